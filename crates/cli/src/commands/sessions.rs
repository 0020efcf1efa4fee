//! `rolechat sessions` — List stored conversation sessions.

use rolechat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&rolechat_config::config_path())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let (sessions, _) = super::open_stores(&config).await?;
    let all = sessions.list().await?;

    if all.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }

    println!("{} session(s), newest first:", all.len());
    println!();
    for session in all {
        println!(
            "  {}  {:<16} {:<14} {}",
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.title,
            session.model,
            session.id
        );
    }

    Ok(())
}
