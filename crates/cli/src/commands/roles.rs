//! `rolechat roles` — List roles from the role directory.

use rolechat_config::AppConfig;
use rolechat_core::role::{RoleDirectory, RoleId};
use rolechat_storage::roles::FileRoleDirectory;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&rolechat_config::config_path())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let directory = FileRoleDirectory::new(&config.roles_path);
    let roles = directory
        .list()
        .await
        .map_err(|e| format!("Failed to read {}: {e}", config.roles_path.display()))?;

    if roles.is_empty() {
        println!("No roles found in {}", config.roles_path.display());
        return Ok(());
    }

    println!("{} role(s) in {}:", roles.len(), config.roles_path.display());
    println!();
    for role in roles {
        let id = match &role.role_id {
            RoleId::Number(n) => n.to_string(),
            RoleId::Text(t) => t.clone(),
        };
        let description = role.description.as_deref().unwrap_or("(no description)");
        println!("  {:<8} {:<16} {}", id, role.name, truncate(description, 72));
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
