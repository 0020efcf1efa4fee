//! `rolechat chat` — Interactive or single-message chat with a role.

use rolechat_config::AppConfig;
use rolechat_core::event::ChatEvent;
use rolechat_engine::{ChatTurnRequest, RoleChatEngine};
use rolechat_knowledge::{ContextBuilder, RoleKnowledgeLibrary, SimilarityRanker};
use rolechat_providers::openai_compat::OpenAiCompatProvider;
use rolechat_storage::roles::FileRoleDirectory;
use std::io::Write;
use std::sync::Arc;
use tokio_stream::StreamExt;

pub struct ChatArgs {
    pub role: String,
    pub message: Option<String>,
    pub session: Option<String>,
    pub new_session: bool,
    pub topic: Option<String>,
    pub model: Option<String>,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&rolechat_config::config_path())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early — give a clear error
    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    OPENAI_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", rolechat_config::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let provider = Arc::new(OpenAiCompatProvider::new(
        config.default_provider.clone(),
        config.base_url.clone(),
        api_key,
    )?);

    let (sessions, messages) = super::open_stores(&config).await?;
    let roles = Arc::new(FileRoleDirectory::new(&config.roles_path));

    let context = ContextBuilder::new(
        RoleKnowledgeLibrary::new(&config.knowledge.root),
        SimilarityRanker::new(
            provider.clone(),
            config.knowledge.embedding_model.clone(),
            config.knowledge.embedding_dimensions,
        ),
        config.knowledge.top_k,
    );

    let engine =
        RoleChatEngine::new(config, roles, sessions, messages, provider).with_knowledge(context);

    match args.message.clone() {
        Some(message) => {
            run_turn(&engine, &args.role, &message, args.session.clone(), &args).await?;
        }
        None => {
            println!("Chatting with {} — type 'exit' to quit.", args.role);
            let mut session_id = args.session.clone();
            loop {
                print!("you> ");
                std::io::stdout().flush()?;
                let mut line = String::new();
                if std::io::stdin().read_line(&mut line)? == 0 {
                    break;
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                // Later turns pin the session resolved by the first one.
                let resolved = run_turn(&engine, &args.role, line, session_id.clone(), &args)
                    .await?;
                session_id = Some(resolved);
            }
        }
    }

    Ok(())
}

/// Stream one turn to stdout and return the session id it ran in.
async fn run_turn(
    engine: &RoleChatEngine,
    role: &str,
    message: &str,
    session_id: Option<String>,
    args: &ChatArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut request = ChatTurnRequest::new(role, message);
    request.session_id = session_id;
    request.create_new_session = args.new_session;
    request.topic_id = args.topic.clone();
    request.model = args.model.clone();

    let mut stream = engine.chat(request).await?;
    let mut resolved_session = String::new();

    while let Some(event) = stream.next().await {
        match event {
            Ok(ChatEvent::Meta { session_id, .. }) => {
                resolved_session = session_id;
            }
            Ok(ChatEvent::Delta { text }) => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            Ok(ChatEvent::Done { .. }) => {
                println!();
            }
            Err(e) => {
                println!();
                return Err(format!("[{}] {e}", e.code()).into());
            }
        }
    }

    Ok(resolved_session)
}
