use std::io::Read;
use std::sync::Arc;

use anyhow::Context;

use inbox_digest::config::AppConfig;
use inbox_digest::llm::create_provider;
use inbox_digest::mailbox::GmailClient;
use inbox_digest::pipeline::{IngestionOrchestrator, Trigger};
use inbox_digest::server;
use inbox_digest::store::create_store;
use inbox_digest::summarizer::LlmSummarizer;

const USAGE: &str = "usage: inbox-digest [serve | once [payload.json]]";

enum Mode {
    Serve,
    /// One pass from a payload file, or stdin when absent.
    Once(Option<String>),
}

fn parse_mode(args: &[String]) -> Option<Mode> {
    match args.first().map(String::as_str) {
        None | Some("serve") => Some(Mode::Serve),
        Some("once") => Some(Mode::Once(args.get(1).cloned())),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(mode) = parse_mode(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("📬 Inbox Digest v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Scope: {}", config.ingest.mailbox_scope);
    eprintln!("   Window: {} most recent", config.ingest.window_size);
    eprintln!("   Model: {}", config.summarizer.model);
    eprintln!("   Store: {} ({:?})", config.ingest.store_id, config.store.backend);

    // ── Collaborators ───────────────────────────────────────────────────
    let mailbox = Arc::new(GmailClient::new(&config.mailbox));
    let llm = create_provider(&config.summarizer)?;
    let summarizer = Arc::new(LlmSummarizer::new(llm, config.summarizer.max_body_chars));
    let store = create_store(&config.store, &config.ingest.store_id)
        .await
        .with_context(|| format!("failed to open store {}", config.ingest.store_id))?;

    let orchestrator = Arc::new(IngestionOrchestrator::new(
        config.ingest.clone(),
        mailbox,
        summarizer,
        store,
    ));

    match mode {
        Mode::Serve => {
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
                .await
                .with_context(|| format!("failed to bind port {}", config.port))?;
            eprintln!("   Push endpoint: http://0.0.0.0:{}/pubsub\n", config.port);
            tracing::info!(port = config.port, "Push server started");

            axum::serve(listener, server::routes(orchestrator))
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                })
                .await?;
            tracing::info!("Push server stopped");
        }
        Mode::Once(path) => {
            let payload = match path {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("failed to read payload {path}"))?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin()
                        .read_to_end(&mut buf)
                        .context("failed to read payload from stdin")?;
                    buf
                }
            };

            let report = orchestrator.run(&Trigger::from_push_body(&payload)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
