mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use freight_chat::{ChatEngine, EngineSettings, HttpBackend};
use ui::chat_view;
use ui::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = EngineSettings::load(cli.settings.as_deref());
    if let Some(base_url) = cli.base_url.clone() {
        settings.base_url = base_url;
    }

    let backend = Arc::new(HttpBackend::new(&settings).context("Failed to set up backend")?);
    let engine = ChatEngine::new(
        backend.clone(),
        backend,
        settings.effective_page_size(),
    );
    engine.open(Some(cli.conversation.as_str()), Some(cli.user.as_str()));

    let mut revisions = engine.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", chat_view::render(&engine.snapshot(), &cli.user, cli.tail));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "/quit" => break,
                    "/more" => {
                        if engine.load_more().is_none() {
                            println!("   (no older messages to load)");
                        }
                    }
                    _ => {
                        engine.send_message(&line, None);
                    }
                }
            }
        }
    }

    engine.close();
    Ok(())
}
