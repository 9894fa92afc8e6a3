//! Contact Chat - terminal front-end
//!
//! Reads commands and messages from stdin and prints the transcript to stdout.

use contact_chat::render::{render_entry, render_session};
use contact_chat::{spawn_client, ClientConfig, ClientUpdate, WsTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "commands: /connect, /disconnect, /quit; anything else is sent to the agent";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout is reserved for the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(endpoint = %config.endpoint, "Starting contact chat");

    let client = spawn_client(config.context(), WsTransport);
    let mut updates = client.subscribe();

    // Presentation: print updates as they arrive
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(ClientUpdate::Entry(entry)) => println!("{}", render_entry(&entry)),
                Ok(ClientUpdate::Session(session)) => {
                    println!("{}", render_session(&session));
                    if session.composing {
                        println!("   agent is typing...");
                    }
                }
                Ok(ClientUpdate::ClearInput) => {}
                Ok(ClientUpdate::Error { message }) => eprintln!("error: {message}"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Display fell behind, updates dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{HELP}");
    if config.autoconnect {
        client.connect().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/connect" => {
                client.connect().await?;
            }
            "/disconnect" => client.disconnect().await?,
            "/quit" => break,
            "/help" => println!("{HELP}"),
            _ => client.send(line.as_str()).await?,
        }
    }

    client.disconnect().await?;
    drop(client);
    let _ = printer.await;

    Ok(())
}
