//! Interactive terminal chat loop.
//!
//! Talks to the same resolver and orchestrator as the HTTP endpoint, so
//! terminal sessions share history with API clients.

use anyhow::Result;
use console::style;
use futures_util::StreamExt;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::state::AppState;

/// Run the interactive chat loop until EOF or an exit command.
pub async fn run_chat(
    state: &AppState,
    username: String,
    location: Option<String>,
    session: Option<Uuid>,
) -> Result<()> {
    let session_id = state.resolver.validate_session(&username, session).await?;

    println!();
    println!(
        "  {} Chatting as {} (session {})",
        style("🍕").bold(),
        style(&username).cyan(),
        style(session_id).dim()
    );
    println!("  {}", style("Type /quit to exit").dim());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", style(">").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" || message == "/exit" {
            break;
        }

        let stream = match state
            .chat_service
            .stream(
                session_id,
                message.to_string(),
                username.clone(),
                location.clone(),
            )
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("  {} {}", style("✗").red(), e);
                continue;
            }
        };

        futures_util::pin_mut!(stream);
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(text) => {
                    print!("{text}");
                    std::io::stdout().flush()?;
                }
                Err(e) => {
                    eprintln!();
                    eprintln!("  {} {}", style("✗").red(), e);
                    break;
                }
            }
        }
        println!();
        println!();
    }

    println!();
    println!(
        "  {} Session saved: {}",
        style("✓").green(),
        style(session_id).dim()
    );
    Ok(())
}
