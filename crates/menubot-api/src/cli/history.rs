//! Session history listing.

use anyhow::{bail, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use uuid::Uuid;

use menubot_core::chat::repository::{HistoryRepository, SessionRepository};

use crate::state::AppState;

/// Print the full ordered history of a session as a table.
pub async fn show_history(state: &AppState, session_id: Uuid) -> Result<()> {
    let Some(session) = state.sessions.get(&session_id).await? else {
        bail!("session '{session_id}' not found");
    };

    let turns = state.history.list(&session_id).await?;

    println!();
    println!(
        "  Session {} (started {})",
        style(session.id).cyan(),
        session.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    if turns.is_empty() {
        println!("  {}", style("No turns yet").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Time"),
            Cell::new("Role"),
            Cell::new("Content"),
        ]);

    for turn in &turns {
        table.add_row(vec![
            Cell::new(turn.seq.to_string()),
            Cell::new(turn.created_at.format("%H:%M:%S").to_string()),
            Cell::new(turn.role.to_string()),
            Cell::new(preview(&turn.content, 80)),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

fn preview(content: &str, max_chars: usize) -> String {
    let mut out: String = content.chars().take(max_chars).collect();
    if content.chars().count() > max_chars {
        out.push('…');
    }
    out
}
