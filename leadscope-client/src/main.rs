//! Leadscope entry point: drives a [`QueryCoordinator`] from stdin.

use leadscope_client::commands::{parse_command, Command};
use leadscope_client::telemetry::init_tracing;
use leadscope_client::{
    ClientConfig, ClientError, HttpResultSource, Outcome, QueryCoordinator, ViewSnapshot,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    init_tracing(&config.logging)?;
    info!(api = %config.api_base_url, page_size = config.page_size, "starting leadscope");

    let source = Arc::new(HttpResultSource::new(&config)?);
    let coordinator = QueryCoordinator::new(source, config.coordinator_config());

    let outcome = coordinator.load_initial().await;
    print_summary(&coordinator.snapshot(), Some(outcome));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                println!("unknown command: {}", line.trim());
            }
            continue;
        };
        if command == Command::Quit {
            break;
        }
        let outcome = handle_command(&coordinator, command).await;
        print_summary(&coordinator.snapshot(), outcome);
    }

    coordinator.shutdown();
    coordinator.settle().await;
    Ok(())
}

async fn handle_command(coordinator: &QueryCoordinator, command: Command) -> Option<Outcome> {
    match command {
        Command::Search(text) => {
            coordinator.set_search_text(text);
            None
        }
        Command::Status(status) => Some(coordinator.set_status_filter(status).await),
        Command::Industry(category) => Some(coordinator.set_category_filter(category).await),
        Command::Page(page) => Some(coordinator.go_to_page(page).await),
        Command::Next => Some(coordinator.next_page().await),
        Command::Prev => Some(coordinator.prev_page().await),
        Command::Retry => Some(coordinator.retry().await),
        Command::Show => {
            if let Some(page) = coordinator.current_result_page() {
                for lead in &page.items {
                    println!(
                        "  {}  {}  ({} contacts)",
                        lead.id(),
                        lead.lead.domain,
                        lead.contact_count()
                    );
                }
            }
            None
        }
        Command::Quit => None,
    }
}

fn print_summary(snapshot: &ViewSnapshot, outcome: Option<Outcome>) {
    let selection = &snapshot.selection;
    let listing = match &snapshot.page {
        Some(page) => format!(
            "page {}/{} ({} of {} leads)",
            page.pagination.page,
            page.pagination.total_pages,
            page.len(),
            page.pagination.total_count
        ),
        None => "no results yet".to_string(),
    };
    let mut line = format!("[{}] {}", selection.triple, listing);
    if let Some(kind) = snapshot.loading {
        line.push_str(&format!(" loading={:?}", kind));
    }
    if let Some(error) = &snapshot.error {
        line.push_str(&format!(" error=\"{}\"", error));
    }
    if let Some(outcome) = outcome {
        line.push_str(&format!(" -> {:?}", outcome));
    }
    println!("{}", line);
}
