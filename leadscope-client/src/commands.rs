//! Line commands understood by the `leadscope` binary.

use leadscope_core::{CategoryFilter, PageNumber, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Type into the search box (debounced).
    Search(String),
    Status(StatusFilter),
    Industry(CategoryFilter),
    Page(PageNumber),
    Next,
    Prev,
    Retry,
    Show,
    Quit,
}

/// Parse one input line. Returns `None` for blank or unrecognised input.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        // `search` on its own clears the search
        "search" | "s" => Some(Command::Search(rest.to_string())),
        "status" => rest.parse().ok().map(Command::Status),
        "industry" => rest.parse().ok().map(Command::Industry),
        "page" | "p" => match rest.parse::<PageNumber>() {
            Ok(page) => Some(Command::Page(page)),
            Err(_) => None,
        },
        "next" | "n" => Some(Command::Next),
        "prev" => Some(Command::Prev),
        "retry" | "r" => Some(Command::Retry),
        "show" => Some(Command::Show),
        "quit" | "q" | "exit" => Some(Command::Quit),
        _ => None,
    }
}
