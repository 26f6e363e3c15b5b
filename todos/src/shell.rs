//! Line-oriented front end.
//!
//! Parses shell commands and renders the list the way the web page lays it
//! out: toggle-all indicator, items with per-item loader, footer, and the
//! notification bar.

use crate::filter::Filter;
use crate::types::{Item, ItemId, TodoState};
use std::fmt::Write as _;
use thiserror::Error;

/// A parsed shell command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the list
    List,
    /// Fetch the list again
    Reload,
    /// Add an item; the rest of the line is the title
    Add(String),
    /// Flip one item
    Toggle(ItemId),
    /// Flip all items
    ToggleAll,
    /// Delete one item
    Remove(ItemId),
    /// Delete every completed item
    ClearCompleted,
    /// Change the filter
    Filter(Filter),
    /// Hide the notification
    Dismiss,
    /// Print runtime metrics
    Stats,
    /// Print the command list
    Help,
    /// Leave the shell
    Quit,
}

/// Errors from parsing a shell line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Empty line
    #[error("empty command")]
    Empty,
    /// Unknown command word
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    /// The command needs an item id
    #[error("'{0}' needs a numeric todo id")]
    MissingId(&'static str),
    /// Filter name not recognised
    #[error(transparent)]
    Filter(#[from] crate::filter::ParseFilterError),
}

/// Help text listing every command
pub const HELP: &str = "\
commands:
  list | ls                     show todos
  reload                        fetch todos again
  add <title>                   add a todo (title may be empty to see validation)
  toggle <id>                   flip completed
  toggle-all                    complete all, or un-complete all when all are done
  rm <id>                       delete a todo
  clear-completed               delete every completed todo
  filter <all|active|completed> change the filter
  dismiss                       hide the notification
  stats                         print runtime metrics
  help                          this text
  quit | exit                   leave";

fn parse_id(word: Option<&str>, command: &'static str) -> Result<ItemId, ParseError> {
    word.and_then(|w| w.parse::<u64>().ok())
        .map(ItemId::new)
        .ok_or(ParseError::MissingId(command))
}

/// Parse one line of input.
///
/// # Errors
///
/// Returns [`ParseError`] for empty lines, unknown words and bad arguments.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_start();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match word {
        "" => Err(ParseError::Empty),
        "list" | "ls" => Ok(Command::List),
        "reload" => Ok(Command::Reload),
        "add" => Ok(Command::Add(rest.to_string())),
        "toggle" => parse_id(rest.split_whitespace().next(), "toggle").map(Command::Toggle),
        "toggle-all" => Ok(Command::ToggleAll),
        "rm" | "remove" => parse_id(rest.split_whitespace().next(), "rm").map(Command::Remove),
        "clear-completed" => Ok(Command::ClearCompleted),
        "filter" => Ok(Command::Filter(rest.parse()?)),
        "dismiss" => Ok(Command::Dismiss),
        "stats" => Ok(Command::Stats),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn render_item(out: &mut String, item: &Item, pending: bool) {
    let mark = if item.completed { 'x' } else { ' ' };
    let id = if item.id.is_placeholder() {
        "…".to_string()
    } else {
        item.id.to_string()
    };
    let loader = if pending || item.id.is_placeholder() {
        "  (saving)"
    } else {
        ""
    };
    let _ = writeln!(out, "  [{mark}] {id:>4}  {}{loader}", item.title);
}

/// Render the whole view
#[must_use]
pub fn render(state: &TodoState) -> String {
    let mut out = String::new();

    let toggle_all = if state.all_completed() { "[x]" } else { "[ ]" };
    let _ = writeln!(out, "todos {toggle_all} all");
    if state.loading {
        let _ = writeln!(out, "  loading…");
    }

    for item in state.visible_items() {
        render_item(&mut out, item, state.is_pending(item.id));
    }

    if state.show_footer() {
        let filters: Vec<String> = Filter::ALL
            .iter()
            .map(|f| {
                if *f == state.filter {
                    format!("[{f}]")
                } else {
                    f.to_string()
                }
            })
            .collect();
        let clear = if state.has_completed() {
            "  clear-completed"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} items left  {}{clear}",
            state.active_count(),
            filters.join(" ")
        );
    }

    if let Some(message) = state.notification.message() {
        let _ = writeln!(out, "! {message}  (dismiss)");
    }

    out
}
