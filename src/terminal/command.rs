//! Input line parsing

use crate::routes::Route;
use chrono::NaiveDate;

pub const HELP: &str = "\
Type a question and press enter to ask it.
  /deep N              deeper explanation of answer N
  /copy N              copy message N to the clipboard
  /subject NAME        switch subject
  /subjects            list subjects
  /menu                toggle the menu
  /new                 start a new chat
  /history             list past days
  /history/YYYY-MM-DD  replay one day
  /delete-history YYYY-MM-DD
  /logout              log out
  /quit                exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    /// One-based message number as displayed
    Deep(usize),
    Copy(usize),
    Subject(String),
    Subjects,
    Menu,
    New,
    Navigate(Route),
    DeleteHistory(NaiveDate),
    Logout,
    Help,
    Quit,
    /// Unusable input with a hint for the user
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') || line.starts_with("//") {
            return Command::Ask(line.strip_prefix('/').unwrap_or(line).to_string());
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match name {
            "/deep" => message_number(arg).map_or_else(
                || Command::Invalid("usage: /deep N".to_string()),
                Command::Deep,
            ),
            "/copy" => message_number(arg).map_or_else(
                || Command::Invalid("usage: /copy N".to_string()),
                Command::Copy,
            ),
            "/subject" if !arg.is_empty() => Command::Subject(arg.to_string()),
            "/subject" => Command::Invalid("usage: /subject NAME".to_string()),
            "/subjects" => Command::Subjects,
            "/menu" => Command::Menu,
            "/new" => Command::New,
            "/delete-history" => NaiveDate::parse_from_str(arg, "%Y-%m-%d").map_or_else(
                |_| Command::Invalid("usage: /delete-history YYYY-MM-DD".to_string()),
                Command::DeleteHistory,
            ),
            "/logout" => Command::Logout,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => match Route::parse(line) {
                Route::NotFound(path) => Command::Invalid(format!("unknown command {path}")),
                route => Command::Navigate(route),
            },
        }
    }
}

fn message_number(arg: &str) -> Option<usize> {
    arg.parse().ok().filter(|n| *n > 0)
}
