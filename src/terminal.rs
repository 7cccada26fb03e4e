//! Line-oriented terminal surface
//!
//! Reads commands and questions from stdin and prints store changes as they
//! are broadcast. Gateway calls run on spawned tasks so the prompt stays
//! responsive while answers and explanations are in flight.

mod clipboard;
mod command;
mod render;

pub use clipboard::Osc52Clipboard;
pub use command::Command;

use crate::controller::ConversationController;
use crate::gateway::Gateway;
use crate::history::{group_by_date, transcript};
use crate::routes::Route;
use crate::store::{SessionStore, Subject};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

type Input = Lines<BufReader<Stdin>>;

/// Passwords are read as plain lines, so the label warns that they echo
const PASSWORD_PROMPT: &str = "Password (visible as you type):";
const CONFIRM_PROMPT: &str = "Confirm password (visible as you type):";

pub struct Terminal<G: Gateway + 'static> {
    controller: Arc<ConversationController<G>>,
    clipboard: Osc52Clipboard<io::Stdout>,
}

impl<G: Gateway + 'static> Terminal<G> {
    pub fn new(controller: Arc<ConversationController<G>>) -> Self {
        Self {
            controller,
            clipboard: Osc52Clipboard::stdout(),
        }
    }

    fn store(&self) -> &Arc<SessionStore> {
        self.controller.store()
    }

    pub async fn run(self) -> io::Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let renderer = spawn_renderer(Arc::clone(self.store()));

        let result = self.command_loop(&mut input).await;
        renderer.abort();
        result
    }

    async fn command_loop(&self, input: &mut Input) -> io::Result<()> {
        loop {
            if !self.store().is_logged_in() && !self.authenticate(input).await? {
                return Ok(());
            }

            let Some(line) = input.next_line().await? else {
                return Ok(());
            };
            match Command::parse(&line) {
                Command::Ask(question) => {
                    if self.controller.is_pending() {
                        println!("Still waiting for the previous answer.");
                    }
                    let controller = Arc::clone(&self.controller);
                    tokio::spawn(async move { controller.submit_question(&question).await });
                }
                Command::Deep(number) => {
                    let Some(id) = self.store().message_id_at(number - 1) else {
                        println!("No message {number}.");
                        continue;
                    };
                    let controller = Arc::clone(&self.controller);
                    tokio::spawn(async move { controller.request_deep_explanation(id).await });
                }
                Command::Copy(number) => {
                    let copied = self
                        .store()
                        .message_id_at(number - 1)
                        .is_some_and(|id| self.controller.copy_message(id, &self.clipboard));
                    if copied {
                        println!("Copied message {number}.");
                    }
                }
                Command::Subject(name) => {
                    let subject = Subject::new(name);
                    if !subject.is_known() {
                        tracing::debug!(subject = %subject, "Selecting unlisted subject");
                    }
                    self.store().set_subject(subject);
                    self.store().set_sidebar_open(false);
                }
                Command::Subjects => {
                    for subject in Subject::known() {
                        println!("  {subject}");
                    }
                }
                Command::Menu => {
                    self.store().toggle_sidebar();
                }
                Command::New => {
                    self.store().clear_messages();
                    self.store().set_sidebar_open(false);
                }
                Command::Navigate(route) => self.navigate(route).await,
                Command::DeleteHistory(date) => self.delete_history(date).await,
                Command::Logout => self.store().logout(),
                Command::Help => println!("{}", command::HELP),
                Command::Quit => return Ok(()),
                Command::Invalid(hint) => println!("{hint}"),
            }
        }
    }

    /// Log in or sign up. Returns false when input ends first.
    async fn authenticate(&self, input: &mut Input) -> io::Result<bool> {
        loop {
            let Some(choice) = prompt(input, "Log in or sign up? [l/s]").await? else {
                return Ok(false);
            };
            let signup = matches!(choice.trim(), "s" | "S" | "signup");
            let Some(username) = prompt(input, "Username:").await? else {
                return Ok(false);
            };
            let Some(password) = prompt(input, PASSWORD_PROMPT).await? else {
                return Ok(false);
            };
            let username = username.trim();

            let result = if signup {
                let Some(confirm) = prompt(input, CONFIRM_PROMPT).await? else {
                    return Ok(false);
                };
                self.controller
                    .gateway()
                    .signup(username, &password, &confirm)
                    .await
            } else {
                self.controller.gateway().login(username, &password).await
            };

            match result {
                Ok(account) => {
                    self.store()
                        .login(account.user_id, account.token, account.username);
                    println!("Type /help for commands.");
                    return Ok(true);
                }
                Err(e) => println!("{}", e.message),
            }
        }
    }

    async fn navigate(&self, route: Route) {
        match route.resolve(self.store().is_logged_in()) {
            Route::Login => println!(
                "Logged in as {}. Use /logout to switch users.",
                self.store().username()
            ),
            Route::Chat => {
                for (position, entry) in self.store().messages().iter().enumerate() {
                    println!("{}", render::format_message(position + 1, &entry.message));
                }
            }
            Route::History => self.show_history().await,
            Route::HistoryDay(date) => self.show_day(date).await,
            Route::Questions | Route::Syllabus => {
                println!("This view is not available in the terminal.");
            }
            Route::NotFound(path) => println!("Page not found: {path}"),
        }
    }

    async fn show_history(&self) {
        let Some(user_id) = self.store().user_id() else {
            return;
        };
        let token = self.store().token();
        match self
            .controller
            .gateway()
            .fetch_history(user_id, token.as_deref())
            .await
        {
            Ok(records) => println!("{}", render::format_history(&group_by_date(&records))),
            Err(e) => println!("Failed to load history: {}", e.message),
        }
    }

    async fn show_day(&self, date: chrono::NaiveDate) {
        let Some(user_id) = self.store().user_id() else {
            return;
        };
        let token = self.store().token();
        match self
            .controller
            .gateway()
            .fetch_history_for_date(user_id, date, token.as_deref())
            .await
        {
            Ok(records) if records.is_empty() => println!("No conversations on {date}."),
            Ok(records) => {
                for (position, message) in transcript(&records).iter().enumerate() {
                    println!("{}", render::format_message(position + 1, message));
                }
            }
            Err(e) => println!("Failed to load {date}: {}", e.message),
        }
    }

    async fn delete_history(&self, date: chrono::NaiveDate) {
        let Some(user_id) = self.store().user_id() else {
            return;
        };
        let token = self.store().token();
        match self
            .controller
            .gateway()
            .delete_history_for_date(user_id, date, token.as_deref())
            .await
        {
            Ok(response) if response.success => println!("{}", response.message),
            Ok(response) => println!(
                "Could not delete {date}: {}",
                response.error.unwrap_or(response.message)
            ),
            Err(e) => println!("Could not delete {date}: {}", e.message),
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> io::Result<Option<String>> {
    println!("{label}");
    input.next_line().await
}

/// Print every store change until the channel closes
fn spawn_renderer(store: Arc<SessionStore>) -> JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(text) = render::describe(&store, &event) {
                        println!("{text}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Renderer lagged behind store events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
