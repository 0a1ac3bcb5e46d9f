//! Line-oriented terminal front end.
//!
//! Reads commands from stdin and renders the conversation log as it
//! changes. Network completions are processed while waiting for input, so
//! replies appear without the user pressing enter.

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::chat::{Command, ConfirmAction, ConversationLog, Event, Message, Role};
use crate::client::ChatClient;
use crate::error::ClientResult;
use crate::sanitize::LINE_BREAK;

/// A parsed line of input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Login { identity: String, password: String },
    Logout,
    Switch,
    History,
    Help,
    Quit,
    Chat(String),
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Chat(line.to_string());
        };
        let mut parts = rest.split_whitespace();
        match parts.next().unwrap_or_default() {
            "login" => Self::Login {
                identity: parts.next().unwrap_or_default().to_string(),
                password: parts.next().unwrap_or_default().to_string(),
            },
            "logout" => Self::Logout,
            "switch" => Self::Switch,
            "history" => Self::History,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Turn sanitized markup back into terminal text.
fn render_markup(markup: &str) -> String {
    markup
        .replace(LINE_BREAK, "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

fn render_message(message: &Message) -> String {
    let text = if message.is_markup() {
        render_markup(message.text())
    } else {
        message.text().to_string()
    };
    let label = match message.role() {
        Role::User => "you",
        Role::Bot => "studybot",
    };
    let indent = " ".repeat(label.len() + 4);
    let body = text.replace('\n', &format!("\n{indent}"));
    format!("  {label}: {body}")
}

/// Tracks what part of the log is already on screen.
#[derive(Debug, Default)]
struct View {
    generation: u64,
    shown: usize,
    pending_shown: bool,
}

impl View {
    fn refresh(&mut self, log: &ConversationLog) {
        if log.generation() != self.generation {
            self.generation = log.generation();
            self.shown = 0;
            println!("  ─────────────────────────────────────────");
        }
        for message in log.messages().iter().skip(self.shown) {
            println!("{}", render_message(message));
        }
        self.shown = log.len();

        let pending = log.pending().is_some();
        if pending && !self.pending_shown {
            println!("  studybot is typing...");
        }
        self.pending_shown = pending;
    }

    fn redraw(&mut self, log: &ConversationLog) {
        self.generation = log.generation().wrapping_add(1);
        self.refresh(log);
    }
}

fn print_help() {
    println!("  Commands:");
    println!("    /login <user_id> <password>   sign in");
    println!("    /logout                       sign out");
    println!("    /switch                       sign in as someone else");
    println!("    /history                      show the whole conversation");
    println!("    /quit                         leave");
    println!("  Anything else is sent to the assistant.");
}

/// Print user-facing commands; returns the confirmation requested, if any.
fn show(commands: Vec<Command>) -> Option<ConfirmAction> {
    let mut confirm = None;
    for command in commands {
        match command {
            Command::Alert { message } => println!("  ! {message}"),
            Command::Rejected(reason) => println!("  ! {reason}"),
            Command::ConfirmationRequired(action) => {
                println!("  {} [y/N]", action.prompt());
                confirm = Some(action);
            }
            Command::Authenticate { .. } | Command::FetchHistory { .. } | Command::SendChat { .. } => {
                debug!(?command, "network command reached the shell");
            }
        }
    }
    confirm
}

/// Run the shell until `/quit` or end of input.
///
/// # Errors
/// Returns an error if stdin cannot be read.
pub async fn run(mut client: ChatClient) -> ClientResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = View::default();
    let mut confirming: Option<ConfirmAction> = None;

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║            Study Assistant Chat           ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    print_help();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(commands) = client.next_completion(), if client.in_flight() > 0 => {
                show(commands);
                view.refresh(client.log());
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };

        if let Some(action) = confirming.take() {
            let confirmed = matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes");
            if confirmed {
                let event = match action {
                    ConfirmAction::SignOut => Event::SignOutRequested { confirmed: true },
                    ConfirmAction::SwitchUser => Event::SwitchUserRequested { confirmed: true },
                };
                show(client.handle(event));
                view.refresh(client.log());
                if action == ConfirmAction::SwitchUser {
                    println!("  Sign in with /login <user_id> <password>.");
                }
            }
            continue;
        }

        let commands = match Input::parse(&line) {
            Input::Login { identity, password } => client.handle(Event::SignInRequested {
                identity,
                credential: SecretString::from(password),
            }),
            Input::Logout => client.handle(Event::SignOutRequested { confirmed: false }),
            Input::Switch => client.handle(Event::SwitchUserRequested { confirmed: false }),
            Input::History => {
                view.redraw(client.log());
                continue;
            }
            Input::Help => {
                print_help();
                continue;
            }
            Input::Quit => break,
            Input::Unknown(name) => {
                println!("  ! unknown command /{name}; try /help");
                continue;
            }
            Input::Chat(text) => client.submit(&text),
        };
        confirming = show(commands);
        view.refresh(client.log());
    }

    if client.session().is_authenticated() {
        client.sign_out();
    }
    println!("  Goodbye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Input::parse("/login alice s3cret"),
            Input::Login {
                identity: "alice".to_string(),
                password: "s3cret".to_string()
            }
        );
        assert_eq!(Input::parse(" /logout "), Input::Logout);
        assert_eq!(Input::parse("/exit"), Input::Quit);
        assert_eq!(Input::parse("/dance"), Input::Unknown("dance".to_string()));
        assert_eq!(
            Input::parse("what is 2/3?"),
            Input::Chat("what is 2/3?".to_string())
        );
    }

    #[test]
    fn test_login_without_arguments_is_blank() {
        assert_eq!(
            Input::parse("/login"),
            Input::Login {
                identity: String::new(),
                password: String::new()
            }
        );
    }

    #[test]
    fn test_render_markup_restores_text() {
        assert_eq!(
            render_markup("a &lt;b&gt; &amp;amp; &quot;c&quot;<br>\u{2022} d"),
            "a <b> &amp; \"c\"\n\u{2022} d"
        );
    }

    #[test]
    fn test_render_message_labels_and_indents() {
        let sanitizer = crate::sanitize::Sanitizer::new().unwrap();
        let bot = Message::bot("one\ntwo", &sanitizer);
        assert_eq!(render_message(&bot), "  studybot: one\n            two");
        assert_eq!(render_message(&Message::user("<hi>")), "  you: <hi>");
    }
}
