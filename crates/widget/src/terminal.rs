use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chatpane::dialogs::Dialogs;
use chatpane::document::{Document, ElementId, MessageNode, SIDEBAR_COLLAPSED_CLASS};
use chatpane_transport::HistoryId;
use tokio::sync::mpsc;

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

pub const USAGE: &str =
    "commands: <text> | /toggle | /resize <width> | /delete <id> | /open <id> | /set <key> <value> | /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Toggle,
    Resize(u32),
    Delete(HistoryId),
    Open(HistoryId),
    /// Saves one setting; it applies from the next start.
    Set {
        key: String,
        value: String,
    },
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Say(line.to_string());
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();

    match parts.as_slice() {
        ["toggle"] => Command::Toggle,
        ["quit" | "exit"] => Command::Quit,
        ["resize", width] => match width.parse() {
            Ok(width) => Command::Resize(width),
            Err(_) => Command::Invalid(format!("not a width: {width}")),
        },
        ["delete", id] => Command::Delete(HistoryId::from(*id)),
        ["open", id] => Command::Open(HistoryId::from(*id)),
        ["set", key, value] => Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        },
        _ => Command::Invalid(format!("unknown command: /{rest}")),
    }
}

/// Writes transcript appends and page changes to stdout.
pub struct TerminalDocument {
    viewport_width: Cell<u32>,
    input: RefCell<String>,
}

impl TerminalDocument {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            viewport_width: Cell::new(viewport_width),
            input: RefCell::new(String::new()),
        }
    }

    pub fn set_viewport_width(&self, viewport_width: u32) {
        self.viewport_width.set(viewport_width);
    }
}

impl Document for TerminalDocument {
    fn contains(&self, _element: ElementId) -> bool {
        true
    }

    fn set_class(&self, element: ElementId, class: &'static str, enabled: bool) {
        if element == ElementId::Sidebar && class == SIDEBAR_COLLAPSED_CLASS {
            println!("[sidebar {}]", if enabled { "collapsed" } else { "expanded" });
        }
    }

    fn viewport_width(&self) -> u32 {
        self.viewport_width.get()
    }

    fn input_value(&self) -> String {
        self.input.borrow().clone()
    }

    fn set_input_value(&self, value: &str) {
        *self.input.borrow_mut() = value.to_string();
    }

    fn append_message(&self, node: MessageNode) {
        let speaker = node
            .classes
            .iter()
            .find(|class| **class != chatpane::document::MESSAGE_CLASS)
            .copied()
            .unwrap_or_default();
        println!("{speaker:>13} | {}", node.markup);
    }

    fn scroll_to_bottom(&self, _element: ElementId) {
        io::stdout().flush().ok();
    }

    // The terminal keeps no conversation list to remove from.
    fn remove_history_entry(&self, history_id: &HistoryId) -> bool {
        println!("[removed conversation {history_id}]");
        true
    }

    fn navigate(&self, location: &str) {
        println!("[navigate {location}]");
    }
}

/// Blocking prompts answered by the next stdin line.
pub struct TerminalDialogs {
    awaiting_answer: Arc<AtomicBool>,
    answers: std::sync::mpsc::Receiver<String>,
}

impl Dialogs for TerminalDialogs {
    fn confirm(&self, prompt: &str) -> bool {
        self.awaiting_answer.store(true, Ordering::SeqCst);
        print!("{prompt} [y/N] ");
        io::stdout().flush().ok();

        let answer = self.answers.recv();
        self.awaiting_answer.store(false, Ordering::SeqCst);
        matches!(answer.as_deref().map(str::trim), Ok("y" | "Y"))
    }

    fn alert(&self, notice: &str) {
        println!("! {notice}");
    }
}

/// Starts the stdin reader.
///
/// Lines go to the returned command channel, except while a confirmation is
/// open, when the next line answers it. Closing stdin closes both.
pub fn spawn_console() -> (mpsc::UnboundedReceiver<String>, TerminalDialogs) {
    let (line_sender, lines) = mpsc::unbounded_channel();
    let (answer_sender, answers) = std::sync::mpsc::channel();
    let awaiting_answer = Arc::new(AtomicBool::new(false));
    let routing = awaiting_answer.clone();

    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    tracing::warn!("failed to read stdin: {error}");
                    break;
                }
            };

            let delivered = if routing.load(Ordering::SeqCst) {
                answer_sender.send(line).is_ok()
            } else {
                line_sender.send(line).is_ok()
            };
            if !delivered {
                break;
            }
        }
        tracing::debug!("stdin closed");
    });

    (
        lines,
        TerminalDialogs {
            awaiting_answer,
            answers,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_sent_verbatim() {
        assert_eq!(
            parse_command("  hello  "),
            Command::Say("  hello  ".to_string())
        );
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_command("/toggle"), Command::Toggle);
        assert_eq!(parse_command("/resize 640"), Command::Resize(640));
        assert_eq!(
            parse_command("/delete 17"),
            Command::Delete(HistoryId::from("17"))
        );
        assert_eq!(parse_command(" /open 17"), Command::Open(HistoryId::from("17")));
        assert_eq!(
            parse_command("/set render_mode plain_text"),
            Command::Set {
                key: "render_mode".to_string(),
                value: "plain_text".to_string(),
            }
        );
        assert_eq!(parse_command("/quit"), Command::Quit);
    }

    #[test]
    fn malformed_commands_are_reported() {
        assert!(matches!(parse_command("/resize wide"), Command::Invalid(_)));
        assert!(matches!(parse_command("/delete"), Command::Invalid(_)));
        assert!(matches!(parse_command("/dance"), Command::Invalid(_)));
        assert!(matches!(parse_command("/toggle now"), Command::Invalid(_)));
        assert!(matches!(parse_command("/set breakpoint"), Command::Invalid(_)));
    }
}
