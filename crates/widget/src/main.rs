mod terminal;

use std::process::ExitCode;
use std::rc::Rc;

use chatpane::document::{Document, ElementId};
use chatpane::preferences::FilePreferences;
use chatpane::settings::SettingsStore;
use chatpane::{ChatWidget, ENTER_KEY, UiEvent, WidgetPorts};
use chatpane_transport::HttpChatTransport;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use terminal::{Command, DEFAULT_VIEWPORT_WIDTH, TerminalDocument, USAGE, parse_command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let store = SettingsStore::load();
    let settings = store.settings();
    tracing::info!(endpoint = %settings.endpoint, config = ?store.config_path(), "starting chatpane");

    let transport = match HttpChatTransport::new(settings.transport_config()) {
        Ok(transport) => transport,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let (mut lines, dialogs) = terminal::spawn_console();
    let document = Rc::new(TerminalDocument::new(DEFAULT_VIEWPORT_WIDTH));
    let widget = ChatWidget::attach(
        WidgetPorts {
            document: document.clone(),
            transport: Rc::new(transport),
            dialogs: Rc::new(dialogs),
            preferences: Rc::new(FilePreferences::open(FilePreferences::default_path())),
        },
        &settings,
    );

    println!("{USAGE}");

    LocalSet::new()
        .run_until(async move {
            while let Some(line) = lines.recv().await {
                let event = match parse_command(&line) {
                    Command::Say(text) => {
                        document.set_input_value(&text);
                        UiEvent::key_press(ElementId::UserInput, ENTER_KEY)
                    }
                    Command::Toggle => UiEvent::Click(ElementId::SidebarToggle),
                    Command::Resize(viewport_width) => {
                        document.set_viewport_width(viewport_width);
                        UiEvent::Resize { viewport_width }
                    }
                    Command::Delete(history_id) => UiEvent::DeleteClick(history_id),
                    Command::Open(history_id) => UiEvent::HistoryClick(history_id),
                    Command::Set { key, value } => {
                        let saved = store
                            .settings()
                            .with_override(&key, &value)
                            .and_then(|updated| store.update(updated));
                        match saved {
                            Ok(()) => println!("[saved {key}; applies on next start]"),
                            Err(error) => println!("! {error}"),
                        }
                        continue;
                    }
                    Command::Quit => break,
                    Command::Invalid(reason) => {
                        println!("{reason}\n{USAGE}");
                        continue;
                    }
                };
                widget.dispatch(event).spawn_local();
            }
        })
        .await;

    ExitCode::SUCCESS
}
