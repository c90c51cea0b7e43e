use std::rc::Rc;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chatpane::chat::RenderMode;
use chatpane::dialogs::ScriptedDialogs;
use chatpane::document::{
    AI_MESSAGE_CLASS, CONTENT_EXPANDED_CLASS, Document, ElementId, HOME_LOCATION, MemoryDocument,
    SIDEBAR_COLLAPSED_CLASS, USER_MESSAGE_CLASS,
};
use chatpane::preferences::MemoryPreferences;
use chatpane::settings::WidgetSettings;
use chatpane::{ChatWidget, ENTER_KEY, UiEvent, WidgetPorts};
use chatpane_transport::{HistoryId, HttpChatTransport, TransportConfig};
use serde_json::{Value, json};
use tokio::task::LocalSet;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    deletes: Arc<Mutex<Vec<String>>>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{address}")
}

/// Replies with `reply` and answers deletes with `delete_success`.
async fn chat_server(reply: &'static str, delete_success: bool) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/get_response",
            post(
                move |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                    recorded.bodies.lock().unwrap().push(body);
                    Json(json!({ "response": reply }))
                },
            ),
        )
        .route(
            "/delete_chat_data/{history_id}",
            post(
                move |State(recorded): State<Recorded>, Path(history_id): Path<String>| async move {
                    recorded.deletes.lock().unwrap().push(history_id);
                    Json(json!({ "success": delete_success }))
                },
            ),
        )
        .with_state(recorded.clone());
    (serve(router).await, recorded)
}

struct Page {
    document: Rc<MemoryDocument>,
    dialogs: Rc<ScriptedDialogs>,
    widget: ChatWidget,
}

fn open_page(
    endpoint: &str,
    document: MemoryDocument,
    dialogs: ScriptedDialogs,
    settings: WidgetSettings,
) -> Page {
    let document = Rc::new(document);
    let dialogs = Rc::new(dialogs);
    let transport = HttpChatTransport::new(TransportConfig::new(endpoint)).unwrap();
    let widget = ChatWidget::attach(
        WidgetPorts {
            document: document.clone(),
            transport: Rc::new(transport),
            dialogs: dialogs.clone(),
            preferences: Rc::new(MemoryPreferences::default()),
        },
        &settings,
    );
    Page {
        document,
        dialogs,
        widget,
    }
}

#[tokio::test]
async fn typed_message_round_trips_through_the_server() {
    let (endpoint, recorded) = chat_server("<b>Hi!</b>", true).await;

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280),
                ScriptedDialogs::accepting(),
                WidgetSettings::default(),
            );
            page.document.set_input_value("  hello  ");

            let handle = page
                .widget
                .dispatch(UiEvent::key_press(ElementId::UserInput, ENTER_KEY))
                .spawn_local()
                .unwrap();

            let transcript = page.document.transcript();
            assert_eq!(transcript.len(), 1);
            assert_eq!(transcript[0].markup, "hello");
            assert!(transcript[0].has_class(USER_MESSAGE_CLASS));
            assert_eq!(page.document.input_value(), "");

            handle.await.unwrap();

            let transcript = page.document.transcript();
            assert_eq!(transcript.len(), 2);
            assert!(transcript[1].has_class(AI_MESSAGE_CLASS));
            assert_eq!(transcript[1].markup, "<b>Hi!</b>");
        })
        .await;

    assert_eq!(
        *recorded.bodies.lock().unwrap(),
        vec![json!({ "message": "  hello  " })]
    );
}

#[tokio::test]
async fn plain_text_mode_escapes_server_markup() {
    let (endpoint, _recorded) = chat_server("<b>Hi!</b>", true).await;

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280),
                ScriptedDialogs::accepting(),
                WidgetSettings {
                    render_mode: RenderMode::PlainText,
                    ..WidgetSettings::default()
                },
            );
            page.document.set_input_value("hi");

            page.widget
                .dispatch(UiEvent::Click(ElementId::SendButton))
                .spawn_local()
                .unwrap()
                .await
                .unwrap();

            assert_eq!(
                page.document.transcript()[1].markup,
                "&lt;b&gt;Hi!&lt;/b&gt;"
            );
        })
        .await;
}

#[tokio::test]
async fn confirmed_delete_removes_entry_and_returns_home() {
    let (endpoint, recorded) = chat_server("unused", true).await;

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280).with_history(["11", "12"]),
                ScriptedDialogs::accepting(),
                WidgetSettings::default(),
            );

            page.widget
                .dispatch(UiEvent::DeleteClick(HistoryId::from("11")))
                .spawn_local()
                .unwrap()
                .await
                .unwrap();

            assert_eq!(page.document.history_entries(), vec![HistoryId::from("12")]);
            assert_eq!(page.document.locations(), vec![HOME_LOCATION]);
            assert!(page.dialogs.alerts().is_empty());
        })
        .await;

    assert_eq!(*recorded.deletes.lock().unwrap(), vec!["11"]);
}

#[tokio::test]
async fn refused_delete_keeps_entry_and_alerts() {
    let (endpoint, _recorded) = chat_server("unused", false).await;

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280).with_history(["11"]),
                ScriptedDialogs::accepting(),
                WidgetSettings::default(),
            );

            page.widget
                .dispatch(UiEvent::DeleteClick(HistoryId::from("11")))
                .spawn_local()
                .unwrap()
                .await
                .unwrap();

            assert_eq!(page.document.history_entries().len(), 1);
            assert!(page.document.locations().is_empty());
            assert_eq!(page.dialogs.alerts(), vec!["Failed to delete the chat."]);
        })
        .await;
}

#[tokio::test]
async fn declined_delete_never_reaches_the_server() {
    let (endpoint, recorded) = chat_server("unused", true).await;

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280).with_history(["11"]),
                ScriptedDialogs::declining(),
                WidgetSettings::default(),
            );

            let outcome = page
                .widget
                .dispatch(UiEvent::DeleteClick(HistoryId::from("11")));
            assert!(outcome.propagation_stopped);
            assert!(outcome.continuation.is_none());
            assert_eq!(page.document.history_entries().len(), 1);
        })
        .await;

    assert!(recorded.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_leaves_only_the_user_message() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    LocalSet::new()
        .run_until(async {
            let page = open_page(
                &endpoint,
                MemoryDocument::new(1280),
                ScriptedDialogs::accepting(),
                WidgetSettings::default(),
            );
            page.document.set_input_value("anyone?");

            page.widget
                .dispatch(UiEvent::Click(ElementId::SendButton))
                .spawn_local()
                .unwrap()
                .await
                .unwrap();

            assert_eq!(page.document.transcript().len(), 1);
            assert_eq!(page.widget.chat().unwrap().pending_replies(), 0);
        })
        .await;
}

#[test]
fn sidebar_follows_viewport_and_manual_toggles() {
    let document = MemoryDocument::new(1280);
    let page = open_page(
        "http://127.0.0.1:5001",
        document,
        ScriptedDialogs::accepting(),
        WidgetSettings::default(),
    );
    let collapsed = |page: &Page| {
        let sidebar = page
            .document
            .has_class(ElementId::Sidebar, SIDEBAR_COLLAPSED_CLASS);
        let content = page
            .document
            .has_class(ElementId::MainContent, CONTENT_EXPANDED_CLASS);
        assert_eq!(sidebar, content);
        sidebar
    };

    assert!(!collapsed(&page));

    page.widget.dispatch(UiEvent::Click(ElementId::SidebarToggle));
    assert!(collapsed(&page));

    page.widget.dispatch(UiEvent::Resize {
        viewport_width: 1280,
    });
    assert!(!collapsed(&page));

    for width in [768, 768, 320] {
        page.widget.dispatch(UiEvent::Resize {
            viewport_width: width,
        });
        assert!(collapsed(&page));
    }
}

#[test]
fn page_without_chat_elements_still_runs_the_sidebar() {
    let page = open_page(
        "http://127.0.0.1:5001",
        MemoryDocument::new(500).without(ElementId::ChatWindow),
        ScriptedDialogs::accepting(),
        WidgetSettings::default(),
    );

    assert!(page.widget.chat().is_none());
    assert!(page.widget.sidebar().is_some());

    page.document.set_input_value("lost");
    let outcome = page.widget.dispatch(UiEvent::Click(ElementId::SendButton));
    assert!(outcome.continuation.is_none());
    assert!(page.document.transcript().is_empty());

    let delete = page
        .widget
        .dispatch(UiEvent::DeleteClick(HistoryId::from("1")));
    assert!(delete.continuation.is_none());
}
