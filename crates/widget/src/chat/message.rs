use serde::{Deserialize, Serialize};

use crate::document::{AI_MESSAGE_CLASS, MessageNode, USER_MESSAGE_CLASS};

/// Stable identifier for one message within a page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::User => USER_MESSAGE_CLASS,
            Self::Assistant => AI_MESSAGE_CLASS,
        }
    }
}

/// Immutable message model; never edited after it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub origin: Origin,
    pub text: String,
}

impl Message {
    pub fn new(id: MessageId, origin: Origin, text: impl Into<String>) -> Self {
        Self {
            id,
            origin,
            text: text.into(),
        }
    }

    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Origin::User, text)
    }

    pub fn assistant(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Origin::Assistant, text)
    }

    pub fn to_node(&self, render_mode: RenderMode) -> MessageNode {
        MessageNode::new(self.origin.css_class(), render_mode.render(&self.text))
    }
}

/// Append-only, chronologically ordered message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<Message>,
}

impl ChatTranscript {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count(&self, origin: Origin) -> usize {
        self.messages
            .iter()
            .filter(|message| message.origin == origin)
            .count()
    }
}

/// How message text is inserted into the transcript container.
///
/// `TrustedMarkup` renders replies unsanitized so the responder can send
/// formatting. Any markup the responder returns, scripts included, reaches the
/// page as-is. Pick `PlainText` when the responder is not trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    PlainText,
    #[default]
    TrustedMarkup,
}

impl RenderMode {
    pub fn render(self, text: &str) -> String {
        match self {
            Self::PlainText => htmlescape::encode_minimal(text),
            Self::TrustedMarkup => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_markup_keeps_formatting() {
        let message = Message::assistant(MessageId::new(1), "<b>Hi!</b>");
        let node = message.to_node(RenderMode::TrustedMarkup);

        assert_eq!(node.markup, "<b>Hi!</b>");
        assert!(node.has_class("message"));
        assert!(node.has_class("ai-message"));
    }

    #[test]
    fn plain_text_escapes_active_markup() {
        let rendered = RenderMode::PlainText.render(r#"<img src=x onerror="alert('x')"> & co"#);
        assert_eq!(
            rendered,
            "&lt;img src=x onerror=&quot;alert(&#x27;x&#x27;)&quot;&gt; &amp; co"
        );
    }

    #[test]
    fn transcript_counts_by_origin_in_append_order() {
        let mut transcript = ChatTranscript::default();
        transcript.push(Message::user(MessageId::new(1), "a"));
        transcript.push(Message::assistant(MessageId::new(2), "b"));
        transcript.push(Message::user(MessageId::new(3), "c"));

        assert_eq!(transcript.count(Origin::User), 2);
        assert_eq!(transcript.count(Origin::Assistant), 1);
        assert_eq!(transcript.last().map(|message| message.text.as_str()), Some("c"));
    }
}
