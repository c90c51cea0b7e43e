use std::cell::RefCell;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Blocking user prompts supplied by the host.
pub trait Dialogs {
    /// Asks a yes/no question; returns true when the user accepts.
    fn confirm(&self, prompt: &str) -> bool;
    fn alert(&self, notice: &str);
}

/// Language used for the widget's own prompts and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Korean,
}

impl Locale {
    pub const fn delete_confirmation(self) -> &'static str {
        match self {
            Self::English => "Are you sure you want to delete this chat?",
            Self::Korean => "정말로 이 채팅을 삭제하시겠습니까?",
        }
    }

    pub const fn delete_failed(self) -> &'static str {
        match self {
            Self::English => "Failed to delete the chat.",
            Self::Korean => "채팅 삭제에 실패했습니다.",
        }
    }

    pub const fn send_failed(self) -> &'static str {
        match self {
            Self::English => "The reply could not be delivered.",
            Self::Korean => "응답을 받지 못했습니다.",
        }
    }
}

/// Headless dialogs answering from a script.
///
/// Queued answers are consumed in order; once the queue is empty every
/// confirmation gets `fallback`.
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    answers: RefCell<VecDeque<bool>>,
    fallback: bool,
    prompts: RefCell<Vec<String>>,
    alerts: RefCell<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn accepting() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    pub fn declining() -> Self {
        Self::default()
    }

    pub fn queue_answer(&self, answer: bool) {
        self.answers.borrow_mut().push_back(answer);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl Dialogs for ScriptedDialogs {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(self.fallback)
    }

    fn alert(&self, notice: &str) {
        self.alerts.borrow_mut().push(notice.to_string());
    }
}
