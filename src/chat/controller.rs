use log::{ debug, warn };
use std::sync::Arc;

use crate::llm::{ ChatBackend, LlmError };
use crate::models::chat::{ Conversation, Message };

/// Shown in front of the failure text when a reply could not be produced.
pub const APOLOGY_PREFIX: &str = "抱歉，出了点小问题 😅";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
}

/// Proof that a request is in flight, carrying the history it was started with.
/// Messages appended after the request began are never part of it.
#[derive(Debug)]
pub struct PendingReply {
    history: Vec<Message>,
}

impl PendingReply {
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// Owns the visible conversation and the input box, and allows at most one
/// backend call at a time.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    conversation: Conversation,
    input: String,
    state: ChatState,
    error: Option<String>,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            conversation: Conversation::new(),
            input: String::new(),
            state: ChatState::Idle,
            error: None,
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == ChatState::Sending
    }

    /// The transient error notice, if the last reply failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Idle -> Sending. Returns `None` without touching any state when the
    /// trimmed input is empty or a reply is already pending.
    pub fn begin_submit(&mut self) -> Option<PendingReply> {
        if self.is_sending() {
            debug!("Submit ignored: reply already pending");
            return None;
        }
        let content = self.input.trim();
        if content.is_empty() {
            return None;
        }

        self.conversation.push(Message::user(content));
        self.input.clear();
        self.error = None;
        self.state = ChatState::Sending;

        Some(PendingReply {
            history: self.conversation.messages().to_vec(),
        })
    }

    /// Sending -> Idle. Appends exactly one assistant message, either the reply
    /// or an apology carrying the failure text.
    pub fn finish(&mut self, _pending: PendingReply, result: Result<String, LlmError>) -> &Message {
        let message = match result {
            Ok(reply) => Message::assistant(reply),
            Err(e) => {
                warn!("Reply failed: {}", e);
                let text = e.to_string();
                let message = Message::assistant(format!("{} {}", APOLOGY_PREFIX, text));
                self.error = Some(text);
                message
            }
        };

        self.conversation.push(message);
        self.state = ChatState::Idle;
        // The message was pushed just above.
        &self.conversation.messages()[self.conversation.len() - 1]
    }

    /// Submits the current input and waits for the reply. Returns the appended
    /// assistant message, or `None` if the submit was a no-op.
    pub async fn submit(&mut self) -> Option<&Message> {
        let pending = self.begin_submit()?;
        let backend = Arc::clone(&self.backend);
        let result = backend.generate_reply(pending.history()).await;
        Some(self.finish(pending, result))
    }
}
