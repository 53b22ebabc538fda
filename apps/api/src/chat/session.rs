//! Chat session — an ordered transcript with an edit/resend state machine.
//!
//! States: `Idle` and `Editing { index }`.
//! - Idle --begin_edit(i)--> Editing
//! - Editing --begin_edit(j)--> Editing (re-target)
//! - Editing --commit_edit--> Idle (truncate at i, append edited message)
//! - Editing --cancel_edit--> Idle
//! - any --clear--> Idle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::chat::attachment::{Attachment, AttachmentView, ACCEPTED_EXTENSIONS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message text cannot be empty")]
    EmptyMessage,

    #[error("message {index} is being edited; commit or cancel the edit first")]
    EditInProgress { index: usize },

    #[error("no edit is in progress")]
    NotEditing,

    #[error("message {index} is not an editable user message (transcript has {len} messages)")]
    InvalidEditTarget { index: usize, len: usize },

    #[error(
        "'{name}' is not an accepted attachment; accepted types: {}",
        ACCEPTED_EXTENSIONS.join(", ")
    )]
    UnsupportedFile { name: String },

    #[error("generation is disabled until an API key is configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub role: Role,
    pub text: String,
    pub attachments: Vec<AttachmentView>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            attachments,
            created_at: Utc::now(),
        }
    }

    /// Assistant replies never carry attachments.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> MessageView {
        MessageView {
            role: self.role,
            text: self.text.clone(),
            attachments: self.attachments.iter().map(Attachment::view).collect(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Editing { index: usize },
}

/// Prefill for the edit box: the message under edit.
#[derive(Debug, Clone, Serialize)]
pub struct EditDraft {
    pub index: usize,
    pub text: String,
    pub attachments: Vec<AttachmentView>,
}

/// Full state handed back to the client after every command.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_draft: Option<EditDraft>,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
    edit_index: Option<usize>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            messages: Vec::new(),
            edit_index: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn edit_index(&self) -> Option<usize> {
        self.edit_index
    }

    pub fn state(&self) -> SessionState {
        match self.edit_index {
            Some(index) => SessionState::Editing { index },
            None => SessionState::Idle,
        }
    }

    /// Alternation is best-effort: the turn pipeline always appends a reply
    /// after a user message, but nothing here enforces it.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<(), ChatError> {
        match self.messages.get(index) {
            Some(message) if message.role == Role::User => {
                self.edit_index = Some(index);
                Ok(())
            }
            _ => Err(ChatError::InvalidEditTarget {
                index,
                len: self.messages.len(),
            }),
        }
    }

    /// Drops the edited message and everything after it, then appends the
    /// replacement with the original attachments. Returns the appended message,
    /// which still needs a reply.
    pub fn commit_edit(&mut self, new_text: &str) -> Result<Message, ChatError> {
        let index = self.edit_index.ok_or(ChatError::NotEditing)?;
        if new_text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut removed = self.messages.split_off(index);
        let attachments = if removed.is_empty() {
            Vec::new()
        } else {
            std::mem::take(&mut removed[0].attachments)
        };

        let edited = Message::user(new_text, attachments);
        self.messages.push(edited.clone());
        self.edit_index = None;
        Ok(edited)
    }

    pub fn cancel_edit(&mut self) {
        self.edit_index = None;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.edit_index = None;
    }

    pub fn edit_draft(&self) -> Option<EditDraft> {
        let index = self.edit_index?;
        let message = self.messages.get(index)?;
        Some(EditDraft {
            index,
            text: message.text.clone(),
            attachments: message.attachments.iter().map(Attachment::view).collect(),
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            created_at: self.created_at,
            state: self.state(),
            edit_draft: self.edit_draft(),
            messages: self.messages.iter().map(Message::view).collect(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
