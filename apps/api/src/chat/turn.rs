//! Turn pipeline — one user action, at most one generate call.
//!
//! Flow: classify uploads → append user message → assemble → generate →
//!       append assistant message.
//!
//! Upload and generation failures never escape a turn: they become the text of
//! the assistant message, so every accepted turn appends exactly two messages
//! (one for a commit after truncation) and the transcript stays alternating.

use tracing::{info, warn};

use crate::chat::attachment::{classify, is_accepted, UploadedFile};
use crate::chat::prompt::{assemble, UploadPolicy};
use crate::chat::session::{ChatError, ChatSession, Message, SessionState};
use crate::llm_client::{GatewayError, ModelGateway};

/// Prefix of every assistant message that reports a failure.
pub const ERROR_MARKER: &str = "❌";

/// The two messages a turn appended.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user: Message,
    pub assistant: Message,
}

/// Sends a new user message and appends the model's reply.
pub async fn submit(
    session: &mut ChatSession,
    gateway: &dyn ModelGateway,
    policy: &UploadPolicy,
    text: &str,
    files: Vec<UploadedFile>,
) -> Result<TurnOutcome, ChatError> {
    if text.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if let SessionState::Editing { index } = session.state() {
        return Err(ChatError::EditInProgress { index });
    }
    if let Some(file) = files.iter().find(|file| !is_accepted(&file.name)) {
        return Err(ChatError::UnsupportedFile {
            name: file.name.clone(),
        });
    }
    ensure_ready(gateway).await?;

    let attachments = files.into_iter().map(classify).collect();
    let user = Message::user(text, attachments);
    session.append(user.clone());

    let assistant = Message::assistant(reply(gateway, policy, &user).await);
    session.append(assistant.clone());

    info!(
        "Session {}: turn completed ({} messages)",
        session.id(),
        session.len()
    );
    Ok(TurnOutcome { user, assistant })
}

/// Commits the pending edit and regenerates the reply for it.
pub async fn commit_edit(
    session: &mut ChatSession,
    gateway: &dyn ModelGateway,
    policy: &UploadPolicy,
    text: &str,
) -> Result<TurnOutcome, ChatError> {
    if session.edit_index().is_none() {
        return Err(ChatError::NotEditing);
    }
    ensure_ready(gateway).await?;

    let user = session.commit_edit(text)?;
    let assistant = Message::assistant(reply(gateway, policy, &user).await);
    session.append(assistant.clone());

    info!(
        "Session {}: edit committed and resent ({} messages)",
        session.id(),
        session.len()
    );
    Ok(TurnOutcome { user, assistant })
}

/// Runs assembly and generation for one user message. Always yields text.
pub async fn reply(gateway: &dyn ModelGateway, policy: &UploadPolicy, message: &Message) -> String {
    let content = match assemble(&message.text, &message.attachments, policy, gateway).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Attachment upload failed: {e}");
            return error_text(&e);
        }
    };

    match gateway.generate(&content).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Generation failed: {e}");
            error_text(&e)
        }
    }
}

pub fn error_text(err: &GatewayError) -> String {
    format!("{ERROR_MARKER} Error generating response: {err}")
}

async fn ensure_ready(gateway: &dyn ModelGateway) -> Result<(), ChatError> {
    if gateway.status().await.ready {
        Ok(())
    } else {
        Err(ChatError::NotConfigured)
    }
}
