//! Prompt assembly — orders attachments and text into one generate request.
//!
//! Attachments come first in upload order, the user's text last. Inline limits
//! on the hosted API are far smaller than file-reference limits, so large PDFs
//! and all audio go through an out-of-band upload.

use tracing::debug;

use crate::chat::attachment::{Attachment, AttachmentPayload, PDF_MIME};
use crate::llm_client::{ContentPart, GatewayError, ModelGateway};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Tunable inline-vs-upload threshold for PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// PDFs strictly below this size are inlined; at or above it they are uploaded.
    pub inline_pdf_limit_bytes: u64,
}

impl UploadPolicy {
    pub const DEFAULT_INLINE_PDF_LIMIT_MB: u64 = 15;

    pub fn new(inline_pdf_limit_bytes: u64) -> Self {
        Self {
            inline_pdf_limit_bytes,
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INLINE_PDF_LIMIT_MB * BYTES_PER_MB)
    }
}

/// Builds the content sequence for `text` and its attachments.
///
/// Fails only when an out-of-band upload fails.
pub async fn assemble(
    text: &str,
    attachments: &[Attachment],
    policy: &UploadPolicy,
    gateway: &dyn ModelGateway,
) -> Result<Vec<ContentPart>, GatewayError> {
    let mut parts = Vec::with_capacity(attachments.len() + 1);

    for attachment in attachments {
        match &attachment.payload {
            AttachmentPayload::Image {
                mime_type, data, ..
            } => parts.push(ContentPart::Inline {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            AttachmentPayload::Pdf { data } if (data.len() as u64) < policy.inline_pdf_limit_bytes => {
                parts.push(ContentPart::Inline {
                    mime_type: PDF_MIME.to_string(),
                    data: data.clone(),
                })
            }
            AttachmentPayload::Pdf { data } => {
                debug!(
                    "{} is {} bytes, uploading instead of inlining",
                    attachment.name,
                    data.len()
                );
                let reference = gateway
                    .upload(data.clone(), PDF_MIME, &attachment.name)
                    .await?;
                parts.push(ContentPart::File(reference));
            }
            AttachmentPayload::Audio { mime_type, data } => {
                let reference = gateway
                    .upload(data.clone(), mime_type, &attachment.name)
                    .await?;
                parts.push(ContentPart::File(reference));
            }
            AttachmentPayload::Unknown { .. } => {
                debug!("Skipping display-only attachment {}", attachment.name);
            }
        }
    }

    parts.push(ContentPart::Text(text.to_string()));
    Ok(parts)
}
