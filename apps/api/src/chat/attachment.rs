//! Attachment classification — turns an uploaded file into a typed attachment.
//!
//! Classification is total: every file becomes an `Attachment`. Files the model
//! cannot take (or images that fail to decode) become `Unknown`, which is kept
//! for display but never sent.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::ImageReader;
use serde::Serialize;
use tracing::{debug, warn};

pub const PDF_MIME: &str = "application/pdf";
const OCTET_STREAM: &str = "application/octet-stream";

/// File extensions a chat message may carry.
pub const ACCEPTED_EXTENSIONS: [&str; 8] =
    ["png", "jpg", "jpeg", "gif", "pdf", "mp3", "wav", "m4a"];

/// Whether `name` ends in one of `ACCEPTED_EXTENSIONS`, ignoring case.
pub fn is_accepted(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}

/// A file as received at the upload boundary, bytes already materialized.
///
/// `Bytes` is immutable and shared, so preview, send and resend after an edit
/// all observe the full content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }

    /// Declared media type without parameters, lower-cased. Falls back to a
    /// guess from the file extension when the client sent none.
    pub fn media_type(&self) -> String {
        let declared = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != OCTET_STREAM);

        declared.unwrap_or_else(|| {
            mime_guess::from_path(&self.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Pdf,
    Audio,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentPayload {
    Image {
        mime_type: String,
        data: Bytes,
        width: u32,
        height: u32,
    },
    Pdf {
        data: Bytes,
    },
    /// Held until the prompt is assembled, then uploaded out-of-band.
    Audio {
        mime_type: String,
        data: Bytes,
    },
    Unknown {
        mime_type: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub size_bytes: u64,
    pub payload: AttachmentPayload,
}

/// What a client sees of an attachment. Never carries payload bytes.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    pub name: String,
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        match self.payload {
            AttachmentPayload::Image { .. } => AttachmentKind::Image,
            AttachmentPayload::Pdf { .. } => AttachmentKind::Pdf,
            AttachmentPayload::Audio { .. } => AttachmentKind::Audio,
            AttachmentPayload::Unknown { .. } => AttachmentKind::Unknown,
        }
    }

    pub fn mime_type(&self) -> &str {
        match &self.payload {
            AttachmentPayload::Image { mime_type, .. }
            | AttachmentPayload::Audio { mime_type, .. }
            | AttachmentPayload::Unknown { mime_type } => mime_type,
            AttachmentPayload::Pdf { .. } => PDF_MIME,
        }
    }

    pub fn view(&self) -> AttachmentView {
        let (width, height) = match self.payload {
            AttachmentPayload::Image { width, height, .. } => (Some(width), Some(height)),
            _ => (None, None),
        };
        AttachmentView {
            name: self.name.clone(),
            kind: self.kind(),
            mime_type: self.mime_type().to_string(),
            size_bytes: self.size_bytes,
            width,
            height,
        }
    }
}

/// Classifies one uploaded file. Never fails.
pub fn classify(file: UploadedFile) -> Attachment {
    let mime_type = file.media_type();
    let size_bytes = file.data.len() as u64;

    let payload = if mime_type.starts_with("image/") {
        match probe_dimensions(&file.data) {
            Some((width, height)) => AttachmentPayload::Image {
                mime_type,
                data: file.data,
                width,
                height,
            },
            None => {
                warn!(
                    "Could not decode {} as {mime_type}; keeping it as display-only",
                    file.name
                );
                AttachmentPayload::Unknown { mime_type }
            }
        }
    } else if mime_type == PDF_MIME {
        AttachmentPayload::Pdf { data: file.data }
    } else if mime_type.starts_with("audio/") {
        AttachmentPayload::Audio {
            mime_type,
            data: file.data,
        }
    } else {
        AttachmentPayload::Unknown { mime_type }
    };

    let attachment = Attachment {
        name: file.name,
        size_bytes,
        payload,
    };
    debug!(
        "Classified {} as {:?} ({} bytes)",
        attachment.name,
        attachment.kind(),
        size_bytes
    );
    attachment
}

/// Reads the image header only; full pixel decoding is left to the model.
fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
