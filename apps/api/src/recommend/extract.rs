//! CV text extraction.
//!
//! PDFs go through `pdf-extract` on the blocking pool. A PDF without a text
//! layer (a scan) is handed to the model as a document instead.

use tracing::{info, warn};

use crate::chat::attachment::{classify, Attachment, UploadedFile, PDF_MIME};
use crate::errors::AppError;

/// Upper bound on CV text sent to the model.
const MAX_CV_CHARS: usize = 60_000;

#[derive(Debug)]
pub enum CvSource {
    Text(String),
    Document(Attachment),
}

pub async fn extract_cv(file: UploadedFile) -> Result<CvSource, AppError> {
    let media_type = file.media_type();

    if media_type == PDF_MIME {
        let data = file.data.clone();
        let extracted =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data)).await;

        match extracted {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                let text = tidy_text(&text);
                info!("Extracted {} characters from {}", text.len(), file.name);
                return Ok(CvSource::Text(text));
            }
            Ok(Ok(_)) => warn!("{} has no text layer; sending it as a document", file.name),
            Ok(Err(e)) => warn!("PDF text extraction failed for {}: {e}", file.name),
            Err(e) => warn!("PDF text extraction task failed for {}: {e}", file.name),
        }
        return Ok(CvSource::Document(classify(file)));
    }

    if media_type.starts_with("text/") {
        let text = String::from_utf8(file.data.to_vec())
            .map_err(|_| AppError::Validation("CV text is not valid UTF-8".to_string()))?;
        if text.trim().is_empty() {
            return Err(AppError::Validation("CV is empty".to_string()));
        }
        return Ok(CvSource::Text(tidy_text(&text)));
    }

    Err(AppError::Validation(format!(
        "Unsupported CV type '{media_type}'. Upload a PDF or plain-text CV."
    )))
}

/// Trims lines, collapses blank runs to one empty line, caps the length.
fn tidy_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_CV_CHARS));
    let mut blank_run = false;

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !blank_run && !out.is_empty() {
                out.push('\n');
            }
            blank_run = true;
            continue;
        }
        blank_run = false;
        out.push_str(line);
        out.push('\n');
    }

    if let Some((cut, _)) = out.char_indices().nth(MAX_CV_CHARS) {
        out.truncate(cut);
    }
    out.trim_end().to_string()
}
