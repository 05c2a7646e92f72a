//! Plain-text extraction from uploaded study documents.

mod html_utils;
mod markdown;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

pub use html_utils::html_to_text;
pub use markdown::markdown_to_text;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported document type: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

/// Kind of document, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Html,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" | "text" => Ok(Self::PlainText),
            "md" | "markdown" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            "" => Err(DocumentError::Unsupported(format!(
                "{} (no file extension)",
                path.display()
            ))),
            other => Err(DocumentError::Unsupported(format!(".{}", other))),
        }
    }
}

/// Read a file and return its text content
pub fn extract_text(path: &Path) -> Result<String> {
    let kind = DocumentKind::from_path(path)?;
    let raw = read_text(File::open(path)?)?;

    let text = extract_from_str(&raw, kind);
    log::debug!(
        "Extracted {} chars from {:?} ({:?})",
        text.chars().count(),
        path,
        kind
    );
    Ok(text)
}

/// Read a whole stream as text. Invalid UTF-8 is replaced, never dropped.
pub fn read_text<R: Read>(mut reader: R) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Convert already-loaded content of the given kind to plain text
pub fn extract_from_str(content: &str, kind: DocumentKind) -> String {
    match kind {
        DocumentKind::PlainText => content.to_string(),
        DocumentKind::Markdown => markdown_to_text(content),
        DocumentKind::Html => html_to_text(content),
    }
}
