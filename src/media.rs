use std::path::Path;

use serde::Serialize;

/// Extensions recognized as video content
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi"];

/// Extensions recognized as image content
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Extensions recognized as PDF documents
const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Coarse content-type classification, used for display and routing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Pdf,
    Other,
}

impl MediaKind {
    /// Classify a filename by its extension, case-insensitively.
    ///
    /// Files without an extension classify as `Other`. Never fails and
    /// performs no I/O.
    pub fn classify(filename: &str) -> Self {
        let ext = match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => ext,
            None => return MediaKind::Other,
        };

        if VIDEO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            MediaKind::Video
        } else if IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            MediaKind::Image
        } else if PDF_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            MediaKind::Pdf
        } else {
            MediaKind::Other
        }
    }

    /// Uppercase label for log lines and page headers.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "VIDEO",
            MediaKind::Image => "IMAGE",
            MediaKind::Pdf => "PDF",
            MediaKind::Other => "OTHER",
        }
    }
}
