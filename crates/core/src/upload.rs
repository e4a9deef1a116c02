//! Resume upload validation.
//!
//! The analysis backend only accepts PDF and Word documents up to
//! [`MAX_UPLOAD_BYTES`].

use crate::error::CoreError;

/// Largest resume file the backend accepts (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME types accepted for resume upload.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX];

/// Check a candidate upload before sending it to the backend.
pub fn validate_upload(mime: &str, size_bytes: u64) -> Result<(), CoreError> {
    if !ACCEPTED_MIME_TYPES.contains(&mime) {
        return Err(CoreError::Validation(
            "Please upload a PDF or Word document".into(),
        ));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "File size must be less than 10MB".into(),
        ));
    }
    Ok(())
}

/// Guess the MIME type from a file extension (case-insensitive).
///
/// Returns `None` for anything that is not an accepted resume format.
pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "doc" => Some(MIME_DOC),
        "docx" => Some(MIME_DOCX),
        _ => None,
    }
}
