//! Local resume export.
//!
//! [`resume::build_resume_text`] formats a rewrite payload as plain
//! text and [`pdf::render_pdf`] turns that text into a downloadable
//! single-page PDF.

pub mod pdf;
pub mod resume;

pub use pdf::{export_file_name, render_pdf};
pub use resume::{build_resume_text, ContactInfo};
