//! Minimal single-page PDF writer for local resume export.
//!
//! Emits a fixed five-object document: catalog, page tree, one letter
//! sized page, one content stream and the built-in Courier font. Input
//! text is word-wrapped to [`MAX_CHARS_PER_LINE`] columns and written
//! with one `Tj` per wrapped line. When the cursor falls below
//! [`BOTTOM_MARGIN`] it is moved back up with `50 750 Td`; no second
//! page is created, so text past the first page is not visible.
//!
//! There is no compression, font embedding or layout beyond that.

use std::fmt::Write;

pub const PAGE_WIDTH: u32 = 612;
pub const PAGE_HEIGHT: u32 = 792;
pub const FONT_SIZE: u32 = 10;
pub const LEFT_MARGIN: i32 = 50;
pub const TOP_Y: i32 = 750;
pub const BOTTOM_MARGIN: i32 = 50;
pub const LINE_HEIGHT: i32 = 12;
pub const MAX_CHARS_PER_LINE: usize = 70;

/// Render `text` into PDF bytes.
pub fn render_pdf(text: &str) -> Vec<u8> {
    let content = content_stream(text);

    let objects = [
        "<<\n/Type /Catalog\n/Pages 2 0 R\n>>".to_string(),
        "<<\n/Type /Pages\n/Kids [3 0 R]\n/Count 1\n>>".to_string(),
        format!(
            "<<\n/Type /Page\n/Parent 2 0 R\n/MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}]\n\
             /Contents 4 0 R\n/Resources <<\n/Font <<\n/F1 5 0 R\n>>\n>>\n>>"
        ),
        format!(
            "<<\n/Length {}\n>>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<<\n/Type /Font\n/Subtype /Type1\n/BaseFont /Courier\n>>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        // Writing to a String cannot fail.
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n\n", idx + 1);
    }

    let xref_offset = out.len();
    let size = objects.len() + 1;
    let _ = write!(out, "xref\n0 {size}\n0000000000 65535 f \n");
    for offset in offsets {
        let _ = writeln!(out, "{offset:010} 00000 n ");
    }
    let _ = write!(
        out,
        "trailer\n<<\n/Size {size}\n/Root 1 0 R\n>>\nstartxref\n{xref_offset}\n%%EOF"
    );

    out.into_bytes()
}

/// Build the page content stream (`BT` ... `ET`) for `text`.
pub fn content_stream(text: &str) -> String {
    let mut ops = format!("BT\n/F1 {FONT_SIZE} Tf\n{LEFT_MARGIN} {TOP_Y} Td\n");
    let mut y = TOP_Y;

    let lines: Vec<&str> = text.split('\n').collect();
    for (line_idx, line) in lines.iter().enumerate() {
        let is_last_line = line_idx + 1 == lines.len();

        if line.trim().is_empty() {
            y -= LINE_HEIGHT;
            let _ = writeln!(ops, "0 -{LINE_HEIGHT} Td");
            continue;
        }

        let wrapped = wrap_line(line, MAX_CHARS_PER_LINE);
        for (seg_idx, segment) in wrapped.iter().enumerate() {
            let _ = writeln!(ops, "({}) Tj", escape_text(segment));
            y -= LINE_HEIGHT;

            if is_last_line && seg_idx + 1 == wrapped.len() {
                break;
            }
            if y < BOTTOM_MARGIN {
                y = TOP_Y;
                let _ = writeln!(ops, "{LEFT_MARGIN} {TOP_Y} Td");
            } else {
                let _ = writeln!(ops, "0 -{LINE_HEIGHT} Td");
            }
        }
    }

    ops.push_str("ET");
    ops
}

/// Greedy word wrap on single spaces.
///
/// A word longer than `width` is kept whole on its own line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ') {
        let word_len = word.chars().count();
        if current.is_empty() {
            current = word.to_string();
            current_len = word_len;
        } else if current_len + word_len < width {
            current.push(' ');
            current.push_str(word);
            current_len += word_len + 1;
        } else {
            wrapped.push(std::mem::take(&mut current));
            current = word.to_string();
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Escape a string for a PDF literal: backslash and parentheses are
/// escaped, carriage returns dropped.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Download file name for a user's exported resume, e.g.
/// `"Ada Lovelace"` -> `"Ada_Lovelace_Resume.pdf"`.
///
/// Every run of whitespace becomes one underscore.
pub fn export_file_name(user_name: &str, extension: &str) -> String {
    let mut name = String::with_capacity(user_name.len() + 12);
    let mut in_space = false;
    for ch in user_name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    name.push_str("_Resume.");
    name.push_str(extension);
    name
}
