//! Plain-text resume builder.
//!
//! Turns the `rewritten` object of the backend's `/resume/rewrite`
//! response into the text that [`crate::pdf::render_pdf`] lays out.
//! Expected keys:
//! `rewritten_summary` (string), `rewritten_experience` and
//! `rewritten_projects` (arrays of strings or `{title, description}`
//! objects), and `rewritten_skills` (object of category -> skill list).
//! Missing keys produce empty sections.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Width of the horizontal rules framing the resume body.
const RULE_WIDTH: usize = 80;

/// Contact line printed under the name.
#[derive(Debug, Clone, Default)]
pub struct ContactInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
}

impl ContactInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn contact_line(&self) -> String {
        [&self.email, &self.phone, &self.linkedin]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Build the resume text for `rewrite`.
pub fn build_resume_text(rewrite: &Value, contact: &ContactInfo, generated_on: NaiveDate) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&contact.name.to_uppercase());
    out.push('\n');
    out.push_str(&contact.contact_line());
    out.push_str("\n\n");
    out.push_str(&rule);
    out.push_str("\n\nPROFESSIONAL SUMMARY\n");
    out.push_str(
        rewrite
            .get("rewritten_summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default(),
    );

    out.push_str("\n\nPROFESSIONAL EXPERIENCE");
    for item in list_items(rewrite.get("rewritten_experience"), ": ") {
        out.push_str("\n- ");
        out.push_str(&item);
    }

    out.push_str("\n\nPROJECTS");
    for item in list_items(rewrite.get("rewritten_projects"), " - ") {
        out.push_str("\n- ");
        out.push_str(&item);
    }

    out.push_str("\n\nTECHNICAL SKILLS");
    if let Some(categories) = rewrite.get("rewritten_skills").and_then(Value::as_object) {
        for (category, skills) in categories {
            let skills: Vec<String> = match skills {
                Value::Array(items) => items.iter().filter_map(plain_item).collect(),
                single => plain_item(single).into_iter().collect(),
            };
            if !skills.is_empty() {
                out.push('\n');
                out.push_str(&category.to_uppercase());
                out.push_str(": ");
                out.push_str(&skills.join(", "));
            }
        }
    }

    out.push_str("\n\n");
    out.push_str(&rule);
    out.push_str("\nAI-ENHANCED RESUME\n");
    out.push_str(&format!("Generated on {}\n", generated_on.format("%Y-%m-%d")));
    out.push_str("Powered by ResumeIQ AI\n");
    out.push_str(&format!(
        "(c) {} ResumeIQ - All Rights Reserved",
        generated_on.year()
    ));

    out
}

/// Format each entry of an experience/project list.
///
/// Objects with both `title` and `description` render as
/// `title{separator}description`; other values fall back to plain text.
fn list_items(value: Option<&Value>, separator: &str) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(Value::as_str).filter(|s| !s.is_empty());
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            match (title, description) {
                (Some(title), Some(description)) => Some(format!("{title}{separator}{description}")),
                _ => plain_item(item),
            }
        })
        .collect()
}

/// Render a value as one trimmed line, dropping empty and null-ish
/// entries.
fn plain_item(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() || text == "null" || text == "undefined" {
        return None;
    }
    Some(text)
}
