//! Deterministic fallback content templates.
//!
//! The composer is the pipeline's safety net: when generation fails for any
//! reason, it builds templated text from the request fields. It is pure —
//! the same request always yields byte-identical text — and it never fails:
//! absent fields are replaced by fixed placeholders. No timestamps appear in
//! the text itself (the produced_at timestamp still lands in the record).

use chrono::Utc;

use crate::domain::content::{ContentKind, ContentOrigin, ContentRequest, GeneratedContent};

/// Composes fallback content for requests whose generation failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackComposer;

impl FallbackComposer {
    /// Build deterministic templated content for the request.
    pub fn compose(&self, request: &ContentRequest) -> GeneratedContent {
        let text = match request.kind {
            ContentKind::Post => post_text(request),
            ContentKind::Letter => letter_text(request),
        };

        GeneratedContent {
            request: request.clone(),
            text,
            origin: ContentOrigin::Fallback,
            produced_at: Utc::now(),
        }
    }
}

fn post_text(request: &ContentRequest) -> String {
    let subject = &request.subject;
    format!(
        "I am the ocean. Conditions in {region} are {severity} (index {index}/100). {cta} #OceanHealth",
        region = subject.get_or("region", "our waters"),
        severity = subject.get_or("severity", "uncertain"),
        index = subject.get_or("index", "n/a"),
        cta = non_empty(&request.audience.call_to_action, "Listen to what the water is telling you."),
    )
}

fn letter_text(request: &ContentRequest) -> String {
    let org = &request.audience;
    let subject = &request.subject;

    let issues = match subject.get("issues") {
        Some(raw) if !raw.trim().is_empty() => raw
            .split("; ")
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "  - Ongoing monitoring of marine conditions".to_string(),
    };

    let action_notes = [
        "Implement enhanced monitoring systems",
        "Increase resource allocation",
        "Establish new partnerships",
    ];
    let actions = if org.focus_areas.is_empty() {
        "1. Strengthen marine protection measures".to_string()
    } else {
        org.focus_areas
            .iter()
            .take(action_notes.len())
            .zip(action_notes.iter())
            .enumerate()
            .map(|(i, (area, note))| format!("{}. {} - {}", i + 1, area, note))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{name}\n\
         Marine Conservation Advocacy Division\n\n\
         Dear {audience},\n\n\
         Subject: Marine Health Status Update for {region}\n\n\
         Our latest assessment places the marine health index at {index}/100 for the {region} \
         region, indicating {severity} conditions.\n\n\
         KEY ISSUES:\n\
         {issues}\n\n\
         RECOMMENDED IMMEDIATE ACTIONS:\n\
         {actions}\n\n\
         We urge you to {cta}.\n\n\
         Sincerely yours,\n\
         {signature}",
        name = org.name,
        audience = non_empty(&org.audience, "Friends of the Ocean"),
        region = subject.get_or("region", "our waters"),
        index = subject.get_or("index", "n/a"),
        severity = subject.get_or("severity", "uncertain"),
        issues = issues,
        actions = actions,
        cta = non_empty(&org.call_to_action, "support marine conservation efforts"),
        signature = org.contact.as_deref().unwrap_or("Tidecast Advocacy"),
    )
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}
