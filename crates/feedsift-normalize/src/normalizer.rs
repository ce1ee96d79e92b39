//! Conversion of raw adapter payloads into canonical records.

use feedsift_core::Record;
use url::Url;

use crate::clean::clean_text;
use crate::error::NormalizeError;
use crate::identity::canonical_identity;
use crate::payload::{SourceKind, SourcePayload};
use crate::timestamp::parse_timestamp;

/// Normalize a source-specific payload into a canonical [`Record`].
///
/// Pure function over its input: cleans every text field, derives the
/// identity from the canonicalized URL, and parses the publication
/// timestamp. An unparseable timestamp is not a failure; the record is
/// produced with `published_at = None`.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedInput`] when the payload is missing
/// its URL or has no title left after cleaning. Callers drop the record and
/// continue the run.
pub fn normalize(payload: &SourcePayload, kind: SourceKind) -> Result<Record, NormalizeError> {
    let source_name = payload.source_name.as_deref().unwrap_or_default();

    let raw_url = payload
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| NormalizeError::MalformedInput {
            source_name: source_name.to_string(),
            reason: format!("{kind} payload has no url"),
        })?;
    let identity = canonical_identity(raw_url, source_name)?;

    let title = clean_text(payload.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return Err(NormalizeError::MalformedInput {
            source_name: source_name.to_string(),
            reason: format!("{kind} payload '{identity}' has no title"),
        });
    }

    let author = clean_text(payload.author.as_deref().unwrap_or_default());
    let description = clean_text(payload.description.as_deref().unwrap_or_default());
    let content = clean_text(payload.content.as_deref().unwrap_or_default());

    let source = {
        let cleaned = clean_text(source_name);
        if cleaned.is_empty() {
            source_from_host(&identity)
        } else {
            cleaned
        }
    };

    // Social posts rarely carry a separate description; everything else gets
    // the description joined with the content when both are present.
    let summary = match (kind, description.is_empty(), content.is_empty()) {
        (SourceKind::Social, true, _) => content.clone(),
        (_, _, true) => description.clone(),
        (_, true, false) => content.clone(),
        (_, false, false) => format!("{description} // {content}"),
    };

    let published_at = payload
        .published
        .as_deref()
        .and_then(parse_timestamp);
    if published_at.is_none() {
        if let Some(raw) = payload.published.as_deref().filter(|p| !p.trim().is_empty()) {
            tracing::warn!(identity = %identity, raw = %raw, "unparseable timestamp, excluding record from recency matching");
        }
    }

    Ok(Record {
        identity,
        source,
        author,
        title,
        summary,
        raw_description: description,
        raw_content: content,
        published_at,
        relevance_score: None,
        embedding: None,
    })
}

/// Derive a readable source name from the identity's host when the adapter
/// supplied none, e.g. `www.next-platform.com` becomes `Next Platform`.
fn source_from_host(identity: &str) -> String {
    let Some(host) = Url::parse(identity).ok().and_then(|u| u.host_str().map(String::from)) else {
        return String::new();
    };
    let labels: Vec<&str> = host.split('.').collect();
    let base = if labels.len() >= 2 {
        labels[labels.len() - 2]
    } else {
        labels[0]
    };
    base.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
