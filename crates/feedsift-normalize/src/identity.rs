//! Identity derivation: canonicalize a source URL into the stable unique
//! key used for corpus and ledger deduplication.

use url::Url;

use crate::error::NormalizeError;

/// Canonicalize a source URL into a record identity.
///
/// Lowercases the scheme and host, drops the query string and fragment, and
/// strips a trailing slash, so that cosmetic URL variants of the same story
/// collapse to one key. The path (case included) is preserved, so the
/// identity remains a dereferenceable link.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedInput`] if the URL cannot be parsed
/// or has no host.
pub fn canonical_identity(raw_url: &str, source_name: &str) -> Result<String, NormalizeError> {
    let mut url = Url::parse(raw_url.trim()).map_err(|e| NormalizeError::MalformedInput {
        source_name: source_name.to_string(),
        reason: format!("unparseable url '{raw_url}': {e}"),
    })?;

    if url.host_str().is_none() {
        return Err(NormalizeError::MalformedInput {
            source_name: source_name.to_string(),
            reason: format!("url '{raw_url}' has no host"),
        });
    }

    // Url::parse already lowercases scheme and host.
    url.set_query(None);
    url.set_fragment(None);

    let mut canonical = url.to_string();
    if canonical.ends_with('/') {
        canonical.pop();
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host_only() {
        let id = canonical_identity("HTTPS://Example.COM/News/Story-One", "t").unwrap();
        assert_eq!(id, "https://example.com/News/Story-One");
    }

    #[test]
    fn strips_query_and_fragment() {
        let id = canonical_identity("https://example.com/a?utm_source=feed#top", "t").unwrap();
        assert_eq!(id, "https://example.com/a");
    }

    #[test]
    fn strips_trailing_slash() {
        let id = canonical_identity("https://example.com/a/", "t").unwrap();
        assert_eq!(id, "https://example.com/a");
    }

    #[test]
    fn query_variants_collapse_to_same_identity() {
        let a = canonical_identity("https://example.com/story?ref=rss", "t").unwrap();
        let b = canonical_identity("https://example.com/story?ref=mail", "t").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage() {
        assert!(canonical_identity("not a url", "t").is_err());
    }
}
