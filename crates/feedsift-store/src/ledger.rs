//! Delivery ledger: the set of identities already surfaced to the notifier.
//!
//! Persisted as a newline-delimited identity set, read whole into memory,
//! unioned with new entries, and rewritten whole. The set only ever grows;
//! a delivered identity is never re-delivered, even across independent runs.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::object::ObjectStore;

pub struct DeliveryLedger {
    objects: ObjectStore,
    object: String,
    delivered: BTreeSet<String>,
}

impl DeliveryLedger {
    /// Loads the ledger. A missing object means nothing has been delivered
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on transport failure after retries.
    pub async fn load(objects: ObjectStore, object: &str) -> Result<Self, StoreError> {
        let delivered = match objects.get_text(object).await? {
            Some(body) => body
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            None => BTreeSet::new(),
        };
        tracing::info!(object = %object, entries = delivered.len(), "loaded delivery ledger");
        Ok(Self {
            objects,
            object: object.to_string(),
            delivered,
        })
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.delivered.contains(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    /// Records identities as delivered and persists the grown set before
    /// returning. On persistence failure the in-memory set is left
    /// unchanged, so a caller that aborts never believes an undelivered
    /// item was delivered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] once the write retry budget is exhausted.
    pub async fn record_delivered<I, S>(&mut self, identities: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut grown = self.delivered.clone();
        grown.extend(identities.into_iter().map(Into::into));
        if grown.len() == self.delivered.len() {
            return Ok(());
        }

        let body = grown.iter().cloned().collect::<Vec<_>>().join("\n");
        self.objects.put_text(&self.object, &body).await?;

        let added = grown.len() - self.delivered.len();
        self.delivered = grown;
        tracing::info!(object = %self.object, added, total = self.delivered.len(), "delivery ledger updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use feedsift_core::RetryPolicy;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn object_store(server_url: &str) -> ObjectStore {
        ObjectStore::new(
            server_url,
            "news",
            Duration::from_secs(5),
            RetryPolicy::exponential(2, Duration::ZERO),
            1024,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_ledger_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/news/o/delivered.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ledger = DeliveryLedger::load(object_store(&server.uri()), "delivered.txt")
            .await
            .unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn record_delivered_writes_the_union() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/news/o/delivered.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("https://example.com/old\n"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/b/news/o/delivered.txt"))
            .and(body_string("https://example.com/new\nhttps://example.com/old"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut ledger = DeliveryLedger::load(object_store(&server.uri()), "delivered.txt")
            .await
            .unwrap();
        ledger
            .record_delivered(["https://example.com/new".to_string()])
            .await
            .unwrap();
        assert!(ledger.contains("https://example.com/old"));
        assert!(ledger.contains("https://example.com/new"));
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn already_delivered_identities_skip_the_write() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/news/o/delivered.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("https://example.com/a"))
            .mount(&server)
            .await;
        // No PUT mock mounted: a write would fail the test with 404.

        let mut ledger = DeliveryLedger::load(object_store(&server.uri()), "delivered.txt")
            .await
            .unwrap();
        ledger
            .record_delivered(["https://example.com/a".to_string()])
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_the_set_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/news/o/delivered.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/b/news/o/delivered.txt"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut ledger = DeliveryLedger::load(object_store(&server.uri()), "delivered.txt")
            .await
            .unwrap();
        let result = ledger
            .record_delivered(["https://example.com/a".to_string()])
            .await;
        assert!(result.is_err());
        assert!(!ledger.contains("https://example.com/a"));
    }
}
