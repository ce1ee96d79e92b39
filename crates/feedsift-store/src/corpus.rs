//! Durable, versioned corpus of all records ever seen.

use feedsift_core::Snapshot;

use crate::codec::{decode_snapshot, encode_snapshot};
use crate::error::StoreError;
use crate::object::ObjectStore;

/// The corpus object inside the bucket, CSV-encoded.
///
/// `save` replaces the whole object through a resumable upload; the prior
/// snapshot stays authoritative until the final chunk is acknowledged, so
/// an aborted run never exposes a half-written corpus to the next `load`.
#[derive(Clone)]
pub struct CorpusStore {
    objects: ObjectStore,
    object: String,
}

impl CorpusStore {
    #[must_use]
    pub fn new(objects: ObjectStore, object: &str) -> Self {
        Self {
            objects,
            object: object.to_string(),
        }
    }

    /// Loads the current snapshot. A missing corpus object means this is
    /// the first run and yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on transport failure (after retries) or if the
    /// stored object is not valid CSV.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        match self.objects.get_text(&self.object).await? {
            Some(body) => {
                let snapshot = decode_snapshot(body.as_bytes())?;
                tracing::info!(object = %self.object, records = snapshot.len(), "loaded corpus snapshot");
                Ok(snapshot)
            }
            None => {
                tracing::info!(object = %self.object, "corpus object not found, starting with empty snapshot");
                Ok(Snapshot::new())
            }
        }
    }

    /// Persists the snapshot, returning the number of bytes transferred.
    ///
    /// Identity deduplication is inherent to [`Snapshot`]; the rows are
    /// written in identity order so consecutive saves of equal content are
    /// byte-identical.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] once the upload retry budget is exhausted; in
    /// that case no partial snapshot is visible to subsequent loads.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<u64, StoreError> {
        let bytes = encode_snapshot(snapshot)?;
        let transferred = self
            .objects
            .upload_resumable(&self.object, "text/csv", &bytes)
            .await?;
        tracing::info!(
            object = %self.object,
            records = snapshot.len(),
            bytes = transferred,
            "saved corpus snapshot"
        );
        Ok(transferred)
    }

    /// Whether an identity is already present in the persisted corpus.
    ///
    /// Reloads the snapshot; callers iterating many identities should load
    /// once and use [`Snapshot::contains`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on transport or codec failure.
    pub async fn exists(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.load().await?.contains(identity))
    }
}
