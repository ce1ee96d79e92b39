//! HTTP object-store client.
//!
//! Small objects (ledger, reference vectors) go through plain GET/PUT.
//! Large objects (the corpus CSV) are written through a resumable chunked
//! upload: the client initiates a session, transmits fixed-size chunks with
//! `Content-Range` headers, and the server acknowledges each chunk with
//! `308` plus a `Range` header naming the bytes it has persisted. A failed
//! chunk is retried from the last acknowledged offset, never from byte
//! zero, and the object is atomically replaced only when the final chunk
//! lands.

use std::time::Duration;

use feedsift_core::{retry_with_backoff, RetryPolicy};
use reqwest::{Client, StatusCode, Url};

use crate::error::StoreError;

/// Outcome of transmitting one chunk.
enum ChunkAck {
    /// Server persisted bytes up to (exclusive) this offset; keep going.
    Persisted(u64),
    /// Final chunk accepted; the object is now visible.
    Complete,
}

/// Client for a bucket in the remote object store.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    base_url: Url,
    bucket: String,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl ObjectStore {
    /// Creates a client for one bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`StoreError::InvalidUrl`] if `base_url`
    /// does not parse.
    pub fn new(
        base_url: &str,
        bucket: &str,
        timeout: Duration,
        retry: RetryPolicy,
        chunk_size: usize,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            // 308 is a chunk acknowledgement here, not a redirect.
            .redirect(reqwest::redirect::Policy::none())
            .user_agent("feedsift/0.1 (corpus-persistence)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            bucket: bucket.to_string(),
            retry,
            chunk_size,
        })
    }

    /// Fetches an object as text. Returns `None` when the object does not
    /// exist yet (first run).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] after the transient-retry budget is exhausted
    /// or on a non-retryable status.
    pub async fn get_text(&self, name: &str) -> Result<Option<String>, StoreError> {
        let url = self.object_url(name)?;
        retry_with_backoff(&self.retry, StoreError::is_transient, || async {
            let response = self.client.get(url.clone()).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                s if s.is_success() => Ok(Some(response.text().await?)),
                s => Err(StoreError::Status {
                    context: format!("GET {name}"),
                    status: s.as_u16(),
                }),
            }
        })
        .await
    }

    /// Writes a small object in one request. The server replaces the object
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] after the transient-retry budget is exhausted
    /// or on a non-retryable status.
    pub async fn put_text(&self, name: &str, body: &str) -> Result<(), StoreError> {
        let url = self.object_url(name)?;
        retry_with_backoff(&self.retry, StoreError::is_transient, || async {
            let response = self
                .client
                .put(url.clone())
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(body.to_string())
                .send()
                .await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(StoreError::Status {
                    context: format!("PUT {name}"),
                    status: status.as_u16(),
                })
            }
        })
        .await
    }

    /// Uploads a large object through a resumable session in fixed-size
    /// chunks, returning the total number of bytes transferred.
    ///
    /// Each transient chunk failure consumes one retry from the budget; the
    /// transfer then resumes from the server's last acknowledged offset.
    /// The object only becomes visible when the final chunk is accepted, so
    /// an abandoned session leaves the prior object untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the retry budget is exhausted or the
    /// session violates the protocol.
    pub async fn upload_resumable(
        &self,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<u64, StoreError> {
        let total = bytes.len() as u64;
        let session_url = self.initiate_session(name, content_type).await?;

        let mut offset: u64 = 0;
        let mut attempt: u32 = 0;
        while offset < total {
            let end = (offset + self.chunk_size as u64).min(total);
            match self.transmit_chunk(&session_url, bytes, offset, end).await {
                Ok(ChunkAck::Complete) => {
                    offset = total;
                }
                Ok(ChunkAck::Persisted(persisted)) => {
                    if persisted <= offset {
                        return Err(StoreError::Protocol(format!(
                            "server acknowledged {persisted} bytes after receiving {end}"
                        )));
                    }
                    attempt = 0;
                    offset = persisted;
                    tracing::info!(
                        object = %name,
                        uploaded = offset,
                        total,
                        "upload progress"
                    );
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        object = %name,
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %err,
                        "chunk transfer failed, resuming from last acknowledged offset"
                    );
                    tokio::time::sleep(delay).await;
                    offset = self.persisted_offset(&session_url, total).await?;
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(object = %name, bytes = total, "upload complete");
        Ok(total)
    }

    /// Opens a resumable-upload session and returns the session URL.
    async fn initiate_session(&self, name: &str, content_type: &str) -> Result<Url, StoreError> {
        let mut url = self.bucket_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("name", name);

        retry_with_backoff(&self.retry, StoreError::is_transient, || async {
            let response = self
                .client
                .post(url.clone())
                .header("X-Upload-Content-Type", content_type)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StoreError::Status {
                    context: format!("initiate upload of {name}"),
                    status: status.as_u16(),
                });
            }
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    StoreError::Protocol("upload session response has no Location header".into())
                })?;
            // Session URLs may be absolute or relative to the store.
            self.base_url.join(location).map_err(|e| {
                StoreError::Protocol(format!("invalid session URL '{location}': {e}"))
            })
        })
        .await
    }

    /// Sends `bytes[offset..end]` with a `Content-Range` header.
    async fn transmit_chunk(
        &self,
        session_url: &Url,
        bytes: &[u8],
        offset: u64,
        end: u64,
    ) -> Result<ChunkAck, StoreError> {
        let total = bytes.len() as u64;
        // Offsets come from bytes.len(), so they always fit a usize.
        let start_idx = usize::try_from(offset)
            .map_err(|_| StoreError::Protocol(format!("offset {offset} out of range")))?;
        let end_idx = usize::try_from(end)
            .map_err(|_| StoreError::Protocol(format!("offset {end} out of range")))?;
        let chunk = bytes[start_idx..end_idx].to_vec();
        let content_range = format!("bytes {}-{}/{}", offset, end - 1, total);

        let response = self
            .client
            .put(session_url.clone())
            .header(reqwest::header::CONTENT_RANGE, content_range)
            .body(chunk)
            .send()
            .await?;

        Self::interpret_ack(&response)
    }

    /// Asks the session how many bytes it has persisted so a retry can
    /// resume rather than restart.
    async fn persisted_offset(&self, session_url: &Url, total: u64) -> Result<u64, StoreError> {
        retry_with_backoff(&self.retry, StoreError::is_transient, || async {
            let response = self
                .client
                .put(session_url.clone())
                .header(reqwest::header::CONTENT_RANGE, format!("bytes */{total}"))
                .send()
                .await?;
            match Self::interpret_ack(&response)? {
                ChunkAck::Complete => Ok(total),
                ChunkAck::Persisted(n) => Ok(n),
            }
        })
        .await
    }

    /// Maps a session response onto a [`ChunkAck`]. `308` means the chunk
    /// was acknowledged and the `Range` header carries the persisted bytes;
    /// any 2xx means the upload finalized.
    fn interpret_ack(response: &reqwest::Response) -> Result<ChunkAck, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(ChunkAck::Complete);
        }
        if status == StatusCode::PERMANENT_REDIRECT {
            let persisted = match response
                .headers()
                .get(reqwest::header::RANGE)
                .and_then(|v| v.to_str().ok())
            {
                Some(range) => parse_range_end(range).ok_or_else(|| {
                    StoreError::Protocol(format!("unparseable Range header '{range}'"))
                })? + 1,
                // No Range header: the session has persisted nothing yet.
                None => 0,
            };
            return Ok(ChunkAck::Persisted(persisted));
        }
        Err(StoreError::Status {
            context: "resumable chunk".to_string(),
            status: status.as_u16(),
        })
    }

    fn bucket_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("b/{}/o", self.bucket))
            .map_err(|e| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn object_url(&self, name: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(&format!("b/{}/o/{}", self.bucket, name))
            .map_err(|e| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Parses the final byte offset out of a session `Range` header of the form
/// `bytes=0-1234`.
fn parse_range_end(range: &str) -> Option<u64> {
    range
        .trim()
        .strip_prefix("bytes=")?
        .split_once('-')?
        .1
        .parse()
        .ok()
}
