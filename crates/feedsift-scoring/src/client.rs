//! HTTP client for the remote embedding service.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Task hint sent with every instance; the service tunes the embedding for
/// similarity comparison rather than retrieval or classification.
const TASK_HINT: &str = "SEMANTIC_SIMILARITY";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    instances: Vec<EmbedInstance<'a>>,
}

#[derive(Serialize)]
struct EmbedInstance<'a> {
    task: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    values: Vec<f32>,
}

/// Client for the embedding endpoint.
///
/// Owned by the caller and passed down explicitly; tests construct one
/// against a `wiremock` server.
pub struct EmbeddingClient {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl EmbeddingClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        api_token: Option<String>,
    ) -> Result<Self, ScoringError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("feedsift/0.1 (relevance-scoring)")
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            api_token,
        })
    }

    /// Embeds one batch of texts, returning one vector per input in request
    /// order.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::Http`] on network failure or timeout.
    /// - [`ScoringError::Status`] on a non-2xx response.
    /// - [`ScoringError::Misaligned`] when the response is not index-aligned
    ///   with the request batch.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ScoringError> {
        let request = EmbedRequest {
            instances: texts
                .iter()
                .map(|text| EmbedInstance {
                    task: TASK_HINT,
                    content: text,
                })
                .collect(),
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::Status {
                status: status.as_u16(),
            });
        }

        let body: EmbedResponse = response.json().await?;
        if body.predictions.len() != texts.len() {
            return Err(ScoringError::Misaligned {
                expected: texts.len(),
                got: body.predictions.len(),
            });
        }
        Ok(body.predictions.into_iter().map(|p| p.values).collect())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server_url: &str, token: Option<String>) -> EmbeddingClient {
        EmbeddingClient::new(server_url, Duration::from_secs(5), token).unwrap()
    }

    #[tokio::test]
    async fn sends_task_hint_and_returns_aligned_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "instances": [
                    {"task": "SEMANTIC_SIMILARITY", "content": "first text"},
                    {"task": "SEMANTIC_SIMILARITY", "content": "second text"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [
                    {"values": [1.0, 0.0]},
                    {"values": [0.0, 1.0]}
                ]
            })))
            .mount(&server)
            .await;

        let vectors = client(&server.uri(), None)
            .embed_batch(&["first text".to_string(), "second text".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"values": [0.5]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vectors = client(&server.uri(), Some("secret-token".to_string()))
            .embed_batch(&["text".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server.uri(), None)
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Status { status: 429 }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn misaligned_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"values": [0.5]}]
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri(), None)
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::Misaligned { expected: 2, got: 1 }));
        assert!(!err.is_transient());
    }
}
