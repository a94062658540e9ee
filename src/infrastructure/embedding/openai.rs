//! OpenAI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::embedding::{Embedding, EmbeddingProvider};
use crate::domain::DomainError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI embedding provider
#[derive(Debug)]
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    /// Create a new OpenAI embedding provider with the default model
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_options(client, api_key, DEFAULT_OPENAI_BASE_URL, DEFAULT_EMBEDDING_MODEL)
    }

    /// Create a new provider with custom base URL and model
    pub fn with_options(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Vec<Embedding>, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse embedding response: {}", e))
        })?;

        let mut embeddings: Vec<Embedding> = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        // OpenAI documents input order but we sort by index to be safe;
        // pair adjacency in the batch flow depends on it
        embeddings.sort_by_key(|e| e.index());

        Ok(embeddings)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        let embeddings = self.parse_response(response)?;

        if embeddings.len() != texts.len() {
            return Err(DomainError::provider(
                "openai",
                format!(
                    "Expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            ));
        }

        Ok(embeddings)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::embedding::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(num_embeddings: usize, dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..num_embeddings)
            .map(|i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i + j) as f32 * 0.001).collect();
                serde_json::json!({
                    "index": i,
                    "embedding": embedding,
                    "object": "embedding"
                })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": { "prompt_tokens": 10, "total_tokens": 10 }
        })
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(2, 8));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let texts = vec!["Hello".to_string(), "World".to_string()];
        let embeddings = provider.embed(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].index(), 0);
        assert_eq!(embeddings[1].index(), 1);
        assert_eq!(embeddings[0].dimensions(), 8);
    }

    #[tokio::test]
    async fn test_request_body_contains_model_and_input() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        provider.embed(&["Hello".to_string()]).await.unwrap();

        let requests = provider.client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], "text-embedding-3-small");
        assert_eq!(requests[0]["input"][0], "Hello");
    }

    #[tokio::test]
    async fn test_out_of_order_indices_are_sorted() {
        let response = serde_json::json!({
            "model": "text-embedding-3-small",
            "data": [
                { "index": 1, "embedding": [1.0, 0.0] },
                { "index": 0, "embedding": [0.0, 1.0] }
            ],
            "usage": { "prompt_tokens": 2, "total_tokens": 2 }
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let texts = vec!["a".to_string(), "b".to_string()];
        let embeddings = provider.embed(&texts).await.unwrap();

        assert_eq!(embeddings[0].vector(), &[0.0, 1.0]);
        assert_eq!(embeddings[1].vector(), &[1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_a_provider_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let texts = vec!["a".to_string(), "b".to_string()];
        let result = provider.embed(&texts).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let client = MockHttpClient::new().with_error("connection refused");
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let result = provider.embed(&["Hello".to_string()]).await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_custom_base_url_and_model() {
        let client = MockHttpClient::new().with_response(
            "http://localhost:9000/v1/embeddings",
            create_mock_response(1, 4),
        );
        let provider = OpenAiEmbeddingProvider::with_options(
            client,
            "key",
            "http://localhost:9000/",
            "custom-model",
        );

        provider.embed(&["Hello".to_string()]).await.unwrap();

        let requests = provider.client.recorded_requests();
        assert_eq!(requests[0]["model"], "custom-model");
    }
}
