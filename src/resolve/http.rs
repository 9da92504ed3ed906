use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{IdResolver, ResolveRequest, ResolvedMap};
use crate::error::{BiographError, Result};

/// Request body for the identifier conversion service
#[derive(Serialize)]
struct ConvertRequest<'a> {
    ids: &'a [String],
    identifier_kind: &'a str,
    entity_type: &'a str,
}

/// HTTP client for a remote identifier conversion service
///
/// Sends one POST per request group; the service answers with a JSON object mapping
/// each recognized id to its equivalent identifiers.
pub struct HttpResolver {
    client: Client,
    endpoint: String,
}

impl HttpResolver {
    /// Create a new resolver client
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Conversion URL, e.g. `http://localhost:8853/convert`
    /// * `timeout` - Per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BiographError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn convert_one(&self, request: &ResolveRequest) -> Result<ResolvedMap> {
        let body = ConvertRequest {
            ids: &request.node_keys,
            identifier_kind: &request.identifier_kind,
            entity_type: &request.entity_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| BiographError::Resolver(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(BiographError::Resolver(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        response
            .json::<ResolvedMap>()
            .await
            .map_err(|e| {
                BiographError::Resolver(format!("Failed to parse resolver response: {}", e))
            })
    }
}

#[async_trait]
impl IdResolver for HttpResolver {
    async fn convert(&self, requests: Vec<ResolveRequest>) -> Result<ResolvedMap> {
        let mut resolved = ResolvedMap::new();
        for request in &requests {
            if request.node_keys.is_empty() {
                continue;
            }
            log::debug!(
                "POST {} ({} ids, {}/{})",
                self.endpoint,
                request.node_keys.len(),
                request.entity_type,
                request.identifier_kind
            );
            resolved.extend(self.convert_one(request).await?);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let keys = vec!["1017".to_string()];
        let body = ConvertRequest {
            ids: &keys,
            identifier_kind: "bts:entrez",
            entity_type: "Gene",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ids"][0], "1017");
        assert_eq!(json["identifier_kind"], "bts:entrez");
        assert_eq!(json["entity_type"], "Gene");
    }

    #[tokio::test]
    async fn test_empty_groups_make_no_calls() {
        // Port 9 (discard) would fail if a request were attempted.
        let resolver =
            HttpResolver::new("http://127.0.0.1:9/convert", Duration::from_secs(1)).unwrap();
        let out = resolver
            .convert(vec![ResolveRequest {
                node_keys: vec![],
                identifier_kind: "bts:entrez".to_string(),
                entity_type: "Gene".to_string(),
            }])
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let resolver =
            HttpResolver::new("http://127.0.0.1:9/convert", Duration::from_secs(1)).unwrap();
        let result = resolver
            .convert(vec![ResolveRequest {
                node_keys: vec!["1017".to_string()],
                identifier_kind: "bts:entrez".to_string(),
                entity_type: "Gene".to_string(),
            }])
            .await;
        assert!(result.is_err());
    }
}
