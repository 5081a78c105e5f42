use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{api_error_message, FittingError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize)]
struct FittingRequest<'a> {
    text: &'a str,
}

/// Body of a successful `POST /api/bra-fitting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub fit_tips: Option<String>,
    #[serde(default)]
    pub identified_issues: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub sister_sizes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Clone)]
pub struct FittingClient {
    client: Client,
    base_url: String,
}

impl FittingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the service for a size recommendation.
    pub async fn recommend(&self, text: &str) -> Result<Recommendation, FittingError> {
        let url = format!("{}/api/bra-fitting", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&FittingRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(FittingError::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        let recommendation: Recommendation = serde_json::from_slice(&body)?;
        Ok(recommendation)
    }

    pub async fn health(&self) -> Result<HealthStatus, FittingError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(FittingError::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for FittingClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = FittingClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_recommendation_tolerates_fallback_body() {
        // The service omits identified_issues when it finds no match
        let body = r#"{
            "recommendation": "34B",
            "confidence": 0.3,
            "reasoning": "Unable to find exact match. Please measure again.",
            "fit_tips": "Please consult our measurement guide."
        }"#;

        let rec: Recommendation = serde_json::from_str(body).unwrap();
        assert_eq!(rec.recommendation, "34B");
        assert_eq!(rec.confidence, Some(0.3));
        assert!(rec.identified_issues.is_none());
        assert!(rec.sister_sizes.is_none());
    }

    #[test]
    fn test_recommendation_requires_size() {
        let body = r#"{ "error": "Empty query" }"#;
        assert!(serde_json::from_str::<Recommendation>(body).is_err());
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus = serde_json::from_str(r#"{"status":"healthy"}"#).unwrap();
        assert!(health.is_healthy());

        let degraded = HealthStatus { status: "degraded".to_string() };
        assert!(!degraded.is_healthy());
    }
}
