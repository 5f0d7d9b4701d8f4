// src/predict/client.rs

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{PredictRequest, PredictResponse, PredictedRow, PredictionService};
use crate::{
    error::{Result, WorkspaceError},
    ingest::RowTable,
};

/// Where the batch endpoint lives when nothing is configured.
pub const DEFAULT_PREDICT_URL: &str = "http://localhost:5000/learning/predict/batch";

/// Answer from the service's `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

impl ServiceHealth {
    pub fn is_ready(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") && self.model_loaded
    }
}

/// Prediction service reached over HTTP/JSON.
///
/// No request timeout is set here; a stalled call lasts as long as the
/// underlying `reqwest::Client` allows.
#[derive(Debug, Clone)]
pub struct HttpPredictionService {
    client: Client,
    endpoint: Url,
}

impl HttpPredictionService {
    pub fn new(client: Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| WorkspaceError::Config(format!("prediction URL {}: {}", endpoint, e)))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Probe `/health` at the endpoint's origin.
    pub async fn health(&self) -> Result<ServiceHealth> {
        let url = self
            .endpoint
            .join("/health")
            .map_err(|e| WorkspaceError::Config(e.to_string()))?;
        let health = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<ServiceHealth>()
            .await?;
        debug!(?health, "service health");
        Ok(health)
    }
}

impl PredictionService for HttpPredictionService {
    #[tracing::instrument(level = "info", skip(self, batch), fields(rows = batch.len(), endpoint = %self.endpoint))]
    async fn predict(&self, batch: &RowTable) -> Result<Vec<PredictedRow>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&PredictRequest {
                batch_data: batch.rows(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkspaceError::Network(format!(
                "POST {} returned {}",
                self.endpoint, status
            )));
        }

        let body: PredictResponse = response.json().await?;
        if let Some(message) = body.message.as_deref() {
            info!(message, "service replied");
        }
        body.into_predictions()
    }
}
