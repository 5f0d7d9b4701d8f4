// src/predict/mod.rs

pub mod client;
pub mod fallback;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WorkspaceError},
    ingest::{RawRow, RowTable},
};

pub use client::{HttpPredictionService, ServiceHealth};
pub use fallback::synthesize;

/// Upper bound of the defect probability scale.
pub const MAX_DEFECT_PROBABILITY: f64 = 100.0;

/// Remote model that scores a whole batch in one call.
///
/// The workspace runs on a single cooperative thread, so implementors are
/// not required to produce `Send` futures.
#[allow(async_fn_in_trait)]
pub trait PredictionService {
    /// Predictions for `batch`, in row order. An `Err` sends the run to the fallback path.
    async fn predict(&self, batch: &RowTable) -> Result<Vec<PredictedRow>>;
}

/// Outcome of one batch row, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub defect_rate: f64,
    pub defect_probability: f64,
    pub avg_particle_size: f64,
    pub conductivity: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub precursor_room_temp: Option<f64>,
    pub precursor_room_humidity: Option<f64>,
    pub precursor_processing_time_min: Option<f64>,
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Request body for `POST /predict/batch`.
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub batch_data: &'a [RawRow],
}

/// Response body for `POST /predict/batch`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub predictions: Vec<PredictedRow>,
}

impl PredictResponse {
    /// Unwrap the prediction list, turning `success: false` into a business error.
    pub fn into_predictions(self) -> Result<Vec<PredictedRow>> {
        if self.success {
            Ok(self.predictions)
        } else {
            Err(WorkspaceError::Business(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "service reported failure".to_string()),
            ))
        }
    }
}

/// One element of the service's `predictions` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedRow {
    pub defect_probability: f64,
    pub particle_size_d50: f64,
    pub conductivity: f64,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default)]
    pub precursor_room_temp: Option<f64>,
    #[serde(default)]
    pub precursor_room_humidity: Option<f64>,
    #[serde(default)]
    pub precursor_processing_time_min: Option<f64>,
    #[serde(default)]
    pub batch_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PredictedRow {
    /// Dashboard record for this row; `now` stands in for a missing or unreadable timestamp.
    pub fn into_record(self, now: DateTime<Utc>) -> PredictionRecord {
        let probability = self.defect_probability.clamp(0.0, MAX_DEFECT_PROBABILITY);
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(timestamp::parse_service_timestamp)
            .unwrap_or(now);

        PredictionRecord {
            defect_rate: probability,
            defect_probability: probability,
            avg_particle_size: self.particle_size_d50,
            conductivity: self.conductivity,
            temperature: self.temperature,
            humidity: self.humidity,
            precursor_room_temp: self.precursor_room_temp,
            precursor_room_humidity: self.precursor_room_humidity,
            precursor_processing_time_min: self.precursor_processing_time_min,
            batch_id: self.batch_id,
            timestamp,
        }
    }
}

/// Map a service answer onto the submitted batch, rejecting answers of the wrong length.
pub fn map_predictions(
    predicted: Vec<PredictedRow>,
    expected: usize,
    now: DateTime<Utc>,
) -> Result<Vec<PredictionRecord>> {
    if predicted.len() != expected {
        return Err(WorkspaceError::MalformedResponse(format!(
            "expected {} predictions, got {}",
            expected,
            predicted.len()
        )));
    }
    Ok(predicted.into_iter().map(|p| p.into_record(now)).collect())
}
