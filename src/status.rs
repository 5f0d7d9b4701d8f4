// src/status.rs

use serde::Serialize;
use std::fmt;

use crate::predict::PredictionRecord;

/// Target mean particle size (nm).
pub const PARTICLE_SIZE_TARGET: f64 = 125.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Warning,
    Critical,
}

impl Status {
    /// Lower is better: `value <= good` is good, `value <= warning` is a warning.
    fn at_most(value: f64, good: f64, warning: f64) -> Self {
        if value <= good {
            Status::Good
        } else if value <= warning {
            Status::Warning
        } else {
            Status::Critical
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Good => "good",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability < 30.0 {
            RiskLevel::Low
        } else if probability < 60.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn grade_defect_rate(rate: f64) -> Status {
    Status::at_most(rate, 5.0, 10.0)
}

pub fn grade_particle_size(size: f64) -> Status {
    Status::at_most((size - PARTICLE_SIZE_TARGET).abs(), 10.0, 20.0)
}

/// Higher is better for conductivity.
pub fn grade_conductivity(conductivity: f64) -> Status {
    if conductivity >= 85.0 {
        Status::Good
    } else if conductivity >= 75.0 {
        Status::Warning
    } else {
        Status::Critical
    }
}

/// Badges shown next to the selected batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub defect_rate: Status,
    pub particle_size: Status,
    pub conductivity: Status,
    pub risk: RiskLevel,
}

impl From<&PredictionRecord> for StatusReport {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            defect_rate: grade_defect_rate(record.defect_rate),
            particle_size: grade_particle_size(record.avg_particle_size),
            conductivity: grade_conductivity(record.conductivity),
            risk: RiskLevel::from_probability(record.defect_probability),
        }
    }
}
