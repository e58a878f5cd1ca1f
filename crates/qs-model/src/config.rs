//! Model configuration.
//!
//! Every config is a plain `serde` struct with defaults, so a JSON file only
//! needs the fields it changes:
//!
//! ```json
//! { "sim": { "start_time": 9.0, "duration": 8.0, "seed": 7 },
//!   "mean_patience": null,
//!   "agendas": [[{ "start": 9.0, "end": 17.0 }]] }
//! ```
//!
//! Times are in hours.  `null` patience means customers never balk.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use qs_agenda::Agenda;
use qs_core::SimConfig;

use crate::{ModelError, ModelResult};

// ── BankConfig ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub sim: SimConfig,

    /// Mean time between customer arrivals.
    pub mean_interarrival: f64,

    /// Mean customer patience.  `f64::INFINITY` (JSON `null`) never balks.
    #[serde(with = "infinite_as_null")]
    pub mean_patience: f64,

    /// Mean service duration.
    pub mean_service: f64,

    /// Absolute arrival times.  When set, replaces the exponential arrival
    /// stream.
    pub arrival_times: Option<Vec<f64>>,

    /// One agenda per staff member; staff ids are assigned `1..=n` in order.
    pub agendas: Vec<Agenda>,
}

impl Default for BankConfig {
    fn default() -> Self {
        let start = 9.0;
        Self {
            sim:               SimConfig { start_time: start, duration: 2.0, seed: 42 },
            mean_interarrival: 6.0 / 60.0,
            mean_patience:     15.0 / 60.0,
            mean_service:      10.0 / 60.0,
            arrival_times:     None,
            agendas:           vec![
                shifts(&[(start, start + 2.5), (start + 3.5, start + 5.0)]),
                shifts(&[(start + 1.0, start + 3.5), (start + 4.0, start + 6.0)]),
            ],
        }
    }
}

impl BankConfig {
    /// Parse from JSON and validate.
    pub fn from_json_reader<R: Read>(reader: R) -> ModelResult<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> ModelResult<Self> {
        Self::from_json_reader(std::fs::File::open(path)?)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.sim.validate()?;
        positive("mean_interarrival", self.mean_interarrival)?;
        positive("mean_service", self.mean_service)?;
        if self.mean_patience.is_nan() || self.mean_patience < 0.0 {
            return Err(ModelError::Config(format!(
                "mean_patience must be non-negative or null, got {}",
                self.mean_patience
            )));
        }
        if let Some(times) = &self.arrival_times {
            if times.iter().any(|t| !t.is_finite()) {
                return Err(ModelError::Config("arrival_times must be finite".into()));
            }
            if times.windows(2).any(|w| w[1] < w[0]) {
                return Err(ModelError::Config("arrival_times must be non-decreasing".into()));
            }
        }
        if self.agendas.is_empty() {
            return Err(ModelError::Config("at least one staff agenda is required".into()));
        }
        Ok(())
    }
}

// ── PostConfig ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub sim: SimConfig,

    /// Mean time between client arrivals.
    pub mean_interarrival: f64,

    /// Service duration is uniform in `[low, high)`.
    pub service_range: (f64, f64),

    /// One agenda per window; window ids are assigned `1..=n` in order.
    pub agendas: Vec<Agenda>,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            sim:               SimConfig { start_time: 8.5, duration: 4.5, seed: 42 },
            mean_interarrival: 0.5,
            service_range:     (1.0 / 60.0, 1.0 / 6.0),
            agendas:           vec![
                shifts(&[(8.5, 10.5), (11.5, 13.5)]),
                shifts(&[(8.5, 9.5), (10.5, 12.5)]),
                shifts(&[(11.5, 14.5)]),
            ],
        }
    }
}

impl PostConfig {
    pub fn from_json_reader<R: Read>(reader: R) -> ModelResult<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> ModelResult<Self> {
        Self::from_json_reader(std::fs::File::open(path)?)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.sim.validate()?;
        positive("mean_interarrival", self.mean_interarrival)?;
        let (low, high) = self.service_range;
        if !(low.is_finite() && high.is_finite() && 0.0 <= low && low <= high) {
            return Err(ModelError::Config(format!(
                "service_range must satisfy 0 <= low <= high, got ({low}, {high})"
            )));
        }
        if self.agendas.is_empty() {
            return Err(ModelError::Config("at least one window agenda is required".into()));
        }
        Ok(())
    }
}

// ── ChargingConfig ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    pub sim:             SimConfig,
    pub charge_duration: f64,
    pub trip_duration:   f64,
    /// Delay after the start at which the driver cuts charging short.
    pub interrupt_after: Option<f64>,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            sim:             SimConfig { start_time: 0.0, duration: 20.0, seed: 0 },
            charge_duration: 5.0,
            trip_duration:   2.0,
            interrupt_after: Some(3.0),
        }
    }
}

impl ChargingConfig {
    pub fn from_json_reader<R: Read>(reader: R) -> ModelResult<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> ModelResult<Self> {
        Self::from_json_reader(std::fs::File::open(path)?)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.sim.validate()?;
        positive("charge_duration", self.charge_duration)?;
        positive("trip_duration", self.trip_duration)?;
        if let Some(delay) = self.interrupt_after {
            if !delay.is_finite() || delay < 0.0 {
                return Err(ModelError::Config(format!("invalid interrupt_after {delay}")));
            }
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn positive(name: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::Config(format!("{name} must be positive and finite, got {value}")))
    }
}

/// Default agendas are hand-written and known to be valid.
fn shifts(pairs: &[(f64, f64)]) -> Agenda {
    Agenda::from_pairs(pairs).unwrap_or_default()
}

/// JSON has no infinity: store it as `null`.
mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
