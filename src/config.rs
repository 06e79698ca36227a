//! Run parameters for the CVRPTW model.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration settings for a CVRPTW run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity shared by every vehicle of the fleet
    pub vehicle_capacity: f64,
    /// Number of identical vehicles
    pub fleet_size: usize,
    /// Explicit big-M; derived from the time data when absent
    pub big_m: Option<f64>,
    /// Optional wall-clock limit for the solve
    #[serde(with = "optional_seconds")]
    pub time_limit: Option<Duration>,
    /// Minimum arc-use value treated as a travelled arc
    pub arc_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vehicle_capacity: 80.0,
            fleet_size: 15,
            big_m: None,
            time_limit: None,
            arc_threshold: 0.5,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::io(path, err))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    /// Set the vehicle capacity.
    pub fn with_vehicle_capacity(mut self, capacity: f64) -> Self {
        self.vehicle_capacity = capacity;
        self
    }

    /// Set the fleet size.
    pub fn with_fleet_size(mut self, size: usize) -> Self {
        self.fleet_size = size;
        self
    }

    /// Set an explicit big-M constant.
    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = Some(big_m);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the arc-use threshold.
    pub fn with_arc_threshold(mut self, threshold: f64) -> Self {
        self.arc_threshold = threshold;
        self
    }

    /// Vehicle identifiers `v0`, `v1`, ... in fleet order.
    pub fn vehicle_ids(&self) -> Vec<String> {
        (0..self.fleet_size).map(vehicle_id).collect()
    }

    /// Reject parameters no model can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.fleet_size == 0 {
            return Err(Error::Config("fleet size must be at least 1".to_string()));
        }
        if !(self.vehicle_capacity.is_finite() && self.vehicle_capacity >= 0.0) {
            return Err(Error::Config(format!(
                "vehicle capacity must be a non-negative number, got {}",
                self.vehicle_capacity
            )));
        }
        if let Some(big_m) = self.big_m {
            if !(big_m.is_finite() && big_m > 0.0) {
                return Err(Error::Config(format!("big-M must be positive, got {}", big_m)));
            }
        }
        if !(self.arc_threshold > 0.0 && self.arc_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "arc threshold must lie in (0, 1], got {}",
                self.arc_threshold
            )));
        }

        Ok(())
    }
}

/// Identifier of the vehicle with the given fleet index.
pub fn vehicle_id(index: usize) -> String {
    format!("v{}", index)
}

/// Time limits are stored as fractional seconds in config files.
mod optional_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let seconds = Option::<f64>::deserialize(deserializer)?;
        match seconds {
            Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => Err(serde::de::Error::custom(format!("invalid time limit: {}", secs))),
            None => Ok(None),
        }
    }
}
