//! Rack configuration.

use serde::{Deserialize, Serialize};

/// Order in which the rack visits modules within one epoch.
///
/// Results do not depend on this once a chain has settled; it exists so the
/// host's scheduling can be reproduced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOrder {
    /// The order modules were added in
    #[default]
    Insertion,
    /// Ascending column
    LeftToRight,
    /// Descending column
    RightToLeft,
    /// The listed columns first, in list order, then everything else in
    /// insertion order
    Columns(Vec<i32>),
}

/// Settings for a [`Rack`](crate::Rack).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RackConfig {
    /// Frames per second
    pub sample_rate: f32,
    /// Lights refresh once every this many frames
    pub light_division: u32,
    pub process_order: ProcessOrder,
    /// Capacity of each module's parameter message queue
    pub message_queue_size: usize,
}

impl Default for RackConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            light_division: 512,
            process_order: ProcessOrder::Insertion,
            message_queue_size: 64,
        }
    }
}

impl RackConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_light_division(mut self, division: u32) -> Self {
        self.light_division = division.max(1);
        self
    }

    pub fn with_process_order(mut self, order: ProcessOrder) -> Self {
        self.process_order = order;
        self
    }

    pub fn with_message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size.max(1);
        self
    }

    /// Clamps values that deserialized configs can carry past the builders.
    ///
    /// A sample rate that is not a positive finite number falls back to the
    /// default.
    pub fn sanitized(mut self) -> Self {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            tracing::warn!(sample_rate = self.sample_rate, "invalid sample rate, using default");
            self.sample_rate = Self::default().sample_rate;
        }
        self.light_division = self.light_division.max(1);
        self.message_queue_size = self.message_queue_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RackConfig = serde_json::from_str(r#"{ "sample_rate": 44100.0 }"#).unwrap();
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.light_division, 512);
        assert_eq!(config.process_order, ProcessOrder::Insertion);
    }

    #[test]
    fn process_order_serializes_by_name() {
        let config = RackConfig::default().with_process_order(ProcessOrder::Columns(vec![2, 0]));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["process_order"], serde_json::json!({ "columns": [2, 0] }));

        let json = serde_json::to_value(ProcessOrder::RightToLeft).unwrap();
        assert_eq!(json, serde_json::json!("right_to_left"));
    }

    #[test]
    fn builders_clamp_degenerate_values() {
        let config = RackConfig::default()
            .with_light_division(0)
            .with_message_queue_size(0);
        assert_eq!(config.light_division, 1);
        assert_eq!(config.message_queue_size, 1);
    }

    #[test]
    fn sanitized_repairs_deserialized_values() {
        let config: RackConfig = serde_json::from_str(
            r#"{ "sample_rate": 0.0, "light_division": 0, "message_queue_size": 0 }"#,
        )
        .unwrap();
        let config = config.sanitized();
        assert_eq!(config.sample_rate, 48_000.0);
        assert_eq!(config.light_division, 1);
        assert_eq!(config.message_queue_size, 1);

        let config = RackConfig::default().with_sample_rate(-1.0).sanitized();
        assert_eq!(config.sample_rate, 48_000.0);
        let config = RackConfig::default().with_sample_rate(44_100.0).sanitized();
        assert_eq!(config.sample_rate, 44_100.0);
    }
}
