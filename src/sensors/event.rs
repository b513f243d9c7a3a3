use super::registry::SensorHandle;
use std::fmt;

/// Payload of a one-shot trigger fire.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub sensor: SensorHandle,
    pub timestamp_ns: u64,
    pub values: Vec<f32>,
}

impl TriggerEvent {
    pub fn new(sensor: SensorHandle, timestamp_ns: u64, values: Vec<f32>) -> Self {
        Self {
            sensor,
            timestamp_ns,
            values,
        }
    }

    /// Gesture subtype reported in the first value, truncated. 0 when absent.
    pub fn subtype(&self) -> i32 {
        self.values.first().map_or(0, |v| *v as i32)
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TriggerEvent[{},{}", self.timestamp_ns, self.sensor.name)?;
        for value in &self.values {
            write!(f, ",{value}")?;
        }
        write!(f, "]")
    }
}
