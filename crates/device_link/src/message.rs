//! Structured device records
//!
//! Each device line is one JSON object. Recognised keys are `temp`,
//! `humidity`, `heat_index`, `air_quality` and `pong`; anything else is kept
//! but ignored.

use contracts::Reading;
use serde_json::{Map, Value};

use crate::error::{DeviceLinkError, Result};

/// One parsed device record
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMessage {
    fields: Map<String, Value>,
}

impl DeviceMessage {
    /// Parse one line as a structured record
    ///
    /// # Errors
    /// Returns `DeviceLinkError::Parse` when the line is not a JSON object.
    pub fn parse(line: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(DeviceLinkError::parse(
                line,
                format!("expected an object, got {}", kind_of(&other)),
            )),
            Err(e) => Err(DeviceLinkError::parse(line, e.to_string())),
        }
    }

    /// Numeric field, if present and a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.number("temp")
    }

    pub fn humidity(&self) -> Option<f64> {
        self.number("humidity")
    }

    /// Whether this record answers a `PING`
    pub fn is_pong(&self) -> bool {
        self.fields.get("pong").is_some_and(is_truthy)
    }

    /// Build a reading when both temperature and humidity are present
    pub fn reading(&self) -> Option<Reading> {
        let temperature = self.temperature()?;
        let humidity = self.humidity()?;

        Some(
            Reading::new(temperature, humidity)
                .with_heat_index(self.number("heat_index"))
                .with_air_quality(self.number("air_quality")),
        )
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_reading() {
        let msg = DeviceMessage::parse(r#"{"temp":25.5,"humidity":60.2,"heat_index":26.1}"#)
            .unwrap();
        let reading = msg.reading().unwrap();

        assert_eq!(reading.temperature, 25.5);
        assert_eq!(reading.humidity, 60.2);
        assert_eq!(reading.heat_index, Some(26.1));
        assert_eq!(reading.air_quality, None);
    }

    #[test]
    fn test_integer_values_are_accepted() {
        let msg = DeviceMessage::parse(r#"{"temp":25,"humidity":60,"air_quality":420}"#).unwrap();
        let reading = msg.reading().unwrap();
        assert_eq!(reading.temperature, 25.0);
        assert_eq!(reading.air_quality, Some(420.0));
    }

    #[test]
    fn test_missing_humidity_is_not_a_reading() {
        let msg = DeviceMessage::parse(r#"{"temp":25.5}"#).unwrap();
        assert!(msg.reading().is_none());
    }

    #[test]
    fn test_non_numeric_temperature_is_not_a_reading() {
        let msg = DeviceMessage::parse(r#"{"temp":"hot","humidity":50}"#).unwrap();
        assert!(msg.reading().is_none());
    }

    #[test]
    fn test_non_object_is_parse_error() {
        let err = DeviceMessage::parse("[1,2]").unwrap_err();
        assert!(matches!(err, DeviceLinkError::Parse { .. }));
        assert!(err.to_string().contains("array"));

        assert!(DeviceMessage::parse("DHT sensor ready").is_err());
        assert!(DeviceMessage::parse(r#"{"temp":25.5"#).is_err());
    }

    #[test]
    fn test_pong_truthiness() {
        assert!(DeviceMessage::parse(r#"{"pong":true}"#).unwrap().is_pong());
        assert!(DeviceMessage::parse(r#"{"pong":1}"#).unwrap().is_pong());
        assert!(!DeviceMessage::parse(r#"{"pong":false}"#).unwrap().is_pong());
        assert!(!DeviceMessage::parse(r#"{"pong":0}"#).unwrap().is_pong());
        assert!(!DeviceMessage::parse(r#"{"status":"ok"}"#).unwrap().is_pong());
    }
}
