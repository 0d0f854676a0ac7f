//! Outbound device commands
//!
//! Commands are plain text lines. Actuator commands are fire-and-forget:
//! success only means the write went through.

use std::fmt;

use crate::error::{DeviceLinkError, Result};

/// Wire commands understood by the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Request one reading
    Read,
    /// Liveness check, answered by `{"pong":true}`
    Ping,
    /// Sound the buzzer once
    Buzz,
    /// Fix the RGB LED colour
    SetColor { r: u8, g: u8, b: u8 },
    /// Let the LED follow the temperature again
    AutoColor,
    /// Buzzer mode
    SetBuzzer(u32),
}

impl DeviceCommand {
    /// Build `SET_COLOR` from unchecked components
    ///
    /// # Errors
    /// Returns `InvalidCommand` when a component is outside 0..=255.
    pub fn set_color(r: i64, g: i64, b: i64) -> Result<Self> {
        let component = |name: &str, v: i64| {
            u8::try_from(v).map_err(|_| {
                DeviceLinkError::InvalidCommand(format!("{name} component {v} is outside 0..=255"))
            })
        };

        Ok(Self::SetColor {
            r: component("red", r)?,
            g: component("green", g)?,
            b: component("blue", b)?,
        })
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("READ"),
            Self::Ping => f.write_str("PING"),
            Self::Buzz => f.write_str("BUZZ"),
            Self::SetColor { r, g, b } => write!(f, "SET_COLOR:{r},{g},{b}"),
            Self::AutoColor => f.write_str("AUTO_COLOR"),
            Self::SetBuzzer(mode) => write!(f, "SET_BUZZER:{mode}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_text() {
        assert_eq!(DeviceCommand::Read.to_string(), "READ");
        assert_eq!(DeviceCommand::Ping.to_string(), "PING");
        assert_eq!(DeviceCommand::Buzz.to_string(), "BUZZ");
        assert_eq!(DeviceCommand::AutoColor.to_string(), "AUTO_COLOR");
        assert_eq!(DeviceCommand::SetBuzzer(2).to_string(), "SET_BUZZER:2");
        assert_eq!(
            DeviceCommand::SetColor { r: 255, g: 0, b: 64 }.to_string(),
            "SET_COLOR:255,0,64"
        );
    }

    #[test]
    fn test_set_color_range() {
        assert_eq!(
            DeviceCommand::set_color(0, 128, 255).unwrap(),
            DeviceCommand::SetColor { r: 0, g: 128, b: 255 }
        );

        let err = DeviceCommand::set_color(0, 256, 0).unwrap_err();
        assert!(err.to_string().contains("green"));
        assert!(DeviceCommand::set_color(-1, 0, 0).is_err());
    }
}
