//! Simulation parameters
//!
//! Owned by the host (sliders, saved presets); the core only reads them and
//! never persists them on its own.

use serde::{Deserialize, Serialize};

use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::error::{Result, SimError};

/// Tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    // === Balls ===
    /// Radius applied to every ball
    pub ball_radius: f64,
    /// Speed magnitude of newly spawned balls (units/s)
    pub ball_speed: f64,
    /// Balls spawned when a simulation is created
    pub target_ball_count: u32,

    // === Disease ===
    /// How long a ball stays infected, in simulated seconds
    pub infectious_seconds: f64,
    /// Probability that a single contact transmits the infection
    pub transmission_rate: f64,

    // === Board ===
    /// Half-gap of every wall's door (0 = closed); each wall clamps it to
    /// half its own height
    pub wall_opening: f64,
    pub field_width: f64,
    pub field_height: f64,

    // === Run control ===
    /// Stop automatically once nobody is infected and the census has been
    /// unchanged for this many seconds
    pub auto_pause_delay: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            ball_radius: 2.0,
            ball_speed: 7.0,
            target_ball_count: 0,

            infectious_seconds: 20.0,
            transmission_rate: 1.0,

            wall_opening: 0.0,
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            auto_pause_delay: 5.0,
        }
    }
}

impl Parameters {
    /// Check every value before it reaches the scene
    pub fn validate(&self) -> Result<()> {
        positive("ball_radius", self.ball_radius)?;
        non_negative("ball_speed", self.ball_speed)?;
        non_negative("infectious_seconds", self.infectious_seconds)?;
        non_negative("wall_opening", self.wall_opening)?;
        positive("field_width", self.field_width)?;
        positive("field_height", self.field_height)?;
        non_negative("auto_pause_delay", self.auto_pause_delay)?;

        if !(0.0..=1.0).contains(&self.transmission_rate) {
            return Err(SimError::InvalidParameter(format!(
                "transmission_rate must be within [0, 1], got {}",
                self.transmission_rate
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Parameters::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_radius = Parameters {
            ball_radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_radius.validate(),
            Err(SimError::InvalidParameter(_))
        ));

        let bad_rate = Parameters {
            transmission_rate: 1.5,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());

        let nan_speed = Parameters {
            ball_speed: f64::NAN,
            ..Default::default()
        };
        assert!(nan_speed.validate().is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let params: Parameters = serde_json::from_str(r#"{"ball_radius": 3.0}"#).unwrap();
        assert_eq!(params.ball_radius, 3.0);
        assert_eq!(params.ball_speed, 7.0);
    }
}
