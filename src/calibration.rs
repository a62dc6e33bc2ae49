//! Contact-rate calibration sweep
//!
//! R0 is derived from how often balls touch, so it helps to know how the
//! contact rate depends on crowding and speed. This runs bare scenes (borders
//! and balls only) over a grid of ball counts and speeds and tabulates
//! contacts per ball per second. Each cell settles first so balls spawned
//! on top of each other can separate, then the collision counter is reset
//! and the rate is measured.

use crate::consts::{SIM_DT, WARMUP_TICKS};
use crate::error::{Result, SimError};
use crate::settings::Parameters;
use crate::sim::{Field, SimState, contact_rate, tick};

/// Densest packing of equal disks in the plane (hexagonal)
pub const CLOSE_PACKING: f64 = std::f64::consts::PI * 1.732_050_807_568_877_2 / 6.0;

/// Sweep setup
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    pub field: Field,
    pub ball_radius: f64,
    /// Ball count increment between rows; the first row has no balls
    pub ball_step: u32,
    /// Speeds measured in every row (units/s)
    pub speeds: Vec<f64>,
    /// Ticks run before counting starts
    pub settle_ticks: u64,
    /// Ticks over which contacts are counted
    pub measure_ticks: u64,
    pub seed: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            field: Field::default(),
            ball_radius: 2.0,
            ball_step: 100,
            speeds: (0..=6).map(|i| f64::from(i) * 10.0).collect(),
            settle_ticks: 120,
            measure_ticks: 1000,
            seed: 42,
        }
    }
}

/// One ball count across all speeds
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRow {
    pub balls: u32,
    /// Fraction of the field covered by balls
    pub packing_fraction: f64,
    /// Contacts per ball per second, one per configured speed
    pub contact_rates: Vec<f64>,
}

/// Fraction of the field area covered by `balls` disks
pub fn packing_fraction(balls: u32, radius: f64, field: Field) -> f64 {
    std::f64::consts::PI * radius * radius * f64::from(balls) / (field.width * field.height)
}

/// Run one bare scene and return its contacts per ball per second
pub fn measure_contact_rate(config: &CalibrationConfig, balls: u32, speed: f64, seed: u64) -> Result<f64> {
    let params = Parameters {
        ball_radius: config.ball_radius,
        ball_speed: speed,
        field_width: config.field.width,
        field_height: config.field.height,
        ..Default::default()
    };
    params.validate()?;

    let mut state = SimState::new(config.field, seed);
    for _ in 0..balls {
        state.spawn_ball(&params)?;
    }

    for _ in 0..config.settle_ticks {
        tick(&mut state, &params, SIM_DT);
    }
    state.collisions = 0;
    // Contacts are only counted from the warm-up tick on
    let counting_after = state.tick.max(WARMUP_TICKS - 1);
    for _ in 0..config.measure_ticks {
        tick(&mut state, &params, SIM_DT);
    }

    let counted_ticks = state.tick.saturating_sub(counting_after);
    Ok(contact_rate(
        state.collisions,
        balls as usize,
        counted_ticks as f64 * SIM_DT,
    ))
}

/// Sweep ball counts in steps of `ball_step` until the next count would
/// exceed close packing
pub fn sweep(config: &CalibrationConfig) -> Result<Vec<CalibrationRow>> {
    if config.ball_step == 0 {
        return Err(SimError::InvalidParameter(
            "ball_step must be positive".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut cell_seed = config.seed;
    let mut balls: u32 = 0;
    loop {
        let packing = packing_fraction(balls, config.ball_radius, config.field);
        if packing > CLOSE_PACKING {
            break;
        }

        let mut contact_rates = Vec::with_capacity(config.speeds.len());
        for &speed in &config.speeds {
            contact_rates.push(measure_contact_rate(config, balls, speed, cell_seed)?);
            cell_seed = cell_seed.wrapping_add(1);
        }
        log::info!(
            "Calibrated {} balls (packing {:.3}): {:?}",
            balls,
            packing,
            contact_rates
        );
        rows.push(CalibrationRow {
            balls,
            packing_fraction: packing,
            contact_rates,
        });

        balls = match balls.checked_add(config.ball_step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CalibrationConfig {
        CalibrationConfig {
            field: Field::new(60.0, 40.0),
            ball_radius: 2.0,
            ball_step: 60,
            speeds: vec![2.0, 40.0],
            settle_ticks: 120,
            measure_ticks: 300,
            seed: 7,
        }
    }

    #[test]
    fn test_packing_fraction() {
        let field = Field::new(100.0, 100.0);
        let packing = packing_fraction(100, 2.0, field);
        assert!((packing - std::f64::consts::PI * 0.04).abs() < 1e-12);
        assert_eq!(packing_fraction(0, 2.0, field), 0.0);
    }

    #[test]
    fn test_sweep_stops_before_close_packing() {
        let rows = sweep(&small_config()).unwrap();
        // 60 x 40 field, r = 2: about 173 disks reach close packing
        let counts: Vec<u32> = rows.iter().map(|r| r.balls).collect();
        assert_eq!(counts, vec![0, 60, 120]);
        assert!(rows.iter().all(|r| r.packing_fraction <= CLOSE_PACKING));
        assert!(rows.iter().all(|r| r.contact_rates.len() == 2));
        assert_eq!(rows[0].contact_rates, vec![0.0, 0.0]);
    }

    #[test]
    fn test_faster_balls_meet_more_often() {
        let config = small_config();
        let slow = measure_contact_rate(&config, 40, 2.0, 11).unwrap();
        let fast = measure_contact_rate(&config, 40, 40.0, 11).unwrap();
        assert!(fast > slow, "fast {fast} <= slow {slow}");
    }

    #[test]
    fn test_single_ball_never_collides() {
        let rate = measure_contact_rate(&small_config(), 1, 30.0, 3).unwrap();
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let config = CalibrationConfig {
            speeds: vec![10.0],
            measure_ticks: 120,
            ..small_config()
        };
        assert_eq!(sweep(&config).unwrap(), sweep(&config).unwrap());
    }

    #[test]
    fn test_zero_step_rejected() {
        let config = CalibrationConfig {
            ball_step: 0,
            ..small_config()
        };
        assert!(matches!(sweep(&config), Err(SimError::InvalidParameter(_))));
    }
}
