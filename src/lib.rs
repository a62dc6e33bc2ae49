//! Contagion - bouncing-ball SIR epidemic simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, infection, census)
//! - `simulation`: Fixed-timestep driver, run/stop state and user intents
//! - `persistence`: Versioned JSON snapshots of a run
//! - `renderer`: Per-entity draw callbacks for an external renderer
//! - `settings`: Tunable simulation parameters
//! - `calibration`: Contact-rate sweep over ball density and speed

pub mod calibration;
pub mod error;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod simulation;

pub use error::{Result, SimError};
pub use persistence::Snapshot;
pub use settings::Parameters;
pub use simulation::{RunPhase, Simulation};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;

    /// Default play-field dimensions (world units, origin at the centre)
    pub const FIELD_WIDTH: f64 = 200.0;
    pub const FIELD_HEIGHT: f64 = 140.0;

    /// Every ball has the same mass
    pub const BALL_MASS: f64 = 10.0;

    /// Walls are always this wide and span the full field height
    pub const WALL_WIDTH: f64 = 4.0;

    /// Collisions before this tick are not counted (balls may spawn overlapped)
    pub const WARMUP_TICKS: u64 = 60;
    /// Trailing window for the Re estimate
    pub const RE_WINDOW_TICKS: u64 = 120;

    /// Rejection-sampling cap when placing a new ball
    pub const MAX_SPAWN_ATTEMPTS: u32 = 1000;
    /// Inset used when pushing balls out of walls or back inside the field
    pub const CORRECTION_EPSILON: f64 = 0.01;
}

/// Rotate a vector counter-clockwise by `theta` radians
#[inline]
pub fn rotate(v: DVec2, theta: f64) -> DVec2 {
    let (sin, cos) = theta.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Inclusive range test; `a` and `b` may come in either order
#[inline]
pub fn between(v: f64, a: f64, b: f64) -> bool {
    v >= a.min(b) && v <= a.max(b)
}
