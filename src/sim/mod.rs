//! Deterministic simulation module
//!
//! All physics and epidemic logic lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (scene order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod epidemic;
pub mod segment;
pub mod state;
pub mod tick;
pub mod wall;

pub use collision::{BallContact, ContactContext, reflect_velocity, resolve_pair};
pub use epidemic::{Census, SpreadHistory, SpreadRecord, contact_rate, estimate_r0, estimate_re};
pub use segment::Segment;
pub use state::{BORDER_COUNT, Ball, Entity, Field, Health, SimState};
pub use tick::{TickReport, tick};
pub use wall::Wall;
