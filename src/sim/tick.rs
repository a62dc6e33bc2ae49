//! Fixed timestep simulation tick
//!
//! One tick = all-pairs collision pass, integration pass, census pass.

use super::collision::{ContactContext, resolve_pair};
use super::epidemic::{Census, estimate_r0, estimate_re};
use super::state::SimState;
use crate::consts::RE_WINDOW_TICKS;
use crate::settings::Parameters;

/// Summary of a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub census: Census,
    /// Overlapping ball pairs this tick
    pub contacts: u32,
    pub infections: u32,
    pub recoveries: u32,
    /// A new spread-history run was started
    pub census_changed: bool,
}

/// Advance the simulation state by one fixed timestep
pub fn tick(state: &mut SimState, params: &Parameters, dt: f64) -> TickReport {
    state.tick += 1;
    let mut report = TickReport::default();

    // Pair pass. O(n²) over the whole scene.
    {
        let SimState {
            entities,
            rng,
            collisions,
            tick: current,
            ..
        } = state;
        let mut ctx = ContactContext {
            tick: *current,
            transmission_rate: params.transmission_rate,
            rng,
            collisions,
        };

        for i in 0..entities.len() {
            let (head, tail) = entities.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                let contact = resolve_pair(a, b, &mut ctx);
                if contact.touching {
                    report.contacts += 1;
                }
                report.infections += contact.infections;
            }
        }
    }

    // Integration pass
    let now = state.tick;
    for ball in state.balls_mut() {
        if ball.integrate(dt, now, params.infectious_seconds) {
            report.recoveries += 1;
        }
    }

    // Census pass
    let census = state.census();
    let balls = census.total() as usize;
    let collisions = state.collisions;
    report.census = census;
    report.census_changed = state.history.record(census, |history| {
        let r0 = estimate_r0(
            params.transmission_rate,
            params.infectious_seconds,
            collisions,
            balls,
            now,
            dt,
        );
        let re = estimate_re(history, census, params.infectious_seconds, dt, RE_WINDOW_TICKS);
        (r0, re)
    });

    if report.infections > 0 || report.recoveries > 0 {
        log::debug!(
            "Tick {}: +{} infected, +{} recovered -> S{} I{} R{}",
            now,
            report.infections,
            report.recoveries,
            census.susceptible,
            census.infected,
            census.recovered
        );
    }

    report
}
