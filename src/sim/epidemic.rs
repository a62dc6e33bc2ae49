//! Epidemic census, spread history and reproduction-number estimates
//!
//! The history is run-length encoded: one record per distinct (S, I, R)
//! census, whose `run_length` grows while the census stays the same. The
//! run lengths always add up to the tick counter.

use serde::{Deserialize, Serialize};

use super::state::{Ball, Health};
use crate::consts::WARMUP_TICKS;

/// Ball counts per disease state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Census {
    pub susceptible: u32,
    pub infected: u32,
    pub recovered: u32,
}

impl Census {
    pub fn of<'a>(balls: impl IntoIterator<Item = &'a Ball>) -> Self {
        let mut census = Census::default();
        for ball in balls {
            match ball.health {
                Health::Susceptible => census.susceptible += 1,
                Health::Infected { .. } => census.infected += 1,
                Health::Recovered => census.recovered += 1,
            }
        }
        census
    }

    pub fn total(&self) -> u32 {
        self.susceptible + self.infected + self.recovered
    }

    /// Infected plus recovered: everyone the disease has reached so far
    pub fn ever_infected(&self) -> u32 {
        self.infected + self.recovered
    }
}

/// One run of identical census ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadRecord {
    pub run_length: u64,
    pub infected: u32,
    pub susceptible: u32,
    pub recovered: u32,
    /// R0 estimate when the run started
    pub r0: f64,
    /// Re estimate when the run started
    pub re: f64,
}

impl SpreadRecord {
    pub fn census(&self) -> Census {
        Census {
            susceptible: self.susceptible,
            infected: self.infected,
            recovered: self.recovered,
        }
    }
}

/// Run-length-encoded census time series
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpreadHistory {
    records: Vec<SpreadRecord>,
}

impl SpreadHistory {
    pub fn from_records(records: Vec<SpreadRecord>) -> Self {
        Self { records }
    }

    /// Record one tick's census. Extends the latest run if the census is
    /// unchanged; otherwise starts a new run, asking `estimates` for the
    /// (R0, Re) pair computed against the history so far.
    ///
    /// Returns true if a new run was started.
    pub fn record<F>(&mut self, census: Census, estimates: F) -> bool
    where
        F: FnOnce(&SpreadHistory) -> (f64, f64),
    {
        if let Some(last) = self.records.last_mut() {
            if last.census() == census {
                last.run_length += 1;
                return false;
            }
        }

        let (r0, re) = estimates(self);
        self.records.push(SpreadRecord {
            run_length: 1,
            infected: census.infected,
            susceptible: census.susceptible,
            recovered: census.recovered,
            r0: finite_or_zero(r0),
            re: finite_or_zero(re),
        });
        true
    }

    pub fn records(&self) -> &[SpreadRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&SpreadRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Sum of all run lengths; equals the tick counter
    pub fn total_ticks(&self) -> u64 {
        self.records.iter().map(|r| r.run_length).sum()
    }

    /// How long the census has been unchanged
    pub fn steady_ticks(&self) -> u64 {
        self.records.last().map(|r| r.run_length).unwrap_or(0)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Basic reproduction number from measured contact frequency:
/// transmission probability × contacts per ball per second × infectious
/// seconds. Contacts are only counted after the warm-up, and each counted
/// collision involves two balls.
///
/// Returns 0 with no balls or before any post-warm-up time has elapsed.
pub fn estimate_r0(
    transmission_rate: f64,
    infectious_seconds: f64,
    collisions: u64,
    balls: usize,
    tick: u64,
    dt: f64,
) -> f64 {
    if tick <= WARMUP_TICKS {
        return 0.0;
    }
    let elapsed = (tick - WARMUP_TICKS) as f64 * dt;
    let rate = contact_rate(collisions, balls, elapsed);
    finite_or_zero(transmission_rate * infectious_seconds * rate)
}

/// Contacts per ball per second. Each counted collision touches two balls.
///
/// Returns 0 with no balls or no elapsed time.
pub fn contact_rate(collisions: u64, balls: usize, elapsed_seconds: f64) -> f64 {
    if balls == 0 || elapsed_seconds <= 0.0 {
        return 0.0;
    }
    finite_or_zero(2.0 * collisions as f64 / balls as f64 / elapsed_seconds)
}

/// Effective reproduction number over a trailing window.
///
/// New cases per second (growth of infected + recovered across the last
/// `window_ticks`) times the infectious duration, divided by the number of
/// currently infected balls. Diagnostic only.
///
/// Returns 0 until the history covers the window, or when nobody is
/// infected.
pub fn estimate_re(
    history: &SpreadHistory,
    current: Census,
    infectious_seconds: f64,
    dt: f64,
    window_ticks: u64,
) -> f64 {
    if current.infected == 0 || window_ticks == 0 {
        return 0.0;
    }

    let mut ticks = 0;
    let mut base = None;
    for record in history.records().iter().rev() {
        ticks += record.run_length;
        if ticks >= window_ticks {
            base = Some(record);
            break;
        }
    }
    let Some(base) = base else {
        return 0.0;
    };

    let new_cases = current.ever_infected() as f64 - base.census().ever_infected() as f64;
    let cases_per_second = new_cases / (ticks as f64 * dt);
    finite_or_zero(cases_per_second * infectious_seconds / current.infected as f64)
}
