//! Simulation driver
//!
//! Wraps the deterministic [`SimState`] with everything a host needs:
//! run/stop control, a fixed-step clock that turns wall-clock time into
//! ticks, auto-pause when the epidemic burns out, and the user intents
//! (add balls, infect, draw obstacles, move walls, ...).

use std::ops::Range;

use glam::DVec2;

use crate::consts::SIM_DT;
use crate::error::{Result, SimError, ensure_finite};
use crate::renderer::{SceneRenderer, draw_scene};
use crate::settings::Parameters;
use crate::sim::{
    Ball, Census, Entity, Field, Segment, SimState, SpreadHistory, TickReport, Wall, estimate_r0,
    tick,
};

/// Whether the clock is advancing the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Stopped,
    Running,
}

/// Converts elapsed real time into whole fixed timesteps.
///
/// Pending time is kept in tick units so that exact multiples of the step
/// produce exact tick counts.
#[derive(Debug, Clone, Default)]
struct FixedStep {
    pending: f64,
}

impl FixedStep {
    fn restart(&mut self) {
        self.pending = 0.0;
    }

    fn accumulate(&mut self, elapsed: f64, dt: f64) {
        self.pending += elapsed / dt;
    }

    /// Consume one tick if one is due
    fn take(&mut self) -> bool {
        if self.pending >= 1.0 {
            self.pending -= 1.0;
            true
        } else {
            false
        }
    }
}

/// A complete simulation instance
#[derive(Debug, Clone)]
pub struct Simulation {
    state: SimState,
    params: Parameters,
    phase: RunPhase,
    /// Keep running even though the auto-pause condition holds
    force_run: bool,
    clock: FixedStep,
}

impl Simulation {
    /// Create a simulation and populate it with `target_ball_count` balls
    pub fn new(params: Parameters, seed: u64) -> Result<Self> {
        params.validate()?;
        let field = Field::new(params.field_width, params.field_height);
        let mut sim = Self::from_state(SimState::new(field, seed), params);
        if sim.params.target_ball_count > 0 {
            sim.add_balls(sim.params.target_ball_count)?;
        }
        log::info!(
            "Simulation created with seed {} ({} balls)",
            seed,
            sim.state.ball_count()
        );
        Ok(sim)
    }

    /// Wrap existing state (stopped)
    pub(crate) fn from_state(state: SimState, params: Parameters) -> Self {
        Self {
            state,
            params,
            phase: RunPhase::Stopped,
            force_run: false,
            clock: FixedStep::default(),
        }
    }

    // === Run control ===

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn force_run(&self) -> bool {
        self.force_run
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.phase = RunPhase::Running;
        self.clock.restart();

        // Restarting a burnt-out epidemic must not be paused again straight away
        if !self.force_run && self.auto_pause_due() {
            self.force_run = true;
        }
        log::info!("Simulation started at tick {}", self.state.tick);
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.phase = RunPhase::Stopped;
        log::info!("Simulation stopped at tick {}", self.state.tick);
    }

    pub fn toggle(&mut self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Nobody in the scene is infected and the census has been flat for the
    /// configured delay
    fn auto_pause_due(&self) -> bool {
        if self.state.census().infected > 0 {
            return false;
        }
        self.state
            .history
            .last()
            .is_some_and(|last| last.run_length as f64 * SIM_DT >= self.params.auto_pause_delay)
    }

    /// Feed elapsed real time (seconds) from the host's frame callback and
    /// run every tick that has become due. Catches up fully rather than
    /// skipping frames. Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        if !self.is_running() || !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.clock.accumulate(elapsed, SIM_DT);

        let mut ticks = 0;
        while self.clock.take() {
            let report = self.step();
            ticks += 1;

            // A fresh outbreak ends the override; its burn-out pauses again
            if report.census.infected > 0 {
                self.force_run = false;
            }

            if !self.force_run && self.auto_pause_due() {
                log::info!(
                    "Epidemic burned out at tick {}; auto-pausing",
                    self.state.tick
                );
                self.stop();
                break;
            }
        }
        ticks
    }

    /// Run exactly one tick, regardless of the run phase
    pub fn step(&mut self) -> TickReport {
        tick(&mut self.state, &self.params, SIM_DT)
    }

    /// Clear the scene back to its borders and zero all counters
    pub fn reset(&mut self) {
        self.phase = RunPhase::Stopped;
        self.force_run = false;
        self.clock.restart();
        self.state.clear();
        log::info!("Simulation reset");
    }

    // === User intents ===

    /// Spawn `count` new susceptible balls. All-or-nothing: if any ball
    /// cannot be placed the scene is left unchanged.
    pub fn add_balls(&mut self, count: u32) -> Result<Range<usize>> {
        if count == 0 {
            return Err(SimError::InvalidParameter(
                "ball count must be positive".to_string(),
            ));
        }
        let start = self.state.entities.len();
        let rng = self.state.rng.clone();
        for _ in 0..count {
            if let Err(err) = self.state.spawn_ball(&self.params) {
                self.state.entities.truncate(start);
                self.state.rng = rng;
                log::warn!("Could not add {} balls: {}", count, err);
                return Err(err);
            }
        }
        log::debug!("Added {} balls", count);
        Ok(start..self.state.entities.len())
    }

    /// Infect a ball at the current tick (also how an outbreak is seeded).
    ///
    /// This is a user override, not disease progression: it may move a
    /// Recovered ball back to Infected. An already infected ball keeps its
    /// original infection tick.
    pub fn infect(&mut self, index: usize) -> Result<()> {
        let tick = self.state.tick;
        let ball = self.state.ball_mut(index)?;
        if !ball.is_infected() {
            ball.infect(tick);
            log::debug!("Ball {} infected by user at tick {}", index, tick);
        }
        Ok(())
    }

    /// Move a ball straight to Recovered
    pub fn cure(&mut self, index: usize) -> Result<()> {
        let ball = self.state.ball_mut(index)?;
        ball.recover();
        log::debug!("Ball {} cured by user", index);
        Ok(())
    }

    /// Add a visible segment obstacle between two points
    pub fn place_segment(&mut self, p1: DVec2, p2: DVec2) -> Result<usize> {
        for v in [p1.x, p1.y, p2.x, p2.y] {
            ensure_finite(v, "segment endpoint")?;
        }
        self.state
            .entities
            .push(Entity::Line(Segment::new(p1, p2)));
        Ok(self.state.entities.len() - 1)
    }

    /// Add a full-height wall centred at `x`, using the configured opening,
    /// and push out any ball caught inside it
    pub fn place_wall(&mut self, x: f64) -> Result<usize> {
        ensure_finite(x, "wall x")?;
        let wall = Wall::new(
            DVec2::new(x, 0.0),
            self.state.field.height,
            self.params.wall_opening,
        );
        self.state.entities.push(Entity::Wall(wall));
        let index = self.state.entities.len() - 1;
        self.state.resolve_wall(index)?;
        log::debug!("Wall {} placed at x = {}", index, x);
        Ok(index)
    }

    pub fn move_wall(&mut self, index: usize, x: f64) -> Result<()> {
        ensure_finite(x, "wall x")?;
        self.state.wall_mut(index)?.set_x(x);
        self.state.resolve_wall(index)?;
        Ok(())
    }

    /// Set one wall's opening (clamped), then push out caught balls
    pub fn set_wall_opening(&mut self, index: usize, opening: f64) -> Result<()> {
        ensure_finite(opening, "wall opening")?;
        self.state.wall_mut(index)?.set_opening(opening);
        self.state.resolve_wall(index)?;
        Ok(())
    }

    /// Nudge one wall's opening (scroll-wheel style)
    pub fn adjust_wall_opening(&mut self, index: usize, delta: f64) -> Result<()> {
        ensure_finite(delta, "wall opening delta")?;
        let current = self.state.wall_mut(index)?.opening();
        self.set_wall_opening(index, current + delta)
    }

    /// Resize the play field: borders follow, balls are pulled back inside
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        let params = Parameters {
            field_width: width,
            field_height: height,
            ..self.params.clone()
        };
        params.validate()?;
        self.params = params;
        self.state.resize(Field::new(width, height));
        Ok(())
    }

    /// Apply a new parameter set. Only changed values take effect, so
    /// applying the same parameters twice is a no-op.
    pub fn apply_parameters(&mut self, params: Parameters) -> Result<()> {
        params.validate()?;
        let old = std::mem::replace(&mut self.params, params);
        let new = &self.params;

        if new.ball_radius != old.ball_radius {
            for ball in self.state.balls_mut() {
                ball.radius = new.ball_radius;
            }
        }
        if new.ball_speed != old.ball_speed {
            for ball in self.state.balls_mut() {
                ball.set_speed(new.ball_speed);
            }
        }
        if new.field_width != old.field_width || new.field_height != old.field_height {
            self.state
                .resize(Field::new(new.field_width, new.field_height));
        }
        if new.wall_opening != old.wall_opening {
            let opening = new.wall_opening;
            let walls: Vec<usize> = self
                .state
                .entities
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.as_wall().map(|_| i))
                .collect();
            for index in walls {
                self.state.wall_mut(index)?.set_opening(opening);
                self.state.resolve_wall(index)?;
            }
        }
        log::debug!("Parameters applied: {:?}", self.params);
        Ok(())
    }

    /// Topmost ball or wall under a point
    pub fn pick(&self, point: DVec2) -> Option<usize> {
        self.state
            .entities
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entity)| match entity {
                Entity::Ball(ball) => ball.contains(point),
                Entity::Wall(wall) => wall.bounds_contain(point),
                Entity::Line(_) => false,
            })
            .map(|(i, _)| i)
    }

    /// Move the UI selection highlight to whatever is under `point`
    pub fn hover(&mut self, point: DVec2) -> Option<usize> {
        let picked = self.pick(point);
        for (i, entity) in self.state.entities.iter_mut().enumerate() {
            let selected = Some(i) == picked;
            match entity {
                Entity::Ball(ball) => ball.selected = selected,
                Entity::Wall(wall) => wall.selected = selected,
                Entity::Line(_) => {}
            }
        }
        picked
    }

    // === Queries ===

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn entities(&self) -> &[Entity] {
        &self.state.entities
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.state.balls()
    }

    pub fn current_tick(&self) -> u64 {
        self.state.tick
    }

    pub fn collisions(&self) -> u64 {
        self.state.collisions
    }

    pub fn census(&self) -> Census {
        self.state.census()
    }

    pub fn history(&self) -> &SpreadHistory {
        &self.state.history
    }

    /// Live R0 estimate from the current counters
    pub fn r0(&self) -> f64 {
        estimate_r0(
            self.params.transmission_rate,
            self.params.infectious_seconds,
            self.state.collisions,
            self.state.ball_count(),
            self.state.tick,
            SIM_DT,
        )
    }

    /// Re stored with the latest census change
    pub fn re(&self) -> f64 {
        self.state.history.last().map(|r| r.re).unwrap_or(0.0)
    }

    /// Hand every entity to a renderer
    pub fn draw<R: SceneRenderer>(&self, renderer: &mut R) {
        draw_scene(&self.state, renderer);
    }
}
