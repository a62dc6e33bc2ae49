//! Simulation state and entity types
//!
//! Everything that must be saved to resume a run exactly lives here. The
//! scene owns its entities by value; nothing holds a reference back to it.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::epidemic::{Census, SpreadHistory};
use super::{Segment, Wall};
use crate::consts::*;
use crate::error::{Result, SimError};
use crate::settings::Parameters;

/// Disease state of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Susceptible,
    /// Infected since the given tick
    Infected { since_tick: u64 },
    Recovered,
}

/// A moving disk; one person in the epidemic
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub mass: f64,
    pub health: Health,
    /// Secondary infections caused by this ball
    pub reproduction_count: u32,
    /// UI highlight only
    pub selected: bool,
}

impl Ball {
    pub fn new(pos: DVec2, vel: DVec2, radius: f64) -> Self {
        Self {
            pos,
            vel,
            radius,
            mass: BALL_MASS,
            health: Health::Susceptible,
            reproduction_count: 0,
            selected: false,
        }
    }

    pub fn is_susceptible(&self) -> bool {
        self.health == Health::Susceptible
    }

    pub fn is_infected(&self) -> bool {
        matches!(self.health, Health::Infected { .. })
    }

    pub fn is_recovered(&self) -> bool {
        self.health == Health::Recovered
    }

    /// Tick at which the current infection began
    pub fn infected_at(&self) -> Option<u64> {
        match self.health {
            Health::Infected { since_tick } => Some(since_tick),
            _ => None,
        }
    }

    pub fn infect(&mut self, tick: u64) {
        self.health = Health::Infected { since_tick: tick };
    }

    pub fn recover(&mut self) {
        self.health = Health::Recovered;
    }

    /// Advance position by one step, then check whether the infection has
    /// run its course. Duration is measured in ticks × dt so the outcome
    /// does not depend on real frame timing.
    ///
    /// Returns true if the ball recovered on this step.
    pub fn integrate(&mut self, dt: f64, tick: u64, infectious_seconds: f64) -> bool {
        self.pos += self.vel * dt;

        if let Health::Infected { since_tick } = self.health {
            let elapsed = tick.saturating_sub(since_tick) as f64 * dt;
            if elapsed >= infectious_seconds {
                self.recover();
                return true;
            }
        }
        false
    }

    /// Rescale velocity to `speed`, keeping the heading
    pub fn set_speed(&mut self, speed: f64) {
        let current = self.vel.length();
        if current > 0.0 {
            self.vel *= speed / current;
        }
    }

    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        self.pos.distance_squared(point) <= self.radius * self.radius
    }

    pub fn momentum(&self) -> DVec2 {
        self.vel * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.vel.length_squared()
    }
}

/// Closed set of scene entity kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Ball(Ball),
    Line(Segment),
    Wall(Wall),
}

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Ball(_) => "ball",
            Entity::Line(_) => "line",
            Entity::Wall(_) => "wall",
        }
    }

    pub fn as_ball(&self) -> Option<&Ball> {
        match self {
            Entity::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_ball_mut(&mut self) -> Option<&mut Ball> {
        match self {
            Entity::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Entity::Wall(wall) => Some(wall),
            _ => None,
        }
    }

    pub fn as_wall_mut(&mut self) -> Option<&mut Wall> {
        match self {
            Entity::Wall(wall) => Some(wall),
            _ => None,
        }
    }
}

/// Play-field extents; the origin is the field centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half_extents(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Left, right, top and bottom borders, in that order
    pub fn borders(&self) -> [Segment; 4] {
        let h = self.half_extents();
        [
            Segment::hidden(DVec2::new(-h.x, -h.y), DVec2::new(-h.x, h.y)),
            Segment::hidden(DVec2::new(h.x, -h.y), DVec2::new(h.x, h.y)),
            Segment::hidden(DVec2::new(-h.x, h.y), DVec2::new(h.x, h.y)),
            Segment::hidden(DVec2::new(-h.x, -h.y), DVec2::new(h.x, -h.y)),
        ]
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

/// Number of border segments at the front of every scene
pub const BORDER_COUNT: usize = 4;

/// Complete simulation state (deterministic, serializable via snapshots)
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub field: Field,
    /// Simulation tick counter
    pub tick: u64,
    /// Ball-ball contacts counted after warm-up
    pub collisions: u64,
    /// Run-length-encoded census time series
    pub history: SpreadHistory,
    /// Borders first, then everything else in insertion order
    pub entities: Vec<Entity>,
    pub rng: Pcg32,
}

impl SimState {
    /// Create an empty scene holding only the field borders
    pub fn new(field: Field, seed: u64) -> Self {
        Self {
            field,
            tick: 0,
            collisions: 0,
            history: SpreadHistory::default(),
            entities: field.borders().into_iter().map(Entity::Line).collect(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Drop everything but the borders and zero all counters.
    /// The random stream carries on.
    pub fn clear(&mut self) {
        self.tick = 0;
        self.collisions = 0;
        self.history.clear();
        self.entities.truncate(BORDER_COUNT);
        self.rebind_borders();
    }

    /// Re-derive the border segments from the field size
    pub fn rebind_borders(&mut self) {
        for (entity, border) in self.entities.iter_mut().zip(self.field.borders()) {
            if let Entity::Line(segment) = entity {
                segment.set(border.p1, border.p2);
            }
        }
    }

    /// Change the field size: walls are stretched to the new height, then
    /// stray balls are pulled back inside and out of any wall
    pub fn resize(&mut self, field: Field) {
        self.field = field;
        self.rebind_borders();
        for wall in self.entities.iter_mut().filter_map(Entity::as_wall_mut) {
            wall.set_height(field.height);
        }

        let h = field.half_extents();
        for ball in self.balls_mut() {
            if ball.pos.x < -h.x {
                ball.pos.x = -h.x + CORRECTION_EPSILON;
            } else if ball.pos.x > h.x {
                ball.pos.x = h.x - CORRECTION_EPSILON;
            }
            if ball.pos.y < -h.y {
                ball.pos.y = -h.y + CORRECTION_EPSILON;
            } else if ball.pos.y > h.y {
                ball.pos.y = h.y - CORRECTION_EPSILON;
            }
        }

        let walls: Vec<Wall> = self.walls().cloned().collect();
        for ball in self.balls_mut() {
            for wall in &walls {
                wall.push_out(ball);
            }
        }
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.entities.iter().filter_map(Entity::as_ball)
    }

    pub fn balls_mut(&mut self) -> impl Iterator<Item = &mut Ball> {
        self.entities.iter_mut().filter_map(Entity::as_ball_mut)
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.entities.iter().filter_map(Entity::as_wall)
    }

    pub fn ball_count(&self) -> usize {
        self.balls().count()
    }

    /// Count balls in each disease state
    pub fn census(&self) -> Census {
        Census::of(self.balls())
    }

    pub fn entity(&self, index: usize) -> Result<&Entity> {
        self.entities
            .get(index)
            .ok_or(SimError::UnknownEntity(index))
    }

    pub fn ball_mut(&mut self, index: usize) -> Result<&mut Ball> {
        self.entities
            .get_mut(index)
            .ok_or(SimError::UnknownEntity(index))?
            .as_ball_mut()
            .ok_or(SimError::WrongEntityKind {
                index,
                expected: "ball",
            })
    }

    pub fn wall_mut(&mut self, index: usize) -> Result<&mut Wall> {
        self.entities
            .get_mut(index)
            .ok_or(SimError::UnknownEntity(index))?
            .as_wall_mut()
            .ok_or(SimError::WrongEntityKind {
                index,
                expected: "wall",
            })
    }

    /// A spawn point is good unless it lies inside some wall
    pub fn is_good_spawn(&self, point: DVec2) -> bool {
        !self.walls().any(|wall| wall.bounds_contain(point))
    }

    /// Place one susceptible ball at a random free spot with a random heading
    pub fn spawn_ball(&mut self, params: &Parameters) -> Result<usize> {
        let r = params.ball_radius;
        let h = self.field.half_extents();
        if h.x <= r || h.y <= r {
            return Err(SimError::CannotPlaceBall { attempts: 0 });
        }

        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let pos = DVec2::new(
                self.rng.random_range(-h.x + r..h.x - r),
                self.rng.random_range(-h.y + r..h.y - r),
            );
            if !self.is_good_spawn(pos) {
                continue;
            }
            let theta = self.rng.random_range(0.0..std::f64::consts::TAU);
            let vel = DVec2::from_angle(theta) * params.ball_speed;

            self.entities.push(Entity::Ball(Ball::new(pos, vel, r)));
            return Ok(self.entities.len() - 1);
        }

        Err(SimError::CannotPlaceBall {
            attempts: MAX_SPAWN_ATTEMPTS,
        })
    }

    /// Push balls out of the solid part of the wall at `index`.
    /// Runs over the whole scene; returns how many balls were moved.
    pub fn resolve_wall(&mut self, index: usize) -> Result<usize> {
        let wall = match self.entity(index)? {
            Entity::Wall(wall) => wall.clone(),
            _ => {
                return Err(SimError::WrongEntityKind {
                    index,
                    expected: "wall",
                });
            }
        };
        let moved = self
            .balls_mut()
            .map(|ball| wall.push_out(ball))
            .filter(|moved| *moved)
            .count();
        if moved > 0 {
            log::debug!("Wall {} pushed {} balls out of its jambs", index, moved);
        }
        Ok(moved)
    }
}
