//! Save/load of a complete run
//!
//! A [`Snapshot`] is a versioned JSON envelope holding everything needed to
//! resume bit-exactly: field, parameters, counters, spread history, the RNG
//! stream position and every entity in scene order. Wall edges and other
//! derived data are rebuilt on import.

use glam::DVec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::settings::Parameters;
use crate::sim::{BORDER_COUNT, Ball, Entity, Field, Health, Segment, SimState, SpreadHistory, Wall};
use crate::simulation::Simulation;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized disease state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallState {
    Susceptible,
    Infected,
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallRecord {
    pub radius: f64,
    pub mass: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    pub state: BallState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infected_at_tick: Option<u64>,
    #[serde(default)]
    pub reproduction_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallRecord {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub opening: f64,
}

/// One scene entity, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityRecord {
    Ball(BallRecord),
    Line(Segment),
    Wall(WallRecord),
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        match entity {
            Entity::Ball(ball) => {
                let (state, infected_at_tick) = match ball.health {
                    Health::Susceptible => (BallState::Susceptible, None),
                    Health::Infected { since_tick } => (BallState::Infected, Some(since_tick)),
                    Health::Recovered => (BallState::Recovered, None),
                };
                EntityRecord::Ball(BallRecord {
                    radius: ball.radius,
                    mass: ball.mass,
                    position: ball.pos,
                    velocity: ball.vel,
                    state,
                    infected_at_tick,
                    reproduction_count: ball.reproduction_count,
                })
            }
            Entity::Line(segment) => EntityRecord::Line(segment.clone()),
            Entity::Wall(wall) => EntityRecord::Wall(WallRecord {
                x: wall.pos.x,
                y: wall.pos.y,
                height: wall.height,
                opening: wall.opening(),
            }),
        }
    }
}

impl EntityRecord {
    fn into_entity(self, index: usize) -> Result<Entity> {
        let entity = match self {
            EntityRecord::Ball(record) => {
                let health = match (record.state, record.infected_at_tick) {
                    (BallState::Susceptible, _) => Health::Susceptible,
                    (BallState::Infected, Some(since_tick)) => Health::Infected { since_tick },
                    (BallState::Infected, None) => {
                        return Err(SimError::InvalidSnapshot(format!(
                            "infected ball {index} has no infection tick"
                        )));
                    }
                    (BallState::Recovered, _) => Health::Recovered,
                };
                if !(record.radius > 0.0 && record.mass > 0.0) {
                    return Err(SimError::InvalidSnapshot(format!(
                        "ball {index} needs a positive radius and mass"
                    )));
                }
                let mut ball = Ball::new(record.position, record.velocity, record.radius);
                ball.mass = record.mass;
                ball.health = health;
                ball.reproduction_count = record.reproduction_count;
                Entity::Ball(ball)
            }
            EntityRecord::Line(segment) => Entity::Line(segment),
            EntityRecord::Wall(record) => Entity::Wall(Wall::new(
                DVec2::new(record.x, record.y),
                record.height,
                record.opening,
            )),
        };
        Ok(entity)
    }
}

/// Versioned save envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub field: Field,
    pub parameters: Parameters,
    pub tick: u64,
    pub collisions: u64,
    pub history: SpreadHistory,
    pub rng: Pcg32,
    pub entities: Vec<EntityRecord>,
}

impl Snapshot {
    pub fn capture(state: &SimState, params: &Parameters) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            field: state.field,
            parameters: params.clone(),
            tick: state.tick,
            collisions: state.collisions,
            history: state.history.clone(),
            rng: state.rng.clone(),
            entities: state.entities.iter().map(EntityRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SimError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Rebuild a stopped simulation from this snapshot
    pub fn restore(self) -> Result<Simulation> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SimError::UnsupportedVersion(self.version));
        }
        self.parameters.validate()?;
        if self.field.width != self.parameters.field_width
            || self.field.height != self.parameters.field_height
        {
            return Err(SimError::InvalidSnapshot(format!(
                "field {}x{} does not match parameters {}x{}",
                self.field.width,
                self.field.height,
                self.parameters.field_width,
                self.parameters.field_height
            )));
        }

        let borders = self
            .entities
            .iter()
            .take(BORDER_COUNT)
            .filter(|record| matches!(record, EntityRecord::Line(_)))
            .count();
        if borders < BORDER_COUNT {
            return Err(SimError::InvalidSnapshot(format!(
                "scene must start with {BORDER_COUNT} border lines"
            )));
        }

        let entities = self
            .entities
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_entity(index))
            .collect::<Result<Vec<_>>>()?;

        if self.history.total_ticks() != self.tick {
            log::warn!(
                "Snapshot history covers {} ticks but tick counter is {}",
                self.history.total_ticks(),
                self.tick
            );
        }

        let state = SimState {
            field: self.field,
            tick: self.tick,
            collisions: self.collisions,
            history: self.history,
            entities,
            rng: self.rng,
        };
        Ok(Simulation::from_state(state, self.parameters))
    }
}

impl Simulation {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.state(), self.params())
    }

    /// Replace the whole run with a snapshot. The result is stopped and
    /// `force_run` is cleared; on error nothing changes.
    pub fn load(&mut self, snapshot: Snapshot) -> Result<()> {
        *self = snapshot.restore()?;
        log::info!(
            "Loaded snapshot at tick {} ({} entities)",
            self.current_tick(),
            self.entities().len()
        );
        Ok(())
    }
}
