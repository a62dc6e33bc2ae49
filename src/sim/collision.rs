//! Collision detection and response
//!
//! Three pair kinds matter: ball-ball (elastic exchange plus infection),
//! ball-segment and ball-wall (reflection off static geometry). Obstacles
//! never collide with each other.

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Ball, Entity, Health};
use super::{Segment, Wall};
use crate::consts::WARMUP_TICKS;
use crate::rotate;

/// Mutable simulation context handed to pair resolution
pub struct ContactContext<'a> {
    pub tick: u64,
    pub transmission_rate: f64,
    pub rng: &'a mut Pcg32,
    /// Post-warm-up ball-ball contact counter
    pub collisions: &'a mut u64,
}

/// What happened between two balls on one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BallContact {
    /// The disks overlap
    pub touching: bool,
    /// Velocities were exchanged (they were approaching)
    pub bounced: bool,
    /// 0 or 1: roles are exclusive within a pair
    pub infections: u32,
}

/// Dispatch on the pair of entity kinds
pub fn resolve_pair(a: &mut Entity, b: &mut Entity, ctx: &mut ContactContext) -> BallContact {
    match (a, b) {
        (Entity::Ball(a), Entity::Ball(b)) => ball_ball(a, b, ctx),
        (Entity::Ball(ball), Entity::Line(segment)) | (Entity::Line(segment), Entity::Ball(ball)) => {
            ball_segment(ball, segment);
            BallContact::default()
        }
        (Entity::Ball(ball), Entity::Wall(wall)) | (Entity::Wall(wall), Entity::Ball(ball)) => {
            ball_wall(ball, wall);
            BallContact::default()
        }
        _ => BallContact::default(),
    }
}

/// Ball-ball contact: elastic response if approaching, then contact
/// counting and infection for any overlap.
pub fn ball_ball(a: &mut Ball, b: &mut Ball, ctx: &mut ContactContext) -> BallContact {
    let delta = b.pos - a.pos;
    let reach = a.radius + b.radius;
    if delta.length_squared() > reach * reach {
        return BallContact::default();
    }

    let bounced = elastic_response(a, b);

    // One count per pair; consumers double it
    if ctx.tick >= WARMUP_TICKS {
        *ctx.collisions += 1;
    }

    let infections = transmit(a, b, ctx);
    BallContact {
        touching: true,
        bounced,
        infections,
    }
}

/// Exchange momentum along the line of centres if the balls approach each
/// other. Overlapping balls that are already separating are left alone so
/// they don't stick together.
///
/// Returns true if velocities changed.
pub fn elastic_response(a: &mut Ball, b: &mut Ball) -> bool {
    let delta = b.pos - a.pos;
    let closing = (a.vel - b.vel).dot(delta);
    if closing < 0.0 {
        return false;
    }

    // Rotate so the line of centres is the x-axis
    let theta = -delta.y.atan2(delta.x);
    let (m1, m2) = (a.mass, b.mass);
    let total = m1 + m2;

    let u1 = rotate(a.vel, theta);
    let u2 = rotate(b.vel, theta);

    // 1D elastic collision on the x component; y is tangential and kept
    let v1 = DVec2::new(u1.x * (m1 - m2) / total + u2.x * 2.0 * m2 / total, u1.y);
    let v2 = DVec2::new(u2.x * (m2 - m1) / total + u1.x * 2.0 * m1 / total, u2.y);

    a.vel = rotate(v1, -theta);
    b.vel = rotate(v2, -theta);
    true
}

/// Evaluate transmission in both directions from the pre-contact states
fn transmit(a: &mut Ball, b: &mut Ball, ctx: &mut ContactContext) -> u32 {
    let (before_a, before_b) = (a.health, b.health);
    let mut infections = 0;

    if infects(before_a, before_b, ctx) {
        b.infect(ctx.tick);
        a.reproduction_count += 1;
        infections += 1;
    }
    if infects(before_b, before_a, ctx) {
        a.infect(ctx.tick);
        b.reproduction_count += 1;
        infections += 1;
    }
    infections
}

fn infects(infector: Health, candidate: Health, ctx: &mut ContactContext) -> bool {
    matches!(infector, Health::Infected { .. })
        && candidate == Health::Susceptible
        && ctx.transmission_rate > 0.0
        && ctx.rng.random::<f64>() <= ctx.transmission_rate
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, for unit `normal`
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2) -> DVec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Bounce a ball off a contact point, using the direction from the contact
/// to the ball centre as the normal. Only applies while the ball is moving
/// into the surface.
///
/// Returns true if the velocity was reflected.
pub fn reflect_from_point(ball: &mut Ball, contact: DVec2) -> bool {
    let offset = ball.pos - contact;
    if offset.dot(ball.vel) > 0.0 {
        return false;
    }
    let Some(normal) = offset.try_normalize() else {
        // Centre exactly on the surface: no usable normal
        return false;
    };
    ball.vel = reflect_velocity(ball.vel, normal);
    true
}

/// Side contact with a segment.
///
/// Returns true if the ball touches the segment's side, whether or not the
/// velocity needed reflecting.
pub fn segment_side_collision(ball: &mut Ball, segment: &Segment) -> bool {
    match segment.side_contact(ball.pos, ball.radius) {
        Some(contact) => {
            reflect_from_point(ball, contact);
            true
        }
        None => false,
    }
}

/// Each endpoint of a segment acts as a point obstacle
pub fn segment_endpoint_collision(ball: &mut Ball, segment: &Segment) {
    for endpoint in segment.endpoint_contacts(ball.pos, ball.radius) {
        reflect_from_point(ball, endpoint);
    }
}

/// Ball against a standalone segment: side first, endpoints otherwise
pub fn ball_segment(ball: &mut Ball, segment: &Segment) {
    if !segment_side_collision(ball, segment) {
        segment_endpoint_collision(ball, segment);
    }
}

/// Ball against a wall: every edge's side is tested; endpoints only run if
/// no side was touched.
pub fn ball_wall(ball: &mut Ball, wall: &Wall) {
    let mut touched = false;
    for edge in wall.edges() {
        touched |= segment_side_collision(ball, edge);
    }
    if !touched {
        for edge in wall.edges() {
            segment_endpoint_collision(ball, edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BALL_MASS;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn ball(x: f64, y: f64, vx: f64, vy: f64) -> Ball {
        Ball::new(DVec2::new(x, y), DVec2::new(vx, vy), 1.0)
    }

    fn context<'a>(rng: &'a mut Pcg32, collisions: &'a mut u64, tick: u64, rate: f64) -> ContactContext<'a> {
        ContactContext {
            tick,
            transmission_rate: rate,
            rng,
            collisions,
        }
    }

    #[test]
    fn test_head_on_equal_mass_swaps_velocities() {
        let mut a = ball(-0.9, 0.0, 5.0, 0.0);
        let mut b = ball(0.9, 0.0, -5.0, 0.0);
        assert!(elastic_response(&mut a, &mut b));
        assert_eq!(a.vel, DVec2::new(-5.0, 0.0));
        assert_eq!(b.vel, DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_separating_overlap_left_alone() {
        let mut a = ball(-0.5, 0.0, -3.0, 1.0);
        let mut b = ball(0.5, 0.0, 3.0, -1.0);
        assert!(!elastic_response(&mut a, &mut b));
        assert_eq!(a.vel, DVec2::new(-3.0, 1.0));
        assert_eq!(b.vel, DVec2::new(3.0, -1.0));
    }

    #[test]
    fn test_unequal_masses() {
        // Heavy ball hits a light ball at rest: light one leaves faster
        let mut heavy = ball(0.0, 0.0, 2.0, 0.0);
        heavy.mass = 3.0 * BALL_MASS;
        let mut light = ball(1.5, 0.0, 0.0, 0.0);
        elastic_response(&mut heavy, &mut light);
        assert!((heavy.vel.x - 1.0).abs() < 1e-12);
        assert!((light.vel.x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_contact_counted_after_warmup_only() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut collisions = 0;

        let mut a = ball(0.0, 0.0, 1.0, 0.0);
        let mut b = ball(1.0, 0.0, -1.0, 0.0);
        ball_ball(&mut a, &mut b, &mut context(&mut rng, &mut collisions, WARMUP_TICKS - 1, 1.0));
        assert_eq!(collisions, 0);

        let contact = ball_ball(&mut a, &mut b, &mut context(&mut rng, &mut collisions, WARMUP_TICKS, 1.0));
        assert!(contact.touching);
        assert_eq!(collisions, 1);

        let mut far = ball(10.0, 0.0, 0.0, 0.0);
        let contact = ball_ball(&mut a, &mut far, &mut context(&mut rng, &mut collisions, 100, 1.0));
        assert!(!contact.touching);
        assert_eq!(collisions, 1);
    }

    #[test]
    fn test_infection_on_overlap_even_when_separating() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut collisions = 0;
        let mut sick = ball(-0.5, 0.0, -1.0, 0.0);
        sick.infect(3);
        let mut healthy = ball(0.5, 0.0, 1.0, 0.0);

        let contact = ball_ball(&mut sick, &mut healthy, &mut context(&mut rng, &mut collisions, 10, 1.0));
        assert!(!contact.bounced);
        assert_eq!(contact.infections, 1);
        assert_eq!(healthy.infected_at(), Some(10));
        assert_eq!(sick.infected_at(), Some(3));
        assert_eq!(sick.reproduction_count, 1);
        assert_eq!(healthy.reproduction_count, 0);
    }

    #[test]
    fn test_infection_either_direction() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut collisions = 0;
        let mut healthy = ball(-0.5, 0.0, 1.0, 0.0);
        let mut sick = ball(0.5, 0.0, -1.0, 0.0);
        sick.infect(0);

        ball_ball(&mut healthy, &mut sick, &mut context(&mut rng, &mut collisions, 5, 1.0));
        assert!(healthy.is_infected());
        assert_eq!(sick.reproduction_count, 1);
    }

    #[test]
    fn test_zero_transmission_rate_never_infects() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut collisions = 0;
        let mut sick = ball(0.0, 0.0, 0.0, 0.0);
        sick.infect(0);
        for tick in 0..1000 {
            let mut healthy = ball(0.5, 0.0, -1.0, 0.0);
            let contact = ball_ball(&mut sick, &mut healthy, &mut context(&mut rng, &mut collisions, tick, 0.0));
            assert_eq!(contact.infections, 0);
            assert!(healthy.is_susceptible());
        }
    }

    #[test]
    fn test_recovered_is_never_reinfected() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut collisions = 0;
        let mut sick = ball(0.0, 0.0, 0.0, 0.0);
        sick.infect(0);
        let mut immune = ball(0.5, 0.0, 0.0, 0.0);
        immune.recover();
        ball_ball(&mut sick, &mut immune, &mut context(&mut rng, &mut collisions, 1, 1.0));
        assert!(immune.is_recovered());
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(DVec2::new(100.0, 0.0), DVec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 1e-12);
        assert!(reflected.y.abs() < 1e-12);
    }

    #[test]
    fn test_segment_side_reflection() {
        let segment = Segment::new(DVec2::new(-10.0, 0.0), DVec2::new(10.0, 0.0));
        let mut b = ball(2.0, 0.5, 3.0, -4.0);
        ball_segment(&mut b, &segment);
        assert!((b.vel - DVec2::new(3.0, 4.0)).length() < 1e-12);

        // Already moving away: untouched
        ball_segment(&mut b, &segment);
        assert!((b.vel - DVec2::new(3.0, 4.0)).length() < 1e-12);
    }

    #[test]
    fn test_segment_endpoint_reflection() {
        let segment = Segment::new(DVec2::new(-10.0, 0.0), DVec2::new(0.0, 0.0));
        // Approaching the p2 endpoint head-on along x
        let mut b = ball(0.8, 0.0, -2.0, 0.0);
        ball_segment(&mut b, &segment);
        assert!((b.vel - DVec2::new(2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_ball_wall_blocks_jamb_but_passes_door() {
        let wall = Wall::new(DVec2::ZERO, 100.0, 10.0);

        // Hits the left face of the top jamb
        let mut blocked = ball(-2.5, 30.0, 5.0, 0.0);
        ball_wall(&mut blocked, &wall);
        assert_eq!(blocked.vel, DVec2::new(-5.0, 0.0));

        // Lines up with the door: nothing to hit
        let mut through = ball(-2.5, 0.0, 5.0, 0.0);
        ball_wall(&mut through, &wall);
        assert_eq!(through.vel, DVec2::new(5.0, 0.0));
    }

    #[test]
    fn test_ball_wall_corner() {
        let wall = Wall::new(DVec2::ZERO, 100.0, 10.0);
        // Diagonally off the bottom jamb's upper-left corner (-2, -10)
        let mut b = ball(-2.6, -9.4, 1.0, -1.0);
        ball_wall(&mut b, &wall);
        assert!((b.vel - DVec2::new(-1.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_dispatch_ignores_obstacle_pairs() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut collisions = 0;
        let mut a = Entity::Line(Segment::new(DVec2::ZERO, DVec2::X));
        let mut b = Entity::Wall(Wall::new(DVec2::ZERO, 10.0, 0.0));
        let before = (a.clone(), b.clone());
        resolve_pair(&mut a, &mut b, &mut context(&mut rng, &mut collisions, 100, 1.0));
        assert_eq!((a, b), before);
    }

    proptest! {
        #[test]
        fn prop_momentum_and_energy_conserved(
            ax in -5.0f64..5.0, ay in -5.0f64..5.0,
            avx in -20.0f64..20.0, avy in -20.0f64..20.0,
            bvx in -20.0f64..20.0, bvy in -20.0f64..20.0,
            angle in 0.0f64..std::f64::consts::TAU,
            mass_b in 1.0f64..50.0,
        ) {
            let mut a = ball(ax, ay, avx, avy);
            let mut b = ball(ax + 1.5 * angle.cos(), ay + 1.5 * angle.sin(), bvx, bvy);
            b.mass = mass_b;

            let momentum = a.momentum() + b.momentum();
            let energy = a.kinetic_energy() + b.kinetic_energy();
            elastic_response(&mut a, &mut b);

            let scale = 1.0 + momentum.length() + energy;
            prop_assert!((a.momentum() + b.momentum() - momentum).length() < 1e-9 * scale);
            prop_assert!((a.kinetic_energy() + b.kinetic_energy() - energy).abs() < 1e-9 * scale);
        }

        #[test]
        fn prop_reflection_negates_normal_component(
            vx in -20.0f64..20.0,
            vy in -20.0f64..-0.1,
            x in -5.0f64..5.0,
        ) {
            // Horizontal segment below, ball approaching from above
            let segment = Segment::new(DVec2::new(-10.0, 0.0), DVec2::new(10.0, 0.0));
            let mut b = ball(x, 0.5, vx, vy);
            ball_segment(&mut b, &segment);
            prop_assert!((b.vel.y + vy).abs() < 1e-12);
            prop_assert!((b.vel.x - vx).abs() < 1e-12);
        }
    }
}
