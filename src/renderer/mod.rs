//! Rendering seam
//!
//! The core does not draw anything itself. A host implements
//! [`SceneRenderer`] (canvas, terminal, GPU, ...) and [`draw_scene`] hands it
//! every visible entity once per frame, in scene order.

use crate::sim::{Ball, Entity, Segment, SimState, Wall};

/// Per-entity draw callbacks
pub trait SceneRenderer {
    /// Called for every ball; colour by `ball.health`
    fn draw_ball(&mut self, ball: &Ball);

    /// Called for every visible segment (borders are hidden)
    fn draw_segment(&mut self, segment: &Segment);

    /// Walls default to their six edges
    fn draw_wall(&mut self, wall: &Wall) {
        for edge in wall.edges() {
            self.draw_segment(edge);
        }
    }
}

/// Draw a whole scene, skipping invisible segments
pub fn draw_scene<R: SceneRenderer + ?Sized>(state: &SimState, renderer: &mut R) {
    for entity in &state.entities {
        match entity {
            Entity::Ball(ball) => renderer.draw_ball(ball),
            Entity::Line(segment) if segment.visible => renderer.draw_segment(segment),
            Entity::Line(_) => {}
            Entity::Wall(wall) => renderer.draw_wall(wall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Field;
    use glam::DVec2;

    #[derive(Default)]
    struct Recorder {
        balls: usize,
        segments: Vec<Segment>,
    }

    impl SceneRenderer for Recorder {
        fn draw_ball(&mut self, _ball: &Ball) {
            self.balls += 1;
        }

        fn draw_segment(&mut self, segment: &Segment) {
            self.segments.push(segment.clone());
        }
    }

    #[test]
    fn test_borders_are_not_drawn() {
        let state = SimState::new(Field::default(), 1);
        let mut recorder = Recorder::default();
        draw_scene(&state, &mut recorder);
        assert_eq!(recorder.balls, 0);
        assert!(recorder.segments.is_empty());
    }

    #[test]
    fn test_scene_order_and_wall_edges() {
        let mut state = SimState::new(Field::default(), 1);
        let line = Segment::new(DVec2::new(-10.0, 0.0), DVec2::new(10.0, 0.0));
        state.entities.push(Entity::Line(line.clone()));
        state
            .entities
            .push(Entity::Ball(Ball::new(DVec2::ZERO, DVec2::ZERO, 2.0)));
        state
            .entities
            .push(Entity::Wall(Wall::new(DVec2::new(40.0, 0.0), 140.0, 10.0)));

        let mut recorder = Recorder::default();
        draw_scene(&state, &mut recorder);
        assert_eq!(recorder.balls, 1);
        assert_eq!(recorder.segments.len(), 7);
        assert_eq!(recorder.segments[0], line);
    }
}
