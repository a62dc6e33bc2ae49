//! Walls with an adjustable door
//!
//! A wall is a vertical bar `WALL_WIDTH` wide spanning the field height,
//! built from two "C"-shaped jambs of three segments each. The door is the
//! gap between the jambs: `opening` on either side of the wall centre.
//!
//! ```text
//!   top  +--+
//!        |  |   top jamb   (edges 3, 4, 5)
//!        +--+   y + opening
//!
//!        +--+   y - opening
//!        |  |   bottom jamb (edges 0, 1, 2)
//! bottom +--+
//! ```

use glam::DVec2;

use super::state::Ball;
use super::Segment;
use crate::between;
use crate::consts::{CORRECTION_EPSILON, WALL_WIDTH};

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    /// Centre of the wall
    pub pos: DVec2,
    pub height: f64,
    opening: f64,
    edges: [Segment; 6],
    /// UI highlight only
    pub selected: bool,
}

impl Wall {
    pub fn new(pos: DVec2, height: f64, opening: f64) -> Self {
        let mut wall = Self {
            pos,
            height,
            opening: 0.0,
            edges: std::array::from_fn(|_| Segment::new(DVec2::ZERO, DVec2::ZERO)),
            selected: false,
        };
        wall.set_opening(opening);
        wall
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.pos.x - WALL_WIDTH / 2.0
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.pos.x + WALL_WIDTH / 2.0
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.pos.y + self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.pos.y - self.height / 2.0
    }

    pub fn opening(&self) -> f64 {
        self.opening
    }

    pub fn edges(&self) -> &[Segment; 6] {
        &self.edges
    }

    /// Inner face of the bottom jamb
    #[inline]
    fn bottom_jamb_end(&self) -> f64 {
        self.bottom() + self.height / 2.0 - self.opening
    }

    /// Inner face of the top jamb
    #[inline]
    fn top_jamb_end(&self) -> f64 {
        self.top() - self.height / 2.0 + self.opening
    }

    /// Set the door half-gap (clamped so jambs never invert) and rebuild edges.
    ///
    /// Callers owning balls must follow up with [`Wall::push_out`].
    pub fn set_opening(&mut self, opening: f64) {
        self.opening = opening.clamp(0.0, self.height / 2.0);
        self.rebuild_edges();
    }

    /// Stretch the wall to a new field height. The opening is re-clamped.
    pub fn set_height(&mut self, height: f64) {
        self.height = height;
        self.set_opening(self.opening);
    }

    /// Move the wall horizontally, keeping its opening
    pub fn set_x(&mut self, x: f64) {
        self.pos.x = x;
        self.rebuild_edges();
    }

    fn rebuild_edges(&mut self) {
        let (left, right) = (self.left(), self.right());
        let (bottom, top) = (self.bottom(), self.top());
        let low = self.bottom_jamb_end();
        let high = self.top_jamb_end();

        self.edges = [
            Segment::new(DVec2::new(left, bottom), DVec2::new(left, low)),
            Segment::new(DVec2::new(left, low), DVec2::new(right, low)),
            Segment::new(DVec2::new(right, bottom), DVec2::new(right, low)),
            Segment::new(DVec2::new(left, top), DVec2::new(left, high)),
            Segment::new(DVec2::new(left, high), DVec2::new(right, high)),
            Segment::new(DVec2::new(right, top), DVec2::new(right, high)),
        ];
    }

    /// Whether a point is inside the wall's full bounding box (door included)
    pub fn bounds_contain(&self, point: DVec2) -> bool {
        between(point.x, self.left(), self.right()) && between(point.y, self.top(), self.bottom())
    }

    /// Whether a point is inside one of the solid jambs
    pub fn solid_contains(&self, point: DVec2) -> bool {
        between(point.x, self.left(), self.right())
            && (between(point.y, self.top(), self.top_jamb_end())
                || between(point.y, self.bottom(), self.bottom_jamb_end()))
    }

    /// Teleport a ball whose centre is inside a jamb to just outside the
    /// nearer vertical face. Velocity is left alone.
    pub fn push_out(&self, ball: &mut Ball) -> bool {
        if !self.solid_contains(ball.pos) {
            return false;
        }
        ball.pos.x = if ball.pos.x < self.pos.x {
            self.left() - CORRECTION_EPSILON
        } else {
            self.right() + CORRECTION_EPSILON
        };
        true
    }
}
