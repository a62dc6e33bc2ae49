//! Straight line-segment obstacles
//!
//! A segment is tested against a ball in two stages:
//! - side contact: the ball centre projects inside the segment and the
//!   projection is within one radius
//! - endpoint contact: each endpoint treated as a point obstacle

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::between;

/// A static segment between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: DVec2,
    pub p2: DVec2,
    /// Rendering hint only; hidden segments still collide
    pub visible: bool,
}

impl Segment {
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        Self {
            p1,
            p2,
            visible: true,
        }
    }

    /// A segment that collides but is not drawn (field borders)
    pub fn hidden(p1: DVec2, p2: DVec2) -> Self {
        Self {
            p1,
            p2,
            visible: false,
        }
    }

    /// Move both endpoints
    pub fn set(&mut self, p1: DVec2, p2: DVec2) {
        self.p1 = p1;
        self.p2 = p2;
    }

    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).length()
    }

    /// Closest point to `point` on the infinite line through the segment.
    ///
    /// The line is written as `a*x + b*y + c = 0`; vertical segments use
    /// `x = p1.x` since they have no slope.
    pub fn closest_point_on_line(&self, point: DVec2) -> DVec2 {
        let (a, b, c) = if self.p1.x == self.p2.x {
            (1.0, 0.0, -self.p1.x)
        } else {
            let m = (self.p1.y - self.p2.y) / (self.p1.x - self.p2.x);
            (-m, 1.0, -(-m * self.p1.x + self.p1.y))
        };
        let norm = a * a + b * b;
        DVec2::new(
            -(a * b * point.y - b * b * point.x + a * c) / norm,
            -(a * b * point.x - a * a * point.y + b * c) / norm,
        )
    }

    /// Whether a point lies inside the segment's bounding box
    #[inline]
    pub fn bounds_contain(&self, point: DVec2) -> bool {
        between(point.x, self.p1.x, self.p2.x) && between(point.y, self.p1.y, self.p2.y)
    }

    /// Contact point on the segment's side, if a disk touches it there
    pub fn side_contact(&self, center: DVec2, radius: f64) -> Option<DVec2> {
        let closest = self.closest_point_on_line(center);
        if self.bounds_contain(closest) && center.distance_squared(closest) <= radius * radius {
            Some(closest)
        } else {
            None
        }
    }

    /// Endpoints within one radius of the disk centre
    pub fn endpoint_contacts(&self, center: DVec2, radius: f64) -> impl Iterator<Item = DVec2> {
        let r_sq = radius * radius;
        [self.p1, self.p2]
            .into_iter()
            .filter(move |p| center.distance_squared(*p) <= r_sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_horizontal() {
        let seg = Segment::new(DVec2::new(-10.0, 5.0), DVec2::new(10.0, 5.0));
        let p = seg.closest_point_on_line(DVec2::new(3.0, 1.0));
        assert!((p - DVec2::new(3.0, 5.0)).length() < 1e-12);
    }

    #[test]
    fn test_closest_point_vertical() {
        let seg = Segment::new(DVec2::new(2.0, -10.0), DVec2::new(2.0, 10.0));
        let p = seg.closest_point_on_line(DVec2::new(7.0, 4.0));
        assert_eq!(p, DVec2::new(2.0, 4.0));
    }

    #[test]
    fn test_closest_point_diagonal() {
        let seg = Segment::new(DVec2::new(0.0, 0.0), DVec2::new(10.0, 10.0));
        let p = seg.closest_point_on_line(DVec2::new(0.0, 10.0));
        assert!((p - DVec2::new(5.0, 5.0)).length() < 1e-9);
    }

    #[test]
    fn test_side_contact_only_within_segment() {
        let seg = Segment::new(DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0));
        assert!(seg.side_contact(DVec2::new(5.0, 1.5), 2.0).is_some());
        assert!(seg.side_contact(DVec2::new(5.0, 2.5), 2.0).is_none());
        // Projects past the end: no side contact
        assert!(seg.side_contact(DVec2::new(11.0, 1.0), 2.0).is_none());
    }

    #[test]
    fn test_endpoint_contacts() {
        let seg = Segment::new(DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0));
        let hits: Vec<_> = seg.endpoint_contacts(DVec2::new(11.0, 1.0), 2.0).collect();
        assert_eq!(hits, vec![DVec2::new(10.0, 0.0)]);
        assert_eq!(seg.endpoint_contacts(DVec2::new(5.0, 0.0), 2.0).count(), 0);
    }
}
