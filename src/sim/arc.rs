//! Ring piece geometry
//!
//! A ring around the tower is cut into angular pieces. Each piece is an arc
//! band on the horizontal plane:
//! - radius: centerline distance from the tower axis
//! - thickness: radial extent (inner = radius - thickness/2, outer = radius + thickness/2)
//! - theta_start, theta_end: angular extent in the ring's local frame

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{around_axis, normalize_angle};

/// A thickened arc band in the ring's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    /// Centerline radius from the tower axis
    pub radius: f32,
    /// Radial thickness (extends radius ± thickness/2)
    pub thickness: f32,
    /// Start angle (radians, normalized to [-π, π))
    pub theta_start: f32,
    /// End angle (radians, normalized to [-π, π))
    pub theta_end: f32,
}

impl ArcSegment {
    pub fn new(radius: f32, thickness: f32, theta_start: f32, theta_end: f32) -> Self {
        Self {
            radius,
            thickness,
            theta_start: normalize_angle(theta_start),
            theta_end: normalize_angle(theta_end),
        }
    }

    /// Band spanning `inner..outer` from the axis
    pub fn band(inner: f32, outer: f32, theta_start: f32, theta_end: f32) -> Self {
        Self::new((inner + outer) / 2.0, outer - inner, theta_start, theta_end)
    }

    #[inline]
    pub fn inner_radius(&self) -> f32 {
        self.radius - self.thickness / 2.0
    }

    #[inline]
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.thickness / 2.0
    }

    /// Angular span of the arc (handles wraparound)
    pub fn angular_span(&self) -> f32 {
        let mut span = self.theta_end - self.theta_start;
        if span <= 0.0 {
            span += std::f32::consts::TAU;
        }
        span
    }

    /// Check if an angle is within the arc's angular extent.
    /// The start edge is inclusive and the end edge exclusive, so equal
    /// slices of a ring never both claim the same angle.
    pub fn contains_angle(&self, theta: f32) -> bool {
        let theta = normalize_angle(theta);
        let start = self.theta_start;
        let end = self.theta_end;

        if start < end {
            theta >= start && theta < end
        } else {
            // Wraparound (e.g., start=170°, end=-170°), or a full circle
            theta >= start || theta < end
        }
    }

    pub fn mid_angle(&self) -> f32 {
        normalize_angle(self.theta_start + self.angular_span() / 2.0)
    }

    /// Same arc turned by `delta` radians
    pub fn rotated(&self, delta: f32) -> Self {
        Self::new(
            self.radius,
            self.thickness,
            self.theta_start + delta,
            self.theta_end + delta,
        )
    }

    /// Center of the arc's centerline, rotated by `yaw`, at height `y`
    pub fn center(&self, yaw: f32, y: f32) -> Vec3 {
        around_axis(self.radius, self.mid_angle() + yaw, y)
    }

    /// Chord length of the outer edge (debris width)
    pub fn outer_chord(&self) -> f32 {
        let half = (self.angular_span() / 2.0).min(std::f32::consts::FRAC_PI_2);
        2.0 * self.outer_radius() * half.sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_arc_contains_angle_no_wrap() {
        let arc = ArcSegment::new(1.0, 0.5, 0.0, PI / 2.0);
        assert!(arc.contains_angle(0.0));
        assert!(arc.contains_angle(PI / 4.0));
        assert!(!arc.contains_angle(PI / 2.0));
        assert!(!arc.contains_angle(-PI / 4.0));
    }

    #[test]
    fn test_arc_contains_angle_wraparound() {
        let arc = ArcSegment::new(1.0, 0.5, 170.0_f32.to_radians(), -170.0_f32.to_radians());
        assert!(arc.contains_angle(PI));
        assert!(arc.contains_angle(-PI + 0.01));
        assert!(!arc.contains_angle(0.0));
    }

    #[test]
    fn test_adjacent_slices_do_not_overlap() {
        let slices = 8;
        let width = std::f32::consts::TAU / slices as f32;
        let arcs: Vec<_> = (0..slices)
            .map(|i| ArcSegment::new(1.0, 0.5, i as f32 * width, (i + 1) as f32 * width))
            .collect();

        for k in 0..64 {
            let theta = -PI + k as f32 * (std::f32::consts::TAU / 64.0) + 0.001;
            let hits = arcs.iter().filter(|a| a.contains_angle(theta)).count();
            assert_eq!(hits, 1, "angle {theta} claimed by {hits} slices");
        }
    }

    #[test]
    fn test_angular_span_and_mid() {
        let arc = ArcSegment::new(1.0, 0.5, 0.0, PI / 2.0);
        assert!((arc.angular_span() - PI / 2.0).abs() < 0.001);
        assert!((arc.mid_angle() - PI / 4.0).abs() < 0.001);

        let wrap = ArcSegment::new(1.0, 0.5, PI * 0.9, -PI * 0.9);
        assert!((wrap.angular_span() - 0.2 * PI).abs() < 0.001);
    }

    #[test]
    fn test_rotated_and_center() {
        let arc = ArcSegment::band(0.5, 1.5, 0.0, 0.2).rotated(-PI / 2.0 - 0.1);
        assert!(arc.contains_angle(-PI / 2.0));
        let c = arc.center(0.0, -3.0);
        assert!(c.x.abs() < 1e-4);
        assert!((c.z + 1.0).abs() < 1e-4);
        assert_eq!(c.y, -3.0);
    }
}
