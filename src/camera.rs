//! Camera follow and the goal column
//!
//! The camera only ever moves down: it eases toward the ball while the ball
//! is below it, and stops once it gets close to the goal.

use glam::Vec3;

use crate::tuning::CameraTuning;

/// Critically damped spring toward `target`, stable for any `dt`
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraFollow {
    pub position: Vec3,
    velocity: f32,
    y_offset: f32,
    smooth_time: f32,
}

impl CameraFollow {
    pub fn new(tuning: &CameraTuning) -> Self {
        Self {
            position: Vec3::from_array(tuning.initial_position),
            velocity: 0.0,
            y_offset: tuning.y_offset,
            smooth_time: tuning.smooth_time,
        }
    }

    /// Follow the ball down while it is below the camera and the camera is
    /// still well above the goal
    pub fn update(&mut self, dt: f32, ball_y: f32, goal_y: f32) {
        let y = self.position.y;
        if y > ball_y && y > goal_y + self.y_offset {
            self.position.y = smooth_damp(y, ball_y, &mut self.velocity, self.smooth_time, dt);
        }
    }
}

/// The long column under the tower, stretched between the ball's start
/// height and the goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalColumn {
    pub center_y: f32,
    pub half_height: f32,
}

impl GoalColumn {
    pub fn fit(start_y: f32, goal_y: f32, offset: f32) -> Self {
        Self {
            center_y: (start_y + goal_y) / 2.0 + offset,
            half_height: (start_y - goal_y).abs() / 2.0,
        }
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_height
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut vel = 0.0;
        let mut y = 0.0;
        for _ in 0..600 {
            y = smooth_damp(y, -10.0, &mut vel, 0.3, 1.0 / 60.0);
            assert!(y >= -10.0);
        }
        assert!((y + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_camera_follows_only_downward() {
        let mut cam = CameraFollow::new(&CameraTuning::default());
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, -5.0));

        // Ball above the camera: stay put
        cam.update(0.1, 0.6, -20.0);
        assert_eq!(cam.position.y, 0.0);

        cam.update(0.1, -3.0, -20.0);
        assert!(cam.position.y < 0.0 && cam.position.y > -3.0);
        assert_eq!(cam.position.z, -5.0);
    }

    #[test]
    fn test_camera_stops_near_goal() {
        let mut cam = CameraFollow::new(&CameraTuning::default());
        for _ in 0..600 {
            cam.update(1.0 / 60.0, -9.0, -8.0);
        }
        // Stops at the first frame that ends at or below goal + 4
        assert!(cam.position.y <= -4.0);
        assert!(cam.position.y > -5.0);
    }

    #[test]
    fn test_goal_column_spans_start_to_goal() {
        let column = GoalColumn::fit(0.6, -8.01, 0.0);
        assert!((column.top() - 0.6).abs() < 1e-5);
        assert!((column.bottom() + 8.01).abs() < 1e-5);

        let shifted = GoalColumn::fit(0.6, -8.01, 1.0);
        assert!((shifted.center_y - column.center_y - 1.0).abs() < 1e-5);
    }
}
