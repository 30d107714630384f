use evoneat::evaluation::Environment;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::f64::consts::PI;

const WIDTH: f64 = 400.0;
const HEIGHT: f64 = 400.0;
const GRAVITY: f64 = 30.0;
const MAX_THRUST: f64 = 150.0;
const MASS: f64 = 1.0;
/// Degrees per tick at full turning output.
const MAX_TURN: f64 = 10.0;
const TARGET_RADIUS: f64 = 30.0;
/// Radius of the circle bounding the rocket's hull.
const ROCKET_RADIUS: f64 = 40.3;
const SPEED_SCALE: f64 = 200.0;
/// Reward per tick spent right on top of the next target.
const CLOSENESS_REWARD: f64 = 0.01;

/// A rocket under gravity that must fly through a sequence
/// of targets without leaving the arena.
///
/// Observations: target offset (x, y), velocity (x, y) and
/// heading (cos, sin), all roughly within [-1, 1].
/// Actions: thrust level and turning rate.
#[derive(Clone, Debug)]
pub struct RocketEnvironment {
    delta_time: f64,
    position: (f64, f64),
    velocity: (f64, f64),
    /// Heading in degrees, counterclockwise from +x.
    rotation: f64,
    thrust: f64,
    target: (f64, f64),
    hits: usize,
    closeness: f64,
}

impl RocketEnvironment {
    pub fn new(delta_time: f64) -> RocketEnvironment {
        let mut environment = RocketEnvironment {
            delta_time,
            position: (0.0, 0.0),
            velocity: (0.0, 0.0),
            rotation: 0.0,
            thrust: 0.0,
            target: (0.0, 0.0),
            hits: 0,
            closeness: 0.0,
        };
        environment.reset();
        environment
    }

    /// Target positions depend only on how many targets were hit,
    /// so every genome faces the same course.
    fn place_target(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.hits as u64);
        self.target = (
            rng.gen_range(WIDTH * 0.1..=WIDTH * 0.9),
            rng.gen_range(HEIGHT * 0.1..=HEIGHT * 0.9),
        );
    }

    fn target_offset(&self) -> (f64, f64) {
        (
            self.target.0 - self.position.0,
            self.target.1 - self.position.1,
        )
    }

    fn target_distance(&self) -> f64 {
        let (dx, dy) = self.target_offset();
        dx.hypot(dy)
    }

    fn in_bounds(&self) -> bool {
        (0.0..=WIDTH).contains(&self.position.0) && (0.0..=HEIGHT).contains(&self.position.1)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl Environment for RocketEnvironment {
    fn reset(&mut self) {
        self.position = (WIDTH / 2.0, HEIGHT / 2.0);
        self.velocity = (0.0, 0.0);
        self.rotation = 90.0;
        self.thrust = 0.0;
        self.hits = 0;
        self.closeness = 0.0;
        self.place_target();
    }

    fn observe(&self) -> Vec<f64> {
        let (dx, dy) = self.target_offset();
        let heading = self.rotation.to_radians();
        vec![
            dx / WIDTH,
            dy / HEIGHT,
            self.velocity.0 / SPEED_SCALE,
            self.velocity.1 / SPEED_SCALE,
            heading.cos(),
            heading.sin(),
        ]
    }

    fn step(&mut self, actions: &[f64]) -> bool {
        self.thrust = actions[0].clamp(0.0, 1.0);
        self.rotation = (self.rotation + (actions[1] - 0.5) * 2.0 * MAX_TURN).rem_euclid(360.0);

        let heading = self.rotation * PI / 180.0;
        let force = self.thrust * MAX_THRUST;
        let acceleration = (
            force * heading.cos() / MASS,
            force * heading.sin() / MASS - GRAVITY,
        );
        let dt = self.delta_time;
        let velocity = (
            self.velocity.0 + acceleration.0 * dt,
            self.velocity.1 + acceleration.1 * dt,
        );
        self.position.0 += (velocity.0 + self.velocity.0) * dt / 2.0;
        self.position.1 += (velocity.1 + self.velocity.1) * dt / 2.0;
        self.velocity = velocity;

        if self.target_distance() <= TARGET_RADIUS + ROCKET_RADIUS {
            self.hits += 1;
            self.place_target();
        }
        let diagonal = WIDTH.hypot(HEIGHT);
        self.closeness += CLOSENESS_REWARD * (1.0 - self.target_distance() / diagonal).max(0.0);
        self.in_bounds()
    }

    /// Targets hit, plus a small reward accumulated for
    /// every tick spent near the next target.
    fn score(&self) -> f64 {
        self.hits as f64 + self.closeness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_without_thrust() {
        let mut environment = RocketEnvironment::new(0.1);
        let start = environment.position.1;
        let mut alive = true;
        let mut ticks = 0;
        while alive && ticks < 1000 {
            alive = environment.step(&[0.0, 0.5]);
            ticks += 1;
        }
        assert!(!alive);
        assert!(environment.position.1 < start);
        assert_eq!(environment.rotation, 90.0);
    }

    #[test]
    fn course_is_reproducible() {
        let mut first = RocketEnvironment::new(0.1);
        let mut second = RocketEnvironment::new(0.1);
        for _ in 0..3 {
            assert_eq!(first.target, second.target);
            first.hits += 1;
            first.place_target();
            second.hits += 1;
            second.place_target();
        }
        first.reset();
        assert_eq!(first.hits(), 0);
        assert_eq!(first.target, RocketEnvironment::new(0.1).target);
    }

    #[test]
    fn observations_are_normalized() {
        let environment = RocketEnvironment::new(0.1);
        let observation = environment.observe();
        assert_eq!(observation.len(), 6);
        assert!(observation.iter().all(|o| o.abs() <= 1.0));
        assert_eq!(environment.score(), 0.0);
    }

    #[test]
    fn score_never_decreases() {
        let mut environment = RocketEnvironment::new(0.1);
        let mut score = environment.score();
        let mut alive = true;
        let mut tick = 0;
        while alive && tick < 500 {
            let turn = if tick % 40 < 20 { 0.3 } else { 0.7 };
            alive = environment.step(&[0.25, turn]);
            assert!(environment.score() >= score);
            assert!(environment.score() > score || !alive);
            score = environment.score();
            tick += 1;
        }
    }

    #[test]
    fn reaching_the_target_scores() {
        let mut environment = RocketEnvironment::new(0.1);
        environment.position = environment.target;
        environment.velocity = (0.0, 0.0);
        assert!(environment.step(&[GRAVITY / MAX_THRUST, 0.5]));
        assert_eq!(environment.hits(), 1);
        assert!(environment.score() >= 1.0);
    }
}
