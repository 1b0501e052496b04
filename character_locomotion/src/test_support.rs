use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::body::{CharacterBody, GroundRay};

const GRAVITY: Real = -9.81;

/// Point body over an optional flat floor at `ground` height.
#[derive(Clone, Debug)]
pub struct MockBody {
    pub position: Vector<Real>,
    pub velocity: Vector<Real>,
    pub ground: Option<Real>,
    pub height: Real,
    pub simulated: bool,
}

impl MockBody {
    pub fn standing(height: Real) -> Self {
        Self {
            position: Vector::new(0.0, height, 0.0),
            velocity: Vector::zeros(),
            ground: Some(0.0),
            height,
            simulated: true,
        }
    }

    /// Integrates gravity and rests the feet on the floor.
    pub fn step(&mut self, dt: Real) {
        if !self.simulated {
            return;
        }
        self.velocity.y += GRAVITY * dt;
        self.position += self.velocity * dt;
        if let Some(ground) = self.ground {
            let rest = ground + self.height;
            if self.position.y <= rest {
                self.position.y = rest;
                self.velocity.y = self.velocity.y.max(0.0);
            }
        }
    }
}

impl CharacterBody for MockBody {
    fn position(&self) -> Vector<Real> {
        self.position
    }

    fn interpolated_position(&self) -> Vector<Real> {
        self.position
    }

    fn velocity(&self) -> Vector<Real> {
        self.velocity
    }

    fn set_position(&mut self, position: Vector<Real>) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vector<Real>) {
        self.velocity = velocity;
    }

    fn set_simulated(&mut self, simulated: bool) {
        self.simulated = simulated;
    }

    fn cast_ground_ray(&self, length: Real) -> GroundRay {
        match self.ground {
            Some(ground) if self.position.y - ground <= length => GroundRay {
                has_hit: true,
                distance: (self.position.y - ground).max(0.0),
            },
            _ => GroundRay {
                has_hit: false,
                distance: length,
            },
        }
    }
}
