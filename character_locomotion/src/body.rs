//! Physics body seam: what the locomotion core reads from and writes to the
//! external physics world.

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundRay {
    pub has_hit: bool,
    /// Distance from the body origin to the hit, or the probe length on a miss.
    pub distance: Real,
}

pub trait CharacterBody {
    fn position(&self) -> Vector<Real>;

    /// Position blended between the last two physics steps for rendering.
    fn interpolated_position(&self) -> Vector<Real>;

    fn velocity(&self) -> Vector<Real>;

    /// Teleports the body; also resets its interpolated position.
    fn set_position(&mut self, position: Vector<Real>);

    fn set_velocity(&mut self, velocity: Vector<Real>);

    /// Adds the body to or removes it from the physics simulation.
    fn set_simulated(&mut self, simulated: bool);

    /// Casts straight down from the body origin, ignoring the body itself.
    fn cast_ground_ray(&self, length: Real) -> GroundRay;
}

/// Physics readings sampled once per update and read by the states.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsSignals {
    pub ray_has_hit: bool,
    pub ray_hit_distance: Real,
    pub body_velocity: Vector<Real>,
    pub body_position: Vector<Real>,
    /// Body velocity from the last airborne physics step.
    pub ground_impact_velocity: Vector<Real>,
}

impl Default for PhysicsSignals {
    fn default() -> Self {
        Self {
            ray_has_hit: true,
            ray_hit_distance: 0.0,
            body_velocity: Vector::zeros(),
            body_position: Vector::zeros(),
            ground_impact_velocity: Vector::zeros(),
        }
    }
}

impl PhysicsSignals {
    pub fn horizontal_speed(&self) -> Real {
        Vector::new(self.body_velocity.x, 0.0, self.body_velocity.z).norm()
    }
}
