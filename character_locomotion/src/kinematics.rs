//! Character motion quantities, heading math and the spring pair.

use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::Real;
use spring_sim::{RelativeSpringSimulator, SpringConfig, VectorSpringSimulator};

use crate::config::{ConfigError, LocomotionConfig};

const DIRECTION_EPSILON: Real = 1.0e-6;

pub fn forward() -> Vector<Real> {
    Vector::new(0.0, 0.0, 1.0)
}

/// Projects onto the ground plane and normalizes; `None` for (near) vertical
/// or zero vectors.
pub fn flatten(direction: Vector<Real>) -> Option<Vector<Real>> {
    let flat = Vector::new(direction.x, 0.0, direction.z);
    let len = flat.norm();
    if len.is_finite() && len > DIRECTION_EPSILON {
        Some(flat / len)
    } else {
        None
    }
}

/// Signed angle about +Y that rotates `from` onto `to`, in `(-π, π]`.
pub fn signed_angle_about_up(from: Vector<Real>, to: Vector<Real>) -> Real {
    let cross = from.cross(&to);
    cross.y.atan2(from.dot(&to))
}

pub fn rotate_about_up(direction: Vector<Real>, angle: Real) -> Vector<Real> {
    Rotation::from_axis_angle(&Vector::y_axis(), angle) * direction
}

/// Heading about +Y of a ground-plane direction, measured from +Z.
pub fn yaw_of(direction: Vector<Real>) -> Real {
    direction.x.atan2(direction.z)
}

/// Combines held directional keys into a local direction: +Z forward,
/// +X to the left. Unit length when any key contributes, zero otherwise.
pub fn local_movement_direction(up: bool, down: bool, left: bool, right: bool) -> Vector<Real> {
    let axis = |positive: bool, negative: bool| -> Real {
        (positive as i8 - negative as i8) as Real
    };
    let direction = Vector::new(axis(left, right), 0.0, axis(up, down));
    let len = direction.norm();
    if len > 0.0 {
        direction / len
    } else {
        direction
    }
}

/// Rotates a local movement direction into the world using the view heading.
pub fn view_relative(local: Vector<Real>, view: Vector<Real>) -> Vector<Real> {
    let yaw = flatten(view).map(yaw_of).unwrap_or(0.0);
    rotate_about_up(local, yaw)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterKinematics {
    /// Smoothed local velocity (x lateral, y vertical, z forward), in units
    /// of the configured move speed.
    pub velocity: Vector<Real>,
    pub velocity_target: Vector<Real>,
    /// Rate of change of `velocity`, taken from the velocity spring.
    pub acceleration: Vector<Real>,
    pub orientation: Vector<Real>,
    pub orientation_target: Vector<Real>,
    pub angular_velocity: Real,
    /// Per-axis share of the arcade velocity blended into the body velocity.
    pub velocity_influence: Vector<Real>,
    pub velocity_is_additive: bool,
    /// Camera forward used to resolve movement keys into world directions.
    pub view_vector: Vector<Real>,
}

impl Default for CharacterKinematics {
    fn default() -> Self {
        Self {
            velocity: Vector::zeros(),
            velocity_target: Vector::zeros(),
            acceleration: Vector::zeros(),
            orientation: forward(),
            orientation_target: forward(),
            angular_velocity: 0.0,
            velocity_influence: Vector::new(1.0, 0.0, 1.0),
            velocity_is_additive: false,
            view_vector: forward(),
        }
    }
}

impl CharacterKinematics {
    pub fn set_forward_speed(&mut self, speed: Real) {
        self.velocity_target = Vector::new(0.0, 0.0, speed);
    }

    /// Sets the orientation target; zero and vertical directions are ignored.
    pub fn set_orientation_target(&mut self, direction: Vector<Real>) -> bool {
        match flatten(direction) {
            Some(direction) => {
                self.orientation_target = direction;
                true
            }
            None => false,
        }
    }

    /// Converts a local velocity to world space along the current heading.
    pub fn local_to_world(&self, local: Vector<Real>) -> Vector<Real> {
        rotate_about_up(local, yaw_of(self.orientation))
    }
}

/// Velocity and rotation springs owned by a character.
#[derive(Clone, Debug)]
pub struct Springs {
    pub velocity: VectorSpringSimulator,
    pub rotation: RelativeSpringSimulator,
    velocity_default: SpringConfig,
    rotation_default: SpringConfig,
}

impl Springs {
    /// Builds both springs at the configured rate. Errors name the spring
    /// that was rejected.
    pub fn from_config(config: &LocomotionConfig) -> Result<Self, ConfigError> {
        let velocity_default = config.velocity_spring_config()?;
        let rotation_default = config.rotation_spring_config()?;
        let velocity = VectorSpringSimulator::new(velocity_default).map_err(|source| {
            ConfigError::Spring {
                name: "velocity",
                source,
            }
        })?;
        let rotation = RelativeSpringSimulator::new(rotation_default).map_err(|source| {
            ConfigError::Spring {
                name: "rotation",
                source,
            }
        })?;
        Ok(Self {
            velocity,
            rotation,
            velocity_default,
            rotation_default,
        })
    }

    /// Restores the configured mass and damping on both springs.
    pub fn restore_defaults(&mut self) {
        self.tune_velocity(self.velocity_default.mass, self.velocity_default.damping);
        self.tune_rotation(self.rotation_default.mass, self.rotation_default.damping);
    }

    pub fn tune_velocity(&mut self, mass: Real, damping: Real) {
        let config = SpringConfig {
            mass,
            damping,
            ..self.velocity.config()
        };
        if let Err(err) = self.velocity.set_config(config) {
            log::warn!("ignoring velocity spring tuning: {err}");
        }
    }

    pub fn tune_rotation(&mut self, mass: Real, damping: Real) {
        let config = SpringConfig {
            mass,
            damping,
            ..self.rotation.config()
        };
        if let Err(err) = self.rotation.set_config(config) {
            log::warn!("ignoring rotation spring tuning: {err}");
        }
    }

    pub fn tune_rotation_damping(&mut self, damping: Real) {
        self.tune_rotation(self.rotation.config().mass, damping);
    }

    pub fn tune_velocity_mass(&mut self, mass: Real) {
        self.tune_velocity(mass, self.velocity.config().damping);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn close(a: Vector<Real>, b: Vector<Real>) -> bool {
        (a - b).norm() < 1.0e-5
    }

    #[test]
    fn movement_direction_from_keys() {
        assert_eq!(local_movement_direction(false, false, false, false), Vector::zeros());
        assert!(close(local_movement_direction(true, false, false, false), forward()));
        assert!(close(
            local_movement_direction(false, false, true, false),
            Vector::new(1.0, 0.0, 0.0)
        ));
        assert_eq!(local_movement_direction(true, true, false, false), Vector::zeros());
        let diagonal = local_movement_direction(true, false, false, true);
        assert!((diagonal.norm() - 1.0).abs() < 1.0e-6);
        assert!(diagonal.x < 0.0 && diagonal.z > 0.0);
    }

    #[test]
    fn signed_angle_matches_rotation_direction() {
        let left = Vector::new(1.0, 0.0, 0.0);
        let angle = signed_angle_about_up(forward(), left);
        assert!((angle - FRAC_PI_2).abs() < 1.0e-6);
        assert!(close(rotate_about_up(forward(), angle), left));
        assert!((signed_angle_about_up(forward(), -forward()).abs() - PI).abs() < 1.0e-6);
        assert!(signed_angle_about_up(left, forward()) < 0.0);
    }

    #[test]
    fn view_relative_follows_camera_heading() {
        let view = Vector::new(1.0, -0.4, 0.0);
        let world = view_relative(forward(), view);
        assert!(close(world, Vector::new(1.0, 0.0, 0.0)));
        assert!(close(view_relative(forward(), Vector::zeros()), forward()));
    }

    #[test]
    fn orientation_target_ignores_degenerate_directions() {
        let mut kinematics = CharacterKinematics::default();
        assert!(!kinematics.set_orientation_target(Vector::new(0.0, 3.0, 0.0)));
        assert_eq!(kinematics.orientation_target, forward());
        assert!(kinematics.set_orientation_target(Vector::new(0.0, 0.0, -5.0)));
        assert!(close(kinematics.orientation_target, -forward()));
    }

    #[test]
    fn local_velocity_follows_heading() {
        let kinematics = CharacterKinematics {
            orientation: Vector::new(-1.0, 0.0, 0.0),
            ..Default::default()
        };
        let world = kinematics.local_to_world(Vector::new(0.0, 0.0, 2.0));
        assert!(close(world, Vector::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn springs_restore_defaults_after_tuning() {
        let config = LocomotionConfig::default();
        let velocity = config.velocity_spring_config().unwrap();
        let rotation = config.rotation_spring_config().unwrap();
        let mut springs = Springs::from_config(&config).unwrap();
        springs.tune_velocity(7.0, 0.5);
        springs.tune_rotation_damping(0.3);
        springs.tune_velocity(-1.0, 0.5);
        assert_eq!(springs.velocity.config().mass, 7.0);
        assert_eq!(springs.rotation.config().damping, 0.3);
        springs.restore_defaults();
        assert_eq!(springs.velocity.config(), velocity);
        assert_eq!(springs.rotation.config(), rotation);
    }

    #[test]
    fn spring_errors_carry_the_spring_name() {
        let mut config = LocomotionConfig::default();
        config.rotation_spring.damping = -0.5;
        assert!(matches!(
            Springs::from_config(&config),
            Err(ConfigError::Spring {
                name: "rotation",
                ..
            })
        ));
        let mut config = LocomotionConfig::default();
        config.velocity_spring.mass = 0.0;
        assert!(matches!(
            Springs::from_config(&config),
            Err(ConfigError::Spring {
                name: "velocity",
                ..
            })
        ));
    }
}
