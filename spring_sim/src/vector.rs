use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::integrator::{Integrator, SpringConfig, SpringError};

/// Smooths a 3D target per axis.
#[derive(Clone, Debug)]
pub struct VectorSpringSimulator {
    pub position: Vector<Real>,
    pub velocity: Vector<Real>,
    pub target: Vector<Real>,
    integrator: Integrator<Vector<Real>>,
}

impl VectorSpringSimulator {
    pub fn new(config: SpringConfig) -> Result<Self, SpringError> {
        Ok(Self {
            position: Vector::zeros(),
            velocity: Vector::zeros(),
            target: Vector::zeros(),
            integrator: Integrator::new(config, Vector::zeros())?,
        })
    }

    pub fn config(&self) -> SpringConfig {
        self.integrator.config()
    }

    pub fn set_config(&mut self, config: SpringConfig) -> Result<(), SpringError> {
        self.integrator.set_config(config)
    }

    pub fn set_mass(&mut self, mass: Real) -> Result<(), SpringError> {
        let config = SpringConfig {
            mass,
            ..self.config()
        };
        self.integrator.set_config(config)
    }

    pub fn set_damping(&mut self, damping: Real) -> Result<(), SpringError> {
        let config = SpringConfig {
            damping,
            ..self.config()
        };
        self.integrator.set_config(config)
    }

    /// Snaps position and target to `value` and drops any motion.
    pub fn reset(&mut self, value: Vector<Real>) {
        self.integrator.reset(value);
        self.position = value;
        self.velocity = Vector::zeros();
        self.target = value;
    }

    pub fn simulate(&mut self, dt: Real) {
        let frame = self.integrator.advance(dt, self.target);
        self.position = frame.position;
        self.velocity = frame.velocity;
    }
}
