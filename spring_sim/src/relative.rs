use std::f32::consts::{PI, TAU};

use rapier3d::prelude::Real;

use crate::integrator::{Integrator, SpringConfig, SpringError};

/// Wraps an angle into `(-π, π]`.
pub fn wrap_angle(angle: Real) -> Real {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Scalar spring whose target is expressed relative to the value the caller
/// currently holds (typically a signed angle to a target heading).
///
/// After [`simulate`](Self::simulate), `position` is the increment to apply
/// this call, not an absolute value. `velocity` is the current rate.
#[derive(Clone, Debug)]
pub struct RelativeSpringSimulator {
    pub position: Real,
    pub velocity: Real,
    pub target: Real,
    integrator: Integrator<Real>,
}

impl RelativeSpringSimulator {
    pub fn new(config: SpringConfig) -> Result<Self, SpringError> {
        Ok(Self {
            position: 0.0,
            velocity: 0.0,
            target: 0.0,
            integrator: Integrator::new(config, 0.0)?,
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

    pub fn reset(&mut self) {
        self.integrator.reset(0.0);
        self.position = 0.0;
        self.velocity = 0.0;
        self.target = 0.0;
    }

    pub fn simulate(&mut self, dt: Real) {
        let frame = self.integrator.advance(dt, wrap_angle(self.target));
        self.position = frame.position;
        self.velocity = frame.velocity;
        // The caller applies `position`; re-anchor the cached frames on the
        // new current value so the next target is measured from there.
        self.integrator.shift(-frame.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(mass: Real, damping: Real) -> RelativeSpringSimulator {
        RelativeSpringSimulator::new(SpringConfig::new(60.0, mass, damping).unwrap()).unwrap()
    }

    #[test]
    fn wraps_across_the_pi_boundary() {
        assert!((wrap_angle(PI + 0.1) - (-PI + 0.1)).abs() < 1.0e-5);
        assert!((wrap_angle(-PI - 0.1) - (PI - 0.1)).abs() < 1.0e-5);
        assert!((wrap_angle(-PI) - PI).abs() < 1.0e-5);
        assert!((wrap_angle(3.0 * TAU + 0.25) - 0.25).abs() < 1.0e-4);
        assert_eq!(wrap_angle(Real::NAN), 0.0);
    }

    #[test]
    fn accumulated_increments_reach_target_heading() {
        let mut sim = simulator(10.0, 1.0);
        let goal: Real = 1.2;
        let mut heading: Real = 0.0;
        for _ in 0..240 {
            sim.target = goal - heading;
            sim.simulate(1.0 / 60.0);
            heading += sim.position;
        }
        assert!((heading - goal).abs() < 1.0e-3, "heading {heading}");
        assert!(sim.velocity.abs() < 1.0e-2);
    }

    #[test]
    fn takes_the_short_way_around() {
        let mut sim = simulator(10.0, 1.0);
        let mut heading: Real = 3.0;
        let goal: Real = -3.0;
        sim.target = goal - heading;
        sim.simulate(1.0 / 60.0);
        sim.simulate(1.0 / 60.0);
        heading += sim.position;
        assert!(sim.velocity > 0.0, "should rotate through +π");
        assert!(heading > 3.0);
    }

    #[test]
    fn heading_never_overshoots_when_critically_damped() {
        let mut sim = simulator(10.0, 1.0);
        let goal: Real = 0.9;
        let mut heading: Real = 0.0;
        for _ in 0..300 {
            sim.target = goal - heading;
            sim.simulate(1.0 / 50.0);
            heading += sim.position;
            assert!(heading <= goal + 1.0e-4, "heading {heading}");
        }
    }
}
