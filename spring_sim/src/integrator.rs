use std::ops::{Add, Mul, Sub};

use rapier3d::math::Vector;
use rapier3d::prelude::Real;
use thiserror::Error;

/// Damping at or above this ratio uses the critically damped solution.
const CRITICAL_EPSILON: Real = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SpringError {
    #[error("spring mass must be positive and finite, got {0}")]
    Mass(Real),
    #[error("spring damping must be within [0, 1], got {0}")]
    Damping(Real),
    #[error("spring frequency must be positive and finite, got {0}")]
    Frequency(Real),
    #[error("spring stiffness must be positive and finite, got {0}")]
    Stiffness(Real),
}

/// Parameters of a damped harmonic oscillator integrated at a fixed rate.
///
/// `damping` is the damping ratio: 0 oscillates forever, 1 is critically
/// damped. `frequency` is the sub-step rate in steps per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub frequency: Real,
    pub mass: Real,
    pub damping: Real,
    pub stiffness: Real,
}

impl SpringConfig {
    /// Builds a config with unit stiffness per sub-step (`frequency²`).
    pub fn new(frequency: Real, mass: Real, damping: Real) -> Result<Self, SpringError> {
        let config = Self {
            frequency,
            mass,
            damping,
            stiffness: frequency * frequency,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_stiffness(mut self, stiffness: Real) -> Result<Self, SpringError> {
        self.stiffness = stiffness;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SpringError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(SpringError::Frequency(self.frequency));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SpringError::Mass(self.mass));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(SpringError::Damping(self.damping));
        }
        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return Err(SpringError::Stiffness(self.stiffness));
        }
        Ok(())
    }

    pub fn step_time(&self) -> Real {
        1.0 / self.frequency
    }

    /// Natural angular frequency in radians per second.
    pub fn angular_frequency(&self) -> Real {
        (self.stiffness / self.mass).sqrt()
    }
}

/// Values a spring can smooth. Integration is linear, so vectors are
/// integrated per axis with no coupling.
pub trait SpringValue: Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Real, Output = Self> {
    fn zero() -> Self;
}

impl SpringValue for Real {
    fn zero() -> Self {
        0.0
    }
}

impl SpringValue for Vector<Real> {
    fn zero() -> Self {
        Vector::zeros()
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame<T> {
    pub position: T,
    pub velocity: T,
}

/// Exact one-step transition matrix of the oscillator:
/// `x' = a·x + b·v`, `v' = c·x + d·v`, with `x` measured from the target.
#[derive(Clone, Copy, Debug)]
struct StepMatrix {
    a: Real,
    b: Real,
    c: Real,
    d: Real,
}

impl StepMatrix {
    fn from_config(config: &SpringConfig) -> Self {
        let h = config.step_time();
        let omega = config.angular_frequency();
        let zeta = config.damping;
        if zeta >= 1.0 - CRITICAL_EPSILON {
            let e = (-omega * h).exp();
            return Self {
                a: (1.0 + omega * h) * e,
                b: h * e,
                c: -omega * omega * h * e,
                d: (1.0 - omega * h) * e,
            };
        }
        let alpha = zeta * omega;
        let damped = omega * (1.0 - zeta * zeta).sqrt();
        let e = (-alpha * h).exp();
        let (sin, cos) = (damped * h).sin_cos();
        let sin_over = sin / damped;
        Self {
            a: e * (cos + alpha * sin_over),
            b: e * sin_over,
            c: -e * omega * omega * sin_over,
            d: e * (cos - alpha * sin_over),
        }
    }
}

/// Fixed-rate integrator with leftover-time accumulation and interpolation
/// between the two most recent sub-step frames.
#[derive(Clone, Debug)]
pub(crate) struct Integrator<T> {
    config: SpringConfig,
    matrix: StepMatrix,
    previous: Frame<T>,
    latest: Frame<T>,
    offset: Real,
}

impl<T: SpringValue> Integrator<T> {
    pub fn new(config: SpringConfig, initial: T) -> Result<Self, SpringError> {
        config.validate()?;
        let frame = Frame {
            position: initial,
            velocity: T::zero(),
        };
        Ok(Self {
            matrix: StepMatrix::from_config(&config),
            config,
            previous: frame,
            latest: frame,
            offset: 0.0,
        })
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SpringConfig) -> Result<(), SpringError> {
        config.validate()?;
        self.config = config;
        self.matrix = StepMatrix::from_config(&config);
        Ok(())
    }

    pub fn reset(&mut self, position: T) {
        let frame = Frame {
            position,
            velocity: T::zero(),
        };
        self.previous = frame;
        self.latest = frame;
        self.offset = 0.0;
    }

    /// Generates every whole sub-step contained in `offset + dt` toward
    /// `target` and returns the interpolated frame.
    pub fn advance(&mut self, dt: Real, target: T) -> Frame<T> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let h = self.config.step_time();
        self.offset += dt;
        while self.offset >= h {
            self.previous = self.latest;
            self.latest = self.step(self.latest, target);
            self.offset -= h;
        }
        let t = (self.offset / h).clamp(0.0, 1.0);
        Frame {
            position: lerp(self.previous.position, self.latest.position, t),
            velocity: lerp(self.previous.velocity, self.latest.velocity, t),
        }
    }

    /// Moves the cached frames by `delta`; used to keep relative output
    /// anchored at zero.
    pub fn shift(&mut self, delta: T) {
        self.previous.position = self.previous.position + delta;
        self.latest.position = self.latest.position + delta;
    }

    fn step(&self, frame: Frame<T>, target: T) -> Frame<T> {
        let m = self.matrix;
        let displacement = frame.position - target;
        Frame {
            position: target + displacement * m.a + frame.velocity * m.b,
            velocity: displacement * m.c + frame.velocity * m.d,
        }
    }
}

fn lerp<T: SpringValue>(from: T, to: T, t: Real) -> T {
    from + (to - from) * t
}
