//! Rapier integration: fixed-step world plus a capsule body for characters.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use rapier3d::prelude::*;

mod character;

pub use character::{CapsuleShape, CharacterBodyView, RapierCharacterBody};

/// Default fixed physics rate.
pub const DEFAULT_FIXED_DT: Real = 1.0 / 60.0;
/// Sub-steps run by one [`PhysicsWorld::advance`] before dropping backlog.
const MAX_STEPS_PER_ADVANCE: usize = 8;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    fixed_dt: Real,
    accumulator: Real,
    previous: HashMap<RigidBodyHandle, Vector<Real>>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self::with_fixed_dt(gravity, DEFAULT_FIXED_DT)
    }

    pub fn with_fixed_dt(gravity: Vector<Real>, fixed_dt: Real) -> Self {
        let fixed_dt = if fixed_dt.is_finite() && fixed_dt > 0.0 {
            fixed_dt
        } else {
            DEFAULT_FIXED_DT
        };
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            fixed_dt,
            accumulator: 0.0,
            previous: HashMap::new(),
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn fixed_dt(&self) -> Real {
        self.fixed_dt
    }

    /// Fraction of a fixed step left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> Real {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }

    /// Runs one raw step of `dt` seconds.
    pub fn step(&mut self, dt: Real) {
        for (handle, body) in self.bodies.iter() {
            self.previous.insert(handle, *body.translation());
        }
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Accumulates `dt` and runs whole fixed steps, calling `before_step`
    /// ahead of each one. Returns the number of steps taken.
    pub fn advance(&mut self, dt: Real, mut before_step: impl FnMut(&mut Self)) -> usize {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt {
            if steps == MAX_STEPS_PER_ADVANCE {
                log::warn!("physics fell behind, dropping {:.3}s", self.accumulator);
                self.accumulator %= self.fixed_dt;
                break;
            }
            before_step(self);
            self.step(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        steps
    }

    /// Translation blended between the last two fixed steps.
    pub fn interpolated_translation(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        let current = *self.bodies.get(handle)?.translation();
        let previous = self.previous.get(&handle).copied().unwrap_or(current);
        Some(previous.lerp(&current, self.alpha()))
    }

    pub fn insert_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        let handle = self.colliders.insert(collider);
        self.query_pipeline.update(&self.colliders);
        handle
    }

    pub fn insert_body(
        &mut self,
        body: RigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let translation = *body.translation();
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.previous.insert(body, translation);
        self.query_pipeline.update(&self.colliders);
        (body, collider)
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Moves a body without interpolating from its old position.
    fn teleport(&mut self, handle: RigidBodyHandle, translation: Vector<Real>) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(translation, true);
            self.previous.insert(handle, translation);
            self.query_pipeline.update(&self.colliders);
        }
    }

    /// Straight-down ray from `origin`, ignoring `exclude`. Returns the hit
    /// distance within `max_distance`.
    pub fn cast_down(
        &self,
        origin: Vector<Real>,
        max_distance: Real,
        exclude: Option<RigidBodyHandle>,
    ) -> Option<Real> {
        let ray = Ray::new(Point::from(origin), -Vector::y());
        let mut filter = QueryFilter::default();
        if let Some(handle) = exclude {
            filter = filter.exclude_rigid_body(handle);
        }
        self.query_pipeline
            .cast_ray(&self.bodies, &self.colliders, &ray, max_distance, true, filter)
            .map(|(_, distance)| distance)
    }
}
