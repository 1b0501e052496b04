use character_locomotion::{CharacterBody, GroundRay};
use rapier3d::prelude::*;

use crate::PhysicsWorld;

/// Capsule measured from the body origin, which sits `half_height + radius`
/// above the feet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleShape {
    pub half_height: Real,
    pub radius: Real,
    pub mass: Real,
    pub friction: Real,
}

impl CapsuleShape {
    /// Capsule whose feet sit `height` below the origin.
    pub fn for_height(height: Real) -> Self {
        let radius = (height * 0.4).max(0.05);
        Self {
            half_height: (height - radius).max(0.0),
            radius,
            mass: 1.0,
            friction: 0.0,
        }
    }

    pub fn origin_to_feet(&self) -> Real {
        self.half_height + self.radius
    }
}

/// Dynamic, rotation-locked capsule driven by velocity commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RapierCharacterBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

impl RapierCharacterBody {
    pub fn spawn(world: &mut PhysicsWorld, position: Vector<Real>, shape: CapsuleShape) -> Self {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let collider = ColliderBuilder::capsule_y(shape.half_height, shape.radius)
            .mass(shape.mass)
            .friction(shape.friction)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .build();
        let (body, collider) = world.insert_body(body, collider);
        Self { body, collider }
    }

    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider_handle(&self) -> ColliderHandle {
        self.collider
    }

    /// Borrows the world as a [`CharacterBody`] for this capsule.
    pub fn view<'a>(&self, world: &'a mut PhysicsWorld) -> CharacterBodyView<'a> {
        CharacterBodyView {
            world,
            handle: self.body,
        }
    }
}

pub struct CharacterBodyView<'a> {
    world: &'a mut PhysicsWorld,
    handle: RigidBodyHandle,
}

impl CharacterBodyView<'_> {
    fn body(&self) -> Option<&RigidBody> {
        self.world.bodies().get(self.handle)
    }
}

impl CharacterBody for CharacterBodyView<'_> {
    fn position(&self) -> Vector<Real> {
        self.body()
            .map(|body| *body.translation())
            .unwrap_or_else(Vector::zeros)
    }

    fn interpolated_position(&self) -> Vector<Real> {
        self.world
            .interpolated_translation(self.handle)
            .unwrap_or_else(Vector::zeros)
    }

    fn velocity(&self) -> Vector<Real> {
        self.body()
            .map(|body| *body.linvel())
            .unwrap_or_else(Vector::zeros)
    }

    fn set_position(&mut self, position: Vector<Real>) {
        self.world.teleport(self.handle, position);
    }

    fn set_velocity(&mut self, velocity: Vector<Real>) {
        if let Some(body) = self.world.body_mut(self.handle) {
            body.set_linvel(velocity, true);
        }
    }

    fn set_simulated(&mut self, simulated: bool) {
        if let Some(body) = self.world.body_mut(self.handle) {
            body.set_enabled(simulated);
        }
    }

    fn cast_ground_ray(&self, length: Real) -> GroundRay {
        match self
            .world
            .cast_down(self.position(), length, Some(self.handle))
        {
            Some(distance) => GroundRay {
                has_hit: true,
                distance,
            },
            None => GroundRay {
                has_hit: false,
                distance: length,
            },
        }
    }
}
