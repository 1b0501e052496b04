//! Character locomotion: input actions, spring-smoothed motion and the
//! locomotion state machine driving animation.
#![forbid(unsafe_code)]

pub mod action;
pub mod animation;
pub mod body;
pub mod character;
pub mod config;
pub mod kinematics;
pub mod state;

#[cfg(test)]
mod test_support;

pub use action::CharacterAction;
pub use animation::{
    AnimationError, AnimationMixer, ClipLibrary, MISSING_CLIP_DURATION, NO_MIXER_DURATION,
};
pub use body::{CharacterBody, GroundRay, PhysicsSignals};
pub use character::{Character, ModelTransform};
pub use config::{ConfigError, LocomotionConfig, SpringSettings};
pub use input_bindings::{ActionTable, Edge, InputCode};
pub use kinematics::{CharacterKinematics, Springs};
pub use state::{LocomotionState, Side, StartDirection, StateKind};
