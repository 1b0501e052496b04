//! Locomotion states and their transition rules.
//!
//! A state is a [`StateKind`] plus the timer and clip length captured when it
//! was entered. Every rule reads the held actions, the sampled physics
//! signals and the character kinematics through a [`StateContext`]; none of
//! them touch the physics body or the mixer directly.

use std::f32::consts::PI;

use input_bindings::ActionTable;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

use crate::action::CharacterAction;
use crate::body::PhysicsSignals;
use crate::config::LocomotionConfig;
use crate::kinematics::{
    local_movement_direction, signed_angle_about_up, view_relative, CharacterKinematics, Springs,
};

/// Smoothed local speed above which movement input resumes walking directly
/// instead of playing a start animation.
const RESUME_WALK_SPEED: Real = 0.5;
/// Heading error that turns an aborted start-walk into an in-place rotation.
const ROTATE_IN_PLACE_ANGLE: Real = 0.3;
const ROTATE_IN_PLACE_WINDOW: Real = 0.1;

const JUMP_IDLE_LAUNCH: Real = 0.2;
const JUMP_IDLE_LAND_CHECK: Real = 0.3;
const JUMP_RUNNING_LAUNCH: Real = 0.13;
const JUMP_RUNNING_LAND_CHECK: Real = 0.24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartDirection {
    Forward,
    Left,
    Right,
    Backward,
}

impl StartDirection {
    /// Picks the start animation from the signed angle between the current
    /// heading and the desired movement direction.
    pub fn from_angle(angle: Real) -> Self {
        if angle.abs() > PI * 0.8 {
            StartDirection::Backward
        } else if angle > PI * 0.3 {
            StartDirection::Left
        } else if angle < -PI * 0.3 {
            StartDirection::Right
        } else {
            StartDirection::Forward
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Idle,
    IdleRotate(Side),
    StartWalk(StartDirection),
    Walk,
    Run,
    Sprint,
    EndWalk,
    JumpIdle,
    JumpRunning,
    Falling,
    DropIdle,
    DropRunning,
    DropRolling,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clip {
    pub name: &'static str,
    pub fade_in: Real,
}

impl StateKind {
    pub fn name(self) -> &'static str {
        match self {
            StateKind::Idle => "Idle",
            StateKind::IdleRotate(Side::Left) => "IdleRotateLeft",
            StateKind::IdleRotate(Side::Right) => "IdleRotateRight",
            StateKind::StartWalk(StartDirection::Forward) => "StartWalkForward",
            StateKind::StartWalk(StartDirection::Left) => "StartWalkLeft",
            StateKind::StartWalk(StartDirection::Right) => "StartWalkRight",
            StateKind::StartWalk(StartDirection::Backward) => "StartWalkBackward",
            StateKind::Walk => "Walk",
            StateKind::Run => "Run",
            StateKind::Sprint => "Sprint",
            StateKind::EndWalk => "EndWalk",
            StateKind::JumpIdle => "JumpIdle",
            StateKind::JumpRunning => "JumpRunning",
            StateKind::Falling => "Falling",
            StateKind::DropIdle => "DropIdle",
            StateKind::DropRunning => "DropRunning",
            StateKind::DropRolling => "DropRolling",
        }
    }

    /// Entry clip and its fade-in.
    pub fn clip(self) -> Clip {
        let (name, fade_in) = match self {
            StateKind::Idle => ("idle", 0.1),
            StateKind::IdleRotate(Side::Left) => ("rotate_left", 0.1),
            StateKind::IdleRotate(Side::Right) => ("rotate_right", 0.1),
            StateKind::StartWalk(StartDirection::Forward) => ("start_forward", 0.1),
            StateKind::StartWalk(StartDirection::Left) => ("start_left", 0.1),
            StateKind::StartWalk(StartDirection::Right) => ("start_right", 0.1),
            StateKind::StartWalk(StartDirection::Backward) => ("start_back", 0.1),
            StateKind::Walk => ("walk", 0.1),
            StateKind::Run => ("run", 0.1),
            StateKind::Sprint => ("sprint", 0.1),
            StateKind::EndWalk => ("stop", 0.1),
            StateKind::JumpIdle => ("jump_idle", 0.1),
            StateKind::JumpRunning => ("jump_running", 0.03),
            StateKind::Falling => ("falling", 0.3),
            StateKind::DropIdle => ("drop_idle", 0.1),
            StateKind::DropRunning => ("drop_running", 0.1),
            StateKind::DropRolling => ("drop_running_roll", 0.03),
        };
        Clip { name, fade_in }
    }
}

/// Everything a state may read, plus the character quantities it may steer.
pub struct StateContext<'a> {
    pub actions: &'a ActionTable<CharacterAction>,
    pub signals: &'a PhysicsSignals,
    pub config: &'a LocomotionConfig,
    pub kinematics: &'a mut CharacterKinematics,
    pub springs: &'a mut Springs,
    /// Vertical speed of a requested jump, consumed by the next physics
    /// pre-step.
    pub pending_jump: &'a mut Option<Real>,
}

impl StateContext<'_> {
    fn pressed(&self, action: CharacterAction) -> bool {
        self.actions.is_pressed(action)
    }

    fn just_pressed(&self, action: CharacterAction) -> bool {
        self.actions.just_pressed(action)
    }

    fn movement_direction(&self) -> Vector<Real> {
        local_movement_direction(
            self.pressed(CharacterAction::Up),
            self.pressed(CharacterAction::Down),
            self.pressed(CharacterAction::Left),
            self.pressed(CharacterAction::Right),
        )
    }

    /// Movement direction resolved against the view heading.
    pub fn movement_vector(&self) -> Vector<Real> {
        view_relative(self.movement_direction(), self.kinematics.view_vector)
    }

    pub fn any_direction(&self) -> bool {
        self.movement_direction() != Vector::zeros()
    }

    pub fn no_direction(&self) -> bool {
        !self.any_direction()
    }

    fn face_movement(&mut self) {
        let movement = self.movement_vector();
        self.kinematics.set_orientation_target(movement);
    }

    fn steer_in_air(&mut self) {
        self.face_movement();
        let speed = if self.any_direction() {
            self.config.walk_speed
        } else {
            0.0
        };
        self.kinematics.set_forward_speed(speed);
    }

    fn local_speed(&self) -> Real {
        self.kinematics.velocity.norm()
    }

    fn falling(&self) -> bool {
        !self.signals.ray_has_hit
            && self.signals.body_velocity.y < self.config.fall_velocity_threshold
    }

    fn jump(&mut self, speed: Real) {
        *self.pending_jump = Some(speed);
    }

    /// Jump state chosen from the horizontal speed at the moment of the
    /// jump edge.
    fn jump_state(&self) -> StateKind {
        if self.signals.horizontal_speed() > self.config.running_speed_threshold {
            StateKind::JumpRunning
        } else {
            StateKind::JumpIdle
        }
    }

    fn start_walk(&self) -> StateKind {
        let angle = signed_angle_about_up(self.kinematics.orientation, self.movement_vector());
        StateKind::StartWalk(StartDirection::from_angle(angle))
    }

    fn moving_state(&self) -> StateKind {
        if self.pressed(CharacterAction::Run) {
            StateKind::Run
        } else if self.local_speed() > RESUME_WALK_SPEED {
            StateKind::Walk
        } else {
            self.start_walk()
        }
    }

    /// Landing state chosen from the impact and the horizontal speed.
    fn drop_state(&self) -> StateKind {
        if self.signals.ground_impact_velocity.y < self.config.roll_impact_velocity {
            StateKind::DropRolling
        } else if self.signals.horizontal_speed() > self.config.running_speed_threshold {
            StateKind::DropRunning
        } else {
            StateKind::DropIdle
        }
    }

    fn landed(&self) -> bool {
        self.signals.ray_has_hit && self.signals.body_velocity.y <= 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocomotionState {
    kind: StateKind,
    timer: Real,
    animation_length: Real,
    jumped: bool,
}

impl LocomotionState {
    /// Applies the entry tuning of `kind`. The clip length is filled in by
    /// the caller once the entry clip has been started.
    pub fn enter(kind: StateKind, ctx: &mut StateContext<'_>) -> Self {
        ctx.springs.restore_defaults();
        ctx.kinematics.velocity_is_additive = false;
        ctx.kinematics.velocity_influence = Vector::new(1.0, 0.0, 1.0);

        let config = ctx.config;
        match kind {
            StateKind::Idle => {
                ctx.springs.tune_velocity(10.0, 0.6);
                ctx.kinematics.set_forward_speed(0.0);
            }
            StateKind::IdleRotate(_) => {
                ctx.springs.tune_rotation(30.0, 0.6);
                ctx.springs.tune_velocity(10.0, 0.6);
                ctx.kinematics.set_forward_speed(0.0);
            }
            StateKind::StartWalk(_) => {
                ctx.springs.tune_rotation(20.0, 0.7);
                ctx.kinematics.set_forward_speed(config.walk_speed);
            }
            StateKind::Walk | StateKind::DropRunning => {
                ctx.kinematics.set_forward_speed(config.walk_speed);
            }
            StateKind::Run => {
                ctx.kinematics.set_forward_speed(config.run_speed);
            }
            StateKind::Sprint => {
                ctx.springs.tune_velocity_mass(10.0);
                ctx.springs.tune_rotation(50.0, 0.8);
                ctx.kinematics.set_forward_speed(config.sprint_speed);
            }
            StateKind::EndWalk => {
                ctx.kinematics.set_forward_speed(0.0);
            }
            StateKind::JumpIdle => {
                ctx.springs.tune_velocity_mass(50.0);
                ctx.kinematics.set_forward_speed(0.0);
            }
            StateKind::JumpRunning => {
                ctx.springs.tune_velocity_mass(100.0);
            }
            StateKind::Falling => {
                ctx.springs.tune_velocity_mass(100.0);
                ctx.springs.tune_rotation_damping(0.3);
                ctx.kinematics.velocity_is_additive = true;
                ctx.kinematics.velocity_influence = Vector::new(0.05, 0.0, 0.05);
            }
            StateKind::DropIdle => {
                ctx.springs.tune_velocity(7.0, 0.5);
                ctx.kinematics.set_forward_speed(0.0);
            }
            StateKind::DropRolling => {
                ctx.springs.tune_velocity(1.0, 0.6);
                ctx.kinematics.set_forward_speed(config.walk_speed);
            }
        }

        Self {
            kind,
            timer: 0.0,
            animation_length: 0.0,
            jumped: false,
        }
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn timer(&self) -> Real {
        self.timer
    }

    pub fn animation_length(&self) -> Real {
        self.animation_length
    }

    pub fn set_animation_length(&mut self, length: Real) {
        self.animation_length = length;
    }

    /// True once the entry clip has (almost) finished. A missing mixer
    /// reports a negative length, so the clip counts as ended.
    pub fn animation_ended(&self, dt: Real) -> bool {
        self.timer > self.animation_length - dt
    }

    /// Like [`Self::animation_ended`], but a missing mixer or clip never
    /// ends the state.
    fn timed_clip_ended(&self, dt: Real) -> bool {
        self.animation_length > 0.0 && self.animation_ended(dt)
    }

    /// Per-step behavior. Returns the state to switch to, if any.
    pub fn update(&mut self, ctx: &mut StateContext<'_>, dt: Real) -> Option<StateKind> {
        self.timer += dt;

        match self.kind {
            StateKind::Idle => ctx.falling().then_some(StateKind::Falling),
            StateKind::IdleRotate(_) => {
                if self.animation_ended(dt) {
                    Some(StateKind::Idle)
                } else {
                    ctx.falling().then_some(StateKind::Falling)
                }
            }
            StateKind::StartWalk(_) => {
                ctx.face_movement();
                if self.animation_ended(dt) {
                    Some(if ctx.pressed(CharacterAction::Run) {
                        StateKind::Run
                    } else {
                        StateKind::Walk
                    })
                } else {
                    ctx.falling().then_some(StateKind::Falling)
                }
            }
            StateKind::Walk | StateKind::Sprint => {
                ctx.face_movement();
                ctx.falling().then_some(StateKind::Falling)
            }
            StateKind::Run => {
                ctx.face_movement();
                if ctx.falling() {
                    Some(StateKind::Falling)
                } else if self.timer >= ctx.config.sprint_delay {
                    Some(StateKind::Sprint)
                } else {
                    None
                }
            }
            StateKind::EndWalk => {
                if self.animation_ended(dt) {
                    Some(StateKind::Idle)
                } else {
                    ctx.falling().then_some(StateKind::Falling)
                }
            }
            StateKind::JumpIdle => {
                ctx.steer_in_air();
                if !self.jumped && self.timer > JUMP_IDLE_LAUNCH {
                    ctx.jump(ctx.config.jump_speed);
                    self.jumped = true;
                    ctx.springs.tune_velocity_mass(100.0);
                    ctx.springs.tune_rotation_damping(0.3);
                    ctx.kinematics.velocity_influence = Vector::new(0.3, 0.0, 0.3);
                    None
                } else {
                    self.airborne_transition(ctx, dt, JUMP_IDLE_LAND_CHECK)
                }
            }
            StateKind::JumpRunning => {
                ctx.face_movement();
                if self.jumped {
                    ctx.steer_in_air();
                }
                if !self.jumped && self.timer > JUMP_RUNNING_LAUNCH {
                    ctx.jump(ctx.config.jump_speed);
                    self.jumped = true;
                    ctx.springs.tune_rotation_damping(0.3);
                    ctx.kinematics.velocity_is_additive = true;
                    ctx.kinematics.velocity_influence = Vector::new(0.05, 0.0, 0.05);
                    None
                } else {
                    self.airborne_transition(ctx, dt, JUMP_RUNNING_LAND_CHECK)
                }
            }
            StateKind::Falling => {
                ctx.steer_in_air();
                ctx.signals.ray_has_hit.then(|| ctx.drop_state())
            }
            StateKind::DropIdle => {
                ctx.face_movement();
                if self.animation_ended(dt) {
                    Some(StateKind::Idle)
                } else {
                    ctx.falling().then_some(StateKind::Falling)
                }
            }
            StateKind::DropRunning => {
                ctx.face_movement();
                if self.animation_ended(dt) {
                    Some(if ctx.pressed(CharacterAction::Run) {
                        StateKind::Run
                    } else {
                        StateKind::Walk
                    })
                } else {
                    ctx.falling().then_some(StateKind::Falling)
                }
            }
            StateKind::DropRolling => {
                ctx.face_movement();
                if !self.animation_ended(dt) {
                    None
                } else if ctx.any_direction() {
                    Some(StateKind::Walk)
                } else {
                    Some(StateKind::EndWalk)
                }
            }
        }
    }

    fn airborne_transition(
        &self,
        ctx: &StateContext<'_>,
        dt: Real,
        land_check: Real,
    ) -> Option<StateKind> {
        if !self.jumped {
            None
        } else if self.timer > land_check && ctx.landed() {
            Some(ctx.drop_state())
        } else if self.timed_clip_ended(dt) || ctx.falling() {
            Some(StateKind::Falling)
        } else {
            None
        }
    }

    /// Reaction to an input edge (or to the inputs held when the state was
    /// entered). Edges are only visible while this runs.
    pub fn on_input_change(&self, ctx: &StateContext<'_>) -> Option<StateKind> {
        let jump = ctx.just_pressed(CharacterAction::Jump);
        match self.kind {
            StateKind::Idle | StateKind::IdleRotate(_) => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.any_direction() {
                    Some(ctx.moving_state())
                } else {
                    None
                }
            }
            StateKind::StartWalk(_) => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.no_direction() {
                    Some(self.abort_start(ctx))
                } else if ctx.just_pressed(CharacterAction::Run) {
                    Some(StateKind::Run)
                } else {
                    None
                }
            }
            StateKind::Walk => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.no_direction() {
                    Some(StateKind::EndWalk)
                } else if ctx.pressed(CharacterAction::Run) {
                    Some(StateKind::Run)
                } else {
                    None
                }
            }
            StateKind::Run | StateKind::Sprint => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.no_direction() {
                    Some(StateKind::EndWalk)
                } else if !ctx.pressed(CharacterAction::Run) {
                    Some(StateKind::Walk)
                } else {
                    None
                }
            }
            StateKind::EndWalk | StateKind::DropIdle => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.any_direction() {
                    Some(ctx.moving_state())
                } else {
                    None
                }
            }
            StateKind::DropRunning => {
                if jump {
                    Some(ctx.jump_state())
                } else if ctx.no_direction() {
                    Some(StateKind::EndWalk)
                } else if ctx.just_pressed(CharacterAction::Run) {
                    Some(StateKind::Run)
                } else {
                    None
                }
            }
            StateKind::JumpIdle
            | StateKind::JumpRunning
            | StateKind::Falling
            | StateKind::DropRolling => None,
        }
    }

    fn abort_start(&self, ctx: &StateContext<'_>) -> StateKind {
        if self.timer < ROTATE_IN_PLACE_WINDOW {
            let angle = signed_angle_about_up(
                ctx.kinematics.orientation,
                ctx.kinematics.orientation_target,
            );
            if angle > ROTATE_IN_PLACE_ANGLE {
                return StateKind::IdleRotate(Side::Left);
            }
            if angle < -ROTATE_IN_PLACE_ANGLE {
                return StateKind::IdleRotate(Side::Right);
            }
        }
        StateKind::Idle
    }
}
