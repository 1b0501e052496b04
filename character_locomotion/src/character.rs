//! Character coordinator: owns the motion state, routes input into the
//! locomotion states and exchanges data with the physics body and mixer.

use input_bindings::{ActionTable, InputCode};
use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::Real;

use crate::action::CharacterAction;
use crate::animation::{play_or_sentinel, AnimationMixer, ClipLibrary};
use crate::body::{CharacterBody, PhysicsSignals};
use crate::config::{ConfigError, LocomotionConfig};
use crate::kinematics::{
    flatten, rotate_about_up, signed_angle_about_up, yaw_of, CharacterKinematics, Springs,
};
use crate::state::{LocomotionState, StateContext, StateKind};

/// Hook transitions followed after a state change before giving up.
const MAX_CHAINED_TRANSITIONS: usize = 8;

/// Pose of the visual model: feet position and facing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    pub translation: Vector<Real>,
    pub rotation: Rotation<Real>,
}

/// Everything the states read or steer except the action table. Kept out
/// of the state itself so both can be borrowed at once.
struct Motion {
    config: LocomotionConfig,
    signals: PhysicsSignals,
    kinematics: CharacterKinematics,
    springs: Springs,
    pending_jump: Option<Real>,
}

impl Motion {
    fn context<'a>(&'a mut self, actions: &'a ActionTable<CharacterAction>) -> StateContext<'a> {
        StateContext {
            actions,
            signals: &self.signals,
            config: &self.config,
            kinematics: &mut self.kinematics,
            springs: &mut self.springs,
            pending_jump: &mut self.pending_jump,
        }
    }
}

/// Mixer slot and the clip last requested from it.
struct Animation<M> {
    mixer: Option<M>,
    requested: Option<(String, Real)>,
}

impl<M: AnimationMixer> Animation<M> {
    fn play(&mut self, name: &str, fade_in: Real) -> Real {
        self.requested = Some((name.to_string(), fade_in));
        play_or_sentinel(self.mixer.as_mut(), name, fade_in)
    }
}

/// Everything a state change touches. Holds the action table by shared
/// reference so it can run inside an input hook while the edge is raised.
struct Transitions<'a, M> {
    actions: &'a ActionTable<CharacterAction>,
    motion: &'a mut Motion,
    state: &'a mut LocomotionState,
    animation: &'a mut Animation<M>,
}

impl<M: AnimationMixer> Transitions<'_, M> {
    fn on_input_change(&mut self) {
        let next = self.state.on_input_change(&self.motion.context(self.actions));
        if let Some(next) = next {
            self.set_state(next);
        }
    }

    fn set_state(&mut self, kind: StateKind) {
        let mut next = Some(kind);
        let mut depth = 0;
        while let Some(kind) = next {
            if depth == MAX_CHAINED_TRANSITIONS {
                log::warn!(
                    "dropping transition to {} after {depth} chained transitions",
                    kind.name()
                );
                return;
            }
            depth += 1;
            log::debug!("locomotion {} -> {}", self.state.kind().name(), kind.name());
            self.install(kind);
            next = self.state.on_input_change(&self.motion.context(self.actions));
        }
    }

    fn install(&mut self, kind: StateKind) {
        *self.state = LocomotionState::enter(kind, &mut self.motion.context(self.actions));
        let clip = kind.clip();
        let length = self.animation.play(clip.name, clip.fade_in);
        self.state.set_animation_length(length);
    }
}

pub struct Character<M: AnimationMixer = ClipLibrary> {
    actions: ActionTable<CharacterAction>,
    motion: Motion,
    state: LocomotionState,
    animation: Animation<M>,
    position: Vector<Real>,
    physics_enabled: bool,
    model: Option<ModelTransform>,
}

impl<M: AnimationMixer> Character<M> {
    /// Builds a character in the Idle state with no mixer and no model.
    pub fn new(config: LocomotionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let springs = Springs::from_config(&config)?;
        let actions = config.action_table();
        let mut motion = Motion {
            config,
            signals: PhysicsSignals::default(),
            kinematics: CharacterKinematics::default(),
            springs,
            pending_jump: None,
        };
        let state = LocomotionState::enter(StateKind::Idle, &mut motion.context(&actions));
        let mut character = Self {
            actions,
            motion,
            state,
            animation: Animation {
                mixer: None,
                requested: None,
            },
            position: Vector::zeros(),
            physics_enabled: true,
            model: None,
        };
        let clip = StateKind::Idle.clip();
        let length = character.set_animation(clip.name, clip.fade_in);
        character.state.set_animation_length(length);
        Ok(character)
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.motion.config
    }

    pub fn actions(&self) -> &ActionTable<CharacterAction> {
        &self.actions
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn state_kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn kinematics(&self) -> &CharacterKinematics {
        &self.motion.kinematics
    }

    pub fn springs(&self) -> &Springs {
        &self.motion.springs
    }

    pub fn signals(&self) -> &PhysicsSignals {
        &self.motion.signals
    }

    /// Last position pulled from (or pushed to) the body.
    pub fn position(&self) -> Vector<Real> {
        self.position
    }

    pub fn physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn mixer(&self) -> Option<&M> {
        self.animation.mixer.as_ref()
    }

    pub fn mixer_mut(&mut self) -> Option<&mut M> {
        self.animation.mixer.as_mut()
    }

    pub fn model(&self) -> Option<&ModelTransform> {
        self.model.as_ref()
    }

    /// Name and fade-in of the last clip requested.
    pub fn animation(&self) -> Option<(&str, Real)> {
        self.animation
            .requested
            .as_ref()
            .map(|(name, fade_in)| (name.as_str(), *fade_in))
    }

    pub fn wants_to_jump(&self) -> bool {
        self.motion.pending_jump.is_some()
    }

    /// Runs one frame. The body is only written when physics is disabled;
    /// velocity commands go through [`Self::apply_velocity_command`].
    pub fn update(&mut self, dt: Real, body: &mut impl CharacterBody) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.sample_signals(&*body);

        let next = self
            .state
            .update(&mut self.motion.context(&self.actions), dt);
        if let Some(next) = next {
            self.set_state(next);
        }

        if self.physics_enabled {
            self.spring_movement(dt);
            self.spring_rotation(dt);
        }

        self.sync_model(&*body);

        if let Some(mixer) = self.animation.mixer.as_mut() {
            mixer.update(dt);
        }

        if self.physics_enabled {
            self.position = body.interpolated_position();
        } else {
            body.set_position(self.position);
        }
    }

    fn sample_signals(&mut self, body: &impl CharacterBody) {
        let signals = &mut self.motion.signals;
        if self.physics_enabled {
            let ray = body.cast_ground_ray(self.motion.config.ground_probe_length());
            signals.ray_has_hit = ray.has_hit;
            signals.ray_hit_distance = ray.distance;
            signals.body_velocity = body.velocity();
            signals.body_position = body.position();
        } else {
            signals.ray_has_hit = true;
            signals.ray_hit_distance = self.motion.config.height;
            signals.body_velocity = Vector::zeros();
            signals.body_position = self.position;
        }
    }

    fn spring_movement(&mut self, dt: Real) {
        let kinematics = &mut self.motion.kinematics;
        let spring = &mut self.motion.springs.velocity;
        spring.target = kinematics.velocity_target;
        spring.simulate(dt);
        kinematics.velocity = spring.position;
        kinematics.acceleration = spring.velocity;
    }

    fn spring_rotation(&mut self, dt: Real) {
        let kinematics = &mut self.motion.kinematics;
        let spring = &mut self.motion.springs.rotation;
        spring.target = signed_angle_about_up(kinematics.orientation, kinematics.orientation_target);
        spring.simulate(dt);
        let rotated = rotate_about_up(kinematics.orientation, spring.position);
        kinematics.orientation = flatten(rotated).unwrap_or(kinematics.orientation);
        kinematics.angular_velocity = spring.velocity;
    }

    fn sync_model(&mut self, body: &impl CharacterBody) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let origin = if self.physics_enabled {
            body.interpolated_position()
        } else {
            self.position
        };
        model.translation = origin - Vector::new(0.0, self.motion.config.height, 0.0);
        model.rotation = Rotation::from_axis_angle(
            &Vector::y_axis(),
            yaw_of(self.motion.kinematics.orientation),
        );
    }

    /// Physics pre-step: turns the smoothed local velocity into the body's
    /// velocity and consumes a pending jump.
    pub fn apply_velocity_command(&mut self, body: &mut impl CharacterBody) {
        if !self.physics_enabled {
            return;
        }
        let config = &self.motion.config;
        let kinematics = &self.motion.kinematics;
        let current = body.velocity();

        if !body.cast_ground_ray(config.ground_probe_length()).has_hit {
            self.motion.signals.ground_impact_velocity = current;
        }

        let arcade = kinematics.local_to_world(kinematics.velocity * config.move_speed);
        let influence = kinematics.velocity_influence;
        let mut next = if kinematics.velocity_is_additive {
            let target = kinematics.local_to_world(kinematics.velocity_target * config.move_speed);
            let mut next = current;
            for axis in 0..3 {
                let below_target = current[axis].abs() < target[axis].abs();
                let opposing = current[axis] * arcade[axis] < 0.0;
                if below_target || opposing {
                    next[axis] += arcade[axis] * influence[axis];
                }
            }
            next
        } else {
            current + (arcade - current).component_mul(&influence)
        };

        if let Some(speed) = self.motion.pending_jump.take() {
            next.y = speed;
        }

        body.set_velocity(next);
    }

    fn transitions(&mut self) -> Transitions<'_, M> {
        Transitions {
            actions: &self.actions,
            motion: &mut self.motion,
            state: &mut self.state,
            animation: &mut self.animation,
        }
    }

    /// Switches state, plays its clip and runs its input hook, following
    /// chained hook transitions up to a fixed depth.
    pub fn set_state(&mut self, kind: StateKind) {
        self.transitions().set_state(kind);
    }

    /// Runs the current state's input hook against the held actions.
    pub fn on_input_change(&mut self) {
        self.transitions().on_input_change();
    }

    /// Feeds a raw input event. Returns the number of action edges raised.
    pub fn handle_input_event(&mut self, code: InputCode, pressed: bool) -> usize {
        let Self {
            actions,
            motion,
            state,
            animation,
            ..
        } = self;
        actions.handle_event(code, pressed, |actions, _, _| {
            Transitions {
                actions,
                motion: &mut *motion,
                state: &mut *state,
                animation: &mut *animation,
            }
            .on_input_change();
        })
    }

    /// Releases every held action, e.g. when the window loses focus.
    pub fn release_all_inputs(&mut self) -> usize {
        let Self {
            actions,
            motion,
            state,
            animation,
            ..
        } = self;
        actions.release_all(|actions, _, _| {
            Transitions {
                actions,
                motion: &mut *motion,
                state: &mut *state,
                animation: &mut *animation,
            }
            .on_input_change();
        })
    }

    /// Plays `name` on the mixer and returns its duration, `0.0` when the
    /// clip is missing and `-1.0` when no mixer is attached.
    pub fn set_animation(&mut self, name: &str, fade_in: Real) -> Real {
        self.animation.play(name, fade_in)
    }

    /// Attaches the mixer once the model is loaded and replays the clip last
    /// requested. A replayed entry clip also times the current state.
    pub fn attach_mixer(&mut self, mixer: M) {
        self.animation.mixer = Some(mixer);
        let Some((name, fade_in)) = self.animation.requested.clone() else {
            return;
        };
        let length = self.animation.play(&name, fade_in);
        if name == self.state.kind().clip().name {
            self.state.set_animation_length(length);
        }
    }

    pub fn attach_model(&mut self) {
        self.model = Some(ModelTransform {
            translation: self.position - Vector::new(0.0, self.motion.config.height, 0.0),
            rotation: Rotation::from_axis_angle(
                &Vector::y_axis(),
                yaw_of(self.motion.kinematics.orientation),
            ),
        });
    }

    pub fn detach_model(&mut self) {
        self.model = None;
    }

    /// Adds the body to or removes it from the simulation. While disabled the
    /// character keeps its last known position.
    pub fn set_physics_enabled(&mut self, enabled: bool, body: &mut impl CharacterBody) {
        if enabled == self.physics_enabled {
            return;
        }
        if enabled {
            body.set_position(self.position);
        } else {
            self.position = body.position();
        }
        body.set_simulated(enabled);
        self.physics_enabled = enabled;
    }

    pub fn set_position(&mut self, position: Vector<Real>, body: &mut impl CharacterBody) {
        self.position = position;
        body.set_position(position);
    }

    pub fn feet_position(&self, body: &impl CharacterBody) -> Vector<Real> {
        body.position() - Vector::new(0.0, self.motion.config.height, 0.0)
    }

    pub fn reset_velocity(&mut self, body: &mut impl CharacterBody) {
        let kinematics = &mut self.motion.kinematics;
        kinematics.velocity = Vector::zeros();
        kinematics.velocity_target = Vector::zeros();
        kinematics.acceleration = Vector::zeros();
        self.motion.springs.velocity.reset(Vector::zeros());
        body.set_velocity(Vector::zeros());
    }

    /// Settles the heading on the current orientation.
    pub fn reset_orientation(&mut self) {
        let kinematics = &mut self.motion.kinematics;
        kinematics.orientation_target = kinematics.orientation;
        kinematics.angular_velocity = 0.0;
        self.motion.springs.rotation.reset();
    }

    pub fn set_velocity_target(&mut self, target: Vector<Real>) {
        self.motion.kinematics.velocity_target = target;
    }

    /// Returns false (and keeps the old target) for zero or vertical input.
    pub fn set_orientation_target(&mut self, direction: Vector<Real>) -> bool {
        self.motion.kinematics.set_orientation_target(direction)
    }

    pub fn set_view_vector(&mut self, view: Vector<Real>) {
        self.motion.kinematics.view_vector = view;
    }

    pub fn set_velocity_influence(&mut self, influence: Vector<Real>) {
        self.motion.kinematics.velocity_influence = influence;
    }

    pub fn jump(&mut self) {
        self.jump_with_speed(self.motion.config.jump_speed);
    }

    pub fn jump_with_speed(&mut self, speed: Real) {
        self.motion.pending_jump = Some(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{MISSING_CLIP_DURATION, NO_MIXER_DURATION};
    use crate::state::StartDirection;
    use crate::test_support::MockBody;

    const DT: Real = 1.0 / 60.0;

    fn clips() -> ClipLibrary {
        [
            ("idle", 2.0),
            ("start_forward", 0.5),
            ("start_left", 0.5),
            ("start_right", 0.5),
            ("start_back", 0.6),
            ("walk", 1.0),
            ("run", 0.8),
            ("sprint", 0.7),
            ("stop", 0.4),
            ("jump_idle", 1.5),
            ("jump_running", 1.2),
            ("falling", 1.0),
            ("drop_idle", 0.4),
            ("drop_running", 0.5),
            ("drop_running_roll", 0.9),
        ]
        .into_iter()
        .fold(ClipLibrary::new(), |library, (name, duration)| {
            library.with_clip(name, duration)
        })
    }

    fn setup() -> (Character, MockBody) {
        let config = LocomotionConfig::default();
        let body = MockBody::standing(config.height);
        let mut character: Character = Character::new(config).unwrap();
        character.attach_mixer(clips());
        (character, body)
    }

    fn step(character: &mut Character, body: &mut MockBody) {
        character.update(DT, body);
        character.apply_velocity_command(body);
        body.step(DT);
    }

    fn step_until(
        character: &mut Character,
        body: &mut MockBody,
        frames: usize,
        done: impl Fn(&Character) -> bool,
    ) -> bool {
        for _ in 0..frames {
            step(character, body);
            if done(character) {
                return true;
            }
        }
        false
    }

    #[test]
    fn starts_idle_and_plays_idle_clip() {
        let (character, _) = setup();
        assert_eq!(character.state_kind(), StateKind::Idle);
        assert_eq!(character.state().animation_length(), 2.0);
        let active = character.mixer().and_then(ClipLibrary::active);
        assert_eq!(active.map(|clip| clip.name.as_str()), Some("idle"));
    }

    #[test]
    fn idle_start_walk_then_walk() {
        let (mut character, mut body) = setup();
        assert_eq!(character.handle_input_event(InputCode::KeyW, true), 1);
        assert_eq!(
            character.state_kind(),
            StateKind::StartWalk(StartDirection::Forward)
        );
        assert_eq!(character.state().animation_length(), 0.5);

        for _ in 0..25 {
            step(&mut character, &mut body);
        }
        assert!(matches!(character.state_kind(), StateKind::StartWalk(_)));
        assert!(step_until(&mut character, &mut body, 10, |c| {
            c.state_kind() == StateKind::Walk
        }));
        assert!(body.position.z > 0.1);
        assert!(body.velocity.z > 0.0);
        character.update(DT, &mut body);
        assert_eq!(character.position(), body.position);
    }

    #[test]
    fn repeated_press_raises_no_edge() {
        let (mut character, _) = setup();
        assert_eq!(character.handle_input_event(InputCode::KeyW, true), 1);
        let state = character.state_kind();
        assert_eq!(character.handle_input_event(InputCode::KeyW, true), 0);
        assert_eq!(character.state_kind(), state);
        assert_eq!(character.handle_input_event(InputCode::KeyQ, true), 0);
    }

    #[test]
    fn walking_off_a_ledge_falls_then_lands_running() {
        let (mut character, mut body) = setup();
        character.handle_input_event(InputCode::KeyW, true);
        assert!(step_until(&mut character, &mut body, 60, |c| {
            c.state_kind() == StateKind::Walk
        }));

        body.ground = None;
        assert!(step_until(&mut character, &mut body, 60, |c| {
            c.state_kind() == StateKind::Falling
        }));
        assert!(character.kinematics().velocity_is_additive);

        body.ground = Some(body.position.y - character.config().height - 0.3);
        assert!(step_until(&mut character, &mut body, 60, |c| {
            c.state_kind() != StateKind::Falling
        }));
        assert_eq!(character.state_kind(), StateKind::DropRunning);
    }

    #[test]
    fn short_drop_from_idle_lands_idle() {
        let (mut character, mut body) = setup();
        body.position.y += 1.0;
        assert!(step_until(&mut character, &mut body, 60, |c| {
            c.state_kind() == StateKind::Falling
        }));
        assert!(step_until(&mut character, &mut body, 120, |c| {
            c.state_kind() != StateKind::Falling
        }));
        assert_eq!(character.state_kind(), StateKind::DropIdle);
        assert!(character.signals().ground_impact_velocity.y > -6.0);
    }

    #[test]
    fn long_drop_rolls() {
        let (mut character, mut body) = setup();
        body.position.y += 4.0;
        assert!(step_until(&mut character, &mut body, 240, |c| {
            matches!(
                c.state_kind(),
                StateKind::DropIdle | StateKind::DropRunning | StateKind::DropRolling
            )
        }));
        assert_eq!(character.state_kind(), StateKind::DropRolling);
    }

    #[test]
    fn jump_edge_issues_one_jump_command() {
        let (mut character, mut body) = setup();
        let start_y = body.position.y;
        character.handle_input_event(InputCode::Space, true);
        assert_eq!(character.state_kind(), StateKind::JumpIdle);

        let mut commands = 0;
        let mut peak = start_y;
        for _ in 0..90 {
            character.update(DT, &mut body);
            if character.wants_to_jump() {
                commands += 1;
            }
            character.apply_velocity_command(&mut body);
            assert!(!character.wants_to_jump());
            body.step(DT);
            peak = peak.max(body.position.y);
        }
        assert_eq!(commands, 1);
        assert!(peak > start_y + 0.5);
        assert_eq!(character.handle_input_event(InputCode::Space, true), 0);
    }

    #[test]
    fn jump_without_mixer_issues_one_command() {
        let config = LocomotionConfig::default();
        let mut body = MockBody::standing(config.height);
        let mut character: Character = Character::new(config).unwrap();
        let start_y = body.position.y;
        character.handle_input_event(InputCode::Space, true);
        assert_eq!(character.state_kind(), StateKind::JumpIdle);
        assert_eq!(character.state().animation_length(), NO_MIXER_DURATION);

        let mut commands = 0;
        let mut peak = start_y;
        for _ in 0..90 {
            character.update(DT, &mut body);
            if character.wants_to_jump() {
                commands += 1;
            }
            character.apply_velocity_command(&mut body);
            body.step(DT);
            peak = peak.max(body.position.y);
        }
        assert_eq!(commands, 1);
        assert!(peak > start_y + 0.5);
        assert_eq!(character.state_kind(), StateKind::Idle);
    }

    #[test]
    fn jump_during_a_long_start_walk_runs() {
        let config = LocomotionConfig::default();
        let mut body = MockBody::standing(config.height);
        let mut character: Character = Character::new(config).unwrap();
        character.attach_mixer(clips().with_clip("start_forward", 2.0));
        character.handle_input_event(InputCode::KeyW, true);
        for _ in 0..100 {
            step(&mut character, &mut body);
        }
        assert!(matches!(character.state_kind(), StateKind::StartWalk(_)));
        assert!(character.signals().horizontal_speed() > character.config().running_speed_threshold);

        character.handle_input_event(InputCode::Space, true);
        assert_eq!(character.state_kind(), StateKind::JumpRunning);
    }

    #[test]
    fn late_mixer_times_the_current_state() {
        let config = LocomotionConfig::default();
        let mut body = MockBody::standing(config.height);
        let mut character: Character = Character::new(config).unwrap();
        character.handle_input_event(InputCode::KeyW, true);
        assert_eq!(character.state().animation_length(), NO_MIXER_DURATION);

        character.attach_mixer(clips());
        assert_eq!(character.state().animation_length(), 0.5);
        step(&mut character, &mut body);
        assert_eq!(
            character.state_kind(),
            StateKind::StartWalk(StartDirection::Forward)
        );
    }

    #[test]
    fn spring_errors_name_the_rejected_spring() {
        let mut config = LocomotionConfig::default();
        config.rotation_spring.mass = -1.0;
        let err = Character::<ClipLibrary>::new(config).err();
        assert!(matches!(
            err,
            Some(ConfigError::Spring {
                name: "rotation",
                ..
            })
        ));
    }

    #[test]
    fn identical_inputs_replay_identically() {
        fn run() -> Vec<Vector<Real>> {
            let (mut character, mut body) = setup();
            let mut trace = Vec::new();
            for frame in 0..180 {
                match frame {
                    10 => {
                        character.handle_input_event(InputCode::KeyW, true);
                    }
                    40 => {
                        character.handle_input_event(InputCode::KeyA, true);
                    }
                    70 => {
                        character.handle_input_event(InputCode::Space, true);
                    }
                    120 => {
                        character.release_all_inputs();
                    }
                    _ => {}
                }
                step(&mut character, &mut body);
                trace.push(body.position);
                trace.push(character.kinematics().orientation);
            }
            trace
        }
        assert_eq!(run(), run());
    }

    #[test]
    fn physics_disable_enable_round_trip() {
        let (mut character, mut body) = setup();
        character.handle_input_event(InputCode::KeyW, true);
        for _ in 0..30 {
            step(&mut character, &mut body);
        }
        character.set_physics_enabled(false, &mut body);
        assert!(!body.simulated);
        let held = character.position();

        body.ground = None;
        for _ in 0..30 {
            step(&mut character, &mut body);
        }
        assert_eq!(body.position, held);
        assert_eq!(character.position(), held);
        assert!(!matches!(character.state_kind(), StateKind::Falling));

        body.ground = Some(0.0);
        character.set_physics_enabled(true, &mut body);
        assert!(body.simulated);
        assert_eq!(body.position, held);
    }

    #[test]
    fn missing_mixer_and_clip_sentinels() {
        let config = LocomotionConfig::default();
        let mut body = MockBody::standing(config.height);
        let mut character: Character = Character::new(config).unwrap();
        assert_eq!(character.set_animation("idle", 0.1), NO_MIXER_DURATION);

        character.handle_input_event(InputCode::KeyW, true);
        assert!(matches!(character.state_kind(), StateKind::StartWalk(_)));
        step(&mut character, &mut body);
        assert_eq!(character.state_kind(), StateKind::Walk);

        character.attach_mixer(ClipLibrary::new().with_clip("walk", 1.0));
        assert_eq!(character.set_animation("wave", 0.2), MISSING_CLIP_DURATION);
        assert_eq!(character.animation(), Some(("wave", 0.2)));
    }

    #[test]
    fn attached_mixer_replays_requested_clip() {
        let config = LocomotionConfig::default();
        let mut character: Character = Character::new(config).unwrap();
        character.attach_mixer(clips());
        let played = character.mixer().map(ClipLibrary::played);
        assert_eq!(played, Some(&["idle".to_string()][..]));
    }

    #[test]
    fn model_follows_body_feet_and_heading() {
        let (mut character, mut body) = setup();
        step(&mut character, &mut body);
        assert!(character.model().is_none());

        character.attach_model();
        character.set_orientation_target(Vector::new(1.0, 0.0, 0.0));
        for _ in 0..120 {
            step(&mut character, &mut body);
        }
        let model = character.model().copied().unwrap();
        assert!((model.translation - character.feet_position(&body)).norm() < 1.0e-5);
        let facing = model.rotation * Vector::new(0.0, 0.0, 1.0);
        assert!((facing - Vector::new(1.0, 0.0, 0.0)).norm() < 1.0e-2);
    }

    #[test]
    fn releasing_movement_ends_walk() {
        let (mut character, mut body) = setup();
        character.handle_input_event(InputCode::KeyW, true);
        step_until(&mut character, &mut body, 60, |c| c.state_kind() == StateKind::Walk);
        assert_eq!(character.state_kind(), StateKind::Walk);
        assert_eq!(character.release_all_inputs(), 1);
        assert_eq!(character.state_kind(), StateKind::EndWalk);
        assert!(step_until(&mut character, &mut body, 60, |c| {
            c.state_kind() == StateKind::Idle
        }));
    }

    #[test]
    fn reset_velocity_and_orientation_settle_motion() {
        let (mut character, mut body) = setup();
        character.set_velocity_target(Vector::new(0.0, 0.0, 1.0));
        character.set_orientation_target(Vector::new(-1.0, 0.0, 0.0));
        for _ in 0..10 {
            step(&mut character, &mut body);
        }
        character.reset_velocity(&mut body);
        character.reset_orientation();
        assert_eq!(character.kinematics().velocity, Vector::zeros());
        assert_eq!(body.velocity, Vector::zeros());
        assert_eq!(
            character.kinematics().orientation_target,
            character.kinematics().orientation
        );
        assert!(!character.set_orientation_target(Vector::zeros()));
    }
}
