//! Scripted input timelines replayed against a rapier world.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use character_locomotion::{
    Character, ClipLibrary, ConfigError, InputCode, LocomotionConfig, StateKind,
};
use physics_rapier::{CapsuleShape, PhysicsWorld, RapierCharacterBody};
use rapier3d::prelude::*;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("dt must be positive, got {0}")]
    Dt(Real),
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScriptEvent {
    pub frame: u32,
    pub code: InputCode,
    pub pressed: bool,
}

/// Axis-aligned slab whose top face sits at `top`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Slab {
    pub center: [Real; 2],
    pub half_extents: [Real; 2],
    pub top: Real,
}

impl Slab {
    fn collider(&self) -> Collider {
        ColliderBuilder::cuboid(self.half_extents[0], 0.1, self.half_extents[1])
            .translation(vector![self.center[0], self.top - 0.1, self.center[1]])
            .build()
    }
}

fn default_frames() -> u32 {
    240
}

fn default_dt() -> Real {
    1.0 / 60.0
}

fn default_start() -> [Real; 3] {
    [0.0, 0.6, 0.0]
}

fn default_ground() -> Vec<Slab> {
    vec![Slab {
        center: [0.0, 0.0],
        half_extents: [50.0, 50.0],
        top: 0.0,
    }]
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(default = "default_dt")]
    pub dt: Real,
    #[serde(default = "default_start")]
    pub start: [Real; 3],
    #[serde(default = "default_ground")]
    pub ground: Vec<Slab>,
    /// Clip durations in seconds; clips not listed are reported missing.
    #[serde(default)]
    pub clips: BTreeMap<String, Real>,
    #[serde(default)]
    pub locomotion: LocomotionConfig,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl ReplayScript {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let script: Self = toml::from_str(text)?;
        if !(script.dt.is_finite() && script.dt > 0.0) {
            return Err(ScriptError::Dt(script.dt));
        }
        script.locomotion.validate()?;
        Ok(script)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub frame: u32,
    pub from: StateKind,
    pub to: StateKind,
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub transitions: Vec<Transition>,
    pub final_state: StateKind,
    pub final_position: Vector<Real>,
    pub physics_steps: usize,
}

pub fn run(script: &ReplayScript) -> Result<ReplayReport, ScriptError> {
    let mut world = PhysicsWorld::with_fixed_dt(vector![0.0, -9.81, 0.0], script.dt);
    for slab in &script.ground {
        world.insert_static_collider(slab.collider());
    }
    let config = script.locomotion.clone();
    let body = RapierCharacterBody::spawn(
        &mut world,
        Vector::from(script.start),
        CapsuleShape::for_height(config.height),
    );
    let mut character: Character = Character::new(config)?;
    if !script.clips.is_empty() {
        let library = script
            .clips
            .iter()
            .fold(ClipLibrary::new(), |library, (name, duration)| {
                library.with_clip(name.as_str(), *duration)
            });
        character.attach_mixer(library);
    }

    let mut events: Vec<_> = script.events.iter().collect();
    events.sort_by_key(|event| event.frame);
    let mut pending = events.into_iter().peekable();

    let mut transitions = Vec::new();
    let mut physics_steps = 0;
    let mut previous = character.state_kind();
    for frame in 0..script.frames {
        while let Some(event) = pending.next_if(|event| event.frame <= frame) {
            log::debug!("frame {frame}: {} pressed={}", event.code, event.pressed);
            character.handle_input_event(event.code, event.pressed);
        }
        character.update(script.dt, &mut body.view(&mut world));
        physics_steps += world.advance(script.dt, |world| {
            character.apply_velocity_command(&mut body.view(world));
        });

        let current = character.state_kind();
        if current != previous {
            transitions.push(Transition {
                frame,
                from: previous,
                to: current,
            });
            previous = current;
        }
    }

    Ok(ReplayReport {
        transitions,
        final_state: character.state_kind(),
        final_position: character.position(),
        physics_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALK_SCRIPT: &str = r#"
frames = 120

[clips]
idle = 2.0
start_forward = 0.5
walk = 1.0
stop = 0.4

[[events]]
frame = 5
code = "KeyW"
pressed = true

[[events]]
frame = 80
code = "KeyW"
pressed = false
"#;

    #[test]
    fn parses_defaults() {
        let script = ReplayScript::parse("").unwrap();
        assert_eq!(script.frames, 240);
        assert_eq!(script.ground.len(), 1);
        assert!(script.events.is_empty());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ReplayScript::parse("dt = 0.0"),
            Err(ScriptError::Dt(_))
        ));
        assert!(matches!(
            ReplayScript::parse("[locomotion]\nheight = -1.0\n"),
            Err(ScriptError::Config(_))
        ));
        assert!(matches!(
            ReplayScript::parse("[[events]]\nframe = 1\ncode = \"Nope\"\npressed = true\n"),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn walk_script_reports_transitions() {
        let script = ReplayScript::parse(WALK_SCRIPT).unwrap();
        let report = run(&script).unwrap();
        let kinds: Vec<_> = report.transitions.iter().map(|t| t.to).collect();
        assert_eq!(
            &kinds[..3],
            &[
                StateKind::StartWalk(character_locomotion::StartDirection::Forward),
                StateKind::Walk,
                StateKind::EndWalk,
            ]
        );
        assert_eq!(report.transitions[0].frame, 5);
        assert_eq!(report.transitions[2].frame, 80);
        assert!(report.final_position.z > 1.0);
        assert_eq!(report.physics_steps, 120);
    }
}
