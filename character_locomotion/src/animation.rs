//! Animation mixer seam and a headless clip library.

use std::collections::BTreeMap;

use rapier3d::prelude::Real;
use thiserror::Error;

/// Duration reported when the requested clip does not exist.
pub const MISSING_CLIP_DURATION: Real = 0.0;
/// Duration reported when no mixer is attached yet (model still loading).
pub const NO_MIXER_DURATION: Real = -1.0;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("animation clip `{0}` not found")]
    ClipNotFound(String),
}

/// Playback surface of the renderer's animation mixer.
pub trait AnimationMixer {
    fn has_clip(&self, name: &str) -> bool;

    /// Starts `name` with a fade-in and returns the clip duration in seconds.
    fn play_clip(&mut self, name: &str, fade_in: Real) -> Result<Real, AnimationError>;

    fn stop_all(&mut self);

    fn update(&mut self, dt: Real);
}

/// Stops everything and plays `name`, mapping lookup failures to sentinel
/// durations instead of errors.
pub fn play_or_sentinel<M: AnimationMixer>(
    mixer: Option<&mut M>,
    name: &str,
    fade_in: Real,
) -> Real {
    let Some(mixer) = mixer else {
        return NO_MIXER_DURATION;
    };
    if !mixer.has_clip(name) {
        log::error!("animation {name} not found");
        return MISSING_CLIP_DURATION;
    }
    mixer.stop_all();
    match mixer.play_clip(name, fade_in) {
        Ok(duration) => duration,
        Err(err) => {
            log::error!("{err}");
            MISSING_CLIP_DURATION
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveClip {
    pub name: String,
    pub duration: Real,
    pub fade_in: Real,
    pub time: Real,
}

impl ActiveClip {
    /// Blend weight ramping from 0 to 1 over the fade-in.
    pub fn weight(&self) -> Real {
        if self.fade_in <= 0.0 {
            1.0
        } else {
            (self.time / self.fade_in).clamp(0.0, 1.0)
        }
    }
}

/// In-memory mixer keyed by clip name. Clips loop; `played` records every
/// clip started, in order.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: BTreeMap<String, Real>,
    active: Option<ActiveClip>,
    played: Vec<String>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, name: impl Into<String>, duration: Real) -> Self {
        self.insert(name, duration);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, duration: Real) {
        self.clips.insert(name.into(), duration.max(0.0));
    }

    pub fn duration(&self, name: &str) -> Option<Real> {
        self.clips.get(name).copied()
    }

    pub fn active(&self) -> Option<&ActiveClip> {
        self.active.as_ref()
    }

    pub fn played(&self) -> &[String] {
        &self.played
    }
}

impl AnimationMixer for ClipLibrary {
    fn has_clip(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    fn play_clip(&mut self, name: &str, fade_in: Real) -> Result<Real, AnimationError> {
        let duration = self
            .duration(name)
            .ok_or_else(|| AnimationError::ClipNotFound(name.to_string()))?;
        self.active = Some(ActiveClip {
            name: name.to_string(),
            duration,
            fade_in: fade_in.max(0.0),
            time: 0.0,
        });
        self.played.push(name.to_string());
        Ok(duration)
    }

    fn stop_all(&mut self) {
        self.active = None;
    }

    fn update(&mut self, dt: Real) {
        if let Some(active) = self.active.as_mut() {
            active.time += dt.max(0.0);
            if active.duration > 0.0 && active.time > active.duration + active.fade_in {
                active.time = active.fade_in + (active.time - active.fade_in) % active.duration;
            }
        }
    }
}
