//! Locomotion tuning and key bindings, loadable from TOML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use input_bindings::{ActionTable, InputCode};
use rapier3d::prelude::Real;
use serde::Deserialize;
use spring_sim::{SpringConfig, SpringError};
use thiserror::Error;

use crate::action::CharacterAction;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read locomotion config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid locomotion config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {name} spring: {source}")]
    Spring {
        name: &'static str,
        #[source]
        source: SpringError,
    },
    #[error("unknown action `{0}` in bindings")]
    UnknownAction(String),
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: Real,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpringSettings {
    pub mass: Real,
    pub damping: Real,
}

impl SpringSettings {
    pub fn to_config(self, frequency: Real) -> Result<SpringConfig, SpringError> {
        SpringConfig::new(frequency, self.mass, self.damping)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Spring sub-step rate in steps per second.
    pub simulation_frequency: Real,
    pub velocity_spring: SpringSettings,
    pub rotation_spring: SpringSettings,
    /// World units per second at a local velocity of 1.
    pub move_speed: Real,
    pub walk_speed: Real,
    pub run_speed: Real,
    pub sprint_speed: Real,
    pub jump_speed: Real,
    /// Seconds of continuous running before sprinting.
    pub sprint_delay: Real,
    /// Distance from the body origin down to the feet.
    pub height: Real,
    /// Extra probe length below the feet used for ground detection.
    pub ray_cast_length: Real,
    /// Vertical body velocity below which an ungrounded character falls.
    pub fall_velocity_threshold: Real,
    /// Horizontal body speed above which a landing keeps running.
    pub running_speed_threshold: Real,
    /// Landing vertical velocity below which the character rolls.
    pub roll_impact_velocity: Real,
    /// Per-action overrides of the default key bindings, keyed by action
    /// name (`up`, `jump`, ...).
    pub bindings: BTreeMap<String, Vec<InputCode>>,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            simulation_frequency: 60.0,
            velocity_spring: SpringSettings {
                mass: 60.0,
                damping: 0.8,
            },
            rotation_spring: SpringSettings {
                mass: 10.0,
                damping: 0.5,
            },
            move_speed: 4.0,
            walk_speed: 0.8,
            run_speed: 1.1,
            sprint_speed: 1.4,
            jump_speed: 4.0,
            sprint_delay: 1.5,
            height: 0.6,
            ray_cast_length: 0.25,
            fall_velocity_threshold: -2.0,
            running_speed_threshold: 1.0,
            roll_impact_velocity: -6.0,
            bindings: BTreeMap::new(),
        }
    }
}

impl LocomotionConfig {
    pub fn parse_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self
            .bindings
            .keys()
            .find(|name| CharacterAction::from_name(name).is_none())
        {
            return Err(ConfigError::UnknownAction(name.clone()));
        }
        self.velocity_spring_config()?;
        self.rotation_spring_config()?;
        let positive = [
            ("move_speed", self.move_speed),
            ("height", self.height),
            ("jump_speed", self.jump_speed),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "positive",
                    value,
                });
            }
        }
        let non_negative = [
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("sprint_speed", self.sprint_speed),
            ("sprint_delay", self.sprint_delay),
            ("ray_cast_length", self.ray_cast_length),
            ("running_speed_threshold", self.running_speed_threshold),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "non-negative",
                    value,
                });
            }
        }
        let negative = [
            ("fall_velocity_threshold", self.fall_velocity_threshold),
            ("roll_impact_velocity", self.roll_impact_velocity),
        ];
        for (field, value) in negative {
            if !(value.is_finite() && value < 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "negative",
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn velocity_spring_config(&self) -> Result<SpringConfig, ConfigError> {
        self.velocity_spring
            .to_config(self.simulation_frequency)
            .map_err(|source| ConfigError::Spring {
                name: "velocity",
                source,
            })
    }

    pub fn rotation_spring_config(&self) -> Result<SpringConfig, ConfigError> {
        self.rotation_spring
            .to_config(self.simulation_frequency)
            .map_err(|source| ConfigError::Spring {
                name: "rotation",
                source,
            })
    }

    /// Default bindings with configured overrides applied, in action order.
    pub fn action_table(&self) -> ActionTable<CharacterAction> {
        let mut table = ActionTable::new();
        for action in CharacterAction::ALL {
            match self.bindings.get(action.name()) {
                Some(codes) => table.bind(action, codes.iter().copied()),
                None => table.bind(action, action.default_codes().iter().copied()),
            }
        }
        table
    }

    /// Probe length from the body origin: down to the feet plus the margin.
    pub fn ground_probe_length(&self) -> Real {
        self.height + self.ray_cast_length
    }
}
