//! Raw input codes and the action binding table with press/release edges.
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

macro_rules! input_codes {
    ($($name:ident),* $(,)?) => {
        /// Keyboard and mouse codes, named like DOM `KeyboardEvent.code`
        /// values with mouse buttons as `Mouse0..Mouse4`.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
        pub enum InputCode {
            $($name),*
        }

        impl InputCode {
            pub const ALL: &'static [InputCode] = &[$(InputCode::$name),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(InputCode::$name => stringify!($name)),*
                }
            }
        }
    };
}

input_codes!(
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
    KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    Space, Enter, Escape, Tab,
    ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight,
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Mouse0, Mouse1, Mouse2, Mouse3, Mouse4,
);

impl fmt::Display for InputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown input code `{0}`")]
pub struct UnknownInputCode(pub String);

impl FromStr for InputCode {
    type Err = UnknownInputCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputCode::ALL
            .iter()
            .copied()
            .find(|code| code.name() == s)
            .ok_or_else(|| UnknownInputCode(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Held level plus one-shot edges for a single action.
///
/// Edges are only set while the change hook runs; they are cleared as soon
/// as it returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionState {
    pub codes: Vec<InputCode>,
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

impl ActionState {
    pub fn new(codes: impl IntoIterator<Item = InputCode>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn is_bound_to(&self, code: InputCode) -> bool {
        self.codes.contains(&code)
    }
}

/// Ordered action → codes table. Hooks fire in binding order, so two runs
/// with the same events observe the same sequence of edges.
#[derive(Clone, Debug)]
pub struct ActionTable<A> {
    bindings: Vec<(A, ActionState)>,
}

impl<A> Default for ActionTable<A> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<A: Copy + PartialEq> ActionTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `codes` to `action`, creating the entry on first use.
    pub fn bind(&mut self, action: A, codes: impl IntoIterator<Item = InputCode>) {
        match self.index_of(action) {
            Some(index) => {
                let state = &mut self.bindings[index].1;
                for code in codes {
                    if !state.codes.contains(&code) {
                        state.codes.push(code);
                    }
                }
            }
            None => self.bindings.push((action, ActionState::new(codes))),
        }
    }

    /// Replaces the codes of `action` without touching its held level.
    pub fn rebind(&mut self, action: A, codes: impl IntoIterator<Item = InputCode>) {
        match self.index_of(action) {
            Some(index) => self.bindings[index].1.codes = codes.into_iter().collect(),
            None => self.bindings.push((action, ActionState::new(codes))),
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = (A, &ActionState)> + '_ {
        self.bindings.iter().map(|(action, state)| (*action, state))
    }

    pub fn state(&self, action: A) -> Option<&ActionState> {
        self.index_of(action).map(|index| &self.bindings[index].1)
    }

    pub fn is_pressed(&self, action: A) -> bool {
        self.state(action).is_some_and(|state| state.pressed)
    }

    pub fn just_pressed(&self, action: A) -> bool {
        self.state(action).is_some_and(|state| state.just_pressed)
    }

    pub fn just_released(&self, action: A) -> bool {
        self.state(action).is_some_and(|state| state.just_released)
    }

    pub fn actions_for(&self, code: InputCode) -> impl Iterator<Item = A> + '_ {
        self.bindings
            .iter()
            .filter(move |(_, state)| state.is_bound_to(code))
            .map(|(action, _)| *action)
    }

    /// First half of an edge: updates the level and raises the matching edge
    /// flag. Returns `None` when the level is unchanged.
    pub fn begin_edge(&mut self, action: A, pressed: bool) -> Option<Edge> {
        let index = self.index_of(action)?;
        let state = &mut self.bindings[index].1;
        if state.pressed == pressed {
            return None;
        }
        state.pressed = pressed;
        state.just_pressed = pressed;
        state.just_released = !pressed;
        Some(if pressed { Edge::Pressed } else { Edge::Released })
    }

    /// Second half of an edge: clears both edge flags.
    pub fn end_edge(&mut self, action: A) {
        if let Some(index) = self.index_of(action) {
            let state = &mut self.bindings[index].1;
            state.just_pressed = false;
            state.just_released = false;
        }
    }

    /// Applies a raw event to every action bound to `code`, running `hook`
    /// between raising and clearing each edge. Returns the number of edges.
    ///
    /// Not reentrant: the hook only sees the table, it cannot feed events.
    pub fn handle_event(
        &mut self,
        code: InputCode,
        pressed: bool,
        mut hook: impl FnMut(&Self, A, Edge),
    ) -> usize {
        let mut edges = 0;
        for index in 0..self.bindings.len() {
            if !self.bindings[index].1.is_bound_to(code) {
                continue;
            }
            let action = self.bindings[index].0;
            if let Some(edge) = self.begin_edge(action, pressed) {
                hook(self, action, edge);
                self.end_edge(action);
                edges += 1;
            }
        }
        edges
    }

    /// Releases every held action through the normal edge path.
    pub fn release_all(&mut self, mut hook: impl FnMut(&Self, A, Edge)) -> usize {
        let mut edges = 0;
        for index in 0..self.bindings.len() {
            let action = self.bindings[index].0;
            if let Some(edge) = self.begin_edge(action, false) {
                hook(self, action, edge);
                self.end_edge(action);
                edges += 1;
            }
        }
        edges
    }

    fn index_of(&self, action: A) -> Option<usize> {
        self.bindings.iter().position(|(bound, _)| *bound == action)
    }
}
