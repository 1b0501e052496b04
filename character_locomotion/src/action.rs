use input_bindings::InputCode;

/// Semantic actions a character reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterAction {
    Up,
    Down,
    Left,
    Right,
    Run,
    Jump,
    Use,
    Enter,
    Primary,
    Secondary,
}

impl CharacterAction {
    pub const ALL: [CharacterAction; 10] = [
        CharacterAction::Up,
        CharacterAction::Down,
        CharacterAction::Left,
        CharacterAction::Right,
        CharacterAction::Run,
        CharacterAction::Jump,
        CharacterAction::Use,
        CharacterAction::Enter,
        CharacterAction::Primary,
        CharacterAction::Secondary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CharacterAction::Up => "up",
            CharacterAction::Down => "down",
            CharacterAction::Left => "left",
            CharacterAction::Right => "right",
            CharacterAction::Run => "run",
            CharacterAction::Jump => "jump",
            CharacterAction::Use => "use",
            CharacterAction::Enter => "enter",
            CharacterAction::Primary => "primary",
            CharacterAction::Secondary => "secondary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    pub fn default_codes(self) -> &'static [InputCode] {
        match self {
            CharacterAction::Up => &[InputCode::KeyW],
            CharacterAction::Down => &[InputCode::KeyS],
            CharacterAction::Left => &[InputCode::KeyA],
            CharacterAction::Right => &[InputCode::KeyD],
            CharacterAction::Run => &[InputCode::ShiftLeft],
            CharacterAction::Jump => &[InputCode::Space],
            CharacterAction::Use => &[InputCode::KeyE],
            CharacterAction::Enter => &[InputCode::KeyF],
            CharacterAction::Primary => &[InputCode::Mouse0],
            CharacterAction::Secondary => &[InputCode::Mouse1],
        }
    }
}
