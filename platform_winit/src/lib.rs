//! winit glue: translates window events into raw input codes.
#![forbid(unsafe_code)]

use input_bindings::InputCode;

pub use winit::event::{ElementState, MouseButton, WindowEvent};
pub use winit::keyboard::{KeyCode, PhysicalKey};

pub fn input_code_for_key(key: KeyCode) -> Option<InputCode> {
    let code = match key {
        KeyCode::KeyA => InputCode::KeyA,
        KeyCode::KeyB => InputCode::KeyB,
        KeyCode::KeyC => InputCode::KeyC,
        KeyCode::KeyD => InputCode::KeyD,
        KeyCode::KeyE => InputCode::KeyE,
        KeyCode::KeyF => InputCode::KeyF,
        KeyCode::KeyG => InputCode::KeyG,
        KeyCode::KeyH => InputCode::KeyH,
        KeyCode::KeyI => InputCode::KeyI,
        KeyCode::KeyJ => InputCode::KeyJ,
        KeyCode::KeyK => InputCode::KeyK,
        KeyCode::KeyL => InputCode::KeyL,
        KeyCode::KeyM => InputCode::KeyM,
        KeyCode::KeyN => InputCode::KeyN,
        KeyCode::KeyO => InputCode::KeyO,
        KeyCode::KeyP => InputCode::KeyP,
        KeyCode::KeyQ => InputCode::KeyQ,
        KeyCode::KeyR => InputCode::KeyR,
        KeyCode::KeyS => InputCode::KeyS,
        KeyCode::KeyT => InputCode::KeyT,
        KeyCode::KeyU => InputCode::KeyU,
        KeyCode::KeyV => InputCode::KeyV,
        KeyCode::KeyW => InputCode::KeyW,
        KeyCode::KeyX => InputCode::KeyX,
        KeyCode::KeyY => InputCode::KeyY,
        KeyCode::KeyZ => InputCode::KeyZ,
        KeyCode::Space => InputCode::Space,
        KeyCode::Enter => InputCode::Enter,
        KeyCode::Escape => InputCode::Escape,
        KeyCode::Tab => InputCode::Tab,
        KeyCode::ShiftLeft => InputCode::ShiftLeft,
        KeyCode::ShiftRight => InputCode::ShiftRight,
        KeyCode::ControlLeft => InputCode::ControlLeft,
        KeyCode::ControlRight => InputCode::ControlRight,
        KeyCode::AltLeft => InputCode::AltLeft,
        KeyCode::AltRight => InputCode::AltRight,
        KeyCode::ArrowUp => InputCode::ArrowUp,
        KeyCode::ArrowDown => InputCode::ArrowDown,
        KeyCode::ArrowLeft => InputCode::ArrowLeft,
        KeyCode::ArrowRight => InputCode::ArrowRight,
        _ => return None,
    };
    Some(code)
}

/// Mouse buttons use DOM numbering: 0 left, 1 middle, 2 right.
pub fn input_code_for_mouse_button(button: MouseButton) -> Option<InputCode> {
    match button {
        MouseButton::Left => Some(InputCode::Mouse0),
        MouseButton::Middle => Some(InputCode::Mouse1),
        MouseButton::Right => Some(InputCode::Mouse2),
        MouseButton::Back => Some(InputCode::Mouse3),
        MouseButton::Forward => Some(InputCode::Mouse4),
        MouseButton::Other(_) => None,
    }
}

pub fn is_pressed(state: ElementState) -> bool {
    state == ElementState::Pressed
}

/// Raw `(code, pressed)` pair for keyboard and mouse button events. Key
/// repeats and unmapped keys yield `None`.
pub fn raw_input(event: &WindowEvent) -> Option<(InputCode, bool)> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if event.repeat {
                return None;
            }
            match event.physical_key {
                PhysicalKey::Code(key) => {
                    input_code_for_key(key).map(|code| (code, is_pressed(event.state)))
                }
                PhysicalKey::Unidentified(_) => None,
            }
        }
        WindowEvent::MouseInput { state, button, .. } => {
            input_code_for_mouse_button(*button).map(|code| (code, is_pressed(*state)))
        }
        _ => None,
    }
}

/// True when the window stopped receiving input and held actions should be
/// released.
pub fn focus_lost(event: &WindowEvent) -> bool {
    matches!(event, WindowEvent::Focused(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mapped_key_round_trips_through_its_name() {
        let keys = [
            KeyCode::KeyA,
            KeyCode::KeyW,
            KeyCode::KeyZ,
            KeyCode::Space,
            KeyCode::ShiftLeft,
            KeyCode::ArrowRight,
        ];
        for key in keys {
            let code = input_code_for_key(key).unwrap();
            assert_eq!(format!("{key:?}"), code.name());
        }
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(input_code_for_key(KeyCode::F1), None);
        assert_eq!(input_code_for_key(KeyCode::Digit1), None);
        assert_eq!(input_code_for_mouse_button(MouseButton::Other(7)), None);
    }

    #[test]
    fn mouse_buttons_follow_dom_numbering() {
        assert_eq!(
            input_code_for_mouse_button(MouseButton::Left),
            Some(InputCode::Mouse0)
        );
        assert_eq!(
            input_code_for_mouse_button(MouseButton::Middle),
            Some(InputCode::Mouse1)
        );
        assert_eq!(
            input_code_for_mouse_button(MouseButton::Right),
            Some(InputCode::Mouse2)
        );
    }

    #[test]
    fn focus_events() {
        assert!(focus_lost(&WindowEvent::Focused(false)));
        assert!(!focus_lost(&WindowEvent::Focused(true)));
        assert_eq!(raw_input(&WindowEvent::Focused(false)), None);
    }
}
