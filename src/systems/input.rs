//! Keyboard polling.
//!
//! [`update_input_state`] reads raylib once per frame and writes the result
//! into [`InputState`]. It is the only place the game touches hardware
//! input.
use bevy_ecs::prelude::*;
use raylib::ffi::KeyboardKey;

use crate::resources::input::{InputState, Key};

fn keyboard_key(key: Key) -> KeyboardKey {
    match key {
        Key::A => KeyboardKey::KEY_A,
        Key::B => KeyboardKey::KEY_B,
        Key::C => KeyboardKey::KEY_C,
        Key::D => KeyboardKey::KEY_D,
        Key::E => KeyboardKey::KEY_E,
        Key::F => KeyboardKey::KEY_F,
        Key::G => KeyboardKey::KEY_G,
        Key::H => KeyboardKey::KEY_H,
        Key::I => KeyboardKey::KEY_I,
        Key::J => KeyboardKey::KEY_J,
        Key::K => KeyboardKey::KEY_K,
        Key::L => KeyboardKey::KEY_L,
        Key::M => KeyboardKey::KEY_M,
        Key::N => KeyboardKey::KEY_N,
        Key::O => KeyboardKey::KEY_O,
        Key::P => KeyboardKey::KEY_P,
        Key::Q => KeyboardKey::KEY_Q,
        Key::R => KeyboardKey::KEY_R,
        Key::S => KeyboardKey::KEY_S,
        Key::T => KeyboardKey::KEY_T,
        Key::U => KeyboardKey::KEY_U,
        Key::V => KeyboardKey::KEY_V,
        Key::W => KeyboardKey::KEY_W,
        Key::X => KeyboardKey::KEY_X,
        Key::Y => KeyboardKey::KEY_Y,
        Key::Z => KeyboardKey::KEY_Z,
        Key::Num0 => KeyboardKey::KEY_ZERO,
        Key::Num1 => KeyboardKey::KEY_ONE,
        Key::Num2 => KeyboardKey::KEY_TWO,
        Key::Num3 => KeyboardKey::KEY_THREE,
        Key::Num4 => KeyboardKey::KEY_FOUR,
        Key::Num5 => KeyboardKey::KEY_FIVE,
        Key::Num6 => KeyboardKey::KEY_SIX,
        Key::Num7 => KeyboardKey::KEY_SEVEN,
        Key::Num8 => KeyboardKey::KEY_EIGHT,
        Key::Num9 => KeyboardKey::KEY_NINE,
        Key::Up => KeyboardKey::KEY_UP,
        Key::Down => KeyboardKey::KEY_DOWN,
        Key::Left => KeyboardKey::KEY_LEFT,
        Key::Right => KeyboardKey::KEY_RIGHT,
        Key::Space => KeyboardKey::KEY_SPACE,
        Key::Enter => KeyboardKey::KEY_ENTER,
        Key::Escape => KeyboardKey::KEY_ESCAPE,
    }
}

/// Poll raylib for every [`Key`] the game knows about.
pub fn update_input_state(mut input: ResMut<InputState>, rl: NonSend<raylib::RaylibHandle>) {
    for key in Key::ALL {
        let code = keyboard_key(key);
        input.set(key, rl.is_key_down(code), rl.is_key_pressed(code));
    }
}
