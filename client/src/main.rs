use client::phases::{App, UiEvent};
use client::sim::{DirectionKeys, WINDOW_HEIGHT, WINDOW_WIDTH};
use client::widgets::BACKGROUND;
use macroquad::prelude::*;

fn window_conf() -> Conf {
    Conf {
        window_title: String::from("Pacman"),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    // Intercept the window close so the peer can be told first.
    prevent_quit();

    let mut app = App::new();

    loop {
        if is_quit_requested() || is_key_pressed(KeyCode::Escape) {
            app.shutdown();
            break;
        }

        clear_background(BACKGROUND);

        app.tick(held_keys());
        for event in ui_events() {
            app.handle_event(&event);
        }
        app.draw();

        next_frame().await;
    }
}

fn held_keys() -> DirectionKeys {
    DirectionKeys {
        left: is_key_down(KeyCode::Left),
        right: is_key_down(KeyCode::Right),
        up: is_key_down(KeyCode::Up),
        down: is_key_down(KeyCode::Down),
    }
}

fn ui_events() -> Vec<UiEvent> {
    let mut events = Vec::new();
    if is_mouse_button_pressed(MouseButton::Left) {
        let (x, y) = mouse_position();
        events.push(UiEvent::MouseDown { x, y });
    }
    while let Some(c) = get_char_pressed() {
        events.push(UiEvent::Char(c));
    }
    if is_key_pressed(KeyCode::Backspace) {
        events.push(UiEvent::Backspace);
    }
    events
}
