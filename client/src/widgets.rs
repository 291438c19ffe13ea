//! Immediate-mode menu widgets: plain data composed by the pages each
//! frame and drawn in one pass. Hit-testing works on fixed rectangles so
//! the pages stay testable without a window.

use macroquad::prelude::*;

pub const FONT_SIZE: f32 = 48.0;
pub const BACKGROUND: Color = BLUE;

pub struct Text {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl Text {
    pub fn new(x: f32, y: f32, text: &str) -> Self {
        Self {
            x,
            y,
            text: text.to_string(),
        }
    }

    pub fn draw(&self) {
        draw_text(&self.text, self.x, self.y + FONT_SIZE, FONT_SIZE, YELLOW);
    }
}

pub struct Button {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub text: String,
    pub background: Color,
    /// Marked once either player has claimed this button.
    pub active: bool,
}

impl Button {
    pub fn new(x: f32, y: f32, w: f32, h: f32, text: &str) -> Self {
        Self {
            x,
            y,
            w,
            h,
            text: text.to_string(),
            background: BLACK,
            active: false,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    pub fn draw(&self) {
        draw_rectangle(self.x, self.y, self.w, self.h, self.background);
        draw_rectangle_lines(self.x, self.y, self.w, self.h, 2.0, YELLOW);
        draw_text(
            &self.text,
            self.x + 8.0,
            self.y + self.h - 14.0,
            FONT_SIZE,
            YELLOW,
        );
    }
}

/// A text box accepting alphanumerics and the dot, enough for a host name
/// or a port number.
pub struct Input {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl Input {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            text: String::new(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        if c.is_ascii_alphanumeric() || c == '.' {
            self.text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn draw(&self) {
        draw_text(&self.text, self.x, self.y + FONT_SIZE, FONT_SIZE, YELLOW);
        draw_line(
            self.x,
            self.y + FONT_SIZE + 8.0,
            self.x + 300.0,
            self.y + FONT_SIZE + 8.0,
            2.0,
            YELLOW,
        );
    }
}
