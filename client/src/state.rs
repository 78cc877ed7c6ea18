use std::collections::HashMap;

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::board::Board;
use crate::session::{Brush, DrawSession, Tool};

pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_WIDTH: f64 = 5.0;
pub const CURSOR_TTL_MS: f64 = 4000.0;

/// A peer's last reported pointer position, kept until it goes quiet.
pub struct RemoteCursor {
    pub x: f64,
    pub y: f64,
    pub seen_at: f64,
}

pub struct State {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub board: Board,
    pub session: DrawSession,
    pub tool: Tool,
    pub color: String,
    pub width: f64,
    pub board_width: f64,
    pub board_height: f64,
    pub images: HashMap<String, HtmlImageElement>,
    pub cursors: HashMap<String, RemoteCursor>,
}

impl State {
    pub fn brush(&self) -> Brush {
        Brush {
            color: self.color.clone(),
            width: self.width,
        }
    }

    pub fn touch_cursor(&mut self, user_id: String, x: f64, y: f64, now: f64) {
        self.cursors.insert(user_id, RemoteCursor { x, y, seen_at: now });
    }

    /// Drop cursors that have gone quiet. Returns true when any were removed.
    pub fn prune_cursors(&mut self, now: f64) -> bool {
        let before = self.cursors.len();
        self.cursors
            .retain(|_, cursor| now - cursor.seen_at < CURSOR_TTL_MS);
        self.cursors.len() != before
    }

    /// Drop cached bitmap elements no shape on the board references.
    pub fn prune_images(&mut self) {
        let board = &self.board;
        self.images.retain(|src, _| board.contains_src(src));
    }
}
