use scrawlboard_shared::{Point, Shape, ShapeId, ShapeKind};

use crate::board::Board;
use crate::geometry::normalize_point;

pub const ERASER_COLOR: &str = "#ffffff";
pub const ERASER_WIDTH: f64 = 20.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tool {
    Pen,
    Eraser,
    Rect,
    Circle,
    Text,
    Bucket,
}

/// Read-only view of the color/width selections at the moment a shape starts.
#[derive(Clone, Debug)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

/// Per-client draw session. The in-progress shape lives in the `Active` slot
/// and joins the board sequence only on finalize, so nothing ever mutates the
/// board through an index mid-drag.
pub enum DrawSession {
    Idle,
    Active(Shape),
}

impl DrawSession {
    pub fn new() -> Self {
        DrawSession::Idle
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DrawSession::Active(_))
    }

    pub fn active_shape(&self) -> Option<&Shape> {
        match self {
            DrawSession::Active(shape) => Some(shape),
            DrawSession::Idle => None,
        }
    }

    /// Pointer-down for the drag tools. Text and bucket never enter the
    /// active state; they go through the `finalize_*` paths below.
    pub fn begin(&mut self, id: ShapeId, tool: Tool, brush: &Brush, point: Point) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(point) = normalize_point(point) else {
            return false;
        };
        let shape = match tool {
            Tool::Pen => Shape::pen(id, point, brush.color.clone(), brush.width),
            Tool::Eraser => Shape::eraser(id, point, ERASER_COLOR.to_string(), ERASER_WIDTH),
            Tool::Rect => Shape::rect(id, point, brush.color.clone(), brush.width),
            Tool::Circle => Shape::circle(id, point, brush.color.clone(), brush.width),
            Tool::Text | Tool::Bucket => return false,
        };
        *self = DrawSession::Active(shape);
        true
    }

    /// Pointer-move. A no-op while idle. Returns true when the active shape
    /// changed and a re-render is due. The shape's kind was fixed at
    /// pointer-down, so a tool switch mid-drag has no effect here.
    pub fn update(&mut self, point: Point) -> bool {
        let Some(point) = normalize_point(point) else {
            return false;
        };
        let DrawSession::Active(shape) = self else {
            return false;
        };
        match &mut shape.kind {
            ShapeKind::Pen { points } | ShapeKind::Eraser { points } => {
                points.push(point.x);
                points.push(point.y);
            }
            ShapeKind::Rect {
                x,
                y,
                width,
                height,
            } => {
                *width = point.x - *x;
                *height = point.y - *y;
            }
            ShapeKind::Circle { x, y, radius } => {
                let dx = point.x - *x;
                let dy = point.y - *y;
                *radius = (dx * dx + dy * dy).sqrt();
            }
            ShapeKind::Text { .. } | ShapeKind::Image { .. } | ShapeKind::Bucket { .. } => {
                return false;
            }
        }
        true
    }

    /// Pointer-up: merge the active shape into the board and hand it back for
    /// broadcast. A pointer-up with no active session is a no-op.
    pub fn finish(&mut self, board: &mut Board) -> Option<Shape> {
        match std::mem::replace(self, DrawSession::Idle) {
            DrawSession::Active(shape) => {
                board.push(shape.clone());
                Some(shape)
            }
            DrawSession::Idle => None,
        }
    }
}

impl Default for DrawSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Text tool: a single click plus prompted content, no drag phase. An empty
/// or whitespace prompt creates nothing.
pub fn finalize_text(
    board: &mut Board,
    id: ShapeId,
    point: Point,
    content: &str,
    brush: &Brush,
) -> Option<Shape> {
    let point = normalize_point(point)?;
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let shape = Shape::text(id, point, content.to_string(), brush.color.clone(), brush.width);
    board.push(shape.clone());
    Some(shape)
}

/// Pasted image data or a recognized video link, synthesized outside the
/// pointer state machine.
pub fn finalize_image(
    board: &mut Board,
    id: ShapeId,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    src: String,
) -> Option<Shape> {
    if !(x.is_finite() && y.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    let shape = Shape::image(id, x, y, width, height, src);
    board.push(shape.clone());
    Some(shape)
}

/// Flood-fill output re-entering the create path like any other shape.
pub fn finalize_overlay(
    board: &mut Board,
    id: ShapeId,
    width: f64,
    height: f64,
    src: String,
) -> Option<Shape> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let shape = Shape::overlay(id, width, height, src);
    board.push(shape.clone());
    Some(shape)
}
