use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

mod board_format;
pub mod protocol;

pub use board_format::{
    decode_board_file, encode_board_file, BoardFileData, BoardFileError, BOARD_FILE_MAGIC,
    BOARD_FILE_VERSION,
};
pub use protocol::{ClientEvent, ServerEvent};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One drawable unit. Serializes to a single flat object: the envelope fields
/// here plus the geometry of its kind, tagged by `tool`.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(flatten)]
    pub kind: ShapeKind,
    #[serde(rename = "strokeColor")]
    pub stroke_color: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(rename = "fillColor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

/// Stroke geometry is the flat `[x0, y0, x1, y1, ..]` list the canvas layer
/// consumes directly.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ShapeKind {
    Pen {
        points: Vec<f64>,
    },
    Eraser {
        points: Vec<f64>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        src: String,
    },
    Bucket {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        src: String,
    },
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, stroke_color: String, stroke_width: f64) -> Self {
        Self {
            id,
            kind,
            stroke_color,
            stroke_width,
            fill_color: None,
        }
    }

    pub fn pen(id: ShapeId, start: Point, color: String, width: f64) -> Self {
        Self::new(id, ShapeKind::Pen { points: vec![start.x, start.y] }, color, width)
    }

    pub fn eraser(id: ShapeId, start: Point, color: String, width: f64) -> Self {
        Self::new(
            id,
            ShapeKind::Eraser { points: vec![start.x, start.y] },
            color,
            width,
        )
    }

    pub fn rect(id: ShapeId, anchor: Point, color: String, width: f64) -> Self {
        Self::new(
            id,
            ShapeKind::Rect {
                x: anchor.x,
                y: anchor.y,
                width: 0.0,
                height: 0.0,
            },
            color,
            width,
        )
    }

    pub fn circle(id: ShapeId, anchor: Point, color: String, width: f64) -> Self {
        Self::new(
            id,
            ShapeKind::Circle {
                x: anchor.x,
                y: anchor.y,
                radius: 0.0,
            },
            color,
            width,
        )
    }

    pub fn text(id: ShapeId, anchor: Point, content: String, color: String, size: f64) -> Self {
        Self::new(
            id,
            ShapeKind::Text {
                x: anchor.x,
                y: anchor.y,
                text: content,
            },
            color,
            size,
        )
    }

    pub fn image(id: ShapeId, x: f64, y: f64, width: f64, height: f64, src: String) -> Self {
        Self::new(id, ShapeKind::Image { x, y, width, height, src }, String::new(), 0.0)
    }

    /// Full-canvas fill overlay anchored at the origin.
    pub fn overlay(id: ShapeId, width: f64, height: f64, src: String) -> Self {
        Self::new(
            id,
            ShapeKind::Bucket {
                x: 0.0,
                y: 0.0,
                width,
                height,
                src,
            },
            String::new(),
            0.0,
        )
    }

    pub fn tool_name(&self) -> &'static str {
        match &self.kind {
            ShapeKind::Pen { .. } => "pen",
            ShapeKind::Eraser { .. } => "eraser",
            ShapeKind::Rect { .. } => "rect",
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Text { .. } => "text",
            ShapeKind::Image { .. } => "image",
            ShapeKind::Bucket { .. } => "bucket",
        }
    }

    /// Bitmap source for image and fill-overlay shapes.
    pub fn image_src(&self) -> Option<&str> {
        match &self.kind {
            ShapeKind::Image { src, .. } | ShapeKind::Bucket { src, .. } => Some(src.as_str()),
            _ => None,
        }
    }
}
