use scrawlboard_shared::{Point, Shape, ShapeId, ShapeKind};

use crate::geometry::shape_hit;

/// The local replica of one board: an ordered, append-mostly shape sequence.
/// Later shapes draw on top of earlier ones.
#[derive(Default)]
pub struct Board {
    shapes: Vec<Shape>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn find(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| &shape.id == id)
    }

    /// Replace the shape carrying the same id, keeping its position in the
    /// draw order. Updates for ids this replica never saw are dropped.
    pub fn replace(&mut self, shape: Shape) -> bool {
        if let Some(index) = self.shapes.iter().position(|item| item.id == shape.id) {
            self.shapes[index] = shape;
            true
        } else {
            false
        }
    }

    /// Apply a bucket fill-update to an existing shape: strokes, rects, and
    /// circles take a `fillColor`; text recolors its glyphs instead. Returns
    /// the updated shape for broadcast.
    pub fn set_fill(&mut self, id: &ShapeId, color: &str) -> Option<Shape> {
        let shape = self.shapes.iter_mut().find(|shape| &shape.id == id)?;
        match &shape.kind {
            ShapeKind::Pen { .. } | ShapeKind::Rect { .. } | ShapeKind::Circle { .. } => {
                shape.fill_color = Some(color.to_string());
            }
            ShapeKind::Text { .. } => {
                shape.stroke_color = color.to_string();
            }
            ShapeKind::Eraser { .. } | ShapeKind::Image { .. } | ShapeKind::Bucket { .. } => {
                return None;
            }
        }
        Some(shape.clone())
    }

    /// Topmost shape under the point, if any.
    pub fn hit_test(&self, point: Point) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|shape| shape_hit(shape, point))
            .map(|shape| shape.id.clone())
    }

    /// Swap in a loaded shape sequence wholesale.
    pub fn reset(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
    }

    /// Whether any shape on the board draws from `src`.
    pub fn contains_src(&self, src: &str) -> bool {
        self.shapes.iter().any(|shape| shape.image_src() == Some(src))
    }
}
