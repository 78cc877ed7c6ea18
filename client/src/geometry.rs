use scrawlboard_shared::{Point, Shape, ShapeKind};

pub fn normalize_point(point: Point) -> Option<Point> {
    if !point.is_finite() {
        return None;
    }
    Some(point)
}

pub fn distance_to_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }
    let t = ((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);
    let proj_x = x1 + t * dx;
    let proj_y = y1 + t * dy;
    ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
}

/// Hit test for the bucket tool's fill-update branch. Eraser strokes, images,
/// and fill overlays are not fill targets; clicks on them fall through to the
/// flood fill.
pub fn shape_hit(shape: &Shape, point: Point) -> bool {
    match &shape.kind {
        ShapeKind::Pen { points } => polyline_hit(points, shape.stroke_width, point),
        ShapeKind::Eraser { .. } => false,
        ShapeKind::Rect {
            x,
            y,
            width,
            height,
        } => {
            let (left, w) = normalized_span(*x, *width);
            let (top, h) = normalized_span(*y, *height);
            point.x >= left && point.x <= left + w && point.y >= top && point.y <= top + h
        }
        ShapeKind::Circle { x, y, radius } => {
            let dx = point.x - x;
            let dy = point.y - y;
            dx * dx + dy * dy <= radius * radius
        }
        ShapeKind::Text { x, y, text } => {
            let size = shape.stroke_width.max(1.0);
            let width = text.chars().count() as f64 * size * 0.6;
            point.x >= *x && point.x <= x + width && point.y >= y - size && point.y <= *y
        }
        ShapeKind::Image { .. } | ShapeKind::Bucket { .. } => false,
    }
}

fn polyline_hit(points: &[f64], stroke_width: f64, point: Point) -> bool {
    let threshold = (stroke_width / 2.0).max(6.0);
    let mut coords = points.chunks_exact(2);
    let Some(first) = coords.next() else {
        return false;
    };
    let mut prev = (first[0], first[1]);
    let mut segments = false;
    for pair in coords {
        let next = (pair[0], pair[1]);
        if distance_to_segment(point.x, point.y, prev.0, prev.1, next.0, next.1) <= threshold {
            return true;
        }
        prev = next;
        segments = true;
    }
    if !segments {
        let dx = point.x - prev.0;
        let dy = point.y - prev.1;
        return dx * dx + dy * dy <= threshold * threshold;
    }
    false
}

/// Rects dragged leftward/upward carry negative extents; map them to a
/// top-left origin and positive size.
pub fn normalized_span(origin: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (origin + extent, -extent)
    } else {
        (origin, extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawlboard_shared::ShapeId;

    #[test]
    fn rect_interior_hits_including_negative_drag() {
        let mut shape = Shape::rect(
            ShapeId::new("r"),
            Point::new(100.0, 100.0),
            "#000000".into(),
            2.0,
        );
        if let ShapeKind::Rect { width, height, .. } = &mut shape.kind {
            *width = -40.0;
            *height = -30.0;
        }
        assert!(shape_hit(&shape, Point::new(80.0, 90.0)));
        assert!(!shape_hit(&shape, Point::new(101.0, 101.0)));
    }

    #[test]
    fn circle_interior_hits() {
        let mut shape = Shape::circle(
            ShapeId::new("c"),
            Point::new(50.0, 50.0),
            "#000000".into(),
            2.0,
        );
        if let ShapeKind::Circle { radius, .. } = &mut shape.kind {
            *radius = 10.0;
        }
        assert!(shape_hit(&shape, Point::new(55.0, 55.0)));
        assert!(!shape_hit(&shape, Point::new(62.0, 50.0)));
    }

    #[test]
    fn pen_stroke_hits_near_the_line_only() {
        let mut shape = Shape::pen(
            ShapeId::new("p"),
            Point::new(0.0, 0.0),
            "#000000".into(),
            4.0,
        );
        if let ShapeKind::Pen { points } = &mut shape.kind {
            points.extend_from_slice(&[100.0, 0.0]);
        }
        assert!(shape_hit(&shape, Point::new(50.0, 3.0)));
        assert!(!shape_hit(&shape, Point::new(50.0, 30.0)));
    }

    #[test]
    fn eraser_and_overlays_are_never_fill_targets() {
        let eraser = Shape::eraser(
            ShapeId::new("e"),
            Point::new(10.0, 10.0),
            "#ffffff".into(),
            20.0,
        );
        assert!(!shape_hit(&eraser, Point::new(10.0, 10.0)));
        let overlay = Shape::overlay(ShapeId::new("o"), 640.0, 480.0, "data:,".into());
        assert!(!shape_hit(&overlay, Point::new(5.0, 5.0)));
    }
}
