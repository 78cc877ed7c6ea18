use web_sys::CanvasRenderingContext2d;

use scrawlboard_shared::{Shape, ShapeKind};

use crate::geometry::normalized_span;
use crate::state::State;

const CURSOR_COLOR: &str = "#4d7cfe";

pub fn redraw(state: &State) {
    state
        .ctx
        .clear_rect(0.0, 0.0, state.board_width, state.board_height);
    for shape in state.board.shapes() {
        draw_shape(state, shape);
    }
    if let Some(shape) = state.session.active_shape() {
        draw_shape(state, shape);
    }
    draw_cursors(state);
}

pub fn draw_shape(state: &State, shape: &Shape) {
    let ctx = &state.ctx;
    match &shape.kind {
        ShapeKind::Pen { points } | ShapeKind::Eraser { points } => {
            draw_polyline(ctx, points, shape);
        }
        ShapeKind::Rect {
            x,
            y,
            width,
            height,
        } => {
            let (left, w) = normalized_span(*x, *width);
            let (top, h) = normalized_span(*y, *height);
            if let Some(fill) = &shape.fill_color {
                ctx.set_fill_style_str(fill);
                ctx.fill_rect(left, top, w, h);
            }
            ctx.set_stroke_style_str(&shape.stroke_color);
            ctx.set_line_width(shape.stroke_width);
            ctx.stroke_rect(left, top, w, h);
        }
        ShapeKind::Circle { x, y, radius } => {
            ctx.begin_path();
            let _ = ctx.arc(*x, *y, *radius, 0.0, std::f64::consts::PI * 2.0);
            if let Some(fill) = &shape.fill_color {
                ctx.set_fill_style_str(fill);
                ctx.fill();
            }
            ctx.set_stroke_style_str(&shape.stroke_color);
            ctx.set_line_width(shape.stroke_width);
            ctx.stroke();
        }
        ShapeKind::Text { x, y, text } => {
            let size = shape.stroke_width.max(1.0);
            ctx.set_font(&format!("{size}px sans-serif"));
            ctx.set_fill_style_str(&shape.stroke_color);
            let _ = ctx.fill_text(text, *x, *y);
        }
        ShapeKind::Image {
            x,
            y,
            width,
            height,
            src,
        }
        | ShapeKind::Bucket {
            x,
            y,
            width,
            height,
            src,
        } => {
            draw_cached_image(state, src, *x, *y, *width, *height);
        }
    }
}

fn draw_polyline(ctx: &CanvasRenderingContext2d, points: &[f64], shape: &Shape) {
    let mut coords = points.chunks_exact(2);
    let Some(first) = coords.next() else {
        return;
    };
    if points.len() == 2 {
        ctx.set_fill_style_str(&shape.stroke_color);
        ctx.begin_path();
        let _ = ctx.arc(
            first[0],
            first[1],
            shape.stroke_width / 2.0,
            0.0,
            std::f64::consts::PI * 2.0,
        );
        ctx.fill();
        return;
    }
    ctx.begin_path();
    ctx.move_to(first[0], first[1]);
    for pair in coords {
        ctx.line_to(pair[0], pair[1]);
    }
    if let Some(fill) = &shape.fill_color {
        ctx.close_path();
        ctx.set_fill_style_str(fill);
        ctx.fill();
    }
    ctx.set_stroke_style_str(&shape.stroke_color);
    ctx.set_line_width(shape.stroke_width);
    ctx.stroke();
}

/// Images draw from the element cache; a shape whose bitmap is still loading
/// is skipped and painted by the redraw its onload schedules.
fn draw_cached_image(state: &State, src: &str, x: f64, y: f64, width: f64, height: f64) {
    let Some(image) = state.images.get(src) else {
        return;
    };
    if !image.complete() {
        return;
    }
    let _ = state
        .ctx
        .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height);
}

fn draw_cursors(state: &State) {
    let ctx = &state.ctx;
    for (user_id, cursor) in &state.cursors {
        ctx.set_fill_style_str(CURSOR_COLOR);
        ctx.begin_path();
        let _ = ctx.arc(cursor.x, cursor.y, 4.0, 0.0, std::f64::consts::PI * 2.0);
        ctx.fill();
        ctx.set_font("11px sans-serif");
        let _ = ctx.fill_text(user_id, cursor.x + 8.0, cursor.y - 8.0);
    }
}
