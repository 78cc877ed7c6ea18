use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Function, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, ClipboardEvent, Document, Event, FileReader, HtmlAnchorElement,
    HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlImageElement, HtmlInputElement,
    HtmlSpanElement, ImageData, KeyboardEvent, PointerEvent, ProgressEvent, Window,
};

use scrawlboard_shared::{ClientEvent, Point, ServerEvent, Shape};

use crate::board::Board;
use crate::chat::request_chat_reply;
use crate::dom::{
    event_to_point, get_element, resize_canvas, set_status, set_tool_button, update_width_label,
};
use crate::fill::{flood_fill, parse_hex_color, Raster};
use crate::net::{board_id_from_location, pasted_media_url};
use crate::persistence::{encode_save_payload, parse_load_payload, to_binary_string};
use crate::render::redraw;
use crate::session::{finalize_image, finalize_overlay, finalize_text, DrawSession, Tool};
use crate::state::{State, DEFAULT_COLOR, DEFAULT_WIDTH};
use crate::util::{make_id, make_user_id};
use crate::ws::{connect_ws, WsEvent, WsSender};

const FALLBACK_ROOM: &str = "default-room";
const PASTED_IMAGE_MAX: f64 = 480.0;
const PASTED_IMAGE_ANCHOR: f64 = 40.0;

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1")
        || search.contains("debug=true")
        || search.contains("log=1")
        || search.contains("log=true")
}

fn sanitize_width(width: f64) -> f64 {
    if width.is_finite() {
        width.clamp(1.0, 20.0)
    } else {
        DEFAULT_WIDTH
    }
}

fn server_event_kind(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::DrawShape { .. } => "draw-shape",
        ServerEvent::UpdateShape { .. } => "update-shape",
        ServerEvent::ClearCanvas => "clear-canvas",
        ServerEvent::CursorMove { .. } => "cursor-move",
    }
}

fn sync_tool_buttons(buttons: &[(Tool, HtmlButtonElement)], active: Tool) {
    for (tool, button) in buttons {
        set_tool_button(button, *tool == active);
    }
}

fn coalesced_pointer_events(event: &PointerEvent) -> Vec<PointerEvent> {
    let get_coalesced_events =
        Reflect::get(event.as_ref(), &JsValue::from_str("getCoalescedEvents"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());

    let mut out = Vec::new();
    if let Some(get_coalesced_events) = get_coalesced_events {
        if let Ok(events) = get_coalesced_events
            .call0(event.as_ref())
            .and_then(|value| value.dyn_into::<js_sys::Array>())
        {
            out.reserve(events.length() as usize + 1);
            for index in 0..events.length() {
                if let Ok(event) = events.get(index).dyn_into::<PointerEvent>() {
                    out.push(event);
                }
            }
        }
    }
    out.push(event.clone());
    out.sort_by(|a, b| {
        a.time_stamp()
            .partial_cmp(&b.time_stamp())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

fn read_loaded_bytes(event: &ProgressEvent) -> Option<Vec<u8>> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    let buffer = reader
        .result()
        .ok()?
        .dyn_into::<js_sys::ArrayBuffer>()
        .ok()?;
    Some(Uint8Array::new(&buffer).to_vec())
}

/// Image and overlay shapes carry their bitmap as a `src`; decode it into a
/// cached element whose onload repaints the board.
fn cache_shape_image(state_rc: &Rc<RefCell<State>>, shape: &Shape) {
    let Some(src) = shape.image_src().map(str::to_string) else {
        return;
    };
    if state_rc.borrow().images.contains_key(&src) {
        return;
    }
    let Ok(image) = HtmlImageElement::new() else {
        return;
    };
    image.set_cross_origin(Some("anonymous"));
    let redraw_state = state_rc.clone();
    let onload = Closure::once_into_js(move || {
        let state = redraw_state.borrow();
        redraw(&state);
    });
    image.set_onload(Some(onload.unchecked_ref()));
    image.set_src(&src);
    state_rc.borrow_mut().images.insert(src, image);
}

fn apply_server_event(state_rc: &Rc<RefCell<State>>, event: ServerEvent, debug: bool) {
    if debug {
        web_sys::console::log_1(&format!("WS event type={}", server_event_kind(&event)).into());
    }
    match event {
        ServerEvent::DrawShape { shape } => {
            cache_shape_image(state_rc, &shape);
            let mut state = state_rc.borrow_mut();
            state.board.push(shape);
            redraw(&state);
        }
        ServerEvent::UpdateShape { shape } => {
            cache_shape_image(state_rc, &shape);
            let mut state = state_rc.borrow_mut();
            if !state.board.replace(shape) && debug {
                web_sys::console::warn_1(&"update-shape for an unknown id dropped".into());
            }
            redraw(&state);
        }
        ServerEvent::ClearCanvas => {
            let mut state = state_rc.borrow_mut();
            state.board.clear();
            state.prune_images();
            redraw(&state);
        }
        ServerEvent::CursorMove { user_id, x, y } => {
            let mut state = state_rc.borrow_mut();
            state.touch_cursor(user_id, x, y, js_sys::Date::now());
            redraw(&state);
        }
    }
}

/// Bucket pointer-down. A hit on a fillable shape becomes an id-addressed
/// fill-update; a miss rasterizes the canvas and flood-fills it into a new
/// overlay shape. Both paths broadcast like any other mutation.
fn apply_bucket(
    state_rc: &Rc<RefCell<State>>,
    window: &Window,
    document: &Document,
    point: Point,
    sender: &Rc<WsSender>,
    room_id: &str,
) {
    let hit = state_rc.borrow().board.hit_test(point);
    if let Some(id) = hit {
        let updated = {
            let mut state = state_rc.borrow_mut();
            let color = state.color.clone();
            let updated = state.board.set_fill(&id, &color);
            if updated.is_some() {
                redraw(&state);
            }
            updated
        };
        if let Some(shape) = updated {
            sender.send(&ClientEvent::UpdateShape {
                room_id: room_id.to_string(),
                shape,
            });
        }
        return;
    }

    if let Some(shape) = run_flood_fill(state_rc, window, document, point) {
        cache_shape_image(state_rc, &shape);
        redraw(&state_rc.borrow());
        sender.send(&ClientEvent::DrawShape {
            room_id: room_id.to_string(),
            shape,
        });
    }
}

fn run_flood_fill(
    state_rc: &Rc<RefCell<State>>,
    window: &Window,
    document: &Document,
    point: Point,
) -> Option<Shape> {
    let (fill, device_seed, width_px, height_px, board_width, board_height) = {
        let state = state_rc.borrow();
        let fill = parse_hex_color(&state.color)?;
        let dpr = window.device_pixel_ratio();
        (
            fill,
            Point::new(point.x * dpr, point.y * dpr),
            state.canvas.width(),
            state.canvas.height(),
            state.board_width,
            state.board_height,
        )
    };

    let bytes = {
        let state = state_rc.borrow();
        let image_data = state
            .ctx
            .get_image_data(0.0, 0.0, f64::from(width_px), f64::from(height_px))
            .ok()?;
        image_data.data().0
    };
    let mut raster = Raster::from_rgba(width_px, height_px, bytes)?;
    if !flood_fill(&mut raster, device_seed, fill) {
        return None;
    }

    let src = raster_to_data_url(document, raster)?;
    let mut state = state_rc.borrow_mut();
    finalize_overlay(&mut state.board, make_id(), board_width, board_height, src)
}

fn raster_to_data_url(document: &Document, raster: Raster) -> Option<String> {
    let width = raster.width();
    let height = raster.height();
    let bytes = raster.into_rgba();
    let image_data =
        ImageData::new_with_u8_clamped_array_and_sh(wasm_bindgen::Clamped(&bytes), width, height)
            .ok()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx = canvas
        .get_context("2d")
        .ok()??
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()?;
    ctx.put_image_data(&image_data, 0.0, 0.0).ok()?;
    canvas.to_data_url().ok()
}

/// Pasted bitmaps and recognized media links enter the board as image shapes.
/// The element loads first so the shape gets real dimensions.
fn insert_pasted_image(
    state_rc: &Rc<RefCell<State>>,
    src: String,
    sender: &Rc<WsSender>,
    room_id: &str,
) {
    let Ok(image) = HtmlImageElement::new() else {
        return;
    };
    image.set_cross_origin(Some("anonymous"));
    let state_rc = state_rc.clone();
    let sender = sender.clone();
    let room_id = room_id.to_string();
    let image_cb = image.clone();
    let src_cb = src.clone();
    let onload = Closure::once_into_js(move || {
        let natural_width = f64::from(image_cb.natural_width()).max(1.0);
        let natural_height = f64::from(image_cb.natural_height()).max(1.0);
        let scale = (PASTED_IMAGE_MAX / natural_width).min(1.0);
        let shape = {
            let mut state = state_rc.borrow_mut();
            state.images.insert(src_cb.clone(), image_cb.clone());
            let shape = finalize_image(
                &mut state.board,
                make_id(),
                PASTED_IMAGE_ANCHOR,
                PASTED_IMAGE_ANCHOR,
                natural_width * scale,
                natural_height * scale,
                src_cb,
            );
            redraw(&state);
            shape
        };
        if let Some(shape) = shape {
            sender.send(&ClientEvent::DrawShape { room_id, shape });
        }
    });
    image.set_onload(Some(onload.unchecked_ref()));
    image.set_src(&src);
}

fn paste_image_file(
    state_rc: &Rc<RefCell<State>>,
    file: &web_sys::File,
    sender: &Rc<WsSender>,
    room_id: &str,
) {
    let Ok(reader) = FileReader::new() else {
        return;
    };
    let state_rc = state_rc.clone();
    let sender = sender.clone();
    let room_id = room_id.to_string();
    let onload = Closure::once_into_js(move |event: ProgressEvent| {
        let src = event
            .target()
            .and_then(|target| target.dyn_into::<FileReader>().ok())
            .and_then(|reader| reader.result().ok())
            .and_then(|value| value.as_string());
        if let Some(src) = src {
            insert_pasted_image(&state_rc, src, &sender, &room_id);
        }
    });
    reader.set_onload(Some(onload.unchecked_ref()));
    let _ = reader.read_as_data_url(file);
}

fn append_chat_line(document: &Document, log: &HtmlElement, role: &str, text: &str) {
    let Ok(line) = document.create_element("div") else {
        return;
    };
    line.set_class_name(&format!("chat-line {role}"));
    line.set_text_content(Some(text));
    let _ = log.append_child(&line);
    log.set_scroll_top(log.scroll_height());
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let debug = debug_enabled(&window);
    if debug {
        let href = window.location().href().ok().unwrap_or_default();
        web_sys::console::log_1(&format!("Scrawlboard debug enabled href={href}").into());
    }

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let pen_button: HtmlButtonElement = get_element(&document, "pen")?;
    let eraser_button: HtmlButtonElement = get_element(&document, "eraser")?;
    let rect_button: HtmlButtonElement = get_element(&document, "rect")?;
    let circle_button: HtmlButtonElement = get_element(&document, "circle")?;
    let text_button: HtmlButtonElement = get_element(&document, "text")?;
    let bucket_button: HtmlButtonElement = get_element(&document, "bucket")?;
    let color_input: HtmlInputElement = get_element(&document, "color")?;
    let width_input: HtmlInputElement = get_element(&document, "width")?;
    let width_value: HtmlSpanElement = get_element(&document, "widthValue")?;
    let clear_button: HtmlButtonElement = get_element(&document, "clear")?;
    let save_button: HtmlButtonElement = get_element(&document, "save")?;
    let load_button: HtmlButtonElement = get_element(&document, "load")?;
    let load_file: HtmlInputElement = get_element(&document, "loadFile")?;
    let chat_toggle: HtmlButtonElement = get_element(&document, "chatToggle")?;
    let chat_panel: HtmlElement = get_element(&document, "chatPanel")?;
    let chat_log: HtmlElement = get_element(&document, "chatLog")?;
    let chat_input: HtmlInputElement = get_element(&document, "chatInput")?;
    let chat_send: HtmlButtonElement = get_element(&document, "chatSend")?;
    let chat_close: HtmlButtonElement = get_element(&document, "chatClose")?;
    let status_el = document
        .get_element_by_id("status")
        .ok_or_else(|| JsValue::from_str("Missing status element"))?;
    let status_text = document
        .get_element_by_id("statusText")
        .ok_or_else(|| JsValue::from_str("Missing status text"))?;

    let room_id = board_id_from_location(&window.location())
        .unwrap_or_else(|| FALLBACK_ROOM.to_string());
    let user_id = make_user_id();

    let initial_color = {
        let value = color_input.value();
        if value.is_empty() {
            DEFAULT_COLOR.to_string()
        } else {
            value
        }
    };
    let state = Rc::new(RefCell::new(State {
        canvas: canvas.clone(),
        ctx,
        board: Board::new(),
        session: DrawSession::new(),
        tool: Tool::Pen,
        color: initial_color,
        width: sanitize_width(width_input.value_as_number()),
        board_width: 0.0,
        board_height: 0.0,
        images: HashMap::new(),
        cursors: HashMap::new(),
    }));

    let tool_buttons: Rc<Vec<(Tool, HtmlButtonElement)>> = Rc::new(vec![
        (Tool::Pen, pen_button),
        (Tool::Eraser, eraser_button),
        (Tool::Rect, rect_button),
        (Tool::Circle, circle_button),
        (Tool::Text, text_button),
        (Tool::Bucket, bucket_button),
    ]);
    sync_tool_buttons(&tool_buttons, Tool::Pen);
    update_width_label(&width_input, &width_value);
    set_status(&status_el, &status_text, "connecting", "Connecting...");

    let sender_slot: Rc<RefCell<Option<Rc<WsSender>>>> = Rc::new(RefCell::new(None));
    let sender = {
        let message_state = state.clone();
        let status_el = status_el.clone();
        let status_text = status_text.clone();
        let sender_slot = sender_slot.clone();
        let room_id = room_id.clone();
        connect_ws(&window, move |event| match event {
            WsEvent::Open => {
                set_status(&status_el, &status_text, "open", "Live connection");
                if let Some(sender) = sender_slot.borrow().as_ref() {
                    sender.send(&ClientEvent::JoinRoom {
                        room_id: room_id.clone(),
                    });
                }
            }
            WsEvent::Close => set_status(&status_el, &status_text, "closed", "Offline"),
            WsEvent::Error => set_status(&status_el, &status_text, "closed", "Connection error"),
            WsEvent::Message(message) => apply_server_event(&message_state, message, debug),
        })?
    };
    sender_slot.borrow_mut().replace(sender.clone());

    {
        let resize_state = state.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let mut state = resize_state.borrow_mut();
            resize_canvas(&window_cb, &mut state);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }
    {
        let mut state = state.borrow_mut();
        resize_canvas(&window, &mut state);
    }

    {
        let color_state = state.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            color_state.borrow_mut().color = color_input_cb.value();
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let width_state = state.clone();
        let width_input_cb = width_input.clone();
        let width_value_cb = width_value.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            update_width_label(&width_input_cb, &width_value_cb);
            width_state.borrow_mut().width = sanitize_width(width_input_cb.value_as_number());
        });
        width_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    for (tool, button) in tool_buttons.iter() {
        let tool = *tool;
        let tool_state = state.clone();
        let buttons = tool_buttons.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            tool_state.borrow_mut().tool = tool;
            sync_tool_buttons(&buttons, tool);
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let clear_state = state.clone();
        let clear_sender = sender.clone();
        let clear_room = room_id.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            {
                let mut state = clear_state.borrow_mut();
                state.board.clear();
                state.prune_images();
                redraw(&state);
            }
            clear_sender.send(&ClientEvent::ClearCanvas {
                room_id: clear_room.clone(),
            });
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let save_state = state.clone();
        let save_window = window.clone();
        let save_document = document.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let payload = {
                let state = save_state.borrow();
                encode_save_payload(state.board.shapes())
            };
            let Ok(encoded) = save_window.btoa(&to_binary_string(&payload)) else {
                return;
            };
            let href = format!("data:application/octet-stream;base64,{encoded}");
            if let Ok(element) = save_document.create_element("a") {
                if let Ok(anchor) = element.dyn_into::<HtmlAnchorElement>() {
                    anchor.set_href(&href);
                    anchor.set_download("scrawlboard.board");
                    anchor.click();
                }
            }
        });
        save_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let load_file_cb = load_file.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            load_file_cb.set_value("");
            load_file_cb.click();
        });
        load_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        // Holds the in-flight read's callback; replaced on the next load.
        let load_onload_slot: Rc<RefCell<Option<Closure<dyn FnMut(ProgressEvent)>>>> =
            Rc::new(RefCell::new(None));
        let load_file_cb = load_file.clone();
        let load_state = state.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let file = load_file_cb.files().and_then(|list| list.get(0));
            let Some(file) = file else {
                return;
            };
            let Ok(reader) = FileReader::new() else {
                return;
            };
            let load_state = load_state.clone();
            let onload = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
                let shapes = read_loaded_bytes(&event)
                    .and_then(|bytes| parse_load_payload(&bytes));
                let Some(shapes) = shapes else {
                    web_sys::console::warn_1(
                        &"Could not read board file; board left unchanged".into(),
                    );
                    return;
                };
                for shape in &shapes {
                    cache_shape_image(&load_state, shape);
                }
                let mut state = load_state.borrow_mut();
                state.board.reset(shapes);
                state.prune_images();
                redraw(&state);
            });
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            load_onload_slot.borrow_mut().replace(onload);
            let _ = reader.read_as_array_buffer(&file);
        });
        load_file.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    // Cursor positions fan out at animation-frame cadence, never per event.
    let cursor_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let cursor_scheduled = Rc::new(Cell::new(false));
    let schedule_cursor_send: Rc<dyn Fn()> = Rc::new({
        let cursor_pos = cursor_pos.clone();
        let cursor_scheduled = cursor_scheduled.clone();
        let sender = sender.clone();
        let window = window.clone();
        let room_id = room_id.clone();
        let user_id = user_id.clone();
        move || {
            if cursor_scheduled.replace(true) {
                return;
            }
            let cursor_pos = cursor_pos.clone();
            let cursor_scheduled = cursor_scheduled.clone();
            let sender = sender.clone();
            let room_id = room_id.clone();
            let user_id = user_id.clone();
            let cb = Closure::once_into_js(move |_: f64| {
                cursor_scheduled.set(false);
                let (x, y) = cursor_pos.get();
                sender.send(&ClientEvent::CursorMove {
                    room_id,
                    user_id,
                    x,
                    y,
                });
            });
            let _ = window.request_animation_frame(cb.unchecked_ref());
        }
    });

    {
        let down_state = state.clone();
        let down_sender = sender.clone();
        let down_canvas = canvas.clone();
        let down_window = window.clone();
        let down_document = document.clone();
        let down_room = room_id.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let Some(point) = event_to_point(&down_canvas, &event) else {
                return;
            };
            let tool = down_state.borrow().tool;
            match tool {
                Tool::Text => {
                    let content = down_window
                        .prompt_with_message("Add text:")
                        .ok()
                        .flatten()
                        .unwrap_or_default();
                    let shape = {
                        let mut state = down_state.borrow_mut();
                        let brush = state.brush();
                        let shape =
                            finalize_text(&mut state.board, make_id(), point, &content, &brush);
                        if shape.is_some() {
                            redraw(&state);
                        }
                        shape
                    };
                    if let Some(shape) = shape {
                        down_sender.send(&ClientEvent::DrawShape {
                            room_id: down_room.clone(),
                            shape,
                        });
                    }
                }
                Tool::Bucket => {
                    apply_bucket(
                        &down_state,
                        &down_window,
                        &down_document,
                        point,
                        &down_sender,
                        &down_room,
                    );
                }
                Tool::Pen | Tool::Eraser | Tool::Rect | Tool::Circle => {
                    let mut state = down_state.borrow_mut();
                    let brush = state.brush();
                    if state.session.begin(make_id(), tool, &brush, point) {
                        redraw(&state);
                        let _ = down_canvas.set_pointer_capture(event.pointer_id());
                    }
                }
            }
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_state = state.clone();
        let move_canvas = canvas.clone();
        let move_schedule = schedule_cursor_send.clone();
        let move_cursor_pos = cursor_pos.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            for event in coalesced_pointer_events(&event) {
                let Some(point) = event_to_point(&move_canvas, &event) else {
                    continue;
                };
                {
                    let mut state = move_state.borrow_mut();
                    if state.session.update(point) {
                        redraw(&state);
                    }
                }
                move_cursor_pos.set((point.x, point.y));
                move_schedule();
            }
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let stop_state = state.clone();
        let stop_sender = sender.clone();
        let stop_canvas = canvas.clone();
        let stop_room = room_id.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let shape = {
                let mut state = stop_state.borrow_mut();
                if !state.session.is_active() {
                    return;
                }
                let state = &mut *state;
                let shape = state.session.finish(&mut state.board);
                redraw(state);
                shape
            };
            event.prevent_default();
            if stop_canvas.has_pointer_capture(event.pointer_id()) {
                let _ = stop_canvas.release_pointer_capture(event.pointer_id());
            }
            if let Some(shape) = shape {
                stop_sender.send(&ClientEvent::DrawShape {
                    room_id: stop_room.clone(),
                    shape,
                });
            }
        });
        canvas.add_event_listener_with_callback("pointerup", onstop.as_ref().unchecked_ref())?;
        canvas
            .add_event_listener_with_callback("pointercancel", onstop.as_ref().unchecked_ref())?;
        canvas.add_event_listener_with_callback("pointerleave", onstop.as_ref().unchecked_ref())?;
        onstop.forget();
    }

    {
        let paste_state = state.clone();
        let paste_sender = sender.clone();
        let paste_room = room_id.clone();
        let onpaste = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Ok(event) = event.dyn_into::<ClipboardEvent>() else {
                return;
            };
            let Some(data) = event.clipboard_data() else {
                return;
            };
            if let Some(file) = data.files().and_then(|list| list.get(0)) {
                if file.type_().starts_with("image/") {
                    event.prevent_default();
                    paste_image_file(&paste_state, &file, &paste_sender, &paste_room);
                    return;
                }
            }
            let Ok(text) = data.get_data("text") else {
                return;
            };
            if let Some(src) = pasted_media_url(&text) {
                event.prevent_default();
                insert_pasted_image(&paste_state, src, &paste_sender, &paste_room);
            }
        });
        document.add_event_listener_with_callback("paste", onpaste.as_ref().unchecked_ref())?;
        onpaste.forget();
    }

    {
        let chat_panel_cb = chat_panel.clone();
        let chat_input_cb = chat_input.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if chat_panel_cb.has_attribute("hidden") {
                let _ = chat_panel_cb.remove_attribute("hidden");
                let _ = chat_input_cb.focus();
            } else {
                let _ = chat_panel_cb.set_attribute("hidden", "");
            }
        });
        chat_toggle.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let chat_panel_cb = chat_panel.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let _ = chat_panel_cb.set_attribute("hidden", "");
        });
        chat_close.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    let send_chat: Rc<dyn Fn()> = Rc::new({
        let chat_input = chat_input.clone();
        let chat_log = chat_log.clone();
        let document = document.clone();
        move || {
            let message = chat_input.value().trim().to_string();
            if message.is_empty() {
                return;
            }
            chat_input.set_value("");
            append_chat_line(&document, &chat_log, "you", &message);
            let document = document.clone();
            let chat_log = chat_log.clone();
            request_chat_reply(message, move |result| match result {
                Ok(reply) => append_chat_line(&document, &chat_log, "assistant", &reply),
                Err(error) => append_chat_line(&document, &chat_log, "error", &error),
            });
        }
    });

    {
        let send_chat = send_chat.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            send_chat();
        });
        chat_send.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let send_chat = send_chat.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                event.prevent_default();
                send_chat();
            }
        });
        chat_input
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let prune_state = state.clone();
        let oninterval = Closure::<dyn FnMut()>::new(move || {
            let mut state = prune_state.borrow_mut();
            if state.prune_cursors(js_sys::Date::now()) {
                redraw(&state);
            }
        });
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            oninterval.as_ref().unchecked_ref(),
            1000,
        );
        oninterval.forget();
    }

    Ok(())
}
