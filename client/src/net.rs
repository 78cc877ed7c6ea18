use wasm_bindgen::JsValue;
use web_sys::Window;

pub fn websocket_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}/ws"))
}

/// Room id for this tab, taken from a `/b/{board_id}` path.
pub fn board_id_from_location(location: &web_sys::Location) -> Option<String> {
    let path = location.pathname().ok()?;
    board_id_from_path(&path)
}

fn board_id_from_path(path: &str) -> Option<String> {
    let mut parts = path.trim_matches('/').split('/');
    if parts.next()? != "b" {
        return None;
    }
    let board_id = parts.next()?;
    if board_id.is_empty() {
        None
    } else {
        Some(board_id.to_string())
    }
}

/// Turn pasted text into an image source when it points at something we can
/// show inline: a direct image URL, or a YouTube link (mapped to its
/// thumbnail). Anything else is ignored.
pub fn pasted_media_url(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return None;
    }
    if let Some(video_id) = youtube_video_id(trimmed) {
        return Some(format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"));
    }
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let lower = path.to_ascii_lowercase();
    const IMAGE_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];
    if IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        return Some(trimmed.to_string());
    }
    None
}

fn youtube_video_id(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let id = if let Some(tail) = rest.strip_prefix("youtube.com/watch?") {
        tail.split('&')
            .find_map(|param| param.strip_prefix("v="))?
            .to_string()
    } else if let Some(tail) = rest.strip_prefix("youtu.be/") {
        tail.split(['?', '&']).next()?.to_string()
    } else {
        return None;
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
