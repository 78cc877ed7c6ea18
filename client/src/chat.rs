pub const CHAT_FALLBACK_ERROR: &str = "Error fetching AI response";

/// Body of the proxy's reply. Success carries `reply`; every failure mode is
/// flattened server-side into an `error` string.
#[derive(serde::Deserialize)]
struct ChatReplyBody {
    reply: Option<String>,
    error: Option<String>,
}

pub fn parse_chat_reply(text: &str) -> Result<String, String> {
    let body: ChatReplyBody =
        serde_json::from_str(text).map_err(|_| CHAT_FALLBACK_ERROR.to_string())?;
    if let Some(reply) = body.reply {
        return Ok(reply);
    }
    Err(body.error.unwrap_or_else(|| CHAT_FALLBACK_ERROR.to_string()))
}

/// Post one message to the chat proxy and hand the outcome to `on_reply`.
/// Fire-and-forget; the panel stays usable while the request is in flight.
pub fn request_chat_reply(message: String, on_reply: impl 'static + FnOnce(Result<String, String>)) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = match fetch_chat_text(&message).await {
            Some(text) => parse_chat_reply(&text),
            None => Err(CHAT_FALLBACK_ERROR.to_string()),
        };
        on_reply(result);
    });
}

/// The proxy answers errors with a JSON body too, so the text is read
/// regardless of status and sorted out by `parse_chat_reply`.
async fn fetch_chat_text(message: &str) -> Option<String> {
    let response = gloo_net::http::Request::post("/api/chat")
        .json(&serde_json::json!({ "message": message }))
        .ok()?
        .send()
        .await
        .ok()?;
    response.text().await.ok()
}
