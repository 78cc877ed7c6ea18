use scrawlboard_shared::ShapeId;

pub fn make_id() -> ShapeId {
    ShapeId::new(uuid::Uuid::new_v4().to_string())
}

/// Short per-tab identity used to label cursor-move events.
pub fn make_user_id() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    format!("u-{}", &id[..8])
}
