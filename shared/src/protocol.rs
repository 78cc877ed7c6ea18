use serde::{Deserialize, Serialize};

use crate::Shape;

/// Client-to-relay events. Every frame is a flat JSON object tagged by `type`,
/// carrying the room it targets; the relay strips `roomId` before fan-out.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join-room")]
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    #[serde(rename = "draw-shape")]
    DrawShape {
        #[serde(rename = "roomId")]
        room_id: String,
        shape: Shape,
    },
    #[serde(rename = "update-shape")]
    UpdateShape {
        #[serde(rename = "roomId")]
        room_id: String,
        shape: Shape,
    },
    #[serde(rename = "clear-canvas")]
    ClearCanvas {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    #[serde(rename = "cursor-move")]
    CursorMove {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        x: f64,
        y: f64,
    },
}

/// Relay-to-client events, as received by every room member except the sender.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "draw-shape")]
    DrawShape { shape: Shape },
    #[serde(rename = "update-shape")]
    UpdateShape { shape: Shape },
    #[serde(rename = "clear-canvas")]
    ClearCanvas,
    #[serde(rename = "cursor-move")]
    CursorMove {
        #[serde(rename = "userId")]
        user_id: String,
        x: f64,
        y: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, ShapeId};

    #[test]
    fn join_room_wire_form() {
        let event = ClientEvent::JoinRoom {
            room_id: "default-room".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "join-room", "roomId": "default-room"})
        );
    }

    #[test]
    fn draw_shape_nests_the_flat_shape_object() {
        let shape = Shape::pen(
            ShapeId::new("s1"),
            Point::new(10.0, 10.0),
            "#000000".into(),
            5.0,
        );
        let event = ClientEvent::DrawShape {
            room_id: "r".into(),
            shape,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "draw-shape");
        assert_eq!(value["shape"]["tool"], "pen");
        assert_eq!(value["shape"]["strokeColor"], "#000000");
    }

    #[test]
    fn clear_canvas_server_event_has_empty_payload() {
        let value = serde_json::to_value(ServerEvent::ClearCanvas).unwrap();
        assert_eq!(value, serde_json::json!({"type": "clear-canvas"}));
    }

    #[test]
    fn cursor_move_round_trips() {
        let event = ServerEvent::CursorMove {
            user_id: "u-9".into(),
            x: 12.5,
            y: 40.25,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
