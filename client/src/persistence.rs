use scrawlboard_shared::{decode_board_file, encode_board_file, BoardFileData, Shape};

pub fn encode_save_payload(shapes: &[Shape]) -> Vec<u8> {
    encode_board_file(&BoardFileData {
        shapes: shapes.to_vec(),
    })
}

/// Board files load from the versioned blob; a bare JSON shape array is
/// accepted too, so hand-built exports keep working.
pub fn parse_load_payload(bytes: &[u8]) -> Option<Vec<Shape>> {
    if let Ok(BoardFileData { shapes }) = decode_board_file(bytes) {
        return Some(shapes);
    }
    let text = std::str::from_utf8(bytes).ok()?;
    serde_json::from_str::<Vec<Shape>>(text.trim()).ok()
}

/// One byte per char, for feeding binary payloads through `btoa`.
pub fn to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawlboard_shared::{Point, ShapeId};

    fn sample_shapes() -> Vec<Shape> {
        vec![
            Shape::pen(ShapeId::new("a"), Point::new(1.0, 2.0), "#000000".into(), 5.0),
            Shape::rect(ShapeId::new("b"), Point::new(0.0, 0.0), "#ff0000".into(), 2.0),
        ]
    }

    #[test]
    fn save_payload_loads_back() {
        let shapes = sample_shapes();
        let payload = encode_save_payload(&shapes);
        assert_eq!(parse_load_payload(&payload).unwrap(), shapes);
    }

    #[test]
    fn bare_json_array_is_accepted() {
        let shapes = sample_shapes();
        let json = serde_json::to_string(&shapes).unwrap();
        assert_eq!(parse_load_payload(json.as_bytes()).unwrap(), shapes);
    }

    #[test]
    fn unrecognized_payloads_are_rejected() {
        assert!(parse_load_payload(b"not a board").is_none());
        assert!(parse_load_payload(b"{\"shapes\": 3}").is_none());
        assert!(parse_load_payload(&[0xff, 0xfe, 0x00]).is_none());
    }

    #[test]
    fn binary_string_maps_each_byte_to_one_char() {
        let text = to_binary_string(&[0x00, 0x41, 0x80, 0xff]);
        let codes: Vec<u32> = text.chars().map(|c| c as u32).collect();
        assert_eq!(codes, [0x00, 0x41, 0x80, 0xff]);
    }
}
