use bincode::{Decode, Encode};
use thiserror::Error;

use crate::Shape;

pub const BOARD_FILE_MAGIC: [u8; 4] = *b"SCWB";
pub const BOARD_FILE_VERSION: u32 = 1;
const BOARD_HEADER_LEN: usize = BOARD_FILE_MAGIC.len() + std::mem::size_of::<u32>();

#[derive(Clone, Debug, Default, Encode, Decode, serde::Serialize, serde::Deserialize)]
pub struct BoardFileData {
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Error)]
pub enum BoardFileError {
    #[error("unsupported board file version {0}")]
    UnsupportedVersion(u32),
    #[error("not a board file")]
    InvalidData,
}

pub fn encode_board_file(data: &BoardFileData) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&BOARD_FILE_MAGIC);
    payload.extend_from_slice(&BOARD_FILE_VERSION.to_le_bytes());
    let body = bincode::encode_to_vec(data, bincode::config::standard()).unwrap_or_default();
    payload.extend_from_slice(&body);
    payload
}

pub fn decode_board_file(payload: &[u8]) -> Result<BoardFileData, BoardFileError> {
    if !(payload.len() >= BOARD_HEADER_LEN && payload.starts_with(&BOARD_FILE_MAGIC)) {
        return Err(BoardFileError::InvalidData);
    }
    let version = u32::from_le_bytes(
        payload[BOARD_FILE_MAGIC.len()..BOARD_HEADER_LEN]
            .try_into()
            .map_err(|_| BoardFileError::InvalidData)?,
    );
    let body = &payload[BOARD_HEADER_LEN..];
    match version {
        1 => bincode::decode_from_slice(body, bincode::config::standard())
            .map(|(data, _)| data)
            .map_err(|_| BoardFileError::InvalidData),
        _ => Err(BoardFileError::UnsupportedVersion(version)),
    }
}
