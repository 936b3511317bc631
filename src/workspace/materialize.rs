use crate::shared::fs_atomic::atomic_write_file;
use crate::workspace::{validate_relative_path, Workspace};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Prefix marking `data` as base64-encoded binary rather than raw text.
pub const BASE64_SENTINEL: &str = "data:base64,";

/// One submitted file. Both fields are optional on the wire so that a
/// malformed entry surfaces as a build failure naming the update instead of
/// rejecting the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileUpdate {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl FileUpdate {
    pub fn new(path: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            data: Some(data.into()),
        }
    }

    pub fn binary(path: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(path, format!("{BASE64_SENTINEL}{}", STANDARD.encode(bytes)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("Invalid update structure (update {index})")]
    InvalidUpdate { index: usize },
    #[error("Invalid file path: {path}: {reason}")]
    InvalidPath {
        index: usize,
        path: String,
        reason: String,
    },
    #[error("Invalid base64 data: {path}: {source}")]
    DecodeFailed {
        index: usize,
        path: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("Failed to write file: {path}: {source}")]
    WriteFailed {
        index: usize,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl MaterializeError {
    /// Path of the offending update, empty when the update had none.
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidUpdate { .. } => "",
            Self::InvalidPath { path, .. }
            | Self::DecodeFailed { path, .. }
            | Self::WriteFailed { path, .. } => path,
        }
    }
}

/// Writes every update into the workspace in order, stopping at the first
/// failure. Returns the names written.
pub fn materialize(
    workspace: &Workspace,
    updates: &[FileUpdate],
) -> Result<Vec<String>, MaterializeError> {
    let mut written = Vec::with_capacity(updates.len());
    for (index, update) in updates.iter().enumerate() {
        let (Some(path), Some(data)) = (update.path.as_deref(), update.data.as_deref()) else {
            return Err(MaterializeError::InvalidUpdate { index });
        };

        validate_relative_path(path).map_err(|reason| MaterializeError::InvalidPath {
            index,
            path: path.to_string(),
            reason,
        })?;

        let bytes = decode_payload(data).map_err(|source| MaterializeError::DecodeFailed {
            index,
            path: path.to_string(),
            source,
        })?;

        let target = workspace.file(path);
        atomic_write_file(&target, &bytes).map_err(|source| MaterializeError::WriteFailed {
            index,
            path: path.to_string(),
            source,
        })?;
        written.push(path.to_string());
    }
    Ok(written)
}

fn decode_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    match data.strip_prefix(BASE64_SENTINEL) {
        Some(encoded) => {
            let compact: String = encoded
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            STANDARD.decode(compact)
        }
        None => Ok(data.as_bytes().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_is_written_verbatim() {
        assert_eq!(decode_payload("lda #$00").expect("decode"), b"lda #$00");
    }

    #[test]
    fn sentinel_payload_is_decoded_ignoring_line_breaks() {
        assert_eq!(
            decode_payload("data:base64,AAEC\r\n/w==").expect("decode"),
            vec![0x00, 0x01, 0x02, 0xff]
        );
    }

    #[test]
    fn sentinel_must_be_a_prefix() {
        let raw = " data:base64,AAEC";
        assert_eq!(decode_payload(raw).expect("decode"), raw.as_bytes());
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        assert!(decode_payload("data:base64,@@@").is_err());
    }

    #[test]
    fn binary_constructor_round_trips_through_decode() {
        let update = FileUpdate::binary("charset.bin", &[1, 2, 3, 250]);
        let data = update.data.expect("data");
        assert!(data.starts_with(BASE64_SENTINEL));
        assert_eq!(decode_payload(&data).expect("decode"), vec![1, 2, 3, 250]);
    }
}
