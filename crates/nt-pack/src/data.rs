//! Compressed object payloads.
//!
//! Each pack object embeds its serialized form as base64(zlib(YAML)).
//! Encoding and decoding restore the exact bytes.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::{PackError, Result};

/// A base64-encoded, zlib-deflated object payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ObjectData(String);

impl ObjectData {
    /// Compress and encode a serialized object.
    pub fn encode(yaml: &str) -> Result<Self> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(yaml.as_bytes())?;
        let deflated = encoder.finish()?;
        Ok(ObjectData(BASE64.encode(deflated)))
    }

    /// Decode and decompress back to the serialized object.
    pub fn decode(&self) -> Result<String> {
        let deflated = BASE64
            .decode(&self.0)
            .map_err(|e| PackError::Payload(format!("invalid base64: {e}")))?;
        let mut decoder = ZlibDecoder::new(deflated.as_slice());
        let mut yaml = String::new();
        decoder
            .read_to_string(&mut yaml)
            .map_err(|e| PackError::Payload(format!("invalid zlib stream: {e}")))?;
        Ok(yaml)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
