//! AnIML EncodedValueSet decoding
//!
//! AnIML series may carry their values as a base64-wrapped run of
//! little-endian IEEE floats instead of individual elements. The decode
//! pipeline is:
//!
//! 1. Base64 decode the element text
//! 2. Interpret the bytes as float32 or float64 (little-endian)

use std::io::Cursor;

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt};

/// Value width of an encoded series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueEncoding {
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    #[default]
    Float64,
}

impl ValueEncoding {
    /// Resolve from an AnIML `seriesType` attribute value.
    pub fn from_series_type(series_type: &str) -> Option<Self> {
        match series_type.to_ascii_lowercase().as_str() {
            "float32" | "float" => Some(ValueEncoding::Float32),
            "float64" | "double" => Some(ValueEncoding::Float64),
            _ => None,
        }
    }

    /// Bytes per value.
    pub fn byte_size(&self) -> usize {
        match self {
            ValueEncoding::Float32 => 4,
            ValueEncoding::Float64 => 8,
        }
    }
}

/// Errors that can occur while decoding an EncodedValueSet payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodedDecodeError {
    /// Payload was not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Byte count was not a multiple of the value width.
    #[error("invalid data length: {actual} bytes is not a multiple of {width}")]
    InvalidLength {
        /// Bytes available after base64 decode.
        actual: usize,
        /// Width of one value in bytes.
        width: usize,
    },

    /// Reading floats out of the byte buffer failed.
    #[error("byte read error: {0}")]
    ByteRead(#[from] std::io::Error),
}

/// Decode a base64 EncodedValueSet payload into f64 values.
pub fn decode(text: &str, encoding: ValueEncoding) -> Result<Vec<f64>, EncodedDecodeError> {
    let trimmed: String = text.split_whitespace().collect();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let bytes = BASE64_STANDARD.decode(trimmed)?;
    bytes_to_floats(&bytes, encoding)
}

fn bytes_to_floats(bytes: &[u8], encoding: ValueEncoding) -> Result<Vec<f64>, EncodedDecodeError> {
    let width = encoding.byte_size();
    if bytes.len() % width != 0 {
        return Err(EncodedDecodeError::InvalidLength {
            actual: bytes.len(),
            width,
        });
    }

    let count = bytes.len() / width;
    let mut values = Vec::with_capacity(count);
    let mut cursor = Cursor::new(bytes);

    match encoding {
        ValueEncoding::Float32 => {
            for _ in 0..count {
                values.push(cursor.read_f32::<LittleEndian>()? as f64);
            }
        }
        ValueEncoding::Float64 => {
            for _ in 0..count {
                values.push(cursor.read_f64::<LittleEndian>()?);
            }
        }
    }

    Ok(values)
}
