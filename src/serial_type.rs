//! Serial-type codec (C3): maps a record-header serial type code to a
//! payload length and to a decoded, tagged value.

use crate::byte_reader::{f64_be, i_be};
use crate::error::EngineError;
use anyhow::Result;

/// A decoded column value. Kept as a tagged union rather than a raw byte
/// slice reinterpreted at print time, so comparison semantics (byte-lex
/// only, no type affinity) stay explicit at every call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(Vec<u8>),
    Blob(Vec<u8>),
}

impl Value {
    /// Renders the value the way a result row concatenates its columns:
    /// `Null` as empty, numbers in their natural decimal form, text/blob as
    /// raw bytes (assumed UTF-8 for text; blobs are rendered lossily since
    /// there is no binary-safe stdout path in this CLI).
    pub fn display_bytes(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Int(i) => i.to_string().into_bytes(),
            Value::Float(f) => f.to_string().into_bytes(),
            Value::Text(bytes) => bytes.clone(),
            Value::Blob(bytes) => bytes.clone(),
        }
    }

    /// Byte-lexicographic comparison key used by WHERE equality and index
    /// ordering. Integers and floats are rendered to their decimal text
    /// form first: the engine's restricted grammar only ever compares a
    /// stored value against a literal token from the SELECT text, so both
    /// sides are compared as bytes rather than through numeric coercion.
    pub fn comparison_bytes(&self) -> Vec<u8> {
        self.display_bytes()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// A serial type code decoded from a record header varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    I8,
    I16,
    I24,
    I32,
    I48,
    I64,
    F64,
    Zero,
    One,
    Reserved,
    Blob(u64),
    Text(u64),
}

impl SerialType {
    pub fn from_code(code: u64) -> Result<Self> {
        Ok(match code {
            0 => SerialType::Null,
            1 => SerialType::I8,
            2 => SerialType::I16,
            3 => SerialType::I24,
            4 => SerialType::I32,
            5 => SerialType::I48,
            6 => SerialType::I64,
            7 => SerialType::F64,
            8 => SerialType::Zero,
            9 => SerialType::One,
            10 | 11 => SerialType::Reserved,
            n if n >= 12 && n % 2 == 0 => SerialType::Blob((n - 12) / 2),
            n if n >= 13 && n % 2 == 1 => SerialType::Text((n - 13) / 2),
            n => return Err(EngineError::Corrupt(format!("invalid serial type {n}")).into()),
        })
    }

    /// The number of payload bytes this serial type occupies in a record body.
    pub fn payload_len(&self) -> usize {
        match self {
            SerialType::Null => 0,
            SerialType::I8 => 1,
            SerialType::I16 => 2,
            SerialType::I24 => 3,
            SerialType::I32 => 4,
            SerialType::I48 => 6,
            SerialType::I64 => 8,
            SerialType::F64 => 8,
            SerialType::Zero => 0,
            SerialType::One => 0,
            SerialType::Reserved => 0,
            SerialType::Blob(n) => *n as usize,
            SerialType::Text(n) => *n as usize,
        }
    }

    /// Decodes this serial type's value out of `body`, which must start at
    /// the column's payload and contain at least `payload_len()` bytes.
    pub fn decode(&self, body: &[u8]) -> Result<Value> {
        let len = self.payload_len();
        if body.len() < len {
            return Err(EngineError::Corrupt(format!(
                "serial type payload truncated: need {len}, have {}",
                body.len()
            ))
            .into());
        }

        Ok(match self {
            SerialType::Null => Value::Null,
            SerialType::I8 => Value::Int(i_be(body, 1)?),
            SerialType::I16 => Value::Int(i_be(body, 2)?),
            SerialType::I24 => Value::Int(i_be(body, 3)?),
            SerialType::I32 => Value::Int(i_be(body, 4)?),
            SerialType::I48 => Value::Int(i_be(body, 6)?),
            SerialType::I64 => Value::Int(i_be(body, 8)?),
            SerialType::F64 => Value::Float(f64_be(body)?),
            SerialType::Zero => Value::Int(0),
            SerialType::One => Value::Int(1),
            SerialType::Reserved => Value::Null,
            SerialType::Blob(n) => Value::Blob(body[..*n as usize].to_vec()),
            SerialType::Text(n) => Value::Text(body[..*n as usize].to_vec()),
        })
    }
}
