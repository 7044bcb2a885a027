//! Big-endian fixed-width decoding (C1).
//!
//! Every multi-byte integer in the SQLite file format is big-endian, and
//! several widths (3, 5, 6 bytes) don't correspond to a native Rust type,
//! so the signed reader sign-extends from the high bit of the first byte
//! after widening into an i64.

use crate::error::EngineError;
use anyhow::{Context, Result};

pub fn u16_be(bytes: &[u8]) -> Result<u16> {
    let arr: [u8; 2] = bytes
        .get(..2)
        .context("u16_be: not enough bytes")?
        .try_into()?;
    Ok(u16::from_be_bytes(arr))
}

pub fn u32_be(bytes: &[u8]) -> Result<u32> {
    let arr: [u8; 4] = bytes
        .get(..4)
        .context("u32_be: not enough bytes")?
        .try_into()?;
    Ok(u32::from_be_bytes(arr))
}

/// Reads a big-endian two's-complement integer of `len` bytes (`len` must be
/// one of 1, 2, 3, 4, 6, 8) and sign-extends it into an `i64`.
pub fn i_be(bytes: &[u8], len: usize) -> Result<i64> {
    if bytes.len() < len {
        return Err(EngineError::Corrupt(format!(
            "i_be: need {len} bytes, have {}",
            bytes.len()
        ))
        .into());
    }
    if !matches!(len, 1 | 2 | 3 | 4 | 6 | 8) {
        return Err(EngineError::Corrupt(format!("i_be: unsupported width {len}")).into());
    }

    let negative = bytes[0] & 0x80 != 0;
    let mut widened = [if negative { 0xFFu8 } else { 0x00u8 }; 8];
    widened[8 - len..].copy_from_slice(&bytes[..len]);
    Ok(i64::from_be_bytes(widened))
}

pub fn f64_be(bytes: &[u8]) -> Result<f64> {
    let arr: [u8; 8] = bytes
        .get(..8)
        .context("f64_be: not enough bytes")?
        .try_into()?;
    Ok(f64::from_be_bytes(arr))
}
