//! # Record Codec
//!
//! Explicit binary encode/decode of `VectorRecord` for the persistence
//! port. The vector buffer is typed end to end; serialization is this one
//! encode/decode step, never an in-place byte reinterpretation.
//!
//! ## Layout (little-endian)
//!
//! ```text
//! magic:       [u8; 4] = "SREC"
//! version:     u16
//! id:          u32 len + utf8 bytes
//! partition:   u32 len + utf8 bytes
//! content:     u32 len + utf8 bytes
//! created_at:  i64 (microseconds since epoch)
//! metadata:    u32 count, then (u32 len + utf8) key/value pairs
//! vector:      u32 len + f32 components
//! ```

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::DateTime;

use crate::error::{Error, Result};
use crate::types::{Metadata, VectorRecord};

const MAGIC: &[u8; 4] = b"SREC";
const VERSION: u16 = 1;

/// Upper bound on any length field; a frame claiming more is corrupt.
const MAX_FIELD_LEN: u32 = 64 * 1024 * 1024;

/// Encode a record into a self-describing byte frame.
pub fn encode_record(record: &VectorRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + record.vector.len() * 4);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    write_str(&mut buf, &record.id);
    write_str(&mut buf, &record.partition_key);
    write_str(&mut buf, &record.content);
    buf.extend_from_slice(&record.created_at.timestamp_micros().to_le_bytes());
    buf.extend_from_slice(&(record.metadata.len() as u32).to_le_bytes());
    for (key, value) in &record.metadata {
        write_str(&mut buf, key);
        write_str(&mut buf, value);
    }
    buf.extend_from_slice(&(record.vector.len() as u32).to_le_bytes());
    for &component in &record.vector {
        buf.extend_from_slice(&component.to_le_bytes());
    }
    buf
}

/// Decode a frame produced by [`encode_record`].
pub fn decode_record(bytes: &[u8]) -> Result<VectorRecord> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut magic)
        .map_err(|_| corrupt("frame shorter than header"))?;
    if &magic != MAGIC {
        return Err(corrupt("bad record magic"));
    }
    let version = cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| corrupt("missing version"))?;
    if version != VERSION {
        return Err(Error::persistence_msg(format!(
            "unsupported record version: {version}"
        )));
    }

    let id = read_str(&mut cursor, "id")?;
    let partition_key = read_str(&mut cursor, "partition_key")?;
    let content = read_str(&mut cursor, "content")?;

    let micros = cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| corrupt("missing created_at"))?;
    let created_at = DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| corrupt("created_at out of range"))?;

    let meta_count = read_len(&mut cursor, "metadata count")?;
    let mut metadata = Metadata::new();
    for _ in 0..meta_count {
        let key = read_str(&mut cursor, "metadata key")?;
        let value = read_str(&mut cursor, "metadata value")?;
        metadata.insert(key, value);
    }

    let dim = read_len(&mut cursor, "vector length")?;
    let mut vector = Vec::with_capacity(dim as usize);
    for _ in 0..dim {
        vector.push(
            cursor
                .read_f32::<LittleEndian>()
                .map_err(|_| corrupt("vector truncated"))?,
        );
    }

    Ok(VectorRecord {
        id,
        partition_key,
        vector,
        content,
        metadata,
        created_at,
    })
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn read_len(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u32> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| corrupt(format!("missing {what}")))?;
    if len > MAX_FIELD_LEN {
        return Err(corrupt(format!("{what} too large: {len}")));
    }
    Ok(len)
}

fn read_str(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<String> {
    let len = read_len(cursor, what)? as usize;
    let start = cursor.position() as usize;
    let bytes = cursor
        .get_ref()
        .get(start..start + len)
        .ok_or_else(|| corrupt(format!("{what} truncated")))?;
    let s = std::str::from_utf8(bytes)
        .map_err(|_| corrupt(format!("{what} is not valid utf8")))?
        .to_string();
    cursor.set_position((start + len) as u64);
    Ok(s)
}

fn corrupt(message: impl Into<String>) -> Error {
    Error::persistence_msg(format!("corrupt record frame: {}", message.into()))
}
