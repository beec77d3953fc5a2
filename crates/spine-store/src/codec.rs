//! Binary encode/decode for the record container.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length; arrays with a `u32` element (or row) count. No
//! compression, no alignment padding.

use std::io::{Read, Write};

use spine_core::{FieldValue, RowArray};
use spine_data::StoredRecord;

use crate::error::StoreError;
use crate::types::{StoreHeader, VariantTag};
use crate::{FORMAT_VERSION, MAGIC};

/// Value tag: `Int(i64)`.
pub const TAG_INT: u8 = 0;
/// Value tag: `Float(f64)`.
pub const TAG_FLOAT: u8 = 1;
/// Value tag: `Bool`, one byte.
pub const TAG_BOOL: u8 = 2;
/// Value tag: `Text`, length-prefixed UTF-8.
pub const TAG_TEXT: u8 = 3;
/// Value tag: `Ints`, count then `i64`s.
pub const TAG_INTS: u8 = 4;
/// Value tag: `Floats`, count then `f32`s.
pub const TAG_FLOATS: u8 = 5;
/// Value tag: `IntRows`, row width, row count, then `i64`s.
pub const TAG_INT_ROWS: u8 = 6;
/// Value tag: `FloatRows`, row width, row count, then `f32`s.
pub const TAG_FLOAT_ROWS: u8 = 7;

/// Upper bound on speculative pre-allocation from a decoded count.
const MAX_PREALLOC: usize = 1 << 16;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), StoreError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i64.
pub fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a `u32` length, failing if `len` does not fit.
pub fn write_len(w: &mut dyn Write, len: usize) -> Result<(), StoreError> {
    let len = u32::try_from(len).map_err(|_| StoreError::MalformedRecord {
        detail: format!("length {len} exceeds u32::MAX"),
    })?;
    write_u32_le(w, len)
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), StoreError> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, StoreError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, StoreError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, StoreError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i64.
pub fn read_i64_le(r: &mut dyn Read) -> Result<i64, StoreError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Read a little-endian f32.
pub fn read_f32_le(r: &mut dyn Read) -> Result<f32, StoreError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, StoreError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, StoreError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    (&mut *r).take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(StoreError::MalformedRecord {
            detail: format!("truncated string: got {} of {len} bytes", buf.len()),
        });
    }
    String::from_utf8(buf).map_err(|e| StoreError::MalformedRecord {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

fn read_vec<T>(
    r: &mut dyn Read,
    count: usize,
    mut read_one: impl FnMut(&mut dyn Read) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        out.push(read_one(r)?);
    }
    Ok(out)
}

// ── Value encode/decode ─────────────────────────────────────────

/// Encode one tagged value.
pub fn encode_value(w: &mut dyn Write, value: &FieldValue) -> Result<(), StoreError> {
    match value {
        FieldValue::Int(v) => {
            write_u8(w, TAG_INT)?;
            write_i64_le(w, *v)?;
        }
        FieldValue::Float(v) => {
            write_u8(w, TAG_FLOAT)?;
            write_f64_le(w, *v)?;
        }
        FieldValue::Bool(v) => {
            write_u8(w, TAG_BOOL)?;
            write_u8(w, u8::from(*v))?;
        }
        FieldValue::Text(s) => {
            write_u8(w, TAG_TEXT)?;
            write_length_prefixed_str(w, s)?;
        }
        FieldValue::Ints(v) => {
            write_u8(w, TAG_INTS)?;
            write_len(w, v.len())?;
            for &x in v {
                write_i64_le(w, x)?;
            }
        }
        FieldValue::Floats(v) => {
            write_u8(w, TAG_FLOATS)?;
            write_len(w, v.len())?;
            for &x in v {
                write_f32_le(w, x)?;
            }
        }
        FieldValue::IntRows(rows) => {
            write_u8(w, TAG_INT_ROWS)?;
            write_len(w, rows.dims())?;
            write_len(w, rows.len())?;
            for &x in rows.as_flat() {
                write_i64_le(w, x)?;
            }
        }
        FieldValue::FloatRows(rows) => {
            write_u8(w, TAG_FLOAT_ROWS)?;
            write_len(w, rows.dims())?;
            write_len(w, rows.len())?;
            for &x in rows.as_flat() {
                write_f32_le(w, x)?;
            }
        }
    }
    Ok(())
}

fn read_rows<T: Copy>(
    r: &mut dyn Read,
    read_one: impl FnMut(&mut dyn Read) -> Result<T, StoreError>,
) -> Result<RowArray<T>, StoreError> {
    let dims = read_u32_le(r)? as usize;
    let rows = read_u32_le(r)? as usize;
    let count = dims.checked_mul(rows).ok_or_else(|| StoreError::MalformedRecord {
        detail: format!("row array of {rows} x {dims} overflows"),
    })?;
    let flat = read_vec(r, count, read_one)?;
    RowArray::from_flat(dims, flat).ok_or_else(|| StoreError::MalformedRecord {
        detail: format!("row array with invalid width {dims}"),
    })
}

/// Decode one tagged value.
pub fn decode_value(r: &mut dyn Read) -> Result<FieldValue, StoreError> {
    let tag = read_u8(r)?;
    let value = match tag {
        TAG_INT => FieldValue::Int(read_i64_le(r)?),
        TAG_FLOAT => FieldValue::Float(read_f64_le(r)?),
        TAG_BOOL => match read_u8(r)? {
            0 => FieldValue::Bool(false),
            1 => FieldValue::Bool(true),
            other => {
                return Err(StoreError::MalformedRecord {
                    detail: format!("invalid bool byte: {other}"),
                })
            }
        },
        TAG_TEXT => FieldValue::Text(read_length_prefixed_str(r)?),
        TAG_INTS => {
            let count = read_u32_le(r)? as usize;
            FieldValue::Ints(read_vec(r, count, read_i64_le)?)
        }
        TAG_FLOATS => {
            let count = read_u32_le(r)? as usize;
            FieldValue::Floats(read_vec(r, count, read_f32_le)?)
        }
        TAG_INT_ROWS => FieldValue::IntRows(read_rows(r, read_i64_le)?),
        TAG_FLOAT_ROWS => FieldValue::FloatRows(read_rows(r, read_f32_le)?),
        tag => return Err(StoreError::UnknownValueTag { tag }),
    };
    Ok(value)
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the stream header (magic, version, variant, schema).
pub fn encode_header(w: &mut dyn Write, header: &StoreHeader) -> Result<(), StoreError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u8(w, header.variant.to_u8())?;
    write_u64_le(w, header.schema_hash)?;
    write_len(w, header.fields.len())?;
    for name in &header.fields {
        write_length_prefixed_str(w, name)?;
    }
    Ok(())
}

/// Decode and validate the stream header.
pub fn decode_header(r: &mut dyn Read) -> Result<StoreHeader, StoreError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(StoreError::InvalidMagic);
    }

    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion { found: version });
    }

    let variant_byte = read_u8(r)?;
    let variant = VariantTag::from_u8(variant_byte).ok_or_else(|| StoreError::MalformedRecord {
        detail: format!("unknown variant tag {variant_byte}"),
    })?;
    let schema_hash = read_u64_le(r)?;
    let count = read_u32_le(r)? as usize;
    let fields = read_vec(r, count, read_length_prefixed_str)?;

    Ok(StoreHeader {
        variant,
        schema_hash,
        fields,
    })
}

// ── Record encode/decode ────────────────────────────────────────

/// Encode one record.
pub fn encode_record(w: &mut dyn Write, record: &StoredRecord) -> Result<(), StoreError> {
    write_len(w, record.len())?;
    for (name, value) in record {
        write_length_prefixed_str(w, name)?;
        encode_value(w, value)?;
    }
    Ok(())
}

fn decode_field(r: &mut dyn Read) -> Result<(String, FieldValue), StoreError> {
    let name = read_length_prefixed_str(r)?;
    let value = decode_value(r)?;
    Ok((name, value))
}

/// Decode one record.
///
/// Returns `Ok(None)` on a clean end of stream (no bytes before the next
/// record). A stream that ends inside a record is
/// [`StoreError::MalformedRecord`].
pub fn decode_record(r: &mut dyn Read) -> Result<Option<StoredRecord>, StoreError> {
    // Read the count byte-by-byte to tell clean EOF (zero bytes) from a
    // truncated count (1-3 bytes).
    let mut count_buf = [0u8; 4];
    let mut filled = 0;
    while filled < 4 {
        match r.read(&mut count_buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(StoreError::MalformedRecord {
                    detail: format!("truncated record header: got {filled} of 4 bytes"),
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StoreError::Io(e)),
        }
    }
    let count = u32::from_le_bytes(count_buf) as usize;

    let mut record = StoredRecord::new();
    for i in 0..count {
        let (name, value) = decode_field(r).map_err(|e| match e {
            StoreError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                StoreError::MalformedRecord {
                    detail: format!("record ends inside field {i} of {count}"),
                }
            }
            other => other,
        })?;
        if record.insert(name.clone(), value).is_some() {
            return Err(StoreError::MalformedRecord {
                detail: format!("field '{name}' appears twice"),
            });
        }
    }
    Ok(Some(record))
}
