//! Record encoder.
//!
//! Every record starts with a fixed 64-byte header:
//!
//! | Offset | Size | Field                                    |
//! |--------|------|------------------------------------------|
//! | 0      | 6    | magic `DATAMO`                           |
//! | 6      | 24   | timestamp `DD/MM/YYYY~HH:MM:SS::mmm`     |
//! | 30     | 2    | type tag (i16)                           |
//! | 32     | 24   | name, space padded                       |
//! | 56     | 8    | payload size (i64)                       |
//!
//! followed by the dimension descriptor (tensors only) and the payload.
//! Integers and doubles use host byte order, so logs are only portable
//! between hosts of the same endianness.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Local};
use tracing::warn;

use crate::models::{Item, Payload};

pub const MAGIC: &[u8; 6] = b"DATAMO";
pub const TIMESTAMP_LEN: usize = 24;
pub const NAME_LEN: usize = 24;
/// Size of the fixed header shared by every record.
pub const HEADER_LEN: usize = 6 + TIMESTAMP_LEN + 2 + NAME_LEN + 8;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y~%H:%M:%S::%3f";

/// Total encoded size of `item`, header included.
pub fn encoded_len(item: &Item) -> usize {
    HEADER_LEN + item.payload_size()
}

/// Encode `item` as one complete record stamped with `at`.
pub fn encode(item: &Item, at: &DateTime<Local>) -> BytesMut {
    let mut buf = BytesMut::with_capacity(encoded_len(item));

    buf.put_slice(MAGIC);
    buf.put_slice(&timestamp(at));
    buf.put_i16_ne(item.kind().code());
    buf.put_slice(&name_slot(item.name()));
    buf.put_i64_ne(item.payload_size() as i64);

    match item.payload() {
        Payload::Scalar(value) => buf.put_f64_ne(*value),
        Payload::Tensor(tensor) => {
            for &dim in tensor.descriptor() {
                buf.put_i32_ne(dim);
            }
            for &value in tensor.data() {
                buf.put_f64_ne(value);
            }
        }
        Payload::MetaProject => {}
        Payload::String(text) => buf.put_slice(text.as_bytes()),
    }

    debug_assert_eq!(buf.len(), encoded_len(item));
    buf
}

/// Fixed-width local timestamp, milliseconds truncated.
pub fn timestamp(at: &DateTime<Local>) -> [u8; TIMESTAMP_LEN] {
    let formatted = at.format(TIMESTAMP_FORMAT).to_string();
    debug_assert_eq!(formatted.len(), TIMESTAMP_LEN, "malformed timestamp {formatted:?}");
    let mut slot = [b' '; TIMESTAMP_LEN];
    let len = formatted.len().min(TIMESTAMP_LEN);
    slot[..len].copy_from_slice(&formatted.as_bytes()[..len]);
    slot
}

/// Left-justified, space-padded name field.
///
/// Names longer than the field are cut on a char boundary and a warning
/// is emitted; encoding still succeeds.
pub fn name_slot(name: &str) -> [u8; NAME_LEN] {
    let mut len = name.len().min(NAME_LEN);
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    if len < name.len() {
        warn!(
            name = %name,
            limit = NAME_LEN,
            "item name is longer than the name field and will be truncated"
        );
    }

    let mut slot = [b' '; NAME_LEN];
    slot[..len].copy_from_slice(&name.as_bytes()[..len]);
    slot
}
