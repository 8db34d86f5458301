//! Tagged varint wire format
//!
//! A minimal protobuf-compatible writer:
//! - unsigned LEB128 varints
//! - field tags `(field << 3) | wire_type`
//! - packed repeated fields (length-delimited run of varints)

/// Wire type of a single varint value
pub const WIRE_VARINT: u8 = 0;

/// Wire type of a length-delimited payload
pub const WIRE_LEN: u8 = 2;

/// Append-only byte buffer for tagged fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an unsigned varint, seven bits per byte, low group first
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a field tag
    pub fn write_tag(&mut self, field: u32, wire_type: u8) {
        self.write_varint((u64::from(field) << 3) | u64::from(wire_type & 0x07));
    }

    /// Write a single varint field
    pub fn write_uint_field(&mut self, field: u32, value: u64) {
        self.write_tag(field, WIRE_VARINT);
        self.write_varint(value);
    }

    /// Write a packed repeated varint field. Empty slices are omitted.
    pub fn write_packed_field(&mut self, field: u32, values: &[u64]) {
        if values.is_empty() {
            return;
        }
        let mut body = ProtoWriter::new();
        for &value in values {
            body.write_varint(value);
        }
        self.write_tag(field, WIRE_LEN);
        self.write_varint(body.buf.len() as u64);
        self.buf.extend_from_slice(&body.buf);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
