use super::cursor::ByteReader;
use super::error::{SerError, SerKind, SerResult};
use crate::field::{FieldElement, FIELD_SIZE};

/// Writes a field element in canonical little-endian order.
pub fn write_felt(out: &mut Vec<u8>, value: &FieldElement) {
    out.extend_from_slice(&value.to_bytes());
}

/// Reads a canonical field element from the byte cursor.
///
/// Non-canonical encodings (values at or above the field modulus) are
/// rejected with an invalid-value error carrying the caller's context.
pub fn read_felt(
    cursor: &mut ByteReader<'_>,
    kind: SerKind,
    field: &'static str,
) -> SerResult<FieldElement> {
    let bytes = cursor.read_array::<FIELD_SIZE>(kind, field)?;
    FieldElement::from_bytes(&bytes).map_err(|_| SerError::invalid_value(kind, field))
}
