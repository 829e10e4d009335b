//! Leaf type codes and their display names.

use std::borrow::Cow;

/// Single-character leaf type codes and the primitive they encode.
pub const TYPE_MAP: [(char, &str); 11] = [
    ('D', "f64"),
    ('F', "f32"),
    ('I', "i32"),
    ('i', "u32"),
    ('L', "i64"),
    ('l', "u64"),
    ('S', "i16"),
    ('s', "u16"),
    ('B', "i8"),
    ('b', "u8"),
    ('O', "bool"),
];

/// Resolve a leaf type code to its display name.
///
/// Unknown codes are returned as-is, so this never fails.
pub fn type_name(code: char) -> Cow<'static, str> {
    TYPE_MAP
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, name)| Cow::Borrowed(*name))
        .unwrap_or_else(|| Cow::Owned(code.to_string()))
}
