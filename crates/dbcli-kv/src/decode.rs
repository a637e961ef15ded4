//! Conversion of raw store values into plain JSON.
//!
//! The decoder is all-or-nothing: either every byte-string leaf becomes text
//! or the whole value is rejected. A half-decoded tree would not survive a
//! trip through a text editor.

use serde_json::{Map, Number, Value};

use crate::error::DecodeError;
use crate::raw::RawValue;

/// Leading bytes of a serialized HyperLogLog sketch.
pub const HLL_HEADER: &[u8] = b"HYLL";

/// Decode a raw store value into a JSON tree of strings and numbers.
///
/// Byte strings must be UTF-8. Floats and integers pass through as numbers,
/// with integral floats written as integers; non-finite floats become the
/// text `"inf"`, `"-inf"` or `"nan"`. Binary data carrying the HyperLogLog
/// header is rejected as [`DecodeError::Opaque`].
pub fn decode(raw: &RawValue) -> Result<Value, DecodeError> {
    match raw {
        RawValue::Nil => Ok(Value::Null),
        RawValue::Int(n) => Ok(Value::Number((*n).into())),
        RawValue::Float(f) => Ok(float_value(*f)),
        RawValue::Bytes(bytes) => decode_text(bytes).map(Value::String),
        RawValue::Array(items) => items.iter().map(decode).collect::<Result<_, _>>().map(Value::Array),
        RawValue::Map(pairs) => {
            let mut object = Map::new();
            for (key, value) in pairs {
                object.insert(decode_key(key)?, decode(value)?);
            }
            Ok(Value::Object(object))
        }
    }
}

/// Decode one byte string as text.
///
/// Valid UTF-8 is always text, whatever it starts with.
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        if bytes.starts_with(HLL_HEADER) {
            DecodeError::Opaque
        } else {
            DecodeError::InvalidText {
                valid_up_to: e.utf8_error().valid_up_to(),
            }
        }
    })
}

fn decode_key(key: &RawValue) -> Result<String, DecodeError> {
    match key {
        RawValue::Bytes(bytes) => decode_text(bytes),
        RawValue::Int(n) => Ok(n.to_string()),
        RawValue::Float(f) => Ok(f.to_string()),
        _ => Err(DecodeError::NonTextKey),
    }
}

/// Bounds of the floats that convert to `i64` exactly.
const I64_LOW: f64 = -9_223_372_036_854_775_808.0;
const I64_HIGH: f64 = 9_223_372_036_854_775_808.0;

fn float_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && (I64_LOW..I64_HIGH).contains(&f) {
        return Value::Number((f as i64).into());
    }
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::String("nan".into()),
        None if f > 0.0 => Value::String("inf".into()),
        None => Value::String("-inf".into()),
    }
}
