//! Values as a store driver returns them.

/// A value returned by a store read, before any text decoding.
///
/// Scalars are byte strings; collections nest further raw values. Scores of
/// sorted sets arrive as [`RawValue::Float`].
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// No value.
    Nil,
    /// An integer reply.
    Int(i64),
    /// A floating-point reply.
    Float(f64),
    /// A byte string.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    Array(Vec<RawValue>),
    /// A sequence of key/value pairs.
    Map(Vec<(RawValue, RawValue)>),
}

impl RawValue {
    /// Build a byte-string value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RawValue::Bytes(data.into())
    }

    /// Build an array of byte strings.
    pub fn byte_array<I, B>(items: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        RawValue::Array(items.into_iter().map(RawValue::bytes).collect())
    }

    /// Returns the byte string, if this is one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(data: Vec<u8>) -> Self {
        RawValue::Bytes(data)
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Bytes(text.as_bytes().to_vec())
    }
}

impl From<f64> for RawValue {
    fn from(score: f64) -> Self {
        RawValue::Float(score)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}
