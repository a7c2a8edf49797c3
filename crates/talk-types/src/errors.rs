//! Error types for parsing Talk domain values

/// Errors raised when a wire value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("unknown {kind} `{value}`; expected one of: {expected}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl TypeError {
    pub(crate) fn unknown(kind: &'static str, value: &str, expected: &'static str) -> Self {
        TypeError::UnknownVariant {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
