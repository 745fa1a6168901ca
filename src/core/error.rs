// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for cdrbridge.
//!
//! Errors fall into three families, see [`ErrorKind`]:
//! - decode bounds (reading past a buffer, malformed headers and lengths)
//! - encoding invariants (values that cannot be represented in the target form)
//! - native boundary (contract violations detected at the FFI seam)

use std::fmt;

/// Broad classification of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Attempt to read beyond the available bytes or a malformed frame.
    DecodeBounds,
    /// A value that violates the encoding rules of its shape.
    EncodingInvariant,
    /// Malformed data handed in from the native side or allocation failure.
    NativeBoundary,
    /// Anything else.
    Other,
}

/// Errors that can occur while encoding, decoding or marshalling values.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// CDR encapsulation header missing or not understood
    InvalidHeader {
        /// Why the header was rejected
        reason: String,
    },

    /// Buffer too short for requested read
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when error occurred
        cursor_pos: u64,
    },

    /// Array or sequence length exceeded data bounds
    LengthExceeded {
        /// Length that was read
        length: usize,
        /// Position in buffer
        position: usize,
        /// Buffer length
        buffer_len: usize,
    },

    /// Invariant violation (unrepresentable lengths, recursion limits, ...)
    InvariantViolation {
        /// Description of the invariant that was violated
        invariant: String,
    },

    /// Value kind does not match the shape it is encoded with
    TypeMismatch {
        /// Shape that was expected
        expected: String,
        /// Kind of value that was found
        actual: String,
    },

    /// Record value lacks a field named by its shape
    MissingField {
        /// Record type name
        struct_name: String,
        /// Missing field name
        field_name: String,
    },

    /// Enumeration ordinal outside the declared enumerators
    InvalidEnum {
        /// Enumeration type name
        enum_name: String,
        /// Offending ordinal
        ordinal: i64,
        /// Number of declared enumerators
        variant_count: usize,
    },

    /// String payload is not valid UTF-8
    InvalidUtf8 {
        /// Cursor position of the string payload
        position: usize,
        /// Decoder message
        message: String,
    },

    /// Wide character unit that is not a Unicode scalar value
    InvalidChar {
        /// Raw code unit
        code: u32,
    },

    /// Native side violated the block layout contract
    NativeContract {
        /// What was wrong
        message: String,
    },

    /// Native heap could not satisfy an allocation
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
    },

    /// Unsupported type or feature
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Other error
    Other(String),
}

impl CodecError {
    /// Create an invalid header error.
    pub fn invalid_header(reason: impl Into<String>) -> Self {
        CodecError::InvalidHeader {
            reason: reason.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, cursor_pos: u64) -> Self {
        CodecError::BufferTooShort {
            requested,
            available,
            cursor_pos,
        }
    }

    /// Create a length exceeded error.
    pub fn length_exceeded(length: usize, position: usize, buffer_len: usize) -> Self {
        CodecError::LengthExceeded {
            length,
            position,
            buffer_len,
        }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(invariant: impl Into<String>) -> Self {
        CodecError::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(struct_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        CodecError::MissingField {
            struct_name: struct_name.into(),
            field_name: field_name.into(),
        }
    }

    /// Create an invalid enum ordinal error.
    pub fn invalid_enum(enum_name: impl Into<String>, ordinal: i64, variant_count: usize) -> Self {
        CodecError::InvalidEnum {
            enum_name: enum_name.into(),
            ordinal,
            variant_count,
        }
    }

    /// Create an invalid UTF-8 error.
    pub fn invalid_utf8(position: usize, message: impl Into<String>) -> Self {
        CodecError::InvalidUtf8 {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid wide character error.
    pub fn invalid_char(code: u32) -> Self {
        CodecError::InvalidChar { code }
    }

    /// Create a native contract violation error.
    pub fn native_contract(message: impl Into<String>) -> Self {
        CodecError::NativeContract {
            message: message.into(),
        }
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(size: usize) -> Self {
        CodecError::AllocationFailed { size }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::InvalidHeader { .. }
            | CodecError::BufferTooShort { .. }
            | CodecError::LengthExceeded { .. } => ErrorKind::DecodeBounds,
            CodecError::InvariantViolation { .. }
            | CodecError::TypeMismatch { .. }
            | CodecError::MissingField { .. }
            | CodecError::InvalidEnum { .. }
            | CodecError::InvalidUtf8 { .. }
            | CodecError::InvalidChar { .. } => ErrorKind::EncodingInvariant,
            CodecError::NativeContract { .. } | CodecError::AllocationFailed { .. } => {
                ErrorKind::NativeBoundary
            }
            CodecError::Unsupported { .. } | CodecError::Other(_) => ErrorKind::Other,
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::InvalidHeader { reason } => vec![("reason", reason.clone())],
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor", cursor_pos.to_string()),
            ],
            CodecError::LengthExceeded {
                length,
                position,
                buffer_len,
            } => vec![
                ("length", length.to_string()),
                ("position", position.to_string()),
                ("buffer_len", buffer_len.to_string()),
            ],
            CodecError::InvariantViolation { invariant } => {
                vec![("invariant", invariant.clone())]
            }
            CodecError::TypeMismatch { expected, actual } => {
                vec![("expected", expected.clone()), ("actual", actual.clone())]
            }
            CodecError::MissingField {
                struct_name,
                field_name,
            } => vec![("struct", struct_name.clone()), ("field", field_name.clone())],
            CodecError::InvalidEnum {
                enum_name,
                ordinal,
                variant_count,
            } => vec![
                ("enum", enum_name.clone()),
                ("ordinal", ordinal.to_string()),
                ("variants", variant_count.to_string()),
            ],
            CodecError::InvalidUtf8 { position, message } => {
                vec![("position", position.to_string()), ("message", message.clone())]
            }
            CodecError::InvalidChar { code } => vec![("code", format!("{code:#x}"))],
            CodecError::NativeContract { message } => vec![("message", message.clone())],
            CodecError::AllocationFailed { size } => vec![("size", size.to_string())],
            CodecError::Unsupported { feature } => vec![("feature", feature.clone())],
            CodecError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidHeader { reason } => write!(f, "Invalid CDR header: {reason}"),
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => write!(
                f,
                "Buffer too short: requested {requested} bytes at position {cursor_pos}, but only {available} bytes available"
            ),
            CodecError::LengthExceeded {
                length,
                position,
                buffer_len,
            } => write!(
                f,
                "Length {length} exceeds buffer at position {position} (buffer length: {buffer_len})"
            ),
            CodecError::InvariantViolation { invariant } => {
                write!(f, "Invariant violation: {invariant}")
            }
            CodecError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, found {actual}")
            }
            CodecError::MissingField {
                struct_name,
                field_name,
            } => write!(f, "Missing field '{field_name}' in '{struct_name}'"),
            CodecError::InvalidEnum {
                enum_name,
                ordinal,
                variant_count,
            } => write!(
                f,
                "Invalid ordinal {ordinal} for enum '{enum_name}' ({variant_count} enumerators)"
            ),
            CodecError::InvalidUtf8 { position, message } => {
                write!(f, "Invalid UTF-8 at position {position}: {message}")
            }
            CodecError::InvalidChar { code } => {
                write!(f, "Invalid wide character unit {code:#x}")
            }
            CodecError::NativeContract { message } => {
                write!(f, "Native contract violation: {message}")
            }
            CodecError::AllocationFailed { size } => {
                write!(f, "Native allocation of {size} bytes failed")
            }
            CodecError::Unsupported { feature } => {
                write!(f, "Unsupported feature: '{feature}'")
            }
            CodecError::Other(msg) => write!(f, "Other error: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Other(err.to_string())
    }
}

/// Result type for cdrbridge operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_too_short_error() {
        let err = CodecError::buffer_too_short(100, 50, 10);
        assert!(matches!(err, CodecError::BufferTooShort { .. }));
        assert_eq!(
            err.to_string(),
            "Buffer too short: requested 100 bytes at position 10, but only 50 bytes available"
        );
        assert_eq!(err.kind(), ErrorKind::DecodeBounds);
    }

    #[test]
    fn test_length_exceeded_error() {
        let err = CodecError::length_exceeded(1000, 500, 800);
        assert_eq!(
            err.to_string(),
            "Length 1000 exceeds buffer at position 500 (buffer length: 800)"
        );
        assert_eq!(err.kind(), ErrorKind::DecodeBounds);
    }

    #[test]
    fn test_invalid_header_error() {
        let err = CodecError::invalid_header("too short");
        assert_eq!(err.to_string(), "Invalid CDR header: too short");
        assert_eq!(err.kind(), ErrorKind::DecodeBounds);
    }

    #[test]
    fn test_invariant_violation_error() {
        let err = CodecError::invariant_violation("length overflow");
        assert_eq!(err.to_string(), "Invariant violation: length overflow");
        assert_eq!(err.kind(), ErrorKind::EncodingInvariant);
    }

    #[test]
    fn test_type_mismatch_error() {
        let err = CodecError::type_mismatch("int32", "string");
        assert_eq!(err.to_string(), "Type mismatch: expected int32, found string");
        assert_eq!(err.kind(), ErrorKind::EncodingInvariant);
    }

    #[test]
    fn test_missing_field_error() {
        let err = CodecError::missing_field("Pose", "x");
        assert_eq!(err.to_string(), "Missing field 'x' in 'Pose'");
    }

    #[test]
    fn test_invalid_enum_error() {
        let err = CodecError::invalid_enum("Color", 7, 3);
        assert_eq!(
            err.to_string(),
            "Invalid ordinal 7 for enum 'Color' (3 enumerators)"
        );
        assert_eq!(err.kind(), ErrorKind::EncodingInvariant);
    }

    #[test]
    fn test_invalid_char_error() {
        let err = CodecError::invalid_char(0xD800);
        assert_eq!(err.to_string(), "Invalid wide character unit 0xd800");
        assert_eq!(err.log_fields(), vec![("code", "0xd800".to_string())]);
    }

    #[test]
    fn test_native_errors_are_boundary_kind() {
        assert_eq!(
            CodecError::native_contract("negative count").kind(),
            ErrorKind::NativeBoundary
        );
        assert_eq!(
            CodecError::allocation_failed(64).kind(),
            ErrorKind::NativeBoundary
        );
        assert_eq!(
            CodecError::allocation_failed(64).to_string(),
            "Native allocation of 64 bytes failed"
        );
    }

    #[test]
    fn test_unsupported_error() {
        let err = CodecError::unsupported("pl_cdr");
        assert_eq!(err.to_string(), "Unsupported feature: 'pl_cdr'");
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_log_fields_buffer_too_short() {
        let err = CodecError::buffer_too_short(100, 50, 10);
        let fields = err.log_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("requested", "100".to_string()));
        assert_eq!(fields[1], ("available", "50".to_string()));
        assert_eq!(fields[2], ("cursor", "10".to_string()));
    }

    #[test]
    fn test_log_fields_invalid_enum() {
        let err = CodecError::invalid_enum("Color", -1, 3);
        let fields = err.log_fields();
        assert_eq!(fields[0], ("enum", "Color".to_string()));
        assert_eq!(fields[1], ("ordinal", "-1".to_string()));
        assert_eq!(fields[2], ("variants", "3".to_string()));
    }

    #[test]
    fn test_error_clone() {
        let err1 = CodecError::invalid_utf8(12, "invalid utf-8 sequence");
        let err2 = err1.clone();
        assert_eq!(err1.to_string(), err2.to_string());
    }
}
