//! Error types for the mactable library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when table construction parameters are invalid
//!   (e.g. zero capacity) or when construction cannot acquire its resources.
//!   Construction is all-or-nothing; no table exists after this error.
//! - [`InvariantError`]: Returned by
//!   [`MacTableCore::check_invariants`](crate::table::MacTableCore::check_invariants)
//!   when the slot table, expiry queue and counters disagree.
//! - [`ParseAddressError`]: Returned when a textual MAC address is malformed.
//!
//! Routine table outcomes (full table, unknown key) are not errors; they are
//! reported through [`InsertOutcome`](crate::table::InsertOutcome) and
//! `Option` return values.
//!
//! ## Example Usage
//!
//! ```
//! use mactable::error::ConfigError;
//! use mactable::builder::MacTableBuilder;
//!
//! let err = MacTableBuilder::new(0).try_build_core().unwrap_err();
//! assert!(err.to_string().contains("capacity"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal table invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when table configuration parameters are invalid.
///
/// Produced by [`MacTableBuilder::try_build`](crate::builder::MacTableBuilder::try_build)
/// and friends.
///
/// # Example
///
/// ```
/// use mactable::error::ConfigError;
///
/// let err = ConfigError::new("capacity must be > 0");
/// assert_eq!(err.message(), "capacity must be > 0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// ParseAddressError
// ---------------------------------------------------------------------------

/// Why a textual MAC address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAddressErrorKind {
    /// Input is not exactly `xx:xx:xx:xx:xx:xx` long.
    Length,
    /// A character that should be a hex digit is not one.
    InvalidDigit,
    /// A character that should be `:` is not one.
    Separator,
}

/// Error returned when decoding a textual MAC address fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAddressError {
    kind: ParseAddressErrorKind,
    position: usize,
}

impl ParseAddressError {
    pub(crate) fn new(kind: ParseAddressErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> ParseAddressErrorKind {
        self.kind
    }

    /// Byte offset in the input where decoding failed.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseAddressErrorKind::Length => {
                write!(f, "malformed MAC address: expected 17 characters, got {}", self.position)
            },
            ParseAddressErrorKind::InvalidDigit => {
                write!(f, "malformed MAC address: invalid hex digit at offset {}", self.position)
            },
            ParseAddressErrorKind::Separator => {
                write!(f, "malformed MAC address: expected ':' at offset {}", self.position)
            },
        }
    }
}

impl std::error::Error for ParseAddressError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
