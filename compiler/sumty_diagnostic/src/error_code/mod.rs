//! Error codes for all sumty diagnostics.
//!
//! The first digit of an `E` code names the phase that raised it; `W` codes
//! are advisory and never block generation or execution.

use std::fmt;

/// Error codes for all sumty diagnostics.
///
/// Format: E#### / W#### where the first digit indicates the phase:
/// - E1xxx: Definition errors (malformed declarations)
/// - E2xxx: Planning errors (layout cannot be computed)
/// - E3xxx: Runtime errors (raised by instances)
/// - W1xxx: Call-site dispatch warnings
/// - W2xxx: Layout warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Definition Errors (E1xxx)
    /// Union declares no cases
    E1001,
    /// Duplicate case name
    E1002,
    /// Case uses the reserved catch-all name
    E1003,
    /// Duplicate type parameter
    E1004,
    /// Zero-byte size or capacity
    E1005,

    // Planning Errors (E2xxx)
    /// Layout-eligible payload with no provable size
    E2001,
    /// Reference type forced into the overlapping block
    E2002,
    /// Two different definitions planned under one name
    E2003,
    /// Payload type does not belong to the type pool
    E2004,

    // Runtime Errors (E3xxx)
    /// Payload larger than the overlapping block
    E3001,
    /// Dispatch had no handler for the active case
    E3002,

    // Call-site Warnings (W1xxx)
    /// Non-exhaustive dispatch
    W1001,
    /// Catch-all handler can never run
    W1002,
    /// Handler bound by position
    W1003,
    /// Handler names no declared case
    W1004,
    /// Case handled more than once
    W1005,

    // Layout Warnings (W2xxx)
    /// Declared block capacity is smaller than a known payload size
    W2001,
}

impl ErrorCode {
    /// All error codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::W1001,
        ErrorCode::W1002,
        ErrorCode::W1003,
        ErrorCode::W1004,
        ErrorCode::W1005,
        ErrorCode::W2001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W1002 => "W1002",
            ErrorCode::W1003 => "W1003",
            ErrorCode::W1004 => "W1004",
            ErrorCode::W1005 => "W1005",
            ErrorCode::W2001 => "W2001",
        }
    }

    /// One-line title used in listings.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "union declares no cases",
            ErrorCode::E1002 => "duplicate case name",
            ErrorCode::E1003 => "reserved case name",
            ErrorCode::E1004 => "duplicate type parameter",
            ErrorCode::E1005 => "zero-byte size",
            ErrorCode::E2001 => "unsized layout-eligible payload",
            ErrorCode::E2002 => "reference type in overlapping block",
            ErrorCode::E2003 => "conflicting union definition",
            ErrorCode::E2004 => "unknown payload type",
            ErrorCode::E3001 => "overlapping block too small",
            ErrorCode::E3002 => "unhandled case at dispatch",
            ErrorCode::W1001 => "non-exhaustive match",
            ErrorCode::W1002 => "redundant default case",
            ErrorCode::W1003 => "unnamed case handler",
            ErrorCode::W1004 => "unknown case handler",
            ErrorCode::W1005 => "duplicate case handler",
            ErrorCode::W2001 => "block capacity shortfall",
        }
    }

    /// Check if this is a definition error (E1xxx range).
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E1002
                | ErrorCode::E1003
                | ErrorCode::E1004
                | ErrorCode::E1005
        )
    }

    /// Check if this is a planning error (E2xxx range).
    pub fn is_planning_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001 | ErrorCode::E2002 | ErrorCode::E2003 | ErrorCode::E2004
        )
    }

    /// Check if this is a runtime error (E3xxx range).
    pub fn is_runtime_error(&self) -> bool {
        matches!(self, ErrorCode::E3001 | ErrorCode::E3002)
    }

    /// Check if this is a warning code (Wxxx range).
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ErrorCode::W1001
                | ErrorCode::W1002
                | ErrorCode::W1003
                | ErrorCode::W1004
                | ErrorCode::W1005
                | ErrorCode::W2001
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorCode {
    type Err = ();

    /// Parse a code like `"E2001"` or `"w1001"` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
