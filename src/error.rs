//! Errors for parsing, compiling and wiring
//!
//! Every failure is a [`TopologyError`]: a numeric [`ErrorCode`], a message,
//! optional context fields (the rule, the registry key …) and a hint. Errors
//! serialize to JSON so that compile reports can carry them.
//!
//! # Codes
//!
//! - parse errors (1xxx): rule text that does not parse
//! - compile errors (2xxx): per-rule failures and registry invariants
//! - wiring errors (3xxx): topology declaration failures
//! - validation errors (5xxx): caller input checks
//! - config errors (7xxx): configuration issues
//! - internal errors (9xxx)
//!
//! Only some of them abort a compile batch: see [`ErrorCode::is_fatal`].
//!
//! ```rust
//! use rete_topology::error::{ErrorCode, TopologyError};
//!
//! let err = TopologyError::empty_prior("r1");
//! assert_eq!(err.code, ErrorCode::EmptyPrior);
//! assert_eq!(err.field("rule"), Some("r1"));
//! assert!(!err.is_fatal());
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::ParseError;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Generic parse error
    ParseError = 1000,
    /// Invalid rule syntax
    InvalidRuleSyntax = 1001,
    /// Prefix used before declaration
    UndefinedPrefix = 1002,
    /// Unexpected end of input
    UnexpectedEof = 1003,

    // Compile errors (2xxx)
    /// Generic compile error
    CompileError = 2000,
    /// Clause entry the compiler cannot place in the network
    UnsupportedClause = 2001,
    /// Rule body produced no operator
    EmptyPrior = 2002,
    /// Registry key maps to an incompatible operator
    RegistryInvariantViolation = 2003,

    // Wiring errors (3xxx)
    /// Edge refers to an operator that was never declared
    UnknownOperator = 3001,

    // Validation errors (5xxx)
    /// Caller-supplied options that cannot work together
    ValidationError = 5000,

    // Config errors (7xxx)
    /// Generic config error
    ConfigError = 7000,
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,
    /// Unknown profile
    UnknownProfile = 7003,
    /// Invalid config value
    InvalidConfigValue = 7004,

    // Internal errors (9xxx)
    /// A compiler bug
    InternalError = 9000,
}

impl ErrorCode {
    /// Numeric value, grouped by category in thousands
    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn description(&self) -> &'static str {
        match self {
            // Parse errors
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRuleSyntax => "Invalid rule syntax",
            ErrorCode::UndefinedPrefix => "Undefined prefix",
            ErrorCode::UnexpectedEof => "Unexpected end of input",

            // Compile errors
            ErrorCode::CompileError => "Compile error",
            ErrorCode::UnsupportedClause => "Unsupported clause",
            ErrorCode::EmptyPrior => "Rule body yields no operator",
            ErrorCode::RegistryInvariantViolation => "Registry invariant violation",

            // Wiring errors
            ErrorCode::UnknownOperator => "Unknown operator",

            // Validation errors
            ErrorCode::ValidationError => "Validation error",

            // Config errors
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::UnknownProfile => "Unknown profile",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            // Internal errors
            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Whether an error with this code aborts a whole compile batch.
    ///
    /// Everything else aborts only the rule being compiled.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorCode::RegistryInvariantViolation
                | ErrorCode::UnknownOperator
                | ErrorCode::InternalError
        )
    }

    /// Process exit code used by the command line tool
    pub fn exit_status(&self) -> i32 {
        match self.code() / 1000 {
            1 => 65, // EX_DATAERR
            7 => 78, // EX_CONFIG
            5 => 64, // EX_USAGE
            _ => 70, // EX_SOFTWARE
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Where an error happened and what led to it
///
/// Fields keep insertion order so that reports serialize the same way on
/// every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// e.g. `rule`, `key`, `prefix`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, String>,
    /// A file, or `file:line` for errors raised with [`topology_error!`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for rete-topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl TopologyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CompileError, message)
    }

    /// A clause the compiler cannot turn into an operator
    pub fn unsupported_clause(clause: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UnsupportedClause,
            format!("Unsupported clause {}", clause),
        )
    }

    /// A non-axiom rule whose body yields no operator
    pub fn empty_prior(rule: &str) -> Self {
        Self::new(
            ErrorCode::EmptyPrior,
            format!("Rule {} has no triple patterns in its body", rule),
        )
        .with_context("rule", rule)
    }

    /// A registry key mapped to an operator of the wrong shape
    pub fn registry_invariant(key: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistryInvariantViolation, message)
            .with_context("key", key)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Reclassify, keeping message and context
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether this error aborts the whole compile batch
    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    /// Look up a context field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.fields.get(key))
            .map(String::as_str)
    }

    /// Compact JSON, as printed by `--report` on failure
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            serde_json::json!({ "code": self.code, "message": self.message }).to_string()
        })
    }
}

// `[2002] Rule r1 has no triple patterns in its body (rule r1)`, then causes
// and the hint on their own lines.
impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        let Some(ctx) = &self.context else {
            return match &self.hint {
                Some(hint) => write!(f, "\nHint: {}", hint),
                None => Ok(()),
            };
        };
        if let Some(rule) = ctx.fields.get("rule") {
            if !self.message.contains(rule.as_str()) {
                write!(f, " (rule {})", rule)?;
            }
        }
        if let Some(location) = &ctx.location {
            write!(f, " at {}", location)?;
        }
        for (i, cause) in ctx.causes.iter().enumerate() {
            let lead = if i == 0 { "\nCaused by:" } else { "" };
            write!(f, "{}\n  - {}", lead, cause)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHint: {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for TopologyError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<ParseError> for TopologyError {
    fn from(err: ParseError) -> Self {
        let code = match &err {
            ParseError::Syntax { .. } | ParseError::NotASingleRule { .. } => {
                ErrorCode::InvalidRuleSyntax
            }
            ParseError::UndefinedPrefix { .. } => ErrorCode::UndefinedPrefix,
            ParseError::UnexpectedEof => ErrorCode::UnexpectedEof,
        };
        let mut error = TopologyError::new(code, err.to_string());
        if let ParseError::UndefinedPrefix { prefix } = &err {
            error = error
                .with_context("prefix", prefix.as_str())
                .with_hint(format!("Declare it with @prefix {}: <...> .", prefix));
        }
        error
    }
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        TopologyError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::internal(err.to_string())
            .with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for TopologyError {
    fn from(err: toml::de::Error) -> Self {
        TopologyError::config(err.to_string())
            .with_code(ErrorCode::InvalidConfigSyntax)
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using TopologyError
pub type TopologyResult<T> = Result<T, TopologyError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a TopologyError with context from the current location
#[macro_export]
macro_rules! topology_error {
    ($code:expr, $msg:expr) => {
        $crate::error::TopologyError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::TopologyError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! topology_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::topology_error!($code, $msg));
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::topology_error!($code, $fmt, $($arg)*));
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
