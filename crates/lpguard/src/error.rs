//! Error types for lpguard.

use crate::alloc::AllocSite;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for guarded invocations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Why a guarded invocation did not complete.
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    /// A context allocation failed before the library was called.
    #[error("out of memory allocating the {0}")]
    #[diagnostic(code(lpguard::resource_exhausted))]
    ResourceExhausted(AllocSite),

    /// The error hook slot was already occupied on this thread.
    #[error("the library error hook is already in use on this thread")]
    #[diagnostic(
        code(lpguard::hook_busy),
        help("guarded regions cannot be nested")
    )]
    HookBusy,

    /// The library detected an invalid operation and control was recovered.
    #[error("the library rejected an operation inside the guarded region")]
    #[diagnostic(code(lpguard::library_failure))]
    LibraryFailure,
}

/// Errors that can occur while loading the demo configuration.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file: {0}")]
    #[diagnostic(code(lpguard::config::read))]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(lpguard::config::parse))]
    ParseToml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    #[diagnostic(code(lpguard::config::invalid))]
    Validation(String),
}
