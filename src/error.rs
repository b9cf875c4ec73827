//! Error types used by the orchestrator, its tasks and configuration loading.
//!
//! - [`RuntimeError`]: errors returned synchronously by [`Orchestrator`](crate::Orchestrator) calls.
//! - [`TaskError`]: errors returned by an individual task execution; these never reach the
//!   dispatcher, they are reported through the error stream instead.
//! - [`ConfigError`]: invalid environment configuration.
//!
//! `RuntimeError` and `TaskError` provide `as_label` for logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the orchestrator itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Dispatch was rejected because the orchestrator is draining or drained.
    #[error("orchestrator is shutting down; task '{task}' rejected")]
    ShuttingDown {
        /// Name of the rejected task.
        task: String,
    },

    /// Drain bound elapsed before every in-flight task completed.
    #[error("drain timeout {timeout:?} exceeded; in_flight={in_flight}; stuck: {stuck:?}")]
    DrainTimeout {
        /// The bound that elapsed.
        timeout: Duration,
        /// Number of tasks still running when the bound elapsed.
        in_flight: usize,
        /// Names of those tasks, sorted.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use membervisor::RuntimeError;
    ///
    /// let err = RuntimeError::ShuttingDown { task: "invoice".into() };
    /// assert_eq!(err.as_label(), "runtime_shutting_down");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::ShuttingDown { .. } => "runtime_shutting_down",
            RuntimeError::DrainTimeout { .. } => "runtime_drain_timeout",
        }
    }
}

/// # Errors produced by task execution.
///
/// `Canceled` is a graceful stop: the task saw its token cancelled at a safe point.
/// Every other variant is a failure and is delivered on the error stream.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Business logic failed (rendering or sending).
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message, including its context chain.
        error: String,
    },

    /// Task exceeded the configured per-task timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Task panicked; the panic was caught by the runner.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },

    /// Task observed cancellation and stopped before doing its work.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Wraps any displayable error as [`TaskError::Fail`], keeping the `anyhow` context chain.
    pub fn fail(err: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: format!("{err:#}"),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use membervisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// True for outcomes that count as failures (everything but `Canceled`).
    pub fn is_failure(&self) -> bool {
        !matches!(self, TaskError::Canceled)
    }
}

/// # Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?} ({details})")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value as found.
        value: String,
        /// What was expected.
        details: &'static str,
    },
}
