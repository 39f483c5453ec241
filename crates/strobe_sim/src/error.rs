//! Simulation error types.
//!
//! Every variant is fatal to the call that raised it; nothing is retried or
//! recovered internally. Most variants are precondition violations (a
//! malformed path, a width that does not fit, a primitive the evaluator set
//! does not cover) surfaced as errors so callers can attribute them.

/// Errors raised during simulator construction or driving.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A path did not resolve to a wire of the simulated module.
    #[error("cannot resolve path '{path}'")]
    UnknownPath {
        /// The offending path.
        path: String,
    },

    /// A hierarchical path hop named something that is not a simulated
    /// child instance.
    #[error("no simulated instance named '{name}'")]
    UnknownInstance {
        /// The offending hop.
        name: String,
    },

    /// The module handed to the simulator has no body.
    #[error("module '{module}' has no definition to simulate")]
    NoDefinition {
        /// The module name.
        module: String,
    },

    /// A bit-vector read or write hit a value that is not a bit or a
    /// bit-array.
    #[error("value is not bit shaped")]
    NotBitShaped,

    /// A bit-vector write did not match the target's width.
    #[error("width mismatch: expected {expected}, got {got}")]
    WidthMismatch {
        /// Width of the target.
        expected: u32,
        /// Width supplied.
        got: u32,
    },

    /// Two value trees that must agree structurally do not.
    #[error("shape mismatch: {reason}")]
    ShapeMismatch {
        /// What disagreed.
        reason: String,
    },

    /// The evaluator met a cell kind it cannot interpret.
    #[error("unsupported primitive '{name}'")]
    UnsupportedPrimitive {
        /// The qualified operation name (or module name when none exists).
        name: String,
    },

    /// A cell is missing a required module/generator argument.
    #[error("instance '{instance}' is missing argument '{arg}'")]
    MissingArg {
        /// The instance name.
        instance: String,
        /// The argument key.
        arg: String,
    },

    /// A cell argument exists but cannot be used.
    #[error("instance '{instance}' has bad argument '{arg}': {reason}")]
    BadArg {
        /// The instance name.
        instance: String,
        /// The argument key.
        arg: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The optional step cap was exceeded before the working set drained.
    #[error("step limit of {limit} exceeded before quiescence")]
    StepLimit {
        /// The configured cap.
        limit: u64,
    },
}
