use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Structural errors in a run's metric list.
///
/// These surface once, as a terminal Error phase on the run, and are never
/// retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no metrics specified")]
    NoMetrics,

    #[error("metrics[{index}]: duplicate metric name '{name}'")]
    DuplicateName { index: usize, name: String },

    #[error("metrics[{index}] ({name}): count {count} must not be less than {limit_field} {limit}")]
    CountBelowLimit {
        index: usize,
        name: String,
        count: i32,
        limit_field: &'static str,
        limit: i32,
    },

    #[error("metrics[{index}] ({name}): count > 1 requires an interval")]
    CountWithoutInterval { index: usize, name: String },

    #[error("metric '{name}': invalid {field}: {reason}")]
    InvalidDuration {
        name: String,
        field: &'static str,
        reason: String,
    },

    #[error("metrics[{index}] ({name}): {field} must not be negative, got {value}")]
    NegativeLimit {
        index: usize,
        name: String,
        field: &'static str,
        value: i32,
    },

    #[error("metrics[{index}] ({name}): consecutiveSuccessfulLimit must be >= 1, got {value}")]
    InvalidConsecutiveSuccessfulLimit {
        index: usize,
        name: String,
        value: i32,
    },

    #[error("metrics[{index}] ({name}): exactly one provider must be configured, found {found}")]
    ProviderVariants {
        index: usize,
        name: String,
        found: usize,
    },
}

/// Provider instantiation and execution errors.
///
/// Instantiation failures become an Error-phase measurement for the one
/// affected metric; other metrics proceed unaffected.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("metric '{metric}': no provider configured")]
    MissingVariant { metric: String },

    #[error("unresolved argument '{name}' in template")]
    UnresolvedArgument { name: String },

    #[error("malformed template: {reason}")]
    MalformedTemplate { reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {reason}")]
    Response { reason: String },

    #[error("garbage collection failed for metric '{metric}': {reason}")]
    GarbageCollect { metric: String, reason: String },
}

/// Condition-expression evaluation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("failed to parse condition '{expr}': {reason}")]
    Parse { expr: String, reason: String },

    #[error("cannot interpret result '{value}' as {wanted}")]
    Coerce { value: String, wanted: &'static str },
}

/// Persistence-boundary errors, propagated to the reconciling worker so the
/// run is requeued and retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("run '{name}' not found")]
    NotFound { name: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
