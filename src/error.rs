//! Error and diagnostic types.
//!
//! Style resolution degrades to "no styling" instead of failing, so most of
//! these are development diagnostics attached to `InteropMeta` and logged,
//! never returned from the render path.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InteropError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteropError {
    #[error("unknown color scheme: {value:?} (expected light, dark or system)")]
    UnknownColorScheme { value: String },

    #[error("container `{name}` is queried by the same component that declares it")]
    ContainerSelfReference { name: String },

    #[error("variable `{name}` references itself")]
    VariableCycle { name: String },
}
