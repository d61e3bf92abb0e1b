//! Construction-time errors.

use thiserror::Error;

use crate::config::LoadError;

/// Fatal problems detected while building an application root or component.
///
/// Nothing is attached to the host when one of these is returned.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("a mount target (element or selector) is required")]
    MissingRoot,

    #[error("could not find mount target '{target}'")]
    RootNotFound { target: String },

    #[error("a view(state, helpers) function is required")]
    MissingView,

    #[error("component '{name}' needs a render function")]
    MissingRender { name: String },

    #[error("invalid runtime config: {0}")]
    InvalidConfig(#[from] LoadError),
}
