mod loader;
mod types;

pub use loader::LoadError;
pub use types::{MarkerNames, RuntimeConfig};
