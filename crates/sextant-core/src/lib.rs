pub mod config;
pub mod error;
pub mod types;

pub use config::SextantConfig;
pub use error::{Result, SextantError};
pub use types::*;
