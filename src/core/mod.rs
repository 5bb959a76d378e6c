pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::EngineConfig;
pub use error::{ActionError, CoreError, Result};
pub use types::{Seconds, Side, UnitId};
