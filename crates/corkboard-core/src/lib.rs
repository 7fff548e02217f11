pub mod config;
pub mod error;
pub mod result;

pub use config::EngineConfig;
pub use error::EngineError;
pub use result::EngineResult;
