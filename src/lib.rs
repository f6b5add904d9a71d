pub mod aggregate;
pub mod config;
pub mod derive;
pub mod dispatch;
pub mod error;
pub mod load;
pub mod rank;
pub mod report;
pub mod table;

pub use error::{EngineError, Result};
