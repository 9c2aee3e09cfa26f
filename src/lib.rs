pub mod config;
pub mod functions;
pub mod queries;
pub mod service;
pub mod snapshot;
pub mod utils;

pub use functions::*;
pub use queries::*;
pub use utils::*;
