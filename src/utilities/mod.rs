//! Persistence helpers shared by the community records.

pub mod errors;
pub mod file_handler;
pub mod paths;

pub use errors::StoreError;
pub use file_handler::FileHandler;
