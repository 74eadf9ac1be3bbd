mod client;
mod error;
pub mod types;

pub use client::CastClient;
pub use error::CastError;
