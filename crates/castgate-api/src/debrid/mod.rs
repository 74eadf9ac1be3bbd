mod client;
mod error;
pub mod types;

pub use client::DebridClient;
pub use error::DebridError;
