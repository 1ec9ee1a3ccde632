pub mod applications;
pub mod client;
pub mod common;
pub mod devices;
pub mod error;
pub mod externalauths;
pub mod localpasswordpolicies;
pub mod pool;
pub mod version;

pub use client::{Client, ClientConfig};
pub use error::ApiError;
pub use pool::{ConnectionPoolConfig, ConnectionStats};
