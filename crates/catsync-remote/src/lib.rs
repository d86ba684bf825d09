pub mod client;
pub mod error;
pub mod retry;
pub mod throttle;
pub mod types;

pub use client::CatalogClient;
pub use error::RemoteError;
pub use throttle::BatchThrottle;
pub use types::{ProductPatch, RemoteProduct};
