pub mod access;
pub mod error;
pub mod fetch;
pub mod images;
pub mod suppliers;
pub mod xml;

pub use error::FeedError;
pub use fetch::FeedFetcher;
pub use images::ImageRehoster;
pub use suppliers::{load_supplier_products, SupplierContext};
