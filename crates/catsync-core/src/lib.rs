pub mod app_config;
pub mod config;
pub mod ids;
pub mod product;
pub mod suppliers;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use ids::namespace_id;
pub use product::{CanonicalProduct, ImageRef, PrintOption, Warehouse};
pub use suppliers::{
    load_suppliers, Credentials, FeedKind, FeedLocation, SupplierConfig, SuppliersFile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read suppliers file {path}: {source}")]
    SuppliersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suppliers file: {0}")]
    SuppliersFileParse(#[from] serde_yaml::Error),

    #[error("invalid suppliers file: {0}")]
    SuppliersFileInvalid(String),
}
