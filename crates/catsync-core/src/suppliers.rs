//! Supplier registry loaded from a YAML file.
//!
//! The registry is the single source of supplier identity: slug, reserved
//! ID tag digit, pad width, and where each feed document lives. Credentials
//! are referenced by environment-variable name, never stored in the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which parser/normalizer handles this supplier's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Project111,
    Oasis,
    Xindao,
    Happygifts,
    Midocean,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedKind::Project111 => write!(f, "project111"),
            FeedKind::Oasis => write!(f, "oasis"),
            FeedKind::Xindao => write!(f, "xindao"),
            FeedKind::Happygifts => write!(f, "happygifts"),
            FeedKind::Midocean => write!(f, "midocean"),
        }
    }
}

/// Where a feed document is read from.
///
/// FTP drops are consumed as local files: the transfer itself happens outside
/// the pipeline, which only sees the landed documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedLocation {
    /// A single document on disk.
    File { path: PathBuf },
    /// A directory of documents, read in filename order.
    Dir { path: PathBuf },
    /// An HTTP GET endpoint, optionally with basic auth taken from env.
    Http { url: String },
}

/// Basic-auth credentials resolved from the environment at process start.
/// Fetch paths receive these values; nothing reads the environment later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// IP-allowlist negotiation endpoints (one supplier only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Page that echoes the caller's egress IP in its HTML body.
    pub echo_url: String,
    /// Management page carrying the allowlist form.
    pub manage_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub slug: String,
    pub kind: FeedKind,
    /// Reserved leading digit for this supplier's namespaced IDs.
    pub tag: char,
    /// Zero-pad width of the local-ID part.
    #[serde(default = "default_id_width")]
    pub id_width: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub catalog_feed: FeedLocation,
    /// Separate price/stock document, for suppliers that publish one.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub stock_feed: Option<FeedLocation>,
    /// Prefix for suppliers that publish relative image paths.
    #[serde(default)]
    pub image_base_url: Option<String>,
    /// Present only for the supplier requiring IP-allowlist negotiation.
    #[serde(default)]
    pub access: Option<AccessConfig>,
    /// Env var names holding basic-auth credentials for feed fetches.
    #[serde(default)]
    pub username_env: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    /// Filled by [`SuppliersFile::resolve_credentials`], never by the file.
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

const fn default_id_width() -> usize {
    9
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SuppliersFile {
    pub suppliers: Vec<SupplierConfig>,
}

impl SuppliersFile {
    /// Resolves each enabled supplier's named credential variables through
    /// `lookup`, storing the values on the supplier. Called once at process
    /// start so a missing variable fails the run before any feed is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first unset
    /// variable. Disabled suppliers are skipped.
    pub fn resolve_credentials(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        for s in &mut self.suppliers {
            if !s.enabled {
                continue;
            }
            let Some(user_var) = &s.username_env else {
                continue;
            };
            let username =
                lookup(user_var).ok_or_else(|| ConfigError::MissingEnvVar(user_var.clone()))?;
            let password = match &s.password_env {
                Some(pass_var) => Some(
                    lookup(pass_var).ok_or_else(|| ConfigError::MissingEnvVar(pass_var.clone()))?,
                ),
                None => None,
            };
            s.credentials = Some(Credentials { username, password });
        }
        Ok(())
    }
}

/// Load and validate the supplier registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (duplicate slugs, duplicate or non-digit tags, zero widths).
pub fn load_suppliers(path: &Path) -> Result<SuppliersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SuppliersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: SuppliersFile = serde_yaml::from_str(&content)?;
    validate_suppliers(&file)?;
    Ok(file)
}

fn validate_suppliers(file: &SuppliersFile) -> Result<(), ConfigError> {
    if file.suppliers.is_empty() {
        return Err(ConfigError::SuppliersFileInvalid(
            "no suppliers defined".to_owned(),
        ));
    }

    let mut slugs: HashSet<&str> = HashSet::new();
    let mut tags: HashSet<char> = HashSet::new();

    for s in &file.suppliers {
        if s.slug.is_empty() {
            return Err(ConfigError::SuppliersFileInvalid(
                "supplier with empty slug".to_owned(),
            ));
        }
        if !slugs.insert(&s.slug) {
            return Err(ConfigError::SuppliersFileInvalid(format!(
                "duplicate supplier slug: {}",
                s.slug
            )));
        }
        if !s.tag.is_ascii_digit() {
            return Err(ConfigError::SuppliersFileInvalid(format!(
                "supplier {}: tag must be a single digit, got '{}'",
                s.slug, s.tag
            )));
        }
        // A shared tag digit would let one supplier's reconciliation delete
        // another supplier's remote records.
        if !tags.insert(s.tag) {
            return Err(ConfigError::SuppliersFileInvalid(format!(
                "duplicate supplier tag digit: {}",
                s.tag
            )));
        }
        if s.id_width == 0 || s.id_width > 12 {
            return Err(ConfigError::SuppliersFileInvalid(format!(
                "supplier {}: id_width must be within 1..=12, got {}",
                s.slug, s.id_width
            )));
        }
    }

    Ok(())
}
