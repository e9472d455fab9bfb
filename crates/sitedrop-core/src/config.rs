//! Deployment configuration.
//!
//! All limits and policy are explicit values handed to the coordinator at
//! construction. Nothing here reads the environment; front ends decide how
//! to populate these structs.

use std::path::PathBuf;
use std::time::Duration;

/// Resource ceilings for a single extraction run.
///
/// # Examples
///
/// ```
/// use sitedrop_core::ExtractionLimits;
///
/// // Small limits for tests
/// let limits = ExtractionLimits {
///     max_extracted_size: 64 * 1024,
///     max_entry_count: 16,
///     ..Default::default()
/// };
/// assert_eq!(limits.max_input_size, 100 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Maximum size of the uploaded archive in bytes.
    pub max_input_size: u64,

    /// Maximum cumulative decompressed bytes written to disk.
    pub max_extracted_size: u64,

    /// Maximum number of entries declared by the archive.
    pub max_entry_count: usize,

    /// Wall-clock budget for the whole extraction.
    pub timeout: Duration,

    /// Maximum number of redundant directory levels the flattener collapses.
    pub max_flatten_depth: usize,
}

impl Default for ExtractionLimits {
    /// Default values:
    /// - `max_input_size`: 100 MB
    /// - `max_extracted_size`: 200 MB
    /// - `max_entry_count`: 1,000
    /// - `timeout`: 30 s
    /// - `max_flatten_depth`: 64
    fn default() -> Self {
        Self {
            max_input_size: 100 * 1024 * 1024,
            max_extracted_size: 200 * 1024 * 1024,
            max_entry_count: 1000,
            timeout: Duration::from_secs(30),
            max_flatten_depth: 64,
        }
    }
}

const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "html",
    "htm",
    "css",
    "js",
    "mjs",
    "json",
    "map",
    "txt",
    "xml",
    "svg",
    "png",
    "jpg",
    "jpeg",
    "gif",
    "webp",
    "avif",
    "ico",
    "bmp",
    "woff",
    "woff2",
    "ttf",
    "otf",
    "eot",
    "mp4",
    "webm",
    "mp3",
    "ogg",
    "wav",
    "pdf",
    "webmanifest",
    "wasm",
];

const DEFAULT_DENIED_NAMES: &[&str] = &[
    ".env",
    ".git",
    ".gitignore",
    "node_modules",
    "package.json",
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    ".htaccess",
    ".DS_Store",
];

/// Which entries are worth keeping.
///
/// Entries failing this policy are skipped, not rejected: they make an
/// archive unwanted, not malicious.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPolicy {
    /// Static-asset extensions (without the dot) a file must carry.
    pub allowed_extensions: Vec<String>,

    /// Final path components that are never extracted.
    pub denied_names: Vec<String>,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            denied_names: DEFAULT_DENIED_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl EntryPolicy {
    /// Returns whether a file extension is on the allow-list.
    ///
    /// Comparison is case-insensitive so `INDEX.HTML` is treated like
    /// `index.html`.
    #[must_use]
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Returns whether a final path component is on the deny-list.
    ///
    /// Case-insensitive to prevent bypass on case-insensitive filesystems.
    #[must_use]
    pub fn is_name_denied(&self, name: &str) -> bool {
        self.denied_names
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(name))
    }
}

/// How a new deployment replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishStrategy {
    /// Extract into a hidden sibling directory and swap it into place only
    /// after validation. A failed attempt leaves the previous site live.
    #[default]
    Staged,

    /// Purge the tenant directory first and extract directly into it. A
    /// failed attempt leaves the tenant with no live site.
    InPlace,
}

/// Configuration for a [`Deployer`](crate::Deployer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Directory holding one subdirectory per tenant.
    pub storage_root: PathBuf,

    /// Domain appended to the tenant name, e.g. `sites.example.com`.
    pub domain_suffix: String,

    /// Scheme of the published URL.
    pub url_scheme: String,

    /// File whose presence at the root marks a deployment as servable.
    pub entry_point: String,

    /// Replacement strategy.
    pub publish: PublishStrategy,

    /// Extraction ceilings.
    pub limits: ExtractionLimits,

    /// Per-entry keep/skip policy.
    pub policy: EntryPolicy,
}

impl DeployConfig {
    /// Creates a configuration with default limits and policy.
    #[must_use]
    pub fn new(storage_root: impl Into<PathBuf>, domain_suffix: impl Into<String>) -> Self {
        Self {
            storage_root: storage_root.into(),
            domain_suffix: domain_suffix.into(),
            url_scheme: "https".to_string(),
            entry_point: "index.html".to_string(),
            publish: PublishStrategy::default(),
            limits: ExtractionLimits::default(),
            policy: EntryPolicy::default(),
        }
    }

    /// Sets the extraction limits.
    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the entry policy.
    pub fn with_policy(mut self, policy: EntryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the publish strategy.
    pub fn with_publish(mut self, publish: PublishStrategy) -> Self {
        self.publish = publish;
        self
    }

    /// Sets the entry-point filename.
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Sets the URL scheme.
    pub fn with_url_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.url_scheme = scheme.into();
        self
    }
}
