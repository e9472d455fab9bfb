//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use sitedrop_core::DeployConfig;
use sitedrop_core::EntryPolicy;
use sitedrop_core::ExtractionLimits;
use sitedrop_core::PublishStrategy;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sitedrop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Log filter written to stderr (e.g. `info`, `sitedrop_core=debug`)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a ZIP archive as a tenant's static site
    Deploy(DeployArgs),
    /// Show how each archive entry would be handled, without writing anything
    Inspect(InspectArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct DeployArgs {
    /// Path to the ZIP archive (`-` reads standard input)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Tenant that owns the site
    #[arg(short, long)]
    pub tenant: String,

    /// Directory holding one subdirectory per tenant
    #[arg(long, env = "SITEDROP_STORAGE_ROOT", value_name = "DIR")]
    pub storage_root: PathBuf,

    /// Domain appended to the tenant name
    #[arg(long, env = "SITEDROP_DOMAIN", value_name = "DOMAIN")]
    pub domain: String,

    /// Scheme of the published URL
    #[arg(long, default_value = "https")]
    pub scheme: String,

    /// File that must exist at the site root
    #[arg(long, default_value = "index.html", value_name = "FILE")]
    pub entry_point: String,

    /// Purge the live site before extracting instead of staging
    #[arg(long)]
    pub in_place: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

impl DeployArgs {
    /// Builds the deployer configuration from the arguments.
    pub fn config(&self) -> DeployConfig {
        let publish = if self.in_place {
            PublishStrategy::InPlace
        } else {
            PublishStrategy::Staged
        };
        DeployConfig::new(&self.storage_root, &self.domain)
            .with_url_scheme(&self.scheme)
            .with_entry_point(&self.entry_point)
            .with_publish(publish)
            .with_limits(self.limits.limits())
            .with_policy(self.limits.policy())
    }

    /// Returns `true` when the archive is read from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.archive.as_os_str() == "-"
    }
}

#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the ZIP archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(clap::Args, Default)]
pub struct LimitArgs {
    /// Maximum archive size (K/M/G/T suffixes allowed)
    #[arg(long, value_parser = parse_byte_size, value_name = "SIZE")]
    pub max_input_size: Option<u64>,

    /// Maximum total decompressed size (K/M/G/T suffixes allowed)
    #[arg(long, value_parser = parse_byte_size, value_name = "SIZE")]
    pub max_extracted_size: Option<u64>,

    /// Maximum number of archive entries
    #[arg(long, value_name = "COUNT")]
    pub max_entries: Option<usize>,

    /// Extraction timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Additional allowed file extension (can be repeated)
    #[arg(long = "allow-ext", value_name = "EXT")]
    pub allow_ext: Vec<String>,
}

impl LimitArgs {
    /// Overlays the given flags on the default limits.
    pub fn limits(&self) -> ExtractionLimits {
        let defaults = ExtractionLimits::default();
        ExtractionLimits {
            max_input_size: self.max_input_size.unwrap_or(defaults.max_input_size),
            max_extracted_size: self
                .max_extracted_size
                .unwrap_or(defaults.max_extracted_size),
            max_entry_count: self.max_entries.unwrap_or(defaults.max_entry_count),
            timeout: self.timeout.map_or(defaults.timeout, Duration::from_secs),
            ..defaults
        }
    }

    /// Extends the default allow-list with `--allow-ext` values.
    pub fn policy(&self) -> EntryPolicy {
        let mut policy = EntryPolicy::default();
        policy.allowed_extensions.extend(
            self.allow_ext
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string()),
        );
        policy
    }
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
