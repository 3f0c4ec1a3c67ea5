//! Configuration settings for HashCalc
//!
//! Defines the algorithm and recalculation enums, the calculator
//! configuration, CLI arguments, and defaults.

use crate::error::{HashCalcError, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default hash algorithm
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Default chunk size for streamed reads (16KB)
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Files larger than this are streamed instead of read into memory (64KB)
pub const DEFAULT_IO_THRESHOLD: u64 = DEFAULT_CHUNK_SIZE as u64 * 4;

/// Default number of worker threads
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// HashCalc - concurrent, cache-aware file digests
#[derive(Parser, Debug, Clone)]
#[command(name = "hashcalc")]
#[command(author = "HashCalc Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Calculate hash values for files using one or more algorithms")]
#[command(long_about = r#"
HashCalc computes one or more digests per file in a single read pass,
using a pool of worker threads and live progress reporting.

Examples:
  hashcalc file1.txt file2.txt                 # sha256 of two files
  hashcalc -a sha1,md5 a.iso b.iso             # sha1 and md5 of both files
  hashcalc big.bin -a blake3 small.txt         # sha256 of big.bin, blake3 of small.txt
  hashcalc -r ./dir --threads 8                # every file under ./dir
  hashcalc algorithms                          # list supported algorithms
"#)]
pub struct CliArgs {
    /// Files hashed with the default algorithm
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Algorithms (comma-separated) followed by the files they apply to; repeatable
    #[arg(
        short = 'a',
        long = "algorithms",
        num_args = 1..,
        action = ArgAction::Append,
        value_names = ["ALGORITHMS", "FILES"]
    )]
    pub algorithm_args: Vec<String>,

    /// `-a` occurrences kept apart: each is the algorithm list then its files
    #[arg(skip)]
    pub algorithm_groups: Vec<Vec<String>>,

    /// Default algorithm for files given without -a
    #[arg(short = 'd', long, default_value = "sha256", value_name = "ALGO")]
    pub default_algorithm: String,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 't', long, default_value = "4", value_name = "NUM")]
    pub threads: usize,

    /// When a cached digest may be reused
    #[arg(long, value_enum, default_value = "timetag")]
    pub recalc_mode: RecalcMode,

    /// Chunk size for streamed reads (e.g., 16K, 1M)
    #[arg(long, default_value = "16K", value_name = "SIZE")]
    pub chunk_size: String,

    /// Files above this size are streamed (e.g., 64K)
    #[arg(long, default_value = "64K", value_name = "SIZE")]
    pub io_threshold: String,

    /// Bound the result cache to this many entries (LRU)
    #[arg(long, value_name = "NUM")]
    pub cache_size: Option<usize>,

    /// Disable the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Hash files inside directories recursively
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Convert paths to absolute paths before hashing
    #[arg(long)]
    pub absolute: bool,

    /// Do not merge algorithm groups that name the same file
    #[arg(long)]
    pub no_aggregate: bool,

    /// Show full paths instead of short display names
    #[arg(long)]
    pub full_path: bool,

    /// Show every task in the progress display, not only running ones
    #[arg(long)]
    pub show_all: bool,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl CliArgs {
    /// Parse the process arguments, exiting on error like [`Parser::parse`]
    pub fn parse_grouped() -> Self {
        match Self::try_parse_grouped_from(std::env::args_os()) {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Parse `itr`, keeping every `-a` occurrence as its own group
    pub fn try_parse_grouped_from<I, T>(itr: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        let mut args = Self::from_arg_matches(&matches)?;
        args.algorithm_groups = matches
            .get_occurrences::<String>("algorithm_args")
            .map(|occurrences| {
                occurrences
                    .map(|values| values.cloned().collect())
                    .collect()
            })
            .unwrap_or_default();
        Ok(args)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List supported hash algorithms
    #[command(name = "algorithms")]
    Algorithms,

    /// Measure algorithm throughput on synthetic data
    #[command(name = "benchmark")]
    Benchmark {
        /// Test data size
        #[arg(long, default_value = "10M")]
        size: String,
    },
}

/// Hash algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// MD5 (128-bit, legacy)
    Md5,
    /// SHA-1 (160-bit, legacy)
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// BLAKE2b (512-bit)
    Blake2b,
    /// BLAKE2s (256-bit)
    Blake2s,
    /// BLAKE3
    Blake3,
    /// XXHash64 - Fast, non-cryptographic (64-bit)
    #[serde(rename = "xxhash64")]
    XXHash64,
    /// XXHash3 - Ultra fast, non-cryptographic (128-bit)
    #[serde(rename = "xxhash3")]
    XXHash3,
}

impl HashAlgorithm {
    /// Every supported algorithm
    pub const ALL: [HashAlgorithm; 15] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Blake2b,
        Self::Blake2s,
        Self::Blake3,
        Self::XXHash64,
        Self::XXHash3,
    ];

    /// Canonical lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha3_224 => "sha3_224",
            Self::Sha3_256 => "sha3_256",
            Self::Sha3_384 => "sha3_384",
            Self::Sha3_512 => "sha3_512",
            Self::Blake2b => "blake2b",
            Self::Blake2s => "blake2s",
            Self::Blake3 => "blake3",
            Self::XXHash64 => "xxhash64",
            Self::XXHash3 => "xxhash3",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha3_224 => "SHA3-224",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
            Self::Blake2b => "BLAKE2b",
            Self::Blake2s => "BLAKE2s",
            Self::Blake3 => "BLAKE3",
            Self::XXHash64 => "XXHash64",
            Self::XXHash3 => "XXHash3",
        }
    }

    /// Get the output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha3_256 | Self::Blake2s | Self::Blake3 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 | Self::Blake2b => 64,
            Self::XXHash64 => 8,
            Self::XXHash3 => 16,
        }
    }

    /// Whether the algorithm is a cryptographic digest
    pub fn is_cryptographic(&self) -> bool {
        !matches!(self, Self::XXHash64 | Self::XXHash3)
    }

    /// Parse a list of names, reporting every unsupported name at once
    pub fn parse_list<I, S>(names: I) -> Result<Vec<HashAlgorithm>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        let mut unknown = Vec::new();

        for name in names {
            let name = name.as_ref();
            match lookup(name) {
                Some(algorithm) => {
                    if !parsed.contains(&algorithm) {
                        parsed.push(algorithm);
                    }
                }
                None => unknown.push(name.to_string()),
            }
        }

        if unknown.is_empty() {
            Ok(parsed)
        } else {
            Err(HashCalcError::UnsupportedAlgorithms(unknown))
        }
    }
}

/// Names from `names` that do not denote a supported algorithm
pub fn unsupported<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|n| lookup(n.as_ref()).is_none())
        .map(|n| n.as_ref().to_string())
        .collect()
}

fn lookup(name: &str) -> Option<HashAlgorithm> {
    let key: String = name
        .trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect();

    let algorithm = match key.as_str() {
        "md5" => HashAlgorithm::Md5,
        "sha1" => HashAlgorithm::Sha1,
        "sha224" => HashAlgorithm::Sha224,
        "sha256" => HashAlgorithm::Sha256,
        "sha384" => HashAlgorithm::Sha384,
        "sha512" => HashAlgorithm::Sha512,
        "sha3224" => HashAlgorithm::Sha3_224,
        "sha3256" => HashAlgorithm::Sha3_256,
        "sha3384" => HashAlgorithm::Sha3_384,
        "sha3512" => HashAlgorithm::Sha3_512,
        "blake2b" | "blake2b512" => HashAlgorithm::Blake2b,
        "blake2s" | "blake2s256" => HashAlgorithm::Blake2s,
        "blake3" => HashAlgorithm::Blake3,
        "xxhash64" | "xxh64" => HashAlgorithm::XXHash64,
        "xxhash3" | "xxh3" | "xxh3128" => HashAlgorithm::XXHash3,
        _ => return None,
    };
    Some(algorithm)
}

impl FromStr for HashAlgorithm {
    type Err = HashCalcError;

    fn from_str(s: &str) -> Result<Self> {
        lookup(s).ok_or_else(|| HashCalcError::UnsupportedAlgorithms(vec![s.to_string()]))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy deciding when a cached digest may be reused
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecalcMode {
    /// Reuse while the cached mtime is not older than the file's mtime
    #[default]
    #[value(name = "timetag")]
    TimeTag,
    /// Always recompute (results are still cached)
    #[value(name = "always")]
    Always,
    /// Reuse any cached result, even if the file changed
    #[value(name = "never")]
    Never,
}

impl FromStr for RecalcMode {
    type Err = HashCalcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TIME_TAG" | "TIMETAG" => Ok(Self::TimeTag),
            "ALWAYS" => Ok(Self::Always),
            "NEVER" => Ok(Self::Never),
            _ => Err(HashCalcError::InvalidRecalcMode(s.to_string())),
        }
    }
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Calculator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Cache results in memory (ignored when a cache manager is injected)
    pub cache_enabled: bool,
    /// Cache trust policy
    pub recalc_mode: RecalcMode,
    /// Chunk size for streamed reads
    pub chunk_size: usize,
    /// Files larger than this are streamed
    pub io_threshold: u64,
    /// Algorithm used when none is requested
    pub default_algorithm: HashAlgorithm,
    /// Worker threads for the threaded calculator (0 = auto-detect)
    pub threads: usize,
    /// Bound the default cache to this many entries
    pub cache_size: Option<usize>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            recalc_mode: RecalcMode::TimeTag,
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threshold: DEFAULT_IO_THRESHOLD,
            default_algorithm: DEFAULT_HASH_ALGORITHM,
            threads: DEFAULT_THREAD_COUNT,
            cache_size: None,
        }
    }
}

impl CalculatorConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let config = Self {
            cache_enabled: !args.no_cache,
            recalc_mode: args.recalc_mode,
            chunk_size: parse_size(&args.chunk_size)
                .map_err(|e| HashCalcError::config(format!("Invalid chunk size: {}", e)))?
                as usize,
            io_threshold: parse_size(&args.io_threshold)
                .map_err(|e| HashCalcError::config(format!("Invalid I/O threshold: {}", e)))?,
            default_algorithm: args.default_algorithm.parse()?,
            threads: args.threads,
            cache_size: args.cache_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Thread count with auto-detection applied
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Reject settings the calculators cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(HashCalcError::config("chunk size must be greater than zero"));
        }
        if self.effective_threads() == 0 {
            return Err(HashCalcError::config("thread count must be greater than zero"));
        }
        Ok(())
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        (size.trim_end_matches(['T', 'B']), 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(['G', 'B']), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("16K").unwrap(), 16 * 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1M").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1.5G").unwrap(), (1.5 * 1024.0 * 1024.0 * 1024.0) as u64);
        assert!(parse_size("").is_err());
        assert!(parse_size("abcK").is_err());
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha3-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha3_256);
        assert_eq!("xxh3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::XXHash3);
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<HashAlgorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn test_parse_list_reports_all_unknown() {
        let err = HashAlgorithm::parse_list(["sha256", "foo", "md5", "bar"]).unwrap_err();
        match err {
            HashCalcError::UnsupportedAlgorithms(names) => {
                assert_eq!(names, vec!["foo".to_string(), "bar".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_dedups_in_order() {
        let list = HashAlgorithm::parse_list(["md5", "sha256", "MD5"]).unwrap();
        assert_eq!(list, vec![HashAlgorithm::Md5, HashAlgorithm::Sha256]);
        assert_eq!(unsupported(["md5", "nope"]), vec!["nope".to_string()]);
    }

    #[test]
    fn test_recalc_mode_from_str() {
        assert_eq!("TIME_TAG".parse::<RecalcMode>().unwrap(), RecalcMode::TimeTag);
        assert_eq!("always".parse::<RecalcMode>().unwrap(), RecalcMode::Always);
        assert_eq!("Never".parse::<RecalcMode>().unwrap(), RecalcMode::Never);
        assert!(matches!(
            "sometimes".parse::<RecalcMode>(),
            Err(HashCalcError::InvalidRecalcMode(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = CalculatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 16 * 1024);
        assert_eq!(config.io_threshold, 64 * 1024);

        let bad = CalculatorConfig { chunk_size: 0, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let config: CalculatorConfig =
            serde_json::from_str(r#"{"recalc_mode":"NEVER","default_algorithm":"blake3"}"#).unwrap();
        assert_eq!(config.recalc_mode, RecalcMode::Never);
        assert_eq!(config.default_algorithm, HashAlgorithm::Blake3);
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_cli_groups() {
        let args = CliArgs::try_parse_grouped_from([
            "hashcalc", "x.bin", "-a", "sha1,md5", "a.txt", "b.txt", "-a", "blake3", "c.txt",
        ])
        .unwrap();
        assert_eq!(args.files, vec![PathBuf::from("x.bin")]);
        assert_eq!(args.algorithm_groups.len(), 2);
        assert_eq!(args.algorithm_groups[0], vec!["sha1,md5", "a.txt", "b.txt"]);
        assert_eq!(args.algorithm_groups[1], vec!["blake3", "c.txt"]);
        assert_eq!(args.algorithm_args.len(), 5);
    }

    #[test]
    fn test_cli_without_groups() {
        let args = CliArgs::try_parse_grouped_from(["hashcalc", "-d", "md5", "x.bin"]).unwrap();
        assert!(args.algorithm_groups.is_empty());
        assert_eq!(args.default_algorithm, "md5");
    }
}
