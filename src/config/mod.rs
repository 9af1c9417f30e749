//! Compiler and wiring configuration
//!
//! Settings come from a TOML file, then `RETE_*` environment variables, then
//! an optional deployment profile (`local`, `cluster`, or one declared under
//! `[profiles.<name>]`). The command line applies its flags last.
//!
//! # Search path
//!
//! The first file found wins:
//! 1. `./rete-topology.toml` - Project-local configuration
//! 2. `~/.config/rete-topology/config.toml` - User configuration (XDG)
//! 3. `~/.rete-topology/config.toml` - User configuration (legacy)
//! 4. `/etc/rete-topology/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `RETE_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `RETE_FORMAT` - Default output format (summary, json, dot)
//! - `RETE_TOPOLOGY_NAME` - Topology name
//! - `RETE_SOURCE` - Raw-fact source identifier
//! - `RETE_AXIOM_SOURCE` - Axiom source identifier
//! - `RETE_WORKERS` - Number of engine workers
//! - `RETE_PARALLELISM` - Default operator parallelism
//! - `RETE_MAX_PARALLELISM` - Parallelism ceiling
//! - `RETE_FEEDBACK` - Feedback edge grouping (shuffle, all)
//! - `RETE_WINDOW_CAPACITY` - Join window capacity
//! - `RETE_WINDOW_RANGE_SECS` - Join window range in seconds
//!
//! # Example Configuration
//!
//! ```toml
//! # rete-topology.toml
//!
//! [general]
//! format = "json"
//! log_level = "verbose"
//!
//! [topology]
//! name = "rdfs-closure"
//! source = "triples"
//! workers = 4
//! max_parallelism = 8
//! feedback = "all"
//!
//! [parallelism]
//! default = 2
//! join = 4
//!
//! [join]
//! window_capacity = 10000
//! window_range_secs = 600
//!
//! [prefixes]
//! ex = "http://example.org/"
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorCode, TopologyError};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReteConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Topology identity and shape
    pub topology: TopologyConfig,
    /// Per-kind operator parallelism
    pub parallelism: ParallelismConfig,
    /// Join window settings
    pub join: JoinConfig,
    /// Compiler settings
    pub compiler: CompilerConfig,
    /// Custom prefix definitions for rule files
    pub prefixes: HashMap<String, String>,
    /// Profile-specific overrides
    pub profiles: HashMap<String, ProfileConfig>,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format (summary, json, dot)
    pub format: OutputFormat,
    /// Logging level
    pub log_level: LogLevel,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Summary,
            log_level: LogLevel::Normal,
        }
    }
}

/// Topology identity and engine-facing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Topology name handed to the engine
    pub name: String,
    /// Identifier of the raw-fact source
    pub source: String,
    /// Identifier of the axiom source
    pub axiom_source: String,
    /// Name of the conflict-set operator
    pub conflict_set: String,
    /// Number of engine workers
    pub workers: usize,
    /// Ceiling applied to every operator's parallelism
    pub max_parallelism: usize,
    /// Grouping of the conflict set → filter feedback edges
    pub feedback: FeedbackGrouping,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            name: "rete-topology".to_string(),
            source: "source".to_string(),
            axiom_source: "axioms".to_string(),
            conflict_set: "conflict_set".to_string(),
            workers: 2,
            max_parallelism: 4,
            feedback: FeedbackGrouping::Shuffle,
        }
    }
}

/// Operator parallelism; unset kinds use `default`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelismConfig {
    pub default: usize,
    pub filter: Option<usize>,
    pub join: Option<usize>,
    pub terminal: Option<usize>,
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            default: 2,
            filter: None,
            join: None,
            terminal: None,
        }
    }
}

/// Sliding window bounding each join side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Tuples retained per side
    pub window_capacity: usize,
    /// Maximum tuple age (seconds)
    pub window_range_secs: u64,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            window_capacity: 5000,
            window_range_secs: 15 * 60,
        }
    }
}

/// Compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Tie-break orderings tried per canonicalized clause list
    pub search_bound: usize,
    /// Builtins that cannot run inside a streaming topology
    pub unsupported_builtins: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            search_bound: crate::canonical::DEFAULT_SEARCH_BOUND,
            unsupported_builtins: ["drop", "table", "tableAll", "remove", "hide"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileConfig {
    /// Override workers
    pub workers: Option<usize>,
    /// Override default parallelism
    pub parallelism: Option<usize>,
    /// Override max_parallelism
    pub max_parallelism: Option<usize>,
    /// Description of the profile
    pub description: Option<String>,
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Dot,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Summary => "summary",
            OutputFormat::Json => "json",
            OutputFormat::Dot => "dot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "summary" | "text" | "txt" => Some(OutputFormat::Summary),
            "json" => Some(OutputFormat::Json),
            "dot" | "graphviz" | "gv" => Some(OutputFormat::Dot),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// The `tracing` level this maps to
    pub fn tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Quiet => tracing::Level::ERROR,
            LogLevel::Normal => tracing::Level::WARN,
            LogLevel::Verbose => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

/// Grouping used on the conflict set → filter feedback edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackGrouping {
    /// Each derived fact reaches one filter instance
    #[default]
    Shuffle,
    /// Each derived fact reaches every filter instance
    All,
}

impl FeedbackGrouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackGrouping::Shuffle => "shuffle",
            FeedbackGrouping::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shuffle" => Some(FeedbackGrouping::Shuffle),
            "all" | "broadcast" => Some(FeedbackGrouping::All),
            _ => None,
        }
    }
}

/// Built-in deployment profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentProfile {
    /// Single worker, everything at parallelism 1
    Local,
    /// Several workers, wider operators
    Cluster,
}

impl DeploymentProfile {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" | "dev" => Some(DeploymentProfile::Local),
            "cluster" | "prod" => Some(DeploymentProfile::Cluster),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DeploymentProfile::Local => "Single worker, parallelism 1",
            DeploymentProfile::Cluster => "Four workers, parallelism 4, ceiling 16",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl ReteConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations
    ///
    /// Searches for config files in order:
    /// 1. ./rete-topology.toml
    /// 2. ~/.config/rete-topology/config.toml
    /// 3. ~/.rete-topology/config.toml
    /// 4. /etc/rete-topology/config.toml
    ///
    /// Then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.clone(), e.to_string()))?;

        let config: ReteConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.clone(), e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project-local
        paths.push(PathBuf::from("./rete-topology.toml"));

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rete-topology").join("config.toml"));
        }

        // Legacy home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".rete-topology").join("config.toml"));
        }

        // System-wide (Unix only)
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/rete-topology/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any `RETE_*` key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("RETE_LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }

        if let Some(format) = lookup("RETE_FORMAT").and_then(|v| OutputFormat::from_str(&v)) {
            self.general.format = format;
        }

        if let Some(name) = lookup("RETE_TOPOLOGY_NAME") {
            self.topology.name = name;
        }

        if let Some(source) = lookup("RETE_SOURCE") {
            self.topology.source = source;
        }

        if let Some(source) = lookup("RETE_AXIOM_SOURCE") {
            self.topology.axiom_source = source;
        }

        if let Some(workers) = lookup("RETE_WORKERS").and_then(|v| v.parse().ok()) {
            self.topology.workers = workers;
        }

        if let Some(n) = lookup("RETE_PARALLELISM").and_then(|v| v.parse().ok()) {
            self.parallelism.default = n;
        }

        if let Some(n) = lookup("RETE_MAX_PARALLELISM").and_then(|v| v.parse().ok()) {
            self.topology.max_parallelism = n;
        }

        if let Some(feedback) = lookup("RETE_FEEDBACK").and_then(|v| FeedbackGrouping::from_str(&v)) {
            self.topology.feedback = feedback;
        }

        if let Some(n) = lookup("RETE_WINDOW_CAPACITY").and_then(|v| v.parse().ok()) {
            self.join.window_capacity = n;
        }

        if let Some(n) = lookup("RETE_WINDOW_RANGE_SECS").and_then(|v| v.parse().ok()) {
            self.join.window_range_secs = n;
        }
    }

    /// Apply a named profile's settings
    pub fn apply_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        if let Some(profile) = DeploymentProfile::from_str(name) {
            match profile {
                DeploymentProfile::Local => {
                    self.topology.workers = 1;
                    self.parallelism.default = 1;
                    self.topology.max_parallelism = 1;
                }
                DeploymentProfile::Cluster => {
                    self.topology.workers = 4;
                    self.parallelism.default = 4;
                    self.topology.max_parallelism = 16;
                }
            }
            return Ok(());
        }

        if let Some(custom) = self.profiles.get(name).cloned() {
            if let Some(workers) = custom.workers {
                self.topology.workers = workers;
            }
            if let Some(parallelism) = custom.parallelism {
                self.parallelism.default = parallelism;
            }
            if let Some(max) = custom.max_parallelism {
                self.topology.max_parallelism = max;
            }
            return Ok(());
        }

        Err(ConfigError::UnknownProfile(name.to_string()))
    }

    /// Check values the compiler and wiring rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let topology = &self.topology;
        if topology.workers == 0 {
            return Err(ConfigError::InvalidValue("topology.workers must be at least 1".into()));
        }
        if topology.max_parallelism == 0 {
            return Err(ConfigError::InvalidValue(
                "topology.max_parallelism must be at least 1".into(),
            ));
        }
        if self.parallelism.default == 0 {
            return Err(ConfigError::InvalidValue("parallelism.default must be at least 1".into()));
        }
        let names = [&topology.source, &topology.axiom_source, &topology.conflict_set];
        if names.iter().any(|n| n.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "source, axiom_source and conflict_set must be named".into(),
            ));
        }
        if topology.source == topology.axiom_source
            || topology.source == topology.conflict_set
            || topology.axiom_source == topology.conflict_set
        {
            return Err(ConfigError::InvalidValue(
                "source, axiom_source and conflict_set must be distinct".into(),
            ));
        }
        if self.join.window_capacity == 0 {
            return Err(ConfigError::InvalidValue("join.window_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# rete-topology configuration file

[general]
# Output format: summary, json, dot
format = "summary"
# Logging level: quiet, normal, verbose, debug
log_level = "normal"

[topology]
# Topology name handed to the engine
name = "rete-topology"
# Raw-fact source and axiom source identifiers
source = "source"
axiom_source = "axioms"
# Name of the global conflict-set operator
conflict_set = "conflict_set"
# Engine workers
workers = 2
# Ceiling applied to every operator's parallelism
max_parallelism = 4
# Conflict set -> filter feedback grouping: shuffle, all
feedback = "shuffle"

[parallelism]
default = 2
# filter = 2
# join = 4
# terminal = 1

[join]
# Tuples retained per join side
window_capacity = 5000
# Maximum tuple age (seconds)
window_range_secs = 900

[compiler]
# Tie-break orderings tried per canonicalized clause list
search_bound = 720
# Builtins reported as unsupported in a streaming topology
unsupported_builtins = ["drop", "table", "tableAll", "remove", "hide"]

[prefixes]
# ex = "http://example.org/"

# Custom profiles can be defined like this:
# [profiles.staging]
# workers = 3
# parallelism = 3
# max_parallelism = 6
# description = "Staging cluster"
"#
    }

    /// List all available profiles
    pub fn available_profiles(&self) -> Vec<(&str, &str)> {
        let mut profiles = vec![
            ("local", DeploymentProfile::Local.description()),
            ("cluster", DeploymentProfile::Cluster.description()),
        ];

        for (name, config) in &self.profiles {
            let desc = config.description.as_deref().unwrap_or("Custom profile");
            profiles.push((name.as_str(), desc));
        }

        profiles
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Why a configuration could not be loaded or used
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {1}", path = .0.display())]
    IoError(PathBuf, String),
    #[error("invalid TOML in {path}: {1}", path = .0.display())]
    ParseError(PathBuf, String),
    #[error("cannot serialize configuration: {0}")]
    SerializeError(String),
    #[error("unknown profile '{0}' (built in: local, cluster)")]
    UnknownProfile(String),
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for TopologyError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::IoError(..) => ErrorCode::ConfigNotFound,
            ConfigError::ParseError(..) => ErrorCode::InvalidConfigSyntax,
            ConfigError::SerializeError(_) => ErrorCode::ConfigError,
            ConfigError::UnknownProfile(_) => ErrorCode::UnknownProfile,
            ConfigError::InvalidValue(_) => ErrorCode::InvalidConfigValue,
        };
        let error = TopologyError::new(code, err.to_string());
        match err {
            ConfigError::IoError(path, _) | ConfigError::ParseError(path, _) => {
                error.at(path.display().to_string())
            }
            ConfigError::UnknownProfile(_) => {
                error.with_hint("Define it under [profiles.<name>] or use local or cluster")
            }
            _ => error,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReteConfig::new();
        assert_eq!(config.topology.source, "source");
        assert_eq!(config.topology.axiom_source, "axioms");
        assert_eq!(config.topology.workers, 2);
        assert_eq!(config.parallelism.default, 2);
        assert_eq!(config.join.window_capacity, 5000);
        assert_eq!(config.join.window_range_secs, 900);
        assert_eq!(config.topology.feedback, FeedbackGrouping::Shuffle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "dot"
            log_level = "verbose"

            [topology]
            name = "closure"
            max_parallelism = 8
            feedback = "all"

            [parallelism]
            join = 6

            [join]
            window_capacity = 100
        "#;

        let config = ReteConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Dot);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.topology.name, "closure");
        assert_eq!(config.topology.source, "source");
        assert_eq!(config.topology.max_parallelism, 8);
        assert_eq!(config.topology.feedback, FeedbackGrouping::All);
        assert_eq!(config.parallelism.join, Some(6));
        assert_eq!(config.parallelism.filter, None);
        assert_eq!(config.join.window_capacity, 100);
    }

    #[test]
    fn test_default_content_parses() {
        let config = ReteConfig::load_from_str(ReteConfig::default_config_content()).unwrap();
        assert_eq!(config.compiler.unsupported_builtins.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = ReteConfig::new();
        config.apply_overrides(|key| match key {
            "RETE_FORMAT" => Some("json".into()),
            "RETE_WORKERS" => Some("7".into()),
            "RETE_FEEDBACK" => Some("all".into()),
            "RETE_PARALLELISM" => Some("not a number".into()),
            _ => None,
        });
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.topology.workers, 7);
        assert_eq!(config.topology.feedback, FeedbackGrouping::All);
        assert_eq!(config.parallelism.default, 2);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("GraphViz"), Some(OutputFormat::Dot));
        assert_eq!(OutputFormat::from_str("n3"), None);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("verbose"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::Debug.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_apply_profile() {
        let mut config = ReteConfig::new();

        config.apply_profile("local").unwrap();
        assert_eq!(config.topology.workers, 1);
        assert_eq!(config.topology.max_parallelism, 1);

        config.apply_profile("cluster").unwrap();
        assert_eq!(config.parallelism.default, 4);
        assert_eq!(config.topology.max_parallelism, 16);
    }

    #[test]
    fn test_custom_profile() {
        let toml = r#"
            [profiles.staging]
            workers = 3
            parallelism = 3
            description = "Staging"
        "#;

        let mut config = ReteConfig::load_from_str(toml).unwrap();
        config.apply_profile("staging").unwrap();
        assert_eq!(config.topology.workers, 3);
        assert_eq!(config.parallelism.default, 3);
        assert!(config.available_profiles().iter().any(|(n, _)| *n == "staging"));
    }

    #[test]
    fn test_unknown_profile_error() {
        let mut config = ReteConfig::new();
        let result = config.apply_profile("nonexistent");
        assert!(matches!(result, Err(ConfigError::UnknownProfile(_))));

        let err = TopologyError::from(result.unwrap_err());
        assert_eq!(err.code, ErrorCode::UnknownProfile);
        assert!(err.message.contains("nonexistent"));
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_missing_file_error_carries_path() {
        let path = PathBuf::from("/nonexistent/rete-topology.toml");
        let err = TopologyError::from(ReteConfig::load_from_file(&path).unwrap_err());
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
        assert_eq!(err.code.exit_status(), 78);
        assert!(err.to_string().contains("/nonexistent/rete-topology.toml"));
    }

    #[test]
    fn test_validate_rejects_clashing_sources() {
        let mut config = ReteConfig::new();
        config.topology.axiom_source = "source".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let err: TopologyError = config.validate().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_prefixes() {
        let toml = r#"
            [prefixes]
            ex = "http://example.org/"
        "#;

        let config = ReteConfig::load_from_str(toml).unwrap();
        assert_eq!(config.prefixes.get("ex"), Some(&"http://example.org/".to_string()));
    }

    #[test]
    fn test_serialize_config() {
        let toml = ReteConfig::new().to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[topology]"));
        assert!(toml.contains("[join]"));
    }

    #[test]
    fn test_config_paths() {
        let paths = ReteConfig::config_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("rete-topology.toml"));
    }
}
