//! Configuration module for the analysis engine.
//!
//! Settings are layered, later layers winning:
//! - Default values
//! - TOML configuration file (`.chunkforge/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CF_` and use double underscores
//! to separate nested levels:
//! - `CF_ANALYSIS__PARALLEL_WORKERS=8` sets `analysis.parallel_workers`
//! - `CF_SEMANTIC__ENABLED=true` sets `semantic.enabled`
//! - `CF_OUTPUT__FORMAT=jsonl` sets `output.format`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-project configuration directory
pub const CONFIG_DIR: &str = ".chunkforge";

/// Name of the ignore file honoured next to `.gitignore`
pub const IGNORE_FILE: &str = ".chunkforgeignore";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Analysis run settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Semantic service (language server) settings
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Language-specific settings
    #[serde(default = "default_languages")]
    pub languages: HashMap<String, LanguageConfig>,

    /// Chunk export settings
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Project identifier stamped on every chunk
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Branch name stamped on every chunk
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Number of files analysed concurrently in phase 2
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,

    /// Stop the run on the first sink failure
    #[serde(default = "default_false")]
    pub fail_fast_sink: bool,

    /// Overall time budget for phase 2 in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_secs: Option<u64>,

    /// Only keep files whose path ends with one of these suffixes
    #[serde(default)]
    pub target_files: Vec<String>,

    /// Source roots passed to the semantic service, relative to the project
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SemanticConfig {
    /// Start a language server for semantic queries
    #[serde(default = "default_false")]
    pub enabled: bool,

    /// Language server executable
    #[serde(default = "default_semantic_command")]
    pub command: String,

    /// Extra arguments for the language server
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Time allowed for the `initialize` handshake
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LanguageConfig {
    /// Whether this language is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// File extensions for this language
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Serialization format of the exported chunks
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty JSON array written once at the end of the run
    #[default]
    Json,
    /// One chunk per line, streamed
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format '{other}' (expected json or jsonl)")),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Base directory for exported chunks
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default = "default_false")]
    pub json: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_project_id() -> String {
    "default".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_parallel_workers() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_source_roots() -> Vec<String> {
    vec![
        "src/main/java".to_string(),
        "src/test/java".to_string(),
        "src".to_string(),
    ]
}
fn default_semantic_command() -> String {
    "jdtls".to_string()
}
fn default_open_timeout_ms() -> u64 {
    10_000
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_init_timeout_ms() -> u64 {
    60_000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            analysis: AnalysisConfig::default(),
            semantic: SemanticConfig::default(),
            languages: default_languages(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            branch: default_branch(),
            parallel_workers: default_parallel_workers(),
            fail_fast_sink: false,
            time_budget_secs: None,
            target_files: Vec::new(),
            source_roots: default_source_roots(),
        }
    }
}

impl AnalysisConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }

    /// Never zero; a zero setting would stall the worker pool
    pub fn effective_workers(&self) -> usize {
        self.parallel_workers.max(1)
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_semantic_command(),
            args: Vec::new(),
            open_timeout_ms: default_open_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            init_timeout_ms: default_init_timeout_ms(),
        }
    }
}

impl SemanticConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    let mut langs = HashMap::new();

    langs.insert(
        "java".to_string(),
        LanguageConfig {
            enabled: true,
            extensions: vec!["java".to_string()],
        },
    );

    langs
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring `CF_` variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels,
            // single underscore stays inside field names
            .merge(Env::prefixed("CF_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.chunkforge/settings.toml` searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Extensions configured for a language key, if the language is enabled
    pub fn enabled_extensions(&self, language_key: &str) -> Vec<String> {
        self.languages
            .get(language_key)
            .filter(|config| config.enabled)
            .map(|config| config.extensions.clone())
            .unwrap_or_default()
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Same as [`Settings::init_config_file`] rooted at `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# chunkforge configuration file

# Version of the configuration schema
version = 1

[analysis]
# Identifiers stamped on every exported chunk
project_id = "default"
branch = "main"

# Files analysed concurrently (defaults to CPU count)
# parallel_workers = {}

# Abort the run when the output sink fails
fail_fast_sink = false

# Stop starting new files after this many seconds
# time_budget_secs = 600

# Restrict the run to files whose path ends with one of these suffixes
target_files = []

source_roots = ["src/main/java", "src/test/java", "src"]

[semantic]
# Resolve ambiguous supertypes and calls through a language server
enabled = false
command = "jdtls"
args = []
open_timeout_ms = 10000
request_timeout_ms = 5000
init_timeout_ms = 60000

[output]
dir = "output"
# "json" writes <dir>/<project>/<branch>/chunks.json, "jsonl" streams one chunk per line
format = "json"

[logging]
# Overridden by RUST_LOG when set
level = "info"
json = false

[languages.java]
enabled = true
extensions = ["java"]
"#,
            num_cpus::get()
        );

        std::fs::write(&config_path, template)?;
        Self::create_default_ignore_file(root, force)?;

        Ok(config_path)
    }

    fn create_default_ignore_file(
        root: &Path,
        force: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ignore_path = root.join(IGNORE_FILE);

        if !force && ignore_path.exists() {
            return Ok(());
        }

        let default_content = r#"# chunkforge ignore patterns (gitignore syntax)

# Build output
target/
build/
out/
bin/

# Generated sources
**/generated/
*.generated.java

# IDE directories
.idea/
.vscode/
.settings/

# chunkforge's own directories
.chunkforge/
output/
"#;

        std::fs::write(&ignore_path, default_content)?;
        Ok(())
    }
}
