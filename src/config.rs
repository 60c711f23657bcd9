//! Configuration management for docsift using the prefer crate.
//!
//! Discovery goes through `prefer::load("docsift")`; the discovered file is
//! then parsed with serde by extension (TOML, YAML, or JSON). Every section
//! has working defaults, so no config file is required. `DOCSIFT_*`
//! environment variables override both defaults and file values.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extract::pdf::DEFAULT_STRATEGIES;
use crate::extract::{DEFAULT_MIN_ALNUM_RATIO, DEFAULT_MIN_CHARS_PER_PAGE, DEFAULT_WORDS_PER_PAGE};

/// Minimum-length threshold below which text is considered unusable.
pub const DEFAULT_MIN_CHARS: usize = 50;

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;
const DEFAULT_WORKERS: usize = 4;

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

/// Structural extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum characters for a strategy (and a result) to count as usable.
    pub min_chars: usize,
    /// Average words per page used to estimate DOCX page counts.
    pub words_per_page: u32,
    /// PDF strategies in priority order.
    pub pdf_strategies: Vec<String>,
    /// Make one final lenient content-stream attempt when every strategy fails.
    pub lenient_fallback: bool,
    /// Bound on each pdftotext/pdfinfo invocation, in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            words_per_page: DEFAULT_WORDS_PER_PAGE,
            pdf_strategies: DEFAULT_STRATEGIES.iter().map(|s| s.to_string()).collect(),
            lenient_fallback: true,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
        .with_overrides(&env_lookup)
    }
}

impl ExtractionConfig {
    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        if let Some(min_chars) = parse_env(lookup, "DOCSIFT_MIN_CHARS") {
            self.min_chars = min_chars;
        }
        if let Some(strategies) = lookup("DOCSIFT_PDF_STRATEGIES") {
            self.pdf_strategies = strategies
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// OCR settings for image inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition backend name.
    pub backend: String,
    /// Tesseract language code(s), e.g. "eng" or "eng+deu".
    pub language: String,
    /// Bound on a single recognition call, in seconds.
    pub timeout_secs: u64,
    /// Run grayscale/normalize/sharpen before recognition.
    pub preprocess: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: "tesseract".to_string(),
            language: "eng".to_string(),
            timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
            preprocess: true,
        }
        .with_overrides(&env_lookup)
    }
}

impl OcrConfig {
    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        if let Some(backend) = lookup("DOCSIFT_OCR_BACKEND") {
            self.backend = backend;
        }
        if let Some(language) = lookup("DOCSIFT_OCR_LANGUAGE") {
            self.language = language;
        }
        if let Some(timeout) = parse_env(lookup, "DOCSIFT_OCR_TIMEOUT") {
            self.timeout_secs = timeout;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Thresholds for the "looks like a scan" check on PDF text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub min_chars_per_page: usize,
    pub min_alnum_ratio: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_chars_per_page: DEFAULT_MIN_CHARS_PER_PAGE,
            min_alnum_ratio: DEFAULT_MIN_ALNUM_RATIO,
        }
    }
}

/// Policy limits applied after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Reject documents with more pages than this. Unset disables the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_pages: None }.with_overrides(&env_lookup)
    }
}

impl LimitsConfig {
    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        if let Some(max_pages) = parse_env(lookup, "DOCSIFT_MAX_PAGES") {
            self.max_pages = Some(max_pages);
        }
        self
    }
}

fn default_workers() -> usize {
    parse_env(&env_lookup, "DOCSIFT_WORKERS").unwrap_or(DEFAULT_WORKERS)
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Batch worker pool size.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig::default(),
            scan: ScanConfig::default(),
            limits: LimitsConfig::default(),
            workers: default_workers(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Falls back to defaults (with env overrides) when nothing is found.
    pub async fn load() -> Self {
        match prefer::load("docsift").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}; using defaults", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format is picked from the extension; anything unknown is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        let config: Config = match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };
        Ok(config.with_env_overrides())
    }

    /// Re-apply `DOCSIFT_*` overrides on top of file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(&env_lookup)
    }

    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Self {
        self.extraction = self.extraction.with_overrides(lookup);
        self.ocr = self.ocr.with_overrides(lookup);
        self.limits = self.limits.with_overrides(lookup);
        if let Some(workers) = parse_env(lookup, "DOCSIFT_WORKERS") {
            self.workers = workers;
        }
        self
    }

    /// Reject settings the pipeline can't run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction.words_per_page == 0 {
            return Err("extraction.words_per_page must be at least 1".to_string());
        }
        if self.extraction.pdf_strategies.is_empty() && !self.extraction.lenient_fallback {
            return Err(
                "extraction.pdf_strategies is empty and lenient_fallback is off; PDFs could never be read"
                    .to_string(),
            );
        }
        if self.ocr.timeout_secs == 0 || self.extraction.tool_timeout_secs == 0 {
            return Err("timeouts must be at least one second".to_string());
        }
        if !(0.0..=1.0).contains(&self.scan.min_alnum_ratio) {
            return Err("scan.min_alnum_ratio must be between 0 and 1".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.limits.max_pages == Some(0) {
            return Err("limits.max_pages must be at least 1 when set".to_string());
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
