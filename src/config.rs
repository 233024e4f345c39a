use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_parallelism() -> usize {
    4
}

/// Window sizes are in bytes of UTF-8 text; the chunker never splits a
/// code point, so multibyte documents get slightly shorter windows rather
/// than broken ones.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1500
}
fn default_overlap() -> usize {
    150
}

/// Tunables for the hybrid comparison pipeline. Thresholds and caps bound
/// the number of gateway calls a comparison makes.
#[derive(Debug, Deserialize, Clone)]
pub struct ComparisonConfig {
    /// Minimum similarity score a chunk pair must reach to be retained.
    #[serde(default = "default_min_match_score")]
    pub min_match_score: u32,
    /// Leading chunks of each document that get metadata extracted.
    #[serde(default = "default_max_chunks_per_doc")]
    pub max_chunks_per_doc: usize,
    /// Ranked matches that proceed to detailed comparison.
    #[serde(default = "default_top_matches")]
    pub top_matches: usize,
    /// Chunks sampled (head, middle, tail) for each holistic summary.
    #[serde(default = "default_summary_sample_chunks")]
    pub summary_sample_chunks: usize,
    /// Chunk prefix length sent with a metadata extraction prompt.
    #[serde(default = "default_metadata_preview_chars")]
    pub metadata_preview_chars: usize,
    /// Chunk prefix length sent with a detailed comparison prompt.
    #[serde(default = "default_detail_preview_chars")]
    pub detail_preview_chars: usize,
    /// Detailed comparisons quoted verbatim in the synthesis prompt.
    #[serde(default = "default_synthesis_sample")]
    pub synthesis_sample: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            min_match_score: default_min_match_score(),
            max_chunks_per_doc: default_max_chunks_per_doc(),
            top_matches: default_top_matches(),
            summary_sample_chunks: default_summary_sample_chunks(),
            metadata_preview_chars: default_metadata_preview_chars(),
            detail_preview_chars: default_detail_preview_chars(),
            synthesis_sample: default_synthesis_sample(),
        }
    }
}

fn default_min_match_score() -> u32 {
    3
}
fn default_max_chunks_per_doc() -> usize {
    12
}
fn default_top_matches() -> usize {
    6
}
fn default_summary_sample_chunks() -> usize {
    10
}
fn default_metadata_preview_chars() -> usize {
    800
}
fn default_detail_preview_chars() -> usize {
    500
}
fn default_synthesis_sample() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Clause explanation calls are capped at this many clauses in the
    /// corporate and government workflows.
    #[serde(default = "default_max_explanations")]
    pub max_explanations: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_explanations: default_max_explanations(),
        }
    }
}

fn default_max_explanations() -> usize {
    10
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Config {
        Config::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.overlap must be < chunking.chunk_size");
    }

    // Validate gateway
    match config.gateway.provider.as_str() {
        "gemini" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown gateway provider: '{}'. Must be gemini or disabled.",
            other
        ),
    }
    if config.gateway.parallelism == 0 {
        anyhow::bail!("gateway.parallelism must be >= 1");
    }

    // Validate comparison caps
    if config.comparison.max_chunks_per_doc == 0 {
        anyhow::bail!("comparison.max_chunks_per_doc must be >= 1");
    }
    if config.comparison.top_matches == 0 {
        anyhow::bail!("comparison.top_matches must be >= 1");
    }
    if config.comparison.summary_sample_chunks < 3 {
        anyhow::bail!("comparison.summary_sample_chunks must be >= 3");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clh.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let (_dir, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.gateway.provider, "gemini");
        assert_eq!(cfg.chunking.chunk_size, 1500);
        assert_eq!(cfg.chunking.overlap, 150);
        assert_eq!(cfg.comparison.min_match_score, 3);
        assert_eq!(cfg.comparison.max_chunks_per_doc, 12);
        assert_eq!(cfg.comparison.top_matches, 6);
        assert_eq!(cfg.workflow.max_explanations, 10);
    }

    #[test]
    fn test_overrides() {
        let (_dir, path) = write_config(
            r#"
[gateway]
model = "gemini-1.5-pro"
parallelism = 2

[comparison]
min_match_score = 5
top_matches = 3
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.gateway.model, "gemini-1.5-pro");
        assert_eq!(cfg.gateway.parallelism, 2);
        assert_eq!(cfg.comparison.min_match_score, 5);
        assert_eq!(cfg.comparison.top_matches, 3);
        // Untouched sections keep defaults
        assert_eq!(cfg.chunking.chunk_size, 1500);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let (_dir, path) = write_config("[chunking]\nchunk_size = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_overlap_at_chunk_size() {
        let (_dir, path) = write_config("[chunking]\nchunk_size = 100\noverlap = 100\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let (_dir, path) = write_config("[gateway]\nprovider = \"openai\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_minimal_matches_defaults() {
        let cfg = Config::minimal();
        assert_eq!(cfg.comparison.top_matches, 6);
        assert_eq!(cfg.gateway.api_key_env, "GEMINI_API_KEY");
    }
}
