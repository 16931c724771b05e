//! Engine configuration
//!
//! Everything has a safe default; no environment variable is required for
//! in-memory mode. `from_env` layers recognized variables on top of the
//! defaults and reports malformed values as `ConfigError` instead of
//! panicking.

use std::time::Duration;

use crate::features::points_to::PointsToConfig;
use crate::features::repomap::ActivationMode;
use crate::features::taint::TaintPolicy;
use crate::shared::models::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Server-store connection string; None = embedded/in-memory
    pub database_url: Option<String>,
    /// Worker pool size for parallel stages (default: core count)
    pub worker_pool_size: usize,
    /// Taint summary cache entries
    pub summary_cache_size: usize,
    /// Force an importance mode instead of Smart-Mode detection
    pub pagerank_mode_override: Option<ActivationMode>,
    /// LLM chunk summaries (off by default; requires an external service)
    pub enable_llm_summaries: bool,
    /// Run the clone-detection stage
    pub enable_clone_detection: bool,
    /// Run the effect-classification stage
    pub enable_effect_analysis: bool,
    /// Per-analysis deadline; None = no deadline
    pub analysis_deadline: Option<Duration>,
    pub points_to: PointsToConfig,
    pub taint_policy: TaintPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            worker_pool_size: num_cpus::get(),
            summary_cache_size: 1024,
            pagerank_mode_override: None,
            enable_llm_summaries: false,
            enable_clone_detection: false,
            enable_effect_analysis: false,
            analysis_deadline: Some(Duration::from_secs(30)),
            points_to: PointsToConfig::default(),
            taint_policy: default_taint_policy(),
        }
    }
}

impl EngineConfig {
    /// Layer environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                config.database_url = Some(url);
            }
        }
        if let Ok(workers) = std::env::var("CODEATLAS_WORKERS") {
            config.worker_pool_size = workers
                .parse()
                .map_err(|_| EngineError::Config(format!("invalid CODEATLAS_WORKERS: {workers}")))?;
            if config.worker_pool_size == 0 {
                return Err(EngineError::Config(
                    "CODEATLAS_WORKERS must be at least 1".into(),
                ));
            }
        }
        if let Ok(mode) = std::env::var("CODEATLAS_PAGERANK_MODE") {
            config.pagerank_mode_override = Some(match mode.to_lowercase().as_str() {
                "fast" => ActivationMode::Fast,
                "ai" => ActivationMode::Ai,
                "architecture" => ActivationMode::Architecture,
                "full" => ActivationMode::Full,
                other => {
                    return Err(EngineError::Config(format!(
                        "invalid CODEATLAS_PAGERANK_MODE: {other}"
                    )))
                }
            });
        }
        if let Ok(flag) = std::env::var("CODEATLAS_LLM_SUMMARIES") {
            config.enable_llm_summaries = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        Ok(config)
    }
}

/// Baseline web-security policy used when the caller supplies none
fn default_taint_policy() -> TaintPolicy {
    TaintPolicy::default()
        .with_source("input", "user_input")
        .with_source("read_param", "user_input")
        .with_source("getenv", "environment")
        .with_sink("execute", &["user_input"])
        .with_sink("eval", &["user_input"])
        .with_sink("render", &["user_input"])
        .with_sanitizer("escape", &["user_input"])
        .with_sanitizer("quote", &["user_input"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_no_environment() {
        let config = EngineConfig::default();
        assert!(config.database_url.is_none());
        assert!(config.worker_pool_size >= 1);
        assert!(!config.enable_llm_summaries);
    }

    #[test]
    fn default_policy_covers_common_web_flows() {
        let policy = default_taint_policy();
        assert!(policy.sources.contains_key("read_param"));
        assert!(policy.sink_accepts("execute", "user_input"));
        assert!(policy.sanitizer_clears("escape", "user_input"));
    }
}
