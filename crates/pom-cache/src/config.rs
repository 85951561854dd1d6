use serde::Deserialize;

/// Configuration for the project cache and its build scheduler.
///
/// Deserializable from host settings; all fields default sensibly.
///
/// # Defaults
///
/// - `worker_limit`: `10` — upper bound on concurrently executing builds.
///   The external builder's internal state is not guaranteed to be
///   request-isolated, so the bound stays conservative. A limit of `0` keeps
///   execution paused even after `start()`; tasks queue until the limit is
///   positive.
/// - `bump_priority_on_duplicate`: `true` — duplicate submissions of a
///   queued key raise its priority so actively requested documents overtake
///   speculative builds. A heuristic, kept tunable rather than guaranteed.
/// - `log_transient_parse_failures`: `false` — mid-edit parse failures in
///   the fallback path are silent by default; enable to log them at debug
///   level for post-mortem debugging.
///
/// # Examples
///
/// ```
/// use pom_cache::CacheConfig;
///
/// let json = r#"{ "worker_limit": 4 }"#;
/// let config: CacheConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.worker_limit, 4);
/// assert!(config.bump_priority_on_duplicate);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,
    #[serde(default = "default_true")]
    pub bump_priority_on_duplicate: bool,
    #[serde(default)]
    pub log_transient_parse_failures: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            worker_limit: default_worker_limit(),
            bump_priority_on_duplicate: true,
            log_transient_parse_failures: false,
        }
    }
}

fn default_worker_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.worker_limit, 10);
        assert!(config.bump_priority_on_duplicate);
        assert!(!config.log_transient_parse_failures);
    }

    #[test]
    fn test_deserialize_empty_object() {
        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.worker_limit, 10);
    }

    #[test]
    fn test_deserialize_overrides() {
        let config: CacheConfig = serde_json::from_str(
            r#"{ "worker_limit": 1, "bump_priority_on_duplicate": false, "log_transient_parse_failures": true }"#,
        )
        .unwrap();
        assert_eq!(config.worker_limit, 1);
        assert!(!config.bump_priority_on_duplicate);
        assert!(config.log_transient_parse_failures);
    }
}
