//! On-disk TOML configuration.
//!
//! All fields are optional so partial configs work (merge with defaults).
//! A `labcite.toml` in the working directory cascades over the platform
//! config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub pipeline: Option<PipelineConfig>,
    pub dedupe: Option<DedupeConfig>,
    pub resolver: Option<ResolverConfig>,
    pub cache: Option<CacheConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_dir: Option<String>,
    pub output: Option<String>,
    /// Adapters to run, in order. Order matters: later adapters' records win
    /// identifier merges.
    pub adapters: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupeConfig {
    pub min_overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub mailto: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub dir: Option<String>,
    pub ttl_secs: Option<u64>,
}

/// Platform config file path: `<config_dir>/labcite/labcite.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("labcite").join("labcite.toml"))
}

/// Load config by cascading CWD `labcite.toml` over the platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new("labcite.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        pipeline: Some(PipelineConfig {
            data_dir: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.data_dir.clone())
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.data_dir.clone())),
            output: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.output.clone())
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.output.clone())),
            adapters: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.adapters.clone())
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.adapters.clone())),
        }),
        dedupe: Some(DedupeConfig {
            min_overlap: overlay
                .dedupe
                .as_ref()
                .and_then(|d| d.min_overlap)
                .or_else(|| base.dedupe.as_ref().and_then(|d| d.min_overlap)),
        }),
        resolver: Some(ResolverConfig {
            mailto: overlay
                .resolver
                .as_ref()
                .and_then(|r| r.mailto.clone())
                .or_else(|| base.resolver.as_ref().and_then(|r| r.mailto.clone())),
        }),
        cache: Some(CacheConfig {
            dir: overlay
                .cache
                .as_ref()
                .and_then(|c| c.dir.clone())
                .or_else(|| base.cache.as_ref().and_then(|c| c.dir.clone())),
            ttl_secs: overlay
                .cache
                .as_ref()
                .and_then(|c| c.ttl_secs)
                .or_else(|| base.cache.as_ref().and_then(|c| c.ttl_secs)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let config = ConfigFile {
            pipeline: Some(PipelineConfig {
                adapters: Some(vec!["dblp".into(), "sources".into()]),
                ..Default::default()
            }),
            dedupe: Some(DedupeConfig {
                min_overlap: Some(8),
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.pipeline.unwrap().adapters.unwrap(),
            ["dblp", "sources"]
        );
        assert_eq!(parsed.dedupe.unwrap().min_overlap, Some(8));
    }

    #[test]
    fn partial_config_deserializes_with_absent_sections() {
        let parsed: ConfigFile = toml::from_str("[resolver]\nmailto = \"lab@example.edu\"\n").unwrap();
        assert!(parsed.pipeline.is_none());
        assert_eq!(
            parsed.resolver.unwrap().mailto.as_deref(),
            Some("lab@example.edu")
        );
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            dedupe: Some(DedupeConfig {
                min_overlap: Some(6),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            dedupe: Some(DedupeConfig {
                min_overlap: Some(9),
            }),
            ..Default::default()
        };
        assert_eq!(merge(base, overlay).dedupe.unwrap().min_overlap, Some(9));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            cache: Some(CacheConfig {
                dir: Some("/base/cache".into()),
                ttl_secs: Some(3600),
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        let cache = merged.cache.unwrap();
        assert_eq!(cache.dir.as_deref(), Some("/base/cache"));
        assert_eq!(cache.ttl_secs, Some(3600));
    }
}
