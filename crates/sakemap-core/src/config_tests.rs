//! Tests for configuration loading.

use super::config::{ClusteringConfig, SakemapConfig, CONFIG_FILE_NAME};
use figment::Jail;
use rand::Rng;
use std::path::PathBuf;

#[test]
fn test_defaults() {
    let config = SakemapConfig::default();
    assert_eq!(config.clustering.max_iterations, 50);
    assert_eq!(config.clustering.min_clusters, 2);
    assert_eq!(config.clustering.max_clusters, 20);
    assert_eq!(config.clustering.seed, None);
    assert_eq!(config.recommend.fallback_limit, 3);
    assert_eq!(config.catalog.data_dir, PathBuf::from("./data"));
    assert!(config.storage.preference_dir.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_without_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = SakemapConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config, SakemapConfig::default());
        Ok(())
    });
}

#[test]
fn test_load_from_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            CONFIG_FILE_NAME,
            r#"
            [clustering]
            max_iterations = 10
            seed = 42

            [catalog]
            data_dir = "/srv/sakenowa"
            "#,
        )?;
        let config = SakemapConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.clustering.max_iterations, 10);
        assert_eq!(config.clustering.seed, Some(42));
        assert_eq!(config.clustering.max_clusters, 20);
        assert_eq!(config.catalog.data_dir, PathBuf::from("/srv/sakenowa"));
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(CONFIG_FILE_NAME, "[clustering]\nseed = 1\n")?;
        jail.set_env("SAKEMAP_CLUSTERING__SEED", "7");
        jail.set_env("SAKEMAP_RECOMMEND__FALLBACK_LIMIT", "5");
        let config = SakemapConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.clustering.seed, Some(7));
        assert_eq!(config.recommend.fallback_limit, 5);
        Ok(())
    });
}

#[test]
fn test_invalid_bounds_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            CONFIG_FILE_NAME,
            "[clustering]\nmin_clusters = 8\nmax_clusters = 4\n",
        )?;
        let err = SakemapConfig::load().unwrap_err();
        assert!(err.to_string().contains("min_clusters"));
        Ok(())
    });
}

#[test]
fn test_zero_min_clusters_rejected() {
    let mut config = SakemapConfig::default();
    config.clustering.min_clusters = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_file_is_config_error() {
    Jail::expect_with(|jail| {
        jail.create_file(CONFIG_FILE_NAME, "[clustering]\nmax_iterations = \"many\"\n")?;
        let err = SakemapConfig::load().unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
        Ok(())
    });
}

#[test]
fn test_to_toml_round_trip() {
    let mut config = SakemapConfig::default();
    config.clustering.seed = Some(9);
    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("[clustering]"));
    assert!(rendered.contains("seed = 9"));
    let parsed: SakemapConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_seeded_rng_is_deterministic() {
    let config = ClusteringConfig {
        seed: Some(123),
        ..ClusteringConfig::default()
    };
    let a: u64 = config.rng().gen();
    let b: u64 = config.rng().gen();
    assert_eq!(a, b);
}

#[test]
fn test_kmeans_for_uses_heuristic() {
    let config = ClusteringConfig::default();
    assert_eq!(config.k_for(200), 10);
    assert_eq!(config.kmeans_for(200).k(), 10);
    assert_eq!(config.kmeans_for(200).max_iterations(), 50);
}

#[test]
fn test_zero_max_iterations_rejected() {
    let mut config = SakemapConfig::default();
    config.clustering.max_iterations = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_iterations"));
}
