use std::fs;

use clap::Parser;
use clonedupe::cli::Cli;
use clonedupe::config::{Config, ConfigError};
use clonedupe::scanner::HashAlgorithm;
use tempfile::tempdir;

#[test]
fn test_file_then_cli_layering() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clonedupe.toml");
    fs::write(
        &path,
        "min_size = 8192\nio_threads = 3\nhash = \"sha256\"\ninclude_hidden = true\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from(["clonedupe", "--io-threads", "5", "/data"]).unwrap();
    let config = Config::load_from(Some(&path), "CLONEDUPE_IT_LAYER_")
        .unwrap()
        .with_cli_overrides(&cli)
        .unwrap();

    assert_eq!(config.min_size, 8192);
    assert_eq!(config.io_threads, 5);
    assert_eq!(config.hash, HashAlgorithm::Sha256);
    assert!(config.include_hidden);
}

#[test]
fn test_environment_layer() {
    std::env::set_var("CLONEDUPE_IT_ENV_HASH", "blake3");
    std::env::set_var("CLONEDUPE_IT_ENV_SKIP_HARDLINKS", "false");
    let config = Config::load_from(None, "CLONEDUPE_IT_ENV_");
    std::env::remove_var("CLONEDUPE_IT_ENV_HASH");
    std::env::remove_var("CLONEDUPE_IT_ENV_SKIP_HARDLINKS");

    let config = config.unwrap();
    assert_eq!(config.hash, HashAlgorithm::Blake3);
    assert!(!config.skip_hardlinks);
}

#[test]
fn test_invalid_chunk_size_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clonedupe.toml");
    fs::write(&path, "chunk_size = 0\n").unwrap();

    let err = Config::load_from(Some(&path), "CLONEDUPE_IT_CHUNK_").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "chunk_size", .. }));
}

#[test]
fn test_cli_zero_threads_rejected() {
    let cli = Cli::try_parse_from(["clonedupe", "--io-threads", "0", "/data"]).unwrap();
    let err = Config::default().with_cli_overrides(&cli).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "io_threads", .. }));
}

#[test]
fn test_show_config_output_parses_back() {
    let config = Config {
        min_size: 1,
        hash: HashAlgorithm::Blake3,
        ..Config::default()
    };
    let text = config.to_toml().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("round.toml");
    fs::write(&path, text).unwrap();
    let loaded = Config::load_from(Some(&path), "CLONEDUPE_IT_ROUND_").unwrap();
    assert_eq!(loaded, config);
}
