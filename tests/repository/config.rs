//! Configuration loading feeding a repository

use crate::common::*;
use docrepo::CONFIG_FILE_NAME;
use std::fs;

#[test]
fn repository_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "database = \"tenants\"\npartition_separator = \".\"\ndefault_page_size = 3\n",
    )
    .unwrap();

    let config = RepositoryConfig::from_file(&path).unwrap();
    let t = TestRepo::with_config(config);
    assert_eq!(t.repo.config().database, "tenants");
    assert_eq!(t.repo.collection_name::<Invoice>(Some("acme")), "acme.Invoice");
    assert_eq!(t.invoices().default_page(), Page::new(0, 3));
}

#[test]
fn default_toml_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, RepositoryConfig::default_toml()).unwrap();
    assert_eq!(RepositoryConfig::from_file(&path).unwrap(), RepositoryConfig::default());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "default_page_size = 0\n").unwrap();
    assert!(matches!(RepositoryConfig::from_file(&path), Err(Error::Config(_))));

    let client = MemoryClient::shared("x");
    let bad = RepositoryConfig {
        partition_separator: String::new(),
        ..RepositoryConfig::default()
    };
    assert!(Repository::new(client, bad).is_err());
}
