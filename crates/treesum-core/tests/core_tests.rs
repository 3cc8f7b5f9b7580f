use std::collections::HashSet;
use std::time::Duration;

use treesum_core::{
    ChecksumConfig, ChecksumError, ChecksumRecord, ChecksumReport, EntryError, ErrorKind,
    HashAlgorithm, ScanStats, SplitPolicy, StorageError, relative_path, to_hex,
};

#[test]
fn test_record_structural_equality() {
    let r1 = ChecksumRecord::new("a.txt", 5, "5d41402abc4b2a76b9719d911017c592");
    let r2 = ChecksumRecord::new("a.txt", 5, "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(r1, r2);

    // Any differing field breaks equality
    assert_ne!(r1, ChecksumRecord::new("b.txt", 5, r1.digest.clone()));
    assert_ne!(r1, ChecksumRecord::new("a.txt", 4, r1.digest.clone()));
    assert_ne!(r1, ChecksumRecord::new("a.txt", 5, "00"));

    let set: HashSet<_> = [r1.clone(), r2].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_hex_rendering_matches_algorithm_width() {
    for algorithm in [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Blake3,
    ] {
        let bytes = vec![0x0a; algorithm.output_len()];
        let hex = to_hex(&bytes);
        assert_eq!(hex.len(), algorithm.hex_len());
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(hex.starts_with("0a0a"));
    }
}

#[test]
fn test_relative_path_normalization() {
    assert_eq!(relative_path("/root", "/root/a.txt"), "a.txt");
    assert_eq!(relative_path("/root", "/root//sub/b.txt"), "sub/b.txt");
    assert_eq!(relative_path("D:\\share", "D:\\share\\x\\y\\z.bin"), "x/y/z.bin");
    assert!(!relative_path("/root", "/root/a/b").starts_with('/'));
}

#[test]
fn test_config_from_toml() {
    let config: ChecksumConfig = toml::from_str(
        r#"
        algorithm = "sha1"
        buffer_size = 4096
        branch_factor = 4

        [split_policy]
        kind = "count"
        max_files = 16
        "#,
    )
    .unwrap();

    assert_eq!(config.algorithm, HashAlgorithm::Sha1);
    assert_eq!(config.buffer_size, 4096);
    assert_eq!(config.branch_factor, 4);
    assert_eq!(config.split_policy, SplitPolicy::Count { max_files: 16 });
    assert_eq!(config.threads, 0);
    assert_eq!(config.progress_interval, 1000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_toml_defaults_and_validation() {
    let config: ChecksumConfig = toml::from_str("").unwrap();
    assert_eq!(config, ChecksumConfig::default());

    let bad: ChecksumConfig = toml::from_str("branch_factor = 1").unwrap();
    assert!(matches!(
        bad.validate(),
        Err(ChecksumError::InvalidConfig { .. })
    ));
}

#[test]
fn test_unknown_algorithm_is_config_error() {
    let err = HashAlgorithm::parse("whirlpool").unwrap_err();
    assert!(matches!(err, ChecksumError::UnsupportedAlgorithm { ref name } if name == "whirlpool"));
    assert!(err.to_string().contains("whirlpool"));
}

#[test]
fn test_report_with_errors_is_partial() {
    let records: HashSet<_> = [ChecksumRecord::new("ok.txt", 2, "aa")].into_iter().collect();
    let err = StorageError::io(
        "/root/locked.txt",
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    );
    let report = ChecksumReport::new(
        records,
        vec![EntryError::storage(&err)],
        ScanStats {
            files_hashed: 1,
            bytes_hashed: 2,
            ..ScanStats::default()
        },
        Duration::from_millis(3),
        false,
    );

    assert!(report.is_partial());
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.failed_count_of(ErrorKind::Storage), 1);
    assert_eq!(report.errors[0].path, "/root/locked.txt");
    assert!(report.get("ok.txt").is_some());
}
