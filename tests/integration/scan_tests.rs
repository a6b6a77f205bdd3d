use clonedupe::scanner::{ScanConfig, ScanError, Scanner};
use tempfile::tempdir;

use super::support::{all_under, content, write};

fn scanner(min_size: u64) -> Scanner {
    Scanner::new(ScanConfig {
        min_size,
        ..ScanConfig::default()
    })
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (files, stats) = scanner(0).scan(&all_under(dir.path())).unwrap();

    assert!(files.is_empty());
    assert_eq!(stats.matched, 0);
    assert_eq!(stats.candidates, 0);
}

#[test]
fn test_scan_nested_directories_in_name_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "b/2.bin", &content(10, 1));
    write(dir.path(), "a/1.bin", &content(10, 2));
    write(dir.path(), "a/sub/0.bin", &content(10, 3));
    write(dir.path(), "c.bin", &content(10, 4));

    let (files, stats) = scanner(0).scan(&all_under(dir.path())).unwrap();

    let names: Vec<_> = files
        .iter()
        .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            std::path::PathBuf::from("a/1.bin"),
            "a/sub/0.bin".into(),
            "b/2.bin".into(),
            "c.bin".into(),
        ]
    );
    assert_eq!(stats.candidate_bytes, 40);
}

#[test]
fn test_scan_multiple_patterns() {
    let dir = tempdir().unwrap();
    write(dir.path(), "photos/a.jpg", &content(100, 1));
    write(dir.path(), "photos/a.txt", &content(100, 1));
    write(dir.path(), "backup/x/a.jpg", &content(100, 1));

    let patterns = vec![
        format!("{}/photos/*.jpg", dir.path().display()),
        format!("{}/backup/**/*.jpg", dir.path().display()),
    ];
    let (files, _) = scanner(0).scan(&patterns).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files[0].path.ends_with("photos/a.jpg"));
    assert!(files[1].path.ends_with("backup/x/a.jpg"));
}

#[test]
fn test_scan_overlapping_patterns_keep_first_position() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", &content(10, 1));
    write(dir.path(), "b.bin", &content(10, 2));

    let patterns = vec![
        format!("{}/b.bin", dir.path().display()),
        format!("{}/*.bin", dir.path().display()),
    ];
    let (files, stats) = scanner(0).scan(&patterns).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files[0].path.ends_with("b.bin"));
    assert!(files[1].path.ends_with("a.bin"));
    assert_eq!(stats.repeated_matches, 1);
}

#[test]
fn test_scan_min_size_threshold_is_inclusive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small.bin", &content(1023, 1));
    write(dir.path(), "exact.bin", &content(1024, 1));

    let (files, stats) = scanner(1024).scan(&all_under(dir.path())).unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("exact.bin"));
    assert_eq!(stats.below_min_size, 1);
}

#[test]
fn test_scan_hidden_files_need_opt_in() {
    let dir = tempdir().unwrap();
    write(dir.path(), ".cache/a.bin", &content(10, 1));
    write(dir.path(), "visible.bin", &content(10, 1));

    let (default_files, _) = scanner(0).scan(&all_under(dir.path())).unwrap();
    assert_eq!(default_files.len(), 1);

    let (all_files, _) = Scanner::new(ScanConfig {
        min_size: 0,
        include_hidden: true,
        ..ScanConfig::default()
    })
    .scan(&all_under(dir.path()))
    .unwrap();
    assert_eq!(all_files.len(), 2);
}

#[test]
fn test_scan_misconfiguration_is_fatal() {
    assert!(matches!(scanner(0).scan(&[]), Err(ScanError::NoPatterns)));
    assert!(matches!(
        scanner(0).scan(&["/data/[unclosed".to_string()]),
        Err(ScanError::InvalidPattern { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_scan_through_symlinked_root() {
    let dir = tempdir().unwrap();
    write(dir.path(), "real/a.bin", &content(2048, 1));
    write(dir.path(), "real/b.bin", &content(2048, 1));
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

    let direct = format!("{}/real/**", dir.path().display());
    let linked = format!("{}/link/**", dir.path().display());

    let (real_files, _) = scanner(0).scan(&[direct]).unwrap();
    let (link_files, stats) = scanner(0).scan(&[linked]).unwrap();

    assert_eq!(real_files.len(), 2);
    assert_eq!(link_files.len(), 2);
    assert_eq!(stats.matched, 2);
    assert!(link_files[0].path.ends_with("link/a.bin"));
}

#[test]
fn test_scan_braces_in_names_are_literal() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a{1}.bin", &content(10, 1));
    write(dir.path(), "x{y/b.bin", &content(10, 2));

    let literal = format!("{}/a{{1}}.bin", dir.path().display());
    let unbalanced = format!("{}/x{{y/*.bin", dir.path().display());

    let (files, _) = scanner(0).scan(&[literal]).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("a{1}.bin"));

    let (files, _) = scanner(0).scan(&[unbalanced]).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("x{y/b.bin"));
}
