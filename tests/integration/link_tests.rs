use std::sync::Arc;

use clonedupe::actions::DedupOptions;
use clonedupe::config::Config;
use clonedupe::Pipeline;
use tempfile::tempdir;

use super::support::{all_under, config, content, write, CopyCloner};

#[cfg(unix)]
#[test]
fn test_symlink_to_large_file_is_never_a_candidate() {
    let dir = tempdir().unwrap();
    let body = content(1 << 20, 1);
    let real = write(dir.path(), "real.bin", &body);
    std::os::unix::fs::symlink(&real, dir.path().join("link.bin")).unwrap();

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.scan.candidates, 1);
    assert_eq!(report.scan.symlinks_skipped, 1);
    assert!(report.result.clusters.is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_walked() {
    let outside = tempdir().unwrap();
    let body = content(2048, 2);
    write(outside.path(), "a.bin", &body);

    let dir = tempdir().unwrap();
    write(dir.path(), "b.bin", &body);
    std::os::unix::fs::symlink(outside.path(), dir.path().join("elsewhere")).unwrap();

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.scan.candidates, 2);
    assert_eq!(report.result.clusters.len(), 1);
    let cluster = &report.result.clusters[0];
    assert!(cluster.canonical.ends_with("b.bin"));
    assert!(cluster.members[0].path.ends_with("elsewhere/a.bin"));
}

#[cfg(unix)]
#[test]
fn test_hardlinks_skipped_by_default() {
    let dir = tempdir().unwrap();
    let body = content(2048, 3);
    let a = write(dir.path(), "a.bin", &body);
    std::fs::hard_link(&a, dir.path().join("b.bin")).unwrap();
    write(dir.path(), "c.bin", &body);

    let cloner = Arc::new(CopyCloner::default());
    let report = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(cloner.clone())
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.scan.hardlinks_skipped, 1);
    assert_eq!(cloner.targets(), vec![dir.path().join("c.bin")]);
}

#[cfg(unix)]
#[test]
fn test_hardlinks_kept_on_request() {
    let dir = tempdir().unwrap();
    let body = content(2048, 4);
    let a = write(dir.path(), "a.bin", &body);
    std::fs::hard_link(&a, dir.path().join("b.bin")).unwrap();

    let config = Config {
        skip_hardlinks: false,
        ..config()
    };
    let report = Pipeline::new(config, DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.scan.hardlinks_skipped, 0);
    assert_eq!(report.result.clusters.len(), 1);
}

#[test]
fn test_small_files_never_cluster() {
    let dir = tempdir().unwrap();
    let small = content(512, 5);
    write(dir.path(), "a.bin", &small);
    write(dir.path(), "b.bin", &small);
    let large = content(4096, 5);
    write(dir.path(), "c.bin", &large);
    write(dir.path(), "d.bin", &large);

    let config = Config {
        min_size: 1024,
        ..config()
    };
    let report = Pipeline::new(config, DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.scan.below_min_size, 2);
    assert_eq!(report.result.clusters.len(), 1);
    assert_eq!(report.result.clusters[0].size, 4096);
}
