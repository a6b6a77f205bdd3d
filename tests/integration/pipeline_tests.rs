use std::fs;
use std::sync::Arc;

use clonedupe::actions::DedupOptions;
use clonedupe::config::Config;
use clonedupe::duplicates::{DuplicateFinder, FinderConfig};
use clonedupe::error::ExitCode;
use clonedupe::scanner::{HashAlgorithm, ScanConfig, Scanner};
use clonedupe::Pipeline;
use tempfile::tempdir;

use super::support::{all_under, config, content, write, CopyCloner};

#[test]
fn test_sizes_scenario() {
    let dir = tempdir().unwrap();
    let body = content(2048, 7);
    let a = write(dir.path(), "a.bin", &body);
    let b = write(dir.path(), "b.bin", &body);
    write(dir.path(), "c.bin", &content(4096, 7));

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.summary.clusters, 1);
    assert_eq!(report.summary.reclaimable_bytes, 2048);
    let cluster = &report.result.clusters[0];
    assert_eq!(cluster.canonical, a);
    assert_eq!(cluster.members.len(), 1);
    assert_eq!(cluster.members[0].path, b);
    assert_eq!(report.result.potential_savings(), 2048);
}

#[test]
fn test_difference_after_prefix_splits_at_full_phase() {
    let dir = tempdir().unwrap();
    let body = content(4096, 3);
    let mut changed = body.clone();
    changed[2000] ^= 0xff;
    write(dir.path(), "a.bin", &body);
    write(dir.path(), "b.bin", &changed);

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.summary.prefix_phase.groups, 1);
    assert_eq!(report.summary.prefix_phase.potential_duplicates, 2);
    assert_eq!(report.summary.full_phase.groups, 0);
    assert_eq!(report.summary.full_phase.eliminated, 2);
    assert!(report.result.clusters.is_empty());
    assert_eq!(report.exit_code, ExitCode::NoDuplicates);
}

#[test]
fn test_difference_in_prefix_eliminated_early() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", &content(4096, 1));
    write(dir.path(), "b.bin", &content(4096, 2));

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.summary.prefix_phase.eliminated, 2);
    assert_eq!(report.summary.full_phase.input_files, 0);
}

#[test]
fn test_cluster_members_are_identical() {
    let dir = tempdir().unwrap();
    for seed in 0..4u8 {
        for copy in 0..3 {
            write(
                dir.path(),
                &format!("set{seed}/copy{copy}.bin"),
                &content(1500 + usize::from(seed) * 100, seed),
            );
        }
    }

    let (files, _) = Scanner::new(ScanConfig { min_size: 0, ..ScanConfig::default() })
        .scan(&all_under(dir.path()))
        .unwrap();
    let (clusters, _) = DuplicateFinder::with_defaults().find_clusters(files).unwrap();

    assert_eq!(clusters.len(), 4);
    for cluster in &clusters {
        assert_eq!(cluster.files.len(), 3);
        let first = fs::read(&cluster.canonical().path).unwrap();
        for member in cluster.duplicates() {
            assert_eq!(fs::read(&member.path).unwrap(), first);
        }
    }
}

#[test]
fn test_clusters_follow_scan_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "1/z.bin", &content(3000, 9));
    write(dir.path(), "2/y.bin", &content(2000, 8));
    write(dir.path(), "3/x.bin", &content(3000, 9));
    write(dir.path(), "4/w.bin", &content(2000, 8));

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .run(&all_under(dir.path()))
        .unwrap();

    let canonicals: Vec<_> = report
        .result
        .clusters
        .iter()
        .map(|c| c.canonical.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        canonicals,
        vec![std::path::PathBuf::from("1/z.bin"), "2/y.bin".into()]
    );
}

#[test]
fn test_parallel_hashing_matches_sequential() {
    let dir = tempdir().unwrap();
    for i in 0..24u8 {
        write(dir.path(), &format!("f{i:02}.bin"), &content(2048, i % 5));
    }

    let run = |threads: usize| {
        let config = Config {
            io_threads: threads,
            ..config()
        };
        Pipeline::new(config, DedupOptions { dry_run: true, ..Default::default() })
            .run(&all_under(dir.path()))
            .unwrap()
    };

    let sequential = run(1);
    let parallel = run(6);
    assert_eq!(sequential.result.clusters, parallel.result.clusters);
    assert_eq!(sequential.result.clusters.len(), 5);
}

#[test]
fn test_algorithms_agree_on_clusters() {
    let dir = tempdir().unwrap();
    let body = content(5000, 4);
    write(dir.path(), "a.bin", &body);
    write(dir.path(), "b.bin", &body);
    write(dir.path(), "c.bin", &content(5000, 5));

    for hash in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
        let config = Config { hash, ..config() };
        let report = Pipeline::new(config, DedupOptions { dry_run: true, ..Default::default() })
            .run(&all_under(dir.path()))
            .unwrap();
        assert_eq!(report.result.clusters.len(), 1);
        assert_eq!(
            report.result.clusters[0].digest.as_bytes().len(),
            hash.digest_len()
        );
        assert_eq!(report.algorithm, hash);
    }
}

#[test]
fn test_empty_files_never_cluster() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.empty", b"");
    write(dir.path(), "b.empty", b"");

    let report = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(Arc::new(CopyCloner::default()))
        .run(&all_under(dir.path()))
        .unwrap();

    assert!(report.result.clusters.is_empty());
    assert_eq!(report.summary.size_phase.empty_files, 2);
}

#[test]
fn test_relative_patterns_resolve_against_cwd() {
    let dir = tempdir().unwrap();
    let body = content(2048, 1);
    write(dir.path(), "data/a.bin", &body);
    write(dir.path(), "data/b.bin", &body);

    let report = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .with_cwd(dir.path())
        .run(&["./data/*.bin".to_string()])
        .unwrap();

    assert_eq!(report.result.clusters.len(), 1);
    assert!(report.result.clusters[0].canonical.is_absolute());
}

#[test]
fn test_interrupted_before_cloning() {
    let dir = tempdir().unwrap();
    let body = content(2048, 1);
    write(dir.path(), "a.bin", &body);
    write(dir.path(), "b.bin", &body);

    let shutdown = clonedupe::signal::ShutdownHandler::new();
    shutdown.request_shutdown();
    let err = Pipeline::new(config(), DedupOptions::default())
        .with_shutdown(shutdown)
        .run(&all_under(dir.path()))
        .unwrap_err();

    assert!(err
        .downcast_ref::<clonedupe::duplicates::FinderError>()
        .is_some());
}

#[test]
fn test_finder_config_threads_floor() {
    let config = FinderConfig::default().with_io_threads(0);
    assert_eq!(config.io_threads, 1);
}
