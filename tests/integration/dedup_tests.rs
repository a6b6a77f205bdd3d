use std::fs;
use std::sync::Arc;

use clonedupe::actions::{DedupExecutor, DedupOptions, MemberOutcome};
use clonedupe::duplicates::DuplicateFinder;
use clonedupe::error::ExitCode;
use clonedupe::scanner::{ScanConfig, Scanner};
use clonedupe::Pipeline;
use tempfile::tempdir;

use super::support::{all_under, config, content, write, CopyCloner, FailingCloner};

#[test]
fn test_clone_replaces_duplicates() {
    let dir = tempdir().unwrap();
    let body = content(2048, 1);
    let a = write(dir.path(), "a.bin", &body);
    let b = write(dir.path(), "b.bin", &body);
    let c = write(dir.path(), "c.bin", &body);
    let cloner = Arc::new(CopyCloner::default());

    let report = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(cloner.clone())
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(cloner.targets(), vec![b.clone(), c.clone()]);
    assert!(cloner.calls.lock().unwrap().iter().all(|(src, _)| *src == a));
    assert_eq!(report.result.files_cloned, 2);
    assert_eq!(report.result.bytes_reclaimed, 4096);
    assert_eq!(report.exit_code, ExitCode::Success);
    for path in [&a, &b, &c] {
        assert_eq!(fs::read(path).unwrap(), body);
    }
}

#[test]
fn test_one_failure_does_not_stop_cluster() {
    let dir = tempdir().unwrap();
    let body = content(2048, 2);
    write(dir.path(), "a.bin", &body);
    let b = write(dir.path(), "b.bin", &body);
    let c = write(dir.path(), "c.bin", &body);
    let d = write(dir.path(), "d.bin", &body);
    let cloner = Arc::new(FailingCloner::new(c.clone()));

    let report = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(cloner.clone())
        .run(&all_under(dir.path()))
        .unwrap();

    let result = &report.result;
    assert_eq!(result.files_cloned, 2);
    assert_eq!(result.files_errored, 1);
    assert_eq!(result.bytes_reclaimed, 4096);
    assert_eq!(result.potential_savings(), 6144);
    assert_eq!(cloner.inner.targets(), vec![b, d]);
    assert!(matches!(
        result.clusters[0].members[1].outcome,
        MemberOutcome::CloneFailed(_)
    ));
    assert_eq!(report.exit_code, ExitCode::PartialSuccess);
}

#[test]
fn test_verify_skips_modified_target() {
    let dir = tempdir().unwrap();
    let body = content(2048, 3);
    write(dir.path(), "a.bin", &body);
    let b = write(dir.path(), "b.bin", &body);
    let c = write(dir.path(), "c.bin", &body);

    let (files, _) = Scanner::new(ScanConfig { min_size: 0, ..ScanConfig::default() })
        .scan(&all_under(dir.path()))
        .unwrap();
    let (clusters, _) = DuplicateFinder::with_defaults().find_clusters(files).unwrap();

    let mut changed = body.clone();
    changed[100] ^= 1;
    fs::write(&b, &changed).unwrap();

    let cloner = Arc::new(CopyCloner::default());
    let result = DedupExecutor::new(DedupOptions {
        verify: true,
        ..Default::default()
    })
    .with_cloner(cloner.clone())
    .execute(&clusters);

    assert_eq!(result.files_verify_skipped, 1);
    assert_eq!(result.files_errored, 0);
    assert_eq!(result.files_cloned, 1);
    assert_eq!(cloner.targets(), vec![c]);
    assert_eq!(fs::read(&b).unwrap(), changed);
    assert_eq!(
        result.clusters[0].members[0].outcome,
        MemberOutcome::VerificationMismatch
    );
    assert_eq!(ExitCode::from_result(&result), ExitCode::PartialSuccess);
}

#[test]
fn test_verify_skips_all_when_canonical_modified() {
    let dir = tempdir().unwrap();
    let body = content(2048, 4);
    let a = write(dir.path(), "a.bin", &body);
    write(dir.path(), "b.bin", &body);
    write(dir.path(), "c.bin", &body);

    let (files, _) = Scanner::new(ScanConfig { min_size: 0, ..ScanConfig::default() })
        .scan(&all_under(dir.path()))
        .unwrap();
    let (clusters, _) = DuplicateFinder::with_defaults().find_clusters(files).unwrap();
    fs::write(&a, content(2048, 5)).unwrap();

    let cloner = Arc::new(CopyCloner::default());
    let result = DedupExecutor::new(DedupOptions {
        verify: true,
        ..Default::default()
    })
    .with_cloner(cloner.clone())
    .execute(&clusters);

    assert_eq!(result.files_verify_skipped, 2);
    assert!(cloner.targets().is_empty());
}

#[test]
fn test_verify_missing_target_is_error() {
    let dir = tempdir().unwrap();
    let body = content(2048, 6);
    write(dir.path(), "a.bin", &body);
    let b = write(dir.path(), "b.bin", &body);

    let (files, _) = Scanner::new(ScanConfig { min_size: 0, ..ScanConfig::default() })
        .scan(&all_under(dir.path()))
        .unwrap();
    let (clusters, _) = DuplicateFinder::with_defaults().find_clusters(files).unwrap();
    fs::remove_file(&b).unwrap();

    let result = DedupExecutor::new(DedupOptions {
        verify: true,
        ..Default::default()
    })
    .with_cloner(Arc::new(CopyCloner::default()))
    .execute(&clusters);

    assert_eq!(result.files_errored, 1);
    assert_eq!(result.files_verify_skipped, 0);
    assert!(matches!(
        result.clusters[0].members[0].outcome,
        MemberOutcome::VerifyFailed(_)
    ));
}

#[test]
fn test_dry_run_does_not_modify_and_predicts_real_run() {
    let dir = tempdir().unwrap();
    let body = content(3000, 7);
    for name in ["a.bin", "b.bin", "c.bin"] {
        write(dir.path(), name, &body);
    }
    write(dir.path(), "d.bin", &content(3000, 8));
    let before: Vec<_> = ["a.bin", "b.bin", "c.bin", "d.bin"]
        .iter()
        .map(|n| fs::metadata(dir.path().join(n)).unwrap().modified().unwrap())
        .collect();

    let cloner = Arc::new(CopyCloner::default());
    let dry = Pipeline::new(config(), DedupOptions { dry_run: true, ..Default::default() })
        .with_cloner(cloner.clone())
        .run(&all_under(dir.path()))
        .unwrap();

    assert!(cloner.targets().is_empty());
    let after: Vec<_> = ["a.bin", "b.bin", "c.bin", "d.bin"]
        .iter()
        .map(|n| fs::metadata(dir.path().join(n)).unwrap().modified().unwrap())
        .collect();
    assert_eq!(before, after);
    assert!(dry
        .result
        .clusters
        .iter()
        .flat_map(|c| &c.members)
        .all(|m| m.outcome == MemberOutcome::WouldClone));

    let real = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(cloner.clone())
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(dry.result.files_cloned, real.result.files_cloned);
    assert_eq!(dry.result.bytes_reclaimed, real.result.bytes_reclaimed);
    assert_eq!(dry.result.bytes_total, real.result.bytes_total);
    assert_eq!(dry.result.bytes_unique, real.result.bytes_unique);
    assert_eq!(dry.exit_code, real.exit_code);
    assert!(dry.result.dry_run && !real.result.dry_run);
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = tempdir().unwrap();
    let body = content(2048, 9);
    for name in ["a.bin", "b.bin", "c.bin"] {
        write(dir.path(), name, &body);
    }
    write(dir.path(), "unique.bin", &content(2048, 10));

    let first = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(Arc::new(CopyCloner::default()))
        .run(&all_under(dir.path()))
        .unwrap();
    let second = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(Arc::new(CopyCloner::default()))
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(first.result.clusters.len(), 1);
    assert_eq!(second.result.clusters.len(), 1);
    assert_eq!(
        first.result.clusters[0].canonical,
        second.result.clusters[0].canonical
    );
    assert_eq!(second.result.files_errored, 0);
    for name in ["a.bin", "b.bin", "c.bin"] {
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), body);
    }
    assert_eq!(
        fs::read(dir.path().join("unique.bin")).unwrap(),
        content(2048, 10)
    );
}

#[test]
fn test_no_duplicates_exit_code() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", &content(2048, 1));
    write(dir.path(), "b.bin", &content(2049, 1));

    let report = Pipeline::new(config(), DedupOptions::default())
        .with_cloner(Arc::new(CopyCloner::default()))
        .run(&all_under(dir.path()))
        .unwrap();

    assert_eq!(report.exit_code, ExitCode::NoDuplicates);
    assert_eq!(report.result.clusters_processed, 0);
}
