//! End-to-end synchronization scenarios against the in-memory device fake.

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use s7web_core::config::Config;
use s7web_core::domain::errors::DomainError;
use s7web_core::ports::progress::IProgressObserver;
use s7web_deploy::{DeployError, Synchronizer};

use crate::common::{mtime, FakeDevice, MemorySource};

fn config(retries: u32) -> Config {
    let mut config = Config::default();
    config.deploy.retries = retries;
    config
}

fn synchronizer(
    device: &Arc<FakeDevice>,
    source: MemorySource,
    retries: u32,
) -> Synchronizer {
    Synchronizer::new(device.clone(), Arc::new(source), &config(retries)).unwrap()
}

fn site_source() -> MemorySource {
    MemorySource::new()
        .with_file("index.html", b"<html></html>", 1000)
        .with_file("css/main.css", b"body {}", 1100)
        .with_file("js/app.js", b"let x = 1;", 1200)
}

#[tokio::test]
async fn test_fresh_deploy_converges_in_one_round() {
    let device = Arc::new(FakeDevice::new());
    let sync = synchronizer(&device, site_source(), 3);

    let report = sync.deploy_or_update(Path::new("/site")).await.unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(report.files_added, 3);
    assert_eq!(report.files_updated, 0);
    assert_eq!(report.files_deleted, 0);
    assert!(report.errors.is_empty());

    assert_eq!(device.file_data("index.html").unwrap(), b"<html></html>");
    assert_eq!(device.file_data("css/main.css").unwrap(), b"body {}");
    assert!(device.has_path("css"));
    assert!(device.has_path("js"));
}

#[tokio::test]
async fn test_deployed_tree_round_trips_through_browse() {
    use s7web_core::ports::local_source::{IgnoreConfig, ILocalSource};
    use s7web_core::ports::rpc_transport::IRpcTransport;

    let device = Arc::new(FakeDevice::new());
    synchronizer(&device, site_source(), 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    let desired = site_source()
        .scan(Path::new("/site"), &IgnoreConfig::default())
        .await
        .unwrap();
    let observed = device.browse_resource_tree(None).await.unwrap();
    assert!(desired.semantically_equal(&observed));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let device = Arc::new(FakeDevice::new());
    synchronizer(&device, site_source(), 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    let report = synchronizer(&device, site_source(), 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    assert_eq!(report.rounds, 0);
    assert_eq!(report.files_added, 0);
    assert_eq!(report.files_updated, 0);
    assert_eq!(report.files_deleted, 0);
}

#[tokio::test]
async fn test_changed_file_is_updated_in_place() {
    let device = Arc::new(FakeDevice::with_app());
    device.seed_file("index.html", b"<html>old</html>", mtime(500));

    let source = MemorySource::new().with_file("index.html", b"<html>new</html>", 1000);
    let report = synchronizer(&device, source, 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(report.files_updated, 1);
    assert_eq!(report.files_added, 0);
    assert_eq!(device.file_data("index.html").unwrap(), b"<html>new</html>");
}

#[tokio::test]
async fn test_stray_subtree_is_removed() {
    let device = Arc::new(FakeDevice::with_app());
    device.seed_file("index.html", b"x", mtime(1000));
    device.seed_dir("legacy");
    device.seed_file("legacy/old.js", b"var y;", mtime(10));

    let source = MemorySource::new().with_file("index.html", b"x", 1000);
    let report = synchronizer(&device, source, 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    // Leaf deleted before its directory, both counted
    assert_eq!(report.files_deleted, 2);
    assert!(!device.has_path("legacy"));
    assert!(!device.has_path("legacy/old.js"));
    assert!(device.has_path("index.html"));
}

#[tokio::test]
async fn test_exhausted_rounds_fail_with_divergent_paths() {
    let device = Arc::new(FakeDevice::new());
    *device.reject_create.lock().unwrap() = Some("css/main.css".to_string());

    let err = synchronizer(&device, site_source(), 2)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap_err();

    match err.downcast_ref::<DeployError>().unwrap() {
        DeployError::DeploymentFailed { rounds, still_missing, unexpected } => {
            assert_eq!(*rounds, 2);
            assert_eq!(
                still_missing.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                ["css/main.css"]
            );
            assert!(unexpected.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }

    // The rest of the site made it up despite the rejected file
    assert!(device.has_path("index.html"));
    assert!(device.has_path("js/app.js"));
}

#[tokio::test]
async fn test_all_tickets_closed_even_when_uploads_fail() {
    let device = Arc::new(FakeDevice::new());
    *device.reject_upload.lock().unwrap() = Some("index.html".to_string());

    let result = synchronizer(&device, site_source(), 2)
        .deploy_or_update(Path::new("/site"))
        .await;

    assert!(result.is_err());
    assert_eq!(device.open_tickets(), 0);
    assert_eq!(
        device.opened.load(Ordering::SeqCst),
        device.closed.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_cancellation_between_operations() {
    let device = Arc::new(FakeDevice::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = synchronizer(&device, site_source(), 3)
        .with_cancellation(cancel)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::Cancelled)
    ));
    // Nothing was applied before the checkpoint fired
    assert!(!device.has_path("index.html"));
}

#[tokio::test]
async fn test_progress_reaches_one_hundred_percent() {
    struct MaxPercent(AtomicU8);

    impl IProgressObserver for MaxPercent {
        fn progress(&self, percent: u8) {
            self.0.fetch_max(percent, Ordering::SeqCst);
        }
    }

    let device = Arc::new(FakeDevice::new());
    let observer = Arc::new(MaxPercent(AtomicU8::new(0)));

    synchronizer(&device, site_source(), 3)
        .with_observer(observer.clone())
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    assert_eq!(observer.0.load(Ordering::SeqCst), 100);
}

#[tokio::test]
async fn test_kind_flip_replaces_file_with_directory() {
    let device = Arc::new(FakeDevice::with_app());
    device.seed_file("assets", b"not a directory", mtime(100));

    let source = MemorySource::new().with_file("assets/logo.svg", b"<svg/>", 200);
    let report = synchronizer(&device, source, 3)
        .deploy_or_update(Path::new("/site"))
        .await
        .unwrap();

    assert_eq!(report.files_deleted, 1);
    assert_eq!(report.files_added, 1);
    assert_eq!(device.file_data("assets/logo.svg").unwrap(), b"<svg/>");
}

#[test]
fn test_zero_retries_rejected_at_construction() {
    let device = Arc::new(FakeDevice::new());
    let err = Synchronizer::new(device, Arc::new(MemorySource::new()), &config(0))
        .unwrap_err();
    assert_eq!(err, DomainError::InvalidRetryCount(0));
}
