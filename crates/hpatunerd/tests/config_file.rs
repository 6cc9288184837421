//! Configuration file loading through `RunArgs::resolve`.

use std::io::Write;
use std::time::Duration;

use hpatunerd::RunArgs;

#[test]
fn resolve_reads_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
namespace = "payments"
probe_addr = "127.0.0.1:18081"
metric_timeout = "2s"
backoff_base = "1s"
"#
    )
    .unwrap();

    let args = RunArgs {
        config: Some(file.path().to_path_buf()),
        api_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let settings = args.resolve().unwrap();

    assert_eq!(settings.controller.namespace.as_deref(), Some("payments"));
    assert_eq!(settings.controller.metric_timeout, Duration::from_secs(2));
    assert_eq!(settings.controller.backoff_base, Duration::from_secs(1));
    assert_eq!(settings.controller.api_timeout, Duration::from_secs(5));
    assert_eq!(settings.controller.requeue_interval, Duration::from_secs(30));
    assert_eq!(settings.probe_addr, "127.0.0.1:18081".parse().unwrap());
}

#[test]
fn resolve_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let args = RunArgs {
        config: Some(dir.path().join("absent.toml")),
        ..Default::default()
    };
    assert!(args.resolve().is_err());
}

#[test]
fn resolve_fails_on_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "namespace = [unterminated").unwrap();

    let args = RunArgs {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(args.resolve().is_err());
}
