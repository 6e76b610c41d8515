//! Adapter tests against scripted stand-ins for lsof and kill.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use portmanager_core::{
    KillCommand, KillError, LsofScanner, OutputFormat, PortScannerPort, PortService,
    ProcessKillerPort, ScanError, TransportProtocol,
};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

const FAKE_LSOF: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    -iTCP) printf 'p101\ncnginx\nf6\nn*:80\nf7\nn[::]:80\np202\ncnode\nf19\nn127.0.0.1:3000\n'; exit 0 ;;
    -iUDP) printf 'p303\ncmDNSResponder\nf8\nn*:5353\n'; exit 0 ;;
  esac
done
exit 2
"#;

const FAKE_LSOF_COLUMNS: &str = r#"#!/bin/sh
case "$1" in
  -iTCP)
    printf '%s\n' 'COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME'
    printf '%s\n' 'Code\x20Helper  1234  user   10u  IPv4 0x1234567890abcdef      0t0  TCP *:8080 (LISTEN)'
    ;;
  -iUDP)
    printf '%s\n' 'COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME'
    printf '%s\n' 'dnsmasq    812  root    4u  IPv4      21034      0t0  UDP 127.0.0.1:53'
    ;;
esac
"#;

const EMPTY_LSOF: &str = "#!/bin/sh\nexit 1\n";

const TCP_ONLY_LSOF: &str = r#"#!/bin/sh
case "$1" in
  -iTCP) printf 'p9\ncsshd\nn*:22\n' ;;
  *) echo 'lsof: unsupported' >&2; exit 1 ;;
esac
"#;

const SLOW_LSOF: &str = "#!/bin/sh\nsleep 5\n";

const KILL_OK: &str = "#!/bin/sh\nexit 0\n";

const KILL_NO_SUCH_PROCESS: &str = "#!/bin/sh\necho \"kill: ($2) - No such process\" >&2\nexit 1\n";

const KILL_NOT_PERMITTED: &str = "#!/bin/sh\necho \"kill: ($2) - Operation not permitted\" >&2\nexit 1\n";

const KILL_OTHER: &str = "#!/bin/sh\necho 'kill: something odd' >&2\nexit 1\n";

/// All scripts are written once, before any test spawns a child, so no
/// script is still open for writing when another test executes it.
fn scripts() -> &'static Path {
    static DIR: OnceLock<TempDir> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("lsof", FAKE_LSOF),
            ("lsof-columns", FAKE_LSOF_COLUMNS),
            ("lsof-empty", EMPTY_LSOF),
            ("lsof-tcp-only", TCP_ONLY_LSOF),
            ("lsof-slow", SLOW_LSOF),
            ("kill-ok", KILL_OK),
            ("kill-no-such-process", KILL_NO_SUCH_PROCESS),
            ("kill-not-permitted", KILL_NOT_PERMITTED),
            ("kill-other", KILL_OTHER),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
    .path()
}

fn script(name: &str) -> PathBuf {
    scripts().join(name)
}

fn scanner(name: &str, format: OutputFormat) -> LsofScanner {
    LsofScanner::with_program(script(name), format, TIMEOUT)
}

#[tokio::test]
async fn scan_merges_tcp_and_udp_sorted_by_port() {
    let service = PortService::new(scanner("lsof", OutputFormat::TaggedField));
    let records = service.scan().await.unwrap();

    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.port, r.protocol, r.pid, r.address.as_str(), r.state.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (80, TransportProtocol::Tcp, 101, "*", "LISTEN"),
            (80, TransportProtocol::Tcp, 101, "[::]", "LISTEN"),
            (3000, TransportProtocol::Tcp, 202, "127.0.0.1", "LISTEN"),
            (5353, TransportProtocol::Udp, 303, "*", "UDP"),
        ]
    );
    assert_eq!(records[2].process_name, "node");
    assert_eq!(records[3].process_name, "mDNSResponder");
}

#[tokio::test]
async fn scan_columnar_output() {
    let service = PortService::new(scanner("lsof-columns", OutputFormat::Columnar));
    let records = service.scan().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].port, 53);
    assert_eq!(records[0].address, "127.0.0.1");
    assert_eq!(records[0].state, "UDP");
    assert_eq!(records[1].port, 8080);
    assert_eq!(records[1].process_name, "Code Helper");
    assert_eq!(records[1].pid, 1234);
}

#[tokio::test]
async fn non_zero_exit_with_empty_output_is_no_records() {
    let lsof = scanner("lsof-empty", OutputFormat::TaggedField);
    let records = lsof.scan_protocol(TransportProtocol::Tcp).await.unwrap();
    assert!(records.is_empty());

    let records = PortService::new(lsof).scan().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn udp_failure_keeps_tcp_results() {
    let service = PortService::new(scanner("lsof-tcp-only", OutputFormat::TaggedField));
    let records = service.scan().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].port, 22);
    assert_eq!(records[0].process_name, "sshd");
}

#[tokio::test]
async fn missing_lsof_is_launch_error() {
    let lsof = LsofScanner::with_program(
        scripts().join("does-not-exist"),
        OutputFormat::TaggedField,
        TIMEOUT,
    );
    let err = PortService::new(lsof).scan().await.unwrap_err();
    assert!(matches!(err, ScanError::Launch { .. }));
}

#[tokio::test]
async fn slow_lsof_times_out() {
    let lsof = LsofScanner::with_program(
        script("lsof-slow"),
        OutputFormat::TaggedField,
        Duration::from_millis(100),
    );
    let err = lsof.scan_protocol(TransportProtocol::Tcp).await.unwrap_err();
    assert!(matches!(err, ScanError::TimedOut { .. }));
}

#[tokio::test]
async fn kill_success() {
    let killer = KillCommand::with_program(script("kill-ok"), TIMEOUT);
    killer.kill(4242).await.unwrap();
}

#[tokio::test]
async fn kill_maps_stderr_to_errors() {
    let killer = KillCommand::with_program(script("kill-no-such-process"), TIMEOUT);
    let err = killer.kill(4242).await.unwrap_err();
    assert!(matches!(err, KillError::ProcessNotFound(4242)));

    let killer = KillCommand::with_program(script("kill-not-permitted"), TIMEOUT);
    let err = killer.kill(1).await.unwrap_err();
    assert!(matches!(err, KillError::PermissionDenied(1)));

    let killer = KillCommand::with_program(script("kill-other"), TIMEOUT);
    let err = killer.kill(4242).await.unwrap_err();
    match err {
        KillError::Failed { pid, reason } => {
            assert_eq!(pid, 4242);
            assert_eq!(reason, "kill: something odd");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn kill_rejects_pid_zero() {
    let killer = KillCommand::with_program(script("kill-ok"), TIMEOUT);
    let err = killer.kill(0).await.unwrap_err();
    assert!(matches!(err, KillError::InvalidPid(0)));
}
