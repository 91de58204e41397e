use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;

use rcmd_core::*;
use rcmd_exec::error::ExecError;
use rcmd_exec::traits::{OutputStream, RemoteConnection, RemoteConnector};
use rcmd_exec::LocalConnector;

// Mock implementations
#[derive(Clone)]
enum HostBehavior {
    RefuseConnect,
    RefuseStart,
    Lines(Vec<&'static str>),
    LinesThenError(Vec<&'static str>),
    LinesThenHang(Vec<&'static str>),
}

struct MockConnector {
    hosts: HashMap<&'static str, HostBehavior>,
}

impl MockConnector {
    fn new(hosts: impl IntoIterator<Item = (&'static str, HostBehavior)>) -> Self {
        Self {
            hosts: hosts.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RemoteConnector for MockConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn RemoteConnection>, ExecError> {
        match self.hosts.get(host) {
            None | Some(HostBehavior::RefuseConnect) => {
                Err(ExecError::ConnectionFailed(format!("{host}: connection refused")))
            }
            Some(behavior) => Ok(Box::new(MockConnection {
                behavior: behavior.clone(),
            })),
        }
    }

    fn connector_type(&self) -> &'static str {
        "mock"
    }
}

struct MockConnection {
    behavior: HostBehavior,
}

#[async_trait]
impl RemoteConnection for MockConnection {
    async fn exec(&mut self, _command: &str) -> Result<Box<dyn OutputStream>, ExecError> {
        match &self.behavior {
            HostBehavior::RefuseStart => Err(ExecError::CommandStart("no such command".into())),
            HostBehavior::Lines(lines) => Ok(Box::new(MockOutput {
                lines: lines.clone().into_iter(),
                end: StreamEnd::Clean,
            })),
            HostBehavior::LinesThenError(lines) => Ok(Box::new(MockOutput {
                lines: lines.clone().into_iter(),
                end: StreamEnd::Error,
            })),
            HostBehavior::LinesThenHang(lines) => Ok(Box::new(MockOutput {
                lines: lines.clone().into_iter(),
                end: StreamEnd::Hang,
            })),
            HostBehavior::RefuseConnect => unreachable!(),
        }
    }

    async fn close(&mut self) {}
}

enum StreamEnd {
    Clean,
    Error,
    Hang,
}

struct MockOutput {
    lines: std::vec::IntoIter<&'static str>,
    end: StreamEnd,
}

#[async_trait]
impl OutputStream for MockOutput {
    async fn next_line(&mut self) -> Result<Option<String>, ExecError> {
        // Give other workers a chance to interleave
        tokio::task::yield_now().await;
        match self.lines.next() {
            Some(line) => Ok(Some(format!("{line}\n"))),
            None => match self.end {
                StreamEnd::Clean => Ok(None),
                StreamEnd::Error => Err(ExecError::Read("connection reset".into())),
                // Remote command that never finishes
                StreamEnd::Hang => std::future::pending().await,
            },
        }
    }

    async fn close(&mut self) {}
}

fn config(hosts: &[&str], show_host_label: bool) -> Config {
    RawParams {
        hosts: Some(hosts.join(",")),
        key_path: Some("key".into()),
        user: Some("u".to_string()),
        command: Some("hostname".to_string()),
        show_host_label: Some(show_host_label),
        ..RawParams::default()
    }
    .validate(|_| Ok::<_, std::io::Error>(b"key".to_vec()))
    .unwrap()
}

/// Run every worker to completion and collect what they sent
async fn run_all(config: &Config, connector: Arc<dyn RemoteConnector>) -> Vec<String> {
    let (tx, mut rx) = output_channel();
    let handles = dispatch(config, &connector, &tx);
    drop(tx);

    for handle in handles {
        handle.await.unwrap();
    }

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn test_single_host_labelled() {
    let connector = Arc::new(MockConnector::new([(
        "10.0.0.1",
        HostBehavior::Lines(vec!["web-01"]),
    )]));

    let lines = run_all(&config(&["10.0.0.1"], true), connector).await;

    assert_eq!(lines, vec![format!("\x1b[31m10.0.0.1:\x1b[39m{}web-01\n", " ".repeat(8))]);
}

#[tokio::test]
async fn test_failed_start_leaks_nothing() {
    let connector = Arc::new(MockConnector::new([
        ("a", HostBehavior::RefuseStart),
        ("b", HostBehavior::Lines(vec!["b says hi"])),
    ]));

    let lines = run_all(&config(&["a", "b"], false), connector).await;

    assert_eq!(lines, vec!["b says hi\n"]);
}

#[tokio::test]
async fn test_one_unreachable_host_does_not_block_others() {
    let connector = Arc::new(MockConnector::new([
        ("up-1", HostBehavior::Lines(vec!["1a", "1b"])),
        ("up-2", HostBehavior::Lines(vec!["2a", "2b"])),
        ("up-3", HostBehavior::Lines(vec!["3a", "3b"])),
    ]));

    let lines = run_all(&config(&["down", "up-1", "up-2", "up-3"], false), connector).await;

    assert_eq!(lines.len(), 6);
    for expected in ["1a\n", "1b\n", "2a\n", "2b\n", "3a\n", "3b\n"] {
        assert!(lines.iter().any(|l| l == expected), "missing {expected:?}");
    }
}

#[tokio::test]
async fn test_per_host_order_preserved() {
    let first: Vec<&'static str> = vec!["a-0", "a-1", "a-2", "a-3", "a-4", "a-5"];
    let second: Vec<&'static str> = vec!["b-0", "b-1", "b-2", "b-3", "b-4", "b-5"];
    let connector = Arc::new(MockConnector::new([
        ("a", HostBehavior::Lines(first.clone())),
        ("b", HostBehavior::Lines(second.clone())),
    ]));

    let lines = run_all(&config(&["a", "b"], true), connector).await;
    assert_eq!(lines.len(), 12);

    for (index, host, expected) in [(0, "a", &first), (1, "b", &second)] {
        let label = format_label(host, index, true);
        let got: Vec<String> = lines
            .iter()
            .filter_map(|l| l.strip_prefix(&label))
            .map(|l| l.trim_end().to_string())
            .collect();
        assert_eq!(&got, expected);
    }
}

#[tokio::test]
async fn test_read_error_keeps_sent_output() {
    let connector = Arc::new(MockConnector::new([(
        "flaky",
        HostBehavior::LinesThenError(vec!["before reset"]),
    )]));

    let lines = run_all(&config(&["flaky"], false), connector).await;

    assert_eq!(lines, vec!["before reset\n"]);
}

#[tokio::test]
async fn test_duplicate_hosts_are_independent() {
    let connector = Arc::new(MockConnector::new([("h", HostBehavior::Lines(vec!["x"]))]));

    let lines = run_all(&config(&["h", "h"], true), connector).await;

    assert_eq!(lines.len(), 2);
    assert!(lines.contains(&format!("{}x\n", format_label("h", 0, true))));
    assert!(lines.contains(&format!("{}x\n", format_label("h", 1, true))));
}

#[tokio::test]
async fn test_local_connector_end_to_end() {
    let mut config = config(&["n1", "n2", "n3"], true);
    config.command = "printf 'first\\nsecond\\n'".to_string();

    let lines = run_all(&config, Arc::new(LocalConnector::new())).await;

    assert_eq!(lines.len(), 6);
    for (index, host) in ["n1", "n2", "n3"].into_iter().enumerate() {
        let label = format_label(host, index, true);
        let own: Vec<&String> = lines.iter().filter(|l| l.starts_with(&label)).collect();
        assert_eq!(*own[0], format!("{label}first\n"));
        assert_eq!(*own[1], format!("{label}second\n"));
    }
}

#[tokio::test]
async fn test_interrupt_after_first_line() {
    let connector: Arc<dyn RemoteConnector> = Arc::new(MockConnector::new([(
        "10.0.0.1",
        HostBehavior::Lines(vec!["web-01"]),
    )]));
    let config = config(&["10.0.0.1"], false);

    let (tx, rx) = output_channel();
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (int_tx, int_rx) = oneshot::channel::<()>();

    let coordinator = tokio::spawn(async move {
        Coordinator::new(rx, writer)
            .run(async {
                let _ = int_rx.await;
            })
            .await
    });

    let _handles = dispatch(&config, &connector, &tx);

    let mut first = vec![0u8; "web-01\n".len()];
    reader.read_exact(&mut first).await.unwrap();
    assert_eq!(first, b"web-01\n");

    int_tx.send(()).unwrap();
    let mux = tokio::time::timeout(Duration::from_secs(5), coordinator)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mux.lines_written(), 1);
    drop(mux);

    let mut rest = String::new();
    reader.read_to_string(&mut rest).await.unwrap();
    assert_eq!(rest, FAREWELL);
    assert_eq!(rest.matches("Bye!").count(), 1);

    // Channel is released, nothing more is accepted
    assert!(tx.send("late\n".to_string()).is_err());
}

#[tokio::test]
async fn test_interrupt_with_workers_still_running() {
    let connector: Arc<dyn RemoteConnector> = Arc::new(MockConnector::new([
        ("tail-1", HostBehavior::LinesThenHang(vec!["t1"])),
        ("tail-2", HostBehavior::LinesThenHang(vec!["t2"])),
    ]));
    let config = config(&["tail-1", "tail-2"], false);

    let (tx, rx) = output_channel();
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (int_tx, int_rx) = oneshot::channel::<()>();

    let coordinator = tokio::spawn(async move {
        Coordinator::new(rx, writer)
            .run(async {
                let _ = int_rx.await;
            })
            .await
    });

    let handles = dispatch(&config, &connector, &tx);

    // Both lines are out, both workers are parked on their streams
    let mut seen = vec![0u8; "t1\n".len() + "t2\n".len()];
    reader.read_exact(&mut seen).await.unwrap();
    let seen = String::from_utf8(seen).unwrap();
    assert!(seen.contains("t1\n") && seen.contains("t2\n"));
    assert!(handles.iter().all(|h| !h.is_finished()));

    int_tx.send(()).unwrap();
    let mux = tokio::time::timeout(Duration::from_secs(5), coordinator)
        .await
        .expect("coordinator did not stop on interrupt")
        .unwrap();
    assert_eq!(mux.lines_written(), 2);
    drop(mux);

    let mut rest = String::new();
    reader.read_to_string(&mut rest).await.unwrap();
    assert_eq!(rest, FAREWELL);
    assert_eq!(rest.matches("Bye!").count(), 1);

    assert!(handles.iter().all(|h| !h.is_finished()));
    assert!(tx.send("late\n".to_string()).is_err());

    for handle in handles {
        handle.abort();
    }
}
