//! Using a writer as the sink of a tracing subscriber

use chrono::NaiveDate;
use logrotor::{LogSink, ManualClock, RotatingWriter, RotationConfig};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    ))
}

#[test]
fn test_fmt_layer_writes_through_rotating_writer() {
    let dir = TempDir::new().unwrap();
    let config = RotationConfig::fine(dir.path().join("app.log"), 0, 1 << 20, 0);
    let writer = Arc::new(RotatingWriter::open_with_clock(config, clock()).unwrap());

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        info!("first event");
        info!(user = "ferris", "second event");
    });

    let path = writer.current_path().unwrap();
    writer.close().unwrap();

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("first event"));
    assert!(content.contains("second event"));
    assert!(content.contains("user=\"ferris\""));
}

#[test]
fn test_size_rotation_under_subscriber_does_not_deadlock() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let config = RotationConfig::fine(dir.path().join("app.log"), 0, 64, 2);
    let writer = Arc::new(RotatingWriter::open_with_clock(config, clock.clone()).unwrap());

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        for i in 0..5 {
            clock.advance(chrono::Duration::seconds(1));
            info!("event number {} with enough padding to cross the limit", i);
        }
    });

    assert!(writer.rotation_count() >= 5);
    writer.wait_purges();
    writer.close().unwrap();
    assert!(fs::read_dir(dir.path()).unwrap().count() <= 3);
}

#[test]
fn test_front_end_holds_sink_explicitly() {
    struct Prefixed<S: LogSink> {
        sink: S,
        prefix: &'static str,
    }

    impl<S: LogSink> Prefixed<S> {
        fn line(&self, msg: &str) -> logrotor::Result<usize> {
            self.sink
                .append(format!("{} {}\n", self.prefix, msg).as_bytes())
        }
    }

    let dir = TempDir::new().unwrap();
    let base = dir.path().join("app.log");
    let log = logrotor::open_fine(&base, 0, 0, 0).unwrap();
    let front = Prefixed {
        sink: log,
        prefix: "[INFO]",
    };

    front.line("ready").unwrap();
    writeln!(&front.sink, "[INFO] raw").unwrap();
    front.sink.close().unwrap();
    assert!(front.line("gone").is_err());

    assert_eq!(
        fs::read_to_string(&base).unwrap(),
        "[INFO] ready\n[INFO] raw\n"
    );
}
