//! Shared mock work-items for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parallel_validation::{WorkArgs, WorkItem, WorkItemError};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Work-item that sleeps, counts its invocations, and optionally fails.
#[derive(Clone)]
pub struct MockItem {
    name: String,
    delay: Duration,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    finish_log: Arc<Mutex<Vec<String>>>,
}

impl MockItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: Duration::from_millis(10),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            finish_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Shares a finish-order log with other items.
    pub fn with_finish_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.finish_log = log;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(&self) -> Arc<dyn WorkItem> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl WorkItem for MockItem {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _args: WorkArgs) -> Result<(), WorkItemError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finish_log.lock().unwrap().push(self.name.clone());
        match &self.failure {
            Some(message) => Err(WorkItemError::new(message.clone())),
            None => Ok(()),
        }
    }
}

/// Work-item that records the arguments it was called with.
#[derive(Clone, Default)]
pub struct ArgsRecorder {
    seen: Arc<Mutex<Vec<WorkArgs>>>,
}

impl ArgsRecorder {
    pub fn seen(&self) -> Vec<WorkArgs> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkItem for ArgsRecorder {
    fn name(&self) -> &str {
        "args_recorder"
    }

    async fn run(&self, args: WorkArgs) -> Result<(), WorkItemError> {
        self.seen.lock().unwrap().push(args);
        Ok(())
    }
}

/// Collects formatted `tracing` output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Installs a thread-local fmt subscriber writing into a fresh capture.
    ///
    /// Events from spawned tasks are only seen on a current-thread runtime.
    pub fn install(level: tracing::Level) -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
