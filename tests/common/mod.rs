#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use blocklaunch::core::downloader::{Fetcher, ProgressEvent, ProgressSink, RetryPolicy};
use blocklaunch::core::http::{Transport, TransportError};

/// In-memory transport: fixed bodies per URL, injected failures, call log.
#[derive(Default)]
pub struct ScriptedTransport {
    bodies: Mutex<HashMap<String, Bytes>>,
    always_fail: Mutex<HashSet<String>>,
    fail_first: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, body: impl Into<Bytes>) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    pub fn fail_always(&self, url: &str) {
        self.always_fail.lock().unwrap().insert(url.to_string());
    }

    /// The next `times` requests for `url` time out.
    pub fn fail_times(&self, url: &str, times: u32) {
        self.fail_first
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<Bytes, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.always_fail.lock().unwrap().contains(url) {
            return Err(TransportError::Connect("connection refused".into()));
        }
        if let Some(remaining) = self.fail_first.lock().unwrap().get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::Timeout);
            }
        }
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(TransportError::Status(404))
    }
}

/// Same schedule shape as production, in milliseconds.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        retry_delay: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        rate_limit_delay: Duration::ZERO,
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
    count: AtomicUsize,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: &ProgressEvent) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn fetcher(transport: Arc<ScriptedTransport>) -> Fetcher {
    Fetcher::new(transport, fast_policy(), Arc::new(RecordingProgress::default()))
}

/// A zip archive holding `entries`.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
