//! Shared mock collaborators for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use petrel_transport::auth::Authenticator;
use petrel_transport::client::TransportClient;
use petrel_transport::error::{Error, Result};
use petrel_transport::pipeline::PipelineContext;
use petrel_transport::session::{
    ByteSink, CloseCallback, SecureSession, StreamingMode, SubsystemChannel,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::sync::oneshot;

/// Helper to initialize tracing for tests.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .init();
    });
}

pub fn test_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 830))
}

pub fn io_cause() -> Error {
    Error::Io(std::io::ErrorKind::ConnectionRefused.into())
}

pub struct MockChannel {
    open_result: Mutex<Option<Result<()>>>,
    streaming: Mutex<Option<StreamingMode>>,
    close_cb: Mutex<Option<CloseCallback>>,
    sink: Mutex<Option<ByteSink>>,
    closed: AtomicBool,
}

impl MockChannel {
    pub fn new() -> (Arc<Self>, DuplexStream) {
        let (near, far) = tokio::io::duplex(4096);
        let channel = Arc::new(Self {
            open_result: Mutex::new(Some(Ok(()))),
            streaming: Mutex::new(None),
            close_cb: Mutex::new(None),
            sink: Mutex::new(Some(Box::new(near))),
            closed: AtomicBool::new(false),
        });
        (channel, far)
    }

    pub fn failing_open(cause: Error) -> Arc<Self> {
        let (channel, _far) = Self::new();
        *channel.open_result.lock().unwrap() = Some(Err(cause));
        channel
    }

    pub fn trigger_remote_close(&self) {
        if let Some(cb) = self.close_cb.lock().unwrap().take() {
            cb();
        }
    }

    pub fn streaming_mode(&self) -> Option<StreamingMode> {
        *self.streaming.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubsystemChannel for MockChannel {
    fn set_streaming_mode(&self, mode: StreamingMode) {
        *self.streaming.lock().unwrap() = Some(mode);
    }

    async fn open(&self) -> Result<()> {
        self.open_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(Error::ChannelClosed))
    }

    fn input_sink(&self) -> Result<ByteSink> {
        self.sink.lock().unwrap().take().ok_or(Error::NotConnected)
    }

    fn on_close(&self, callback: CloseCallback) {
        *self.close_cb.lock().unwrap() = Some(callback);
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockSession {
    channel: Mutex<Option<Arc<MockChannel>>>,
    graceful_closes: AtomicUsize,
    forced_closes: AtomicUsize,
    closed: AtomicBool,
}

impl MockSession {
    pub fn with_channel(channel: Arc<MockChannel>) -> Arc<Self> {
        Arc::new(Self {
            channel: Mutex::new(Some(channel)),
            graceful_closes: AtomicUsize::new(0),
            forced_closes: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub fn graceful_closes(&self) -> usize {
        self.graceful_closes.load(Ordering::SeqCst)
    }

    pub fn forced_closes(&self) -> usize {
        self.forced_closes.load(Ordering::SeqCst)
    }

    pub fn total_closes(&self) -> usize {
        self.graceful_closes() + self.forced_closes()
    }
}

#[async_trait]
impl SecureSession for MockSession {
    fn create_subsystem_channel(&self, _name: &str) -> Result<Arc<dyn SubsystemChannel>> {
        let channel = self
            .channel
            .lock()
            .unwrap()
            .take()
            .ok_or(Error::ChannelClosed)?;
        Ok(channel)
    }

    fn is_closing(&self) -> bool {
        false
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self, immediately: bool) -> Result<bool> {
        if immediately {
            self.forced_closes.fetch_add(1, Ordering::SeqCst);
        } else {
            self.graceful_closes.fetch_add(1, Ordering::SeqCst);
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(true)
    }
}

pub struct MockClient {
    result: Mutex<Option<Result<Arc<dyn SecureSession>>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn with_session(session: Arc<MockSession>) -> Self {
        Self {
            result: Mutex::new(Some(Ok(session))),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(cause: Error) -> Self {
        Self {
            result: Mutex::new(Some(Err(cause))),
            gate: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(session: Arc<MockSession>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let client = Self {
            result: Mutex::new(Some(Ok(session))),
            gate: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        };
        (client, tx)
    }

    pub fn connect_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportClient for MockClient {
    async fn connect(
        &self,
        _principal: &str,
        _remote_addr: SocketAddr,
    ) -> Result<Arc<dyn SecureSession>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(Error::ChannelClosed))
    }
}

pub struct MockAuthenticator {
    error: Mutex<Option<Error>>,
    attempts: AtomicUsize,
}

impl MockAuthenticator {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            error: Mutex::new(None),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn rejecting(cause: Error) -> Arc<Self> {
        Arc::new(Self {
            error: Mutex::new(Some(cause)),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    fn principal(&self) -> &str {
        "admin"
    }

    async fn authenticate(&self, _session: Arc<dyn SecureSession>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.error.lock().unwrap().take() {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }
}

/// A pipeline context that counts notifications and transport releases.
pub struct CountingPipeline {
    connect_timeout: Duration,
    active: AtomicUsize,
    inactive: AtomicUsize,
    released: AtomicUsize,
    fail_release: AtomicBool,
}

impl CountingPipeline {
    pub fn new(connect_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            connect_timeout,
            active: AtomicUsize::new(0),
            inactive: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            fail_release: AtomicBool::new(false),
        })
    }

    pub fn fail_release(&self) {
        self.fail_release.store(true, Ordering::SeqCst);
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn inactive_count(&self) -> usize {
        self.inactive.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl PipelineContext for CountingPipeline {
    fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    fn fire_active(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn fire_inactive(&self) {
        self.inactive.fetch_add(1, Ordering::SeqCst);
    }

    fn release_transport(&self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            Err(Error::ChannelClosed)
        } else {
            Ok(())
        }
    }
}
