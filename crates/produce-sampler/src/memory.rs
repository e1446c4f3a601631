//! In-memory producer client.
//!
//! Records every message instead of sending it. Used for dry runs and tests;
//! failures can be injected at connect, send, and delivery time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::client::{ProducerClient, ProducerConnector};
use crate::config::{DeliveryMode, SamplerConfig};
use crate::error::{Result, SamplerError};

/// A message captured by [`MemoryProducerClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sent: Mutex<Vec<SentRecord>>,
    connect_failure: Mutex<Option<String>>,
    send_failure: Mutex<Option<String>>,
    delivery_failure: Mutex<Option<String>>,
    panic_on_send: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// Shared view of the in-memory cluster, for inspecting and steering it.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    state: Arc<MemoryState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking send is a supported failure; keep the data usable after it
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryHandle {
    /// Messages recorded so far, in send order.
    pub fn sent(&self) -> Vec<SentRecord> {
        lock(&self.state.sent).clone()
    }

    pub fn sent_count(&self) -> usize {
        lock(&self.state.sent).len()
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Make the next connects fail with `reason`.
    pub fn fail_connect(&self, reason: Option<&str>) {
        *lock(&self.state.connect_failure) = reason.map(str::to_string);
    }

    /// Make sends fail synchronously, as a full queue would.
    pub fn fail_sends(&self, reason: Option<&str>) {
        *lock(&self.state.send_failure) = reason.map(str::to_string);
    }

    /// Make deliveries fail after the message was queued. Only visible in
    /// [`DeliveryMode::Acknowledged`].
    pub fn fail_deliveries(&self, reason: Option<&str>) {
        *lock(&self.state.delivery_failure) = reason.map(str::to_string);
    }

    pub fn panic_on_send(&self, enabled: bool) {
        self.state.panic_on_send.store(enabled, Ordering::SeqCst);
    }
}

/// Opens [`MemoryProducerClient`]s that all report into one [`MemoryHandle`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    handle: MemoryHandle,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemoryHandle {
        self.handle.clone()
    }
}

#[async_trait::async_trait]
impl ProducerConnector for MemoryConnector {
    type Client = MemoryProducerClient;

    async fn connect(&self, config: &SamplerConfig) -> Result<MemoryProducerClient> {
        if let Some(reason) = lock(&self.handle.state.connect_failure).clone() {
            return Err(SamplerError::Connect {
                brokers: config.bootstrap_servers.clone(),
                reason,
            });
        }
        self.handle.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryProducerClient {
            state: Arc::clone(&self.handle.state),
        })
    }
}

pub struct MemoryProducerClient {
    state: Arc<MemoryState>,
}

#[async_trait::async_trait]
impl ProducerClient for MemoryProducerClient {
    async fn send(&self, topic: &str, payload: &[u8], mode: DeliveryMode) -> Result<()> {
        if self.state.panic_on_send.load(Ordering::SeqCst) {
            panic!("memory producer asked to panic on send to '{topic}'");
        }
        if let Some(reason) = lock(&self.state.send_failure).clone() {
            return Err(SamplerError::Client(reason));
        }

        lock(&self.state.sent).push(SentRecord {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });

        if mode == DeliveryMode::Acknowledged {
            if let Some(reason) = lock(&self.state.delivery_failure).clone() {
                return Err(SamplerError::Client(format!("delivery failed: {reason}")));
            }
        }
        Ok(())
    }

    async fn close(&self, _timeout: Duration) -> Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
