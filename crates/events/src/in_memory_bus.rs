//! In-memory broker for tests/dev.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

use async_trait::async_trait;

use crate::bus::{BrokerChannel, BrokerError};

/// A message as it reached the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.payload)
    }
}

/// Receiving end of an [`InMemoryBroker`] subscription.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: mpsc::Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: mpsc::Receiver<M>) -> Self {
        Self { receiver }
    }

    pub fn try_recv(&self) -> Result<M, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// In-memory broker.
///
/// - Records every accepted message
/// - Best-effort fan-out to subscribers
/// - Can be switched "down" to exercise degraded paths
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    published: Mutex<Vec<PublishedMessage>>,
    subscribers: Mutex<Vec<mpsc::Sender<PublishedMessage>>>,
    unavailable: AtomicBool,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (`true`) or succeed again (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of everything accepted so far.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn published_to(&self, exchange: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.exchange == exchange)
            .collect()
    }

    pub fn subscribe(&self) -> Subscription<PublishedMessage> {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still yields a (silent) subscription.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

#[async_trait]
impl BrokerChannel for InMemoryBroker {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("in-memory broker is down".to_string()));
        }

        let message = PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload,
        };

        {
            let mut subs = self
                .subscribers
                .lock()
                .map_err(|_| BrokerError::Unavailable("subscriber lock poisoned".to_string()))?;
            // Drop any dead subscribers while publishing.
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        }

        self.published
            .lock()
            .map_err(|_| BrokerError::Unavailable("message log lock poisoned".to_string()))?
            .push(message);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_fans_out() {
        let broker = InMemoryBroker::new();
        let sub = broker.subscribe();

        broker.publish("ex", "rk", b"{\"a\":1}".to_vec()).await.unwrap();

        let got = sub.try_recv().unwrap();
        assert_eq!(got.exchange, "ex");
        assert_eq!(got.json().unwrap()["a"], 1);
        assert_eq!(broker.published_to("ex").len(), 1);
        assert!(broker.published_to("other").is_empty());
    }

    #[tokio::test]
    async fn unavailable_broker_rejects_and_records_nothing() {
        let broker = InMemoryBroker::new();
        broker.set_unavailable(true);

        let err = broker.publish("ex", "rk", vec![]).await.unwrap_err();
        assert!(matches!(err, BrokerError::Unavailable(_)));
        assert!(broker.published().is_empty());

        broker.set_unavailable(false);
        broker.publish("ex", "rk", vec![]).await.unwrap();
        assert_eq!(broker.published().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_publishers_are_all_recorded() {
        let broker = std::sync::Arc::new(InMemoryBroker::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let broker = broker.clone();
            tasks.push(tokio::spawn(async move {
                broker.publish("ex", "rk", vec![i]).await
            }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        assert_eq!(broker.published().len(), 32);
    }
}
