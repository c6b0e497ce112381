use std::future::Future;
use std::sync::Arc;
use std::time::Instant as StdInstant;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;

use crate::decoration::DecorationKey;

pub const DEFAULT_TRANSLATION_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Network(String),
    #[error("translation timed out after {0}s")]
    Timeout(u64),
    #[error("translation backend returned HTTP {status}")]
    Http { status: u16 },
    #[error("failed to decode translation response: {0}")]
    Decode(String),
    #[error("translation backend returned an empty response")]
    EmptyResponse,
}

pub trait Translator: Send + Sync + 'static {
    fn translate(
        &self,
        text: String,
    ) -> impl Future<Output = Result<String, TranslationError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationState {
    Pending,
    Ready(String),
    Failed(String),
}

#[derive(Debug)]
pub struct TranslationOutcome {
    pub id: u64,
    pub key: DecorationKey,
    pub source_text: String,
    pub result: Result<String, TranslationError>,
    pub elapsed_ms: u64,
}

struct InFlight {
    id: u64,
    key: DecorationKey,
    handle: JoinHandle<()>,
}

/// Holds at most one in-flight translation. Starting a request for another
/// decoration aborts the previous one instead of queueing behind it.
pub struct TranslationSlot {
    timeout: Duration,
    next_id: u64,
    in_flight: Option<InFlight>,
}

impl TranslationSlot {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            next_id: 0,
            in_flight: None,
        }
    }

    pub fn in_flight_key(&self) -> Option<&DecorationKey> {
        self.in_flight.as_ref().map(|request| &request.key)
    }

    pub fn begin<T>(
        &mut self,
        translator: Arc<T>,
        key: DecorationKey,
        text: String,
        outcomes: mpsc::UnboundedSender<TranslationOutcome>,
    ) -> Option<u64>
    where
        T: Translator,
    {
        if self.in_flight_key() == Some(&key) {
            return None;
        }
        self.cancel();

        self.next_id += 1;
        let id = self.next_id;
        let timeout = self.timeout;
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let started = StdInstant::now();
            let result =
                match tokio::time::timeout(timeout, translator.translate(text.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(TranslationError::Timeout(timeout.as_secs())),
                };
            let outcome = TranslationOutcome {
                id,
                key: task_key,
                source_text: text,
                result,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            if outcomes.send(outcome).is_err() {
                debug!("translation outcome dropped; session is gone");
            }
        });

        self.in_flight = Some(InFlight { id, key, handle });
        Some(id)
    }

    pub fn complete(&mut self, outcome: &TranslationOutcome) -> bool {
        match &self.in_flight {
            Some(request) if request.id == outcome.id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            debug!(key = previous.key.as_str(), "superseding in-flight translation");
            previous.handle.abort();
        }
    }
}

impl Drop for TranslationSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::DelayedTranslator;
    use super::*;

    fn key(raw: &str) -> DecorationKey {
        DecorationKey::parse(raw).expect("valid key")
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_the_previous_one() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let translator = Arc::new(DelayedTranslator {
            delay: Duration::from_millis(200),
            fail: false,
        });
        let mut slot = TranslationSlot::new(Duration::from_secs(30));

        let first = slot.begin(Arc::clone(&translator), key("0-2"), "你好".into(), tx.clone());
        let second = slot.begin(Arc::clone(&translator), key("3-2"), "世界".into(), tx);
        assert!(first.is_some());
        assert!(second.is_some());

        let outcome = rx.recv().await.expect("outcome");
        assert_eq!(outcome.key, key("3-2"));
        assert_eq!(outcome.result, Ok("<世界>".to_string()));
        assert!(slot.complete(&outcome));
        assert!(slot.in_flight_key().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_request_for_same_key_is_not_restarted() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let translator = Arc::new(DelayedTranslator {
            delay: Duration::from_millis(200),
            fail: false,
        });
        let mut slot = TranslationSlot::new(Duration::from_secs(30));
        let first = slot.begin(Arc::clone(&translator), key("0-2"), "你好".into(), tx.clone());
        let repeated = slot.begin(translator, key("0-2"), "你好".into(), tx);
        assert!(first.is_some());
        assert!(repeated.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let translator = Arc::new(DelayedTranslator {
            delay: Duration::from_secs(60),
            fail: false,
        });
        let mut slot = TranslationSlot::new(Duration::from_secs(30));
        slot.begin(translator, key("0-2"), "你好".into(), tx);

        let outcome = rx.recv().await.expect("outcome");
        assert_eq!(outcome.result, Err(TranslationError::Timeout(30)));
    }

    #[test]
    fn stale_outcome_is_rejected() {
        let mut slot = TranslationSlot::new(Duration::from_secs(30));
        let outcome = TranslationOutcome {
            id: 7,
            key: key("0-2"),
            source_text: "你好".into(),
            result: Ok("hello".into()),
            elapsed_ms: 5,
        };
        assert!(!slot.complete(&outcome));
    }
}
