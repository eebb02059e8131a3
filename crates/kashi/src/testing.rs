//! Fakes for the external collaborators, used by the tests.

use crate::{
    error::{ConversionError, OracleError},
    oracle::{Credentials, Oracle, Refinement, Verification, VerifyRequest},
    reading::{DictionaryConverter, ReadingService, ReadingTarget},
    ParsedLine,
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Installs a subscriber that prints through the test harness, `RUST_LOG` picks the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fails every conversion.
pub struct BrokenService;

#[async_trait]
impl ReadingService for BrokenService {
    async fn convert(&self, text: &str, _target: ReadingTarget) -> Result<String, ConversionError> {
        Err(ConversionError::Service(format!("offline: {text}")))
    }
}

pub fn lyrics_dictionary() -> DictionaryConverter {
    DictionaryConverter::new([
        ("忘", "わす"),
        ("物", "もの"),
        ("火", "ひ"),
        ("水", "みず"),
        ("空", "そら"),
        ("夜", "よる"),
        ("君", "きみ"),
    ])
}

/// A scripted answer to a verification request.
pub struct FakeVerification {
    /// If set, the answer is held back until the gate is notified.
    pub gate: Option<Arc<Notify>>,
    pub response: Result<Option<Verification>, OracleError>,
}

impl FakeVerification {
    pub fn answer(reading: &str, definition: &str) -> Self {
        Self {
            gate: None,
            response: Ok(Some(Verification {
                reading: reading.to_string(),
                definition: Some(definition.to_string()),
                notes: None,
            })),
        }
    }

    pub fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }
}

#[derive(Default)]
pub struct FakeOracle {
    refinement: Mutex<Option<Result<Refinement, OracleError>>>,
    verifications: Mutex<VecDeque<FakeVerification>>,
    refine_calls: AtomicUsize,
    cancelled: AtomicUsize,
    /// Notified whenever a verification request starts.
    pub verify_started: Notify,
}

impl FakeOracle {
    pub fn with_refinement(refinement: Result<Refinement, OracleError>) -> Self {
        Self {
            refinement: Mutex::new(Some(refinement)),
            ..Default::default()
        }
    }

    pub fn with_verifications(verifications: impl IntoIterator<Item = FakeVerification>) -> Self {
        Self {
            verifications: Mutex::new(verifications.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn refine_calls(&self) -> usize {
        self.refine_calls.load(Ordering::SeqCst)
    }

    /// How many requests noticed their cancellation.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn refine(
        &self,
        _credentials: &Credentials,
        _raw_text: &str,
        _lines: &[ParsedLine],
    ) -> Result<Refinement, OracleError> {
        self.refine_calls.fetch_add(1, Ordering::SeqCst);
        self.refinement
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(OracleError::Unavailable("nothing scripted".to_string())))
    }

    async fn verify(
        &self,
        _credentials: &Credentials,
        _request: &VerifyRequest,
        cancel: CancellationToken,
    ) -> Result<Option<Verification>, OracleError> {
        let scripted = self.verifications.lock().unwrap().pop_front();
        self.verify_started.notify_one();
        let Some(scripted) = scripted else {
            return Ok(None);
        };
        if let Some(gate) = scripted.gate {
            tokio::select! {
                _ = gate.notified() => {}
                _ = cancel.cancelled() => {
                    self.cancelled.fetch_add(1, Ordering::SeqCst);
                    return Err(OracleError::Cancelled);
                }
            }
        }
        scripted.response
    }
}
