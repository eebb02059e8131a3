//! Contains `VerificationSession`, which looks up single tokens with the AI oracle on demand.
//!
//! Starting a new lookup cancels the one in flight, and a lookup only writes its result if it is
//! still the current one when it finishes and the document hasn't been replaced in the meantime.

use crate::{
    document::SharedDocument,
    error::OracleError,
    oracle::{Credentials, Oracle, RequestId, Verification, VerifyRequest},
    Token, TokenId, TokenUpdate,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use wana_kana::ConvertJapanese;

pub const FALLBACK_DEFINITION: &str = "Definition unavailable (AI offline).";
pub const FALLBACK_NOTES: &str = "Local dictionary fallback";
const CACHED_NOTES: &str = "From text analysis";

/// How a lookup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The oracle answered and the token was updated.
    Applied(Verification),
    /// The oracle failed, the token got the placeholder definition.
    Fallback(Verification),
    /// The token already had a definition, the oracle wasn't asked.
    Cached(Verification),
    /// A newer lookup or a new document took over, nothing was written.
    Stale,
    /// Only kanji tokens are looked up.
    Ineligible,
    NotFound,
}

#[derive(Debug)]
struct InFlight {
    id: RequestId,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct SessionState {
    last_id: u64,
    current: Option<InFlight>,
}

#[derive(Clone)]
pub struct VerificationSession {
    oracle: Arc<dyn Oracle>,
    credentials: Credentials,
    state: Arc<Mutex<SessionState>>,
}

impl VerificationSession {
    pub fn new(oracle: Arc<dyn Oracle>, credentials: Credentials) -> Self {
        Self {
            oracle,
            credentials,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The request currently in flight, if any.
    pub fn current_request(&self) -> Option<RequestId> {
        self.state().current.as_ref().map(|c| c.id)
    }

    /// Cancels the request in flight. Returns whether there was one.
    ///
    /// The cancelled request still settles through the fallback path.
    pub fn cancel(&self) -> bool {
        match &self.state().current {
            Some(current) => {
                tracing::debug!("Cancelling {}", current.id);
                current.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Like `verify`, but uses the token's existing definition if it has one.
    pub async fn lookup(&self, document: &SharedDocument, token_id: TokenId) -> VerificationOutcome {
        let cached = {
            let document = document.read().await;
            document.token(token_id).and_then(|token| {
                token.definition().map(|definition| Verification {
                    reading: token.reading().to_string(),
                    definition: Some(definition.to_string()),
                    notes: Some(token.notes().unwrap_or(CACHED_NOTES).to_string()),
                })
            })
        };
        match cached {
            Some(verification) => VerificationOutcome::Cached(verification),
            None => self.verify(document, token_id).await,
        }
    }

    /// Asks the oracle about the token and writes the answer back to the document.
    pub async fn verify(&self, document: &SharedDocument, token_id: TokenId) -> VerificationOutcome {
        let (token, line_context, generation) = {
            let document = document.read().await;
            let Some(token) = document.token(token_id).cloned() else {
                return VerificationOutcome::NotFound;
            };
            let line_context = document.line_context(token.position().line);
            (token, line_context, document.generation())
        };
        if !token.is_kanji() {
            return VerificationOutcome::Ineligible;
        }

        let (request_id, cancel) = self.begin();
        let request = VerifyRequest {
            request_id,
            token_text: token.text().to_string(),
            line_context,
        };
        tracing::debug!("Verifying '{}' as {request_id}", request.token_text);
        let response = if self.credentials.is_usable() {
            tokio::select! {
                biased;
                response = self.oracle.verify(&self.credentials, &request, cancel.clone()) => response,
                _ = cancel.cancelled() => Err(OracleError::Cancelled),
            }
        } else {
            Err(OracleError::MissingCredentials)
        };

        // holding the write lock while settling keeps a newer request from writing in between
        let mut document = document.write().await;
        if !self.finish(request_id) {
            tracing::debug!("Discarding stale result of {request_id}");
            return VerificationOutcome::Stale;
        }
        if document.generation() != generation {
            tracing::debug!("Discarding result of {request_id}, the document was replaced");
            return VerificationOutcome::Stale;
        }

        match response {
            Ok(Some(verification)) if !verification.reading.is_empty() => {
                let update = TokenUpdate {
                    romaji: Some(verification.reading.to_romaji()),
                    reading: Some(verification.reading.clone()),
                    definition: verification.definition.clone(),
                    notes: verification.notes.clone(),
                };
                document.update_token(token_id, &update);
                VerificationOutcome::Applied(verification)
            }
            Ok(_) => {
                tracing::warn!("Oracle had no answer for {request_id}, using local fallback");
                let verification = fallback(&token);
                document.update_token(token_id, &fallback_update(&verification));
                VerificationOutcome::Fallback(verification)
            }
            Err(err) => {
                tracing::warn!("Verification {request_id} failed, using local fallback: {err}");
                let verification = fallback(&token);
                document.update_token(token_id, &fallback_update(&verification));
                VerificationOutcome::Fallback(verification)
            }
        }
    }

    // mints a request id and makes it current, cancelling the previous one
    fn begin(&self) -> (RequestId, CancellationToken) {
        let mut state = self.state();
        if let Some(previous) = state.current.take() {
            tracing::debug!("Superseding {}", previous.id);
            previous.cancel.cancel();
        }
        state.last_id += 1;
        let id = RequestId(state.last_id);
        let cancel = CancellationToken::new();
        state.current = Some(InFlight {
            id,
            cancel: cancel.clone(),
        });
        (id, cancel)
    }

    // clears the current request if it is the given one, returns whether it was
    fn finish(&self, id: RequestId) -> bool {
        let mut state = self.state();
        match &state.current {
            Some(current) if current.id == id => {
                state.current = None;
                true
            }
            _ => false,
        }
    }
}

fn fallback(token: &Token) -> Verification {
    Verification {
        reading: token.reading().to_string(),
        definition: Some(FALLBACK_DEFINITION.to_string()),
        notes: Some(FALLBACK_NOTES.to_string()),
    }
}

fn fallback_update(verification: &Verification) -> TokenUpdate {
    TokenUpdate {
        reading: None,
        romaji: None,
        definition: verification.definition.clone(),
        notes: verification.notes.clone(),
    }
}
