//! Ordered model fallback.
//!
//! Candidates are tried one at a time, preferred first. A transient failure
//! (service unavailable) is retried on the same candidate after a fixed pause;
//! any other failure abandons the candidate for the next one. The first
//! successful text wins and nothing is ever combined across candidates.
//!
//! ```text
//! TryCandidate(i) ─ok──────────────▶ Success
//!      │ transient, attempts left ─▶ RetryWait ─▶ TryCandidate(i)
//!      │ otherwise ───────────────▶ NextCandidate ─▶ TryCandidate(i+1) | AllFailed
//! ```

use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::{GenerationError, GenerationProvider, GenerationRequest, ModelCandidate};

/// Bounded in-place retry for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per candidate, first try included
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Text produced by the winning candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: ModelCandidate,
    /// Total attempts across all candidates, the successful one included
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no model candidates configured")]
    NoCandidates,
    #[error("all {} model candidates failed", .failures.len())]
    AllCandidatesFailed {
        /// Last failure of each candidate, in order
        failures: Vec<(ModelCandidate, GenerationError)>,
    },
}

#[derive(Debug)]
enum State {
    TryCandidate { index: usize, attempt: u32 },
    RetryWait { index: usize, attempt: u32 },
    NextCandidate { index: usize },
    Success(Generation),
    AllFailed,
}

pub struct GenerationOrchestrator<P> {
    provider: P,
    candidates: Vec<ModelCandidate>,
    retry: RetryPolicy,
}

impl<P: GenerationProvider> GenerationOrchestrator<P> {
    pub fn new(provider: P, candidates: Vec<ModelCandidate>) -> Self {
        Self {
            provider,
            candidates,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            backoff: retry.backoff,
        };
        self
    }

    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, OrchestratorError> {
        if self.candidates.is_empty() {
            return Err(OrchestratorError::NoCandidates);
        }

        let mut failures: Vec<(ModelCandidate, GenerationError)> = Vec::new();
        let mut total_attempts = 0;
        let mut state = State::TryCandidate { index: 0, attempt: 1 };

        loop {
            state = match state {
                State::TryCandidate { index, attempt } => {
                    let model = &self.candidates[index];
                    total_attempts += 1;
                    info!(%model, "Generating (attempt {}/{})", attempt, self.retry.max_attempts);

                    match self.provider.generate(model, request).await {
                        Ok(text) => State::Success(Generation {
                            text,
                            model: model.clone(),
                            attempts: total_attempts,
                        }),
                        Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                            warn!(%model, "Model temporarily unavailable, retrying in {:?}", self.retry.backoff);
                            State::RetryWait { index, attempt }
                        }
                        Err(e) => {
                            warn!(%model, "Model failed: {}. Trying next model", e);
                            failures.push((model.clone(), e));
                            State::NextCandidate { index }
                        }
                    }
                }
                State::RetryWait { index, attempt } => {
                    tokio::time::sleep(self.retry.backoff).await;
                    State::TryCandidate {
                        index,
                        attempt: attempt + 1,
                    }
                }
                State::NextCandidate { index } => {
                    if index + 1 < self.candidates.len() {
                        State::TryCandidate {
                            index: index + 1,
                            attempt: 1,
                        }
                    } else {
                        State::AllFailed
                    }
                }
                State::Success(generation) => {
                    info!(model = %generation.model, "Generation succeeded after {} attempts", generation.attempts);
                    return Ok(generation);
                }
                State::AllFailed => {
                    return Err(OrchestratorError::AllCandidatesFailed { failures });
                }
            };
        }
    }
}
