//! Circuit breaker for outbound calls to the bank.
//!
//! State machine:
//!
//! ```text
//! Closed --(failure_threshold failures)--> Open
//! Open --(recovery_time elapsed, next call)--> HalfOpen
//! HalfOpen --(half_open_max_requests successes)--> Closed
//! HalfOpen --(any failure)--> Open
//! ```
//!
//! The call that finds an expired `Open` circuit only performs the transition
//! and returns `Ok(None)` without invoking anything; the call after it is the
//! first probe. One mutex covers state inspection, the wrapped call and the
//! transition that follows, so calls through one breaker never overlap.

use super::ClientError;
use crate::config::BreakerConfig;
use std::fmt;
use std::future::Future;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

impl Inner {
    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_successes = 0;
    }

    fn reset(&mut self, state: CircuitState) {
        self.state = state;
        self.failures = 0;
        self.half_open_successes = 0;
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                half_open_successes: 0,
                opened_at: None,
            }),
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Runs `f` through the breaker.
    ///
    /// `Ok(None)` means the call only moved the circuit from `Open` to
    /// `HalfOpen` and `f` was not invoked. A call that exceeds
    /// `call_timeout` counts as a failure; its task is left to finish on its
    /// own and the late result is dropped.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<Option<T>, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        let mut inner = self.inner.lock().await;

        if inner.state == CircuitState::Open {
            let recovered = inner
                .opened_at
                .is_some_and(|opened| opened.elapsed() >= self.config.recovery_time());
            if !recovered {
                return Err(ClientError::CircuitOpen);
            }
            inner.reset(CircuitState::HalfOpen);
            info!("Circuit breaker moved from open to half-open");
            return Ok(None);
        }

        let outcome = self.invoke(f).await;

        match (&outcome, inner.state) {
            (Ok(_), CircuitState::HalfOpen) => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_max_requests {
                    inner.reset(CircuitState::Closed);
                    info!("Circuit breaker moved from half-open to closed");
                }
            }
            (Ok(_), _) => inner.failures = 0,
            (Err(err), CircuitState::HalfOpen) => {
                inner.trip();
                warn!(error = %err, "Circuit breaker probe failed, moved from half-open to open");
            }
            (Err(err), _) => {
                inner.failures += 1;
                debug!(failures = inner.failures, error = %err, "Call through circuit breaker failed");
                if inner.failures >= self.config.failure_threshold {
                    inner.trip();
                    warn!(
                        failures = inner.failures,
                        recovery_ms = self.config.recovery_time_ms,
                        "Circuit breaker moved from closed to open"
                    );
                }
            }
        }

        outcome.map(Some)
    }

    async fn invoke<T, F, Fut>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        let timeout = self.config.call_timeout();
        match tokio::time::timeout(timeout, tokio::spawn(f())).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ClientError::Aborted(join.to_string())),
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }
}
