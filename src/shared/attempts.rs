//! Sequential fallback over alternative request shapes.
//!
//! Some Yunxiao endpoints accept different payload shapes depending on the
//! tenant or review template. Callers list the candidates in preference
//! order and the first success wins.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::debug;

pub type AttemptFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// A labelled attempt.
pub struct Attempt<'a, T> {
    pub label: String,
    pub run: Box<dyn FnOnce() -> AttemptFuture<'a, T> + Send + 'a>,
}

impl<'a, T> Attempt<'a, T> {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> AttemptFuture<'a, T> + Send + 'a,
    {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }
}

#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("No attempts were provided")]
    NoAttempts,
}

/// Run attempts in order and return the first success with its label.
/// When every attempt fails, the last error is returned.
pub async fn try_in_sequence<'a, T>(attempts: Vec<Attempt<'a, T>>) -> anyhow::Result<(String, T)> {
    let mut last_error: Option<anyhow::Error> = None;

    for attempt in attempts {
        match (attempt.run)().await {
            Ok(value) => return Ok((attempt.label, value)),
            Err(e) => {
                debug!(label = %attempt.label, error = %e, "attempt failed");
                last_error = Some(e.context(format!("attempt '{}' failed", attempt.label)));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AttemptError::NoAttempts.into()))
}
