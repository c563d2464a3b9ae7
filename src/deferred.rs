//! Values that are either known now or become known exactly once, later.
//!
//! [`Deferred<T>`] is the single abstraction behind every way a layer can supply its effect:
//! a ready value, a pending computation started ahead of time, or the output of a resolver
//! invoked at composition time. Pending computations are wrapped in a [`Shared`] future so that
//! every clone of a deferred value drives the same underlying work, which therefore runs at
//! most once; its outcome (success or failure) is cached for all later observers.

use std::{fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::foundation::error::{LayerError, LayerResult};

type SharedOutput<T> = Result<T, Arc<LayerError>>;

/// A value that is either already computed or will be computed once by a shared future.
pub struct Deferred<T> {
    state: State<T>,
}

enum State<T> {
    Ready(T),
    Pending(Shared<BoxFuture<'static, SharedOutput<T>>>),
    Failed(Arc<LayerError>),
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        let state = match &self.state {
            State::Ready(v) => State::Ready(v.clone()),
            State::Pending(shared) => State::Pending(shared.clone()),
            State::Failed(err) => State::Failed(Arc::clone(err)),
        };
        Self { state }
    }
}

impl<T: Clone> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Ready(_) => "ready",
            State::Pending(shared) if shared.peek().is_some() => "completed",
            State::Pending(_) => "pending",
            State::Failed(_) => "failed",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap an already-computed value.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(value),
        }
    }

    /// Wrap a computation that has not completed yet.
    ///
    /// The future is not polled until the first [`Deferred::resolve`] (or a continuation
    /// attached through [`Deferred::map`]) is awaited.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = LayerResult<T>> + Send + 'static,
    {
        let fut: BoxFuture<'static, SharedOutput<T>> = fut.map(|r| r.map_err(share)).boxed();
        Self {
            state: State::Pending(fut.shared()),
        }
    }

    /// A deferred value whose computation is known to have failed.
    pub fn failed(err: LayerError) -> Self {
        Self {
            state: State::Failed(share(err)),
        }
    }

    /// `true` once the outcome is known and [`Deferred::resolve`] will not suspend.
    pub fn is_resolved(&self) -> bool {
        match &self.state {
            State::Ready(_) | State::Failed(_) => true,
            State::Pending(shared) => shared.peek().is_some(),
        }
    }

    /// The outcome if it is already known, without driving any computation.
    pub fn try_get(&self) -> Option<LayerResult<T>> {
        match &self.state {
            State::Ready(v) => Some(Ok(v.clone())),
            State::Failed(err) => Some(Err(LayerError::Upstream(Arc::clone(err)))),
            State::Pending(shared) => shared
                .peek()
                .map(|out| out.clone().map_err(LayerError::Upstream)),
        }
    }

    /// Obtain the eventual value.
    ///
    /// Returns immediately for ready values. For pending ones this is the only suspension
    /// point; the underlying computation runs once no matter how many times or through how
    /// many clones this is called, and a failure is reported to every caller.
    pub async fn resolve(&self) -> LayerResult<T> {
        match &self.state {
            State::Ready(v) => Ok(v.clone()),
            State::Failed(err) => Err(LayerError::Upstream(Arc::clone(err))),
            State::Pending(shared) => shared.clone().await.map_err(LayerError::Upstream),
        }
    }

    /// Transform the eventual value. See [`Deferred::and_then`].
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(move |v| Ok(f(v)))
    }

    /// Attach a fallible continuation.
    ///
    /// If the outcome is already known the continuation runs right away. Otherwise it runs
    /// inside the poll that observes completion of the upstream computation, so its result
    /// is visible to whoever awaits the returned value in that same step. An upstream
    /// failure skips `f` and propagates.
    pub fn and_then<U, F>(self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> LayerResult<U> + Send + 'static,
    {
        match self.state {
            State::Ready(v) => Deferred::from_result(f(v)),
            State::Failed(err) => Deferred {
                state: State::Failed(err),
            },
            State::Pending(shared) => {
                if let Some(done) = shared.peek() {
                    return match done.clone() {
                        Ok(v) => Deferred::from_result(f(v)),
                        Err(err) => Deferred {
                            state: State::Failed(err),
                        },
                    };
                }
                let fut: BoxFuture<'static, SharedOutput<U>> = shared
                    .map(move |out| out.and_then(|v| f(v).map_err(share)))
                    .boxed();
                Deferred {
                    state: State::Pending(fut.shared()),
                }
            }
        }
    }

    fn from_result(r: LayerResult<T>) -> Self {
        match r {
            Ok(v) => Self::ready(v),
            Err(err) => Self::failed(err),
        }
    }
}

fn share(err: LayerError) -> Arc<LayerError> {
    match err {
        LayerError::Upstream(inner) => inner,
        other => Arc::new(other),
    }
}

#[cfg(test)]
#[path = "../tests/unit/deferred.rs"]
mod tests;
