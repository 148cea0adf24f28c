//! A predictor shared between threads.
//!
//! Every call takes the lock once and holds it for the whole operation, so
//! updates, observations and samples from different threads are serialised
//! and never interleave inside a single step.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;

use crate::alphabet::Symbol;
use crate::context::ContextSnapshot;
use crate::error::Result;
use crate::predictor::{PredictorStats, SequentialPredictor, UpdateResult};

/// Cloneable handle to one [`SequentialPredictor`].
#[derive(Debug)]
pub struct SharedPredictor<S: Symbol> {
    inner: Arc<Mutex<SequentialPredictor<S>>>,
}

impl<S: Symbol> Clone for SharedPredictor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Symbol> SharedPredictor<S> {
    pub fn new(predictor: SequentialPredictor<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(predictor)),
        }
    }

    // Predictor operations validate before mutating, so a panic in another
    // holder cannot leave a half-applied update behind.
    fn lock(&self) -> MutexGuard<'_, SequentialPredictor<S>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn update(&self, symbol: &S) -> Result<f64> {
        self.lock().update(symbol)
    }

    pub fn update_with_result(&self, symbol: &S) -> Result<UpdateResult> {
        self.lock().update_with_result(symbol)
    }

    pub fn observe(&self, symbol: &S) -> Result<()> {
        self.lock().observe(symbol)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rejection: bool, rng: &mut R) -> S {
        self.lock().sample(rejection, rng)
    }

    /// Sample a continuation under a single lock.
    pub fn generate<R: Rng + ?Sized>(&self, len: usize, rejection: bool, rng: &mut R) -> Vec<S> {
        self.lock().generate(len, rejection, rng)
    }

    pub fn context(&self) -> ContextSnapshot<S> {
        self.lock().context()
    }

    pub fn set_context(&self, snapshot: &ContextSnapshot<S>) -> Result<()> {
        self.lock().set_context(snapshot)
    }

    pub fn log_prob(&self, symbol: &S) -> Result<f64> {
        self.lock().log_prob(symbol)
    }

    pub fn stats(&self) -> PredictorStats {
        self.lock().stats()
    }

    /// Run `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut SequentialPredictor<S>) -> T) -> T {
        f(&mut self.lock())
    }

    /// Unwrap the predictor if this is the last handle.
    pub fn try_into_inner(self) -> std::result::Result<SequentialPredictor<S>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}
