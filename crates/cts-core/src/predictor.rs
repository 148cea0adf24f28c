//! Online sequence predictor: a context tree plus the live context.
//!
//! The predictor is the only public way to train a tree. Each `update`
//! scores the symbol against the current context, trains the tree, and
//! appends the symbol to the context. `observe` moves the context without
//! training, and `sample` never mutates anything, so a caller can explore
//! continuations and then restore the context to resume training exactly
//! where it left off.
//!
//! Loss accounting mirrors the usual sequential-prediction bookkeeping: the
//! cumulative log-loss of the model, the log-loss an order-0 estimator with
//! the same prior would have paid on the same symbols, and their difference.

use cts_math::{nats_to_bits, EstimatorParams, LocalEstimator, PriorPolicy, SwitchRate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alphabet::{Alphabet, Symbol};
use crate::context::{ContextSnapshot, SequenceContext};
use crate::error::Result;
use crate::tree::ContextTree;

/// Outcome of a single update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// 1-based update count after this update.
    pub step: u64,
    /// Alphabet index of the symbol.
    pub symbol_index: usize,
    /// Natural-log probability assigned before the update.
    pub log_prob: f64,
    /// Same loss in bits: `-log2 P(symbol)`.
    pub log_loss_bits: f64,
}

/// Outcome of a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub symbols: usize,
    /// Sum of `-ln P` over the batch.
    pub total_log_loss: f64,
    pub total_log_loss_bits: f64,
    /// Bits per symbol; 0 for an empty batch.
    pub avg_log_loss_bits: f64,
    pub final_step: u64,
}

/// Cumulative statistics since construction or the last reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorStats {
    pub steps: u64,
    /// Sum of `-ln P` over all updates.
    pub total_log_loss: f64,
    pub total_log_loss_bits: f64,
    pub avg_log_loss_bits: f64,
    /// Loss of an order-0 estimator with the same prior.
    pub baseline_log_loss_bits: f64,
    /// `total_log_loss_bits - baseline_log_loss_bits`; negative when context
    /// helps.
    pub regret_bits: f64,
    pub node_count: usize,
    pub max_depth_reached: usize,
}

/// Running loss totals, persisted with the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossTracker {
    total_log_loss: f64,
    baseline: LocalEstimator,
    baseline_log_loss: f64,
}

impl LossTracker {
    fn record(&mut self, log_prob: f64, index: usize, params: &EstimatorParams) {
        self.total_log_loss -= log_prob;
        self.baseline_log_loss -= self.baseline.predict(index, params).ln();
        self.baseline.observe(index);
    }

    /// Sum of `-ln P` over all updates.
    pub fn total_log_loss(&self) -> f64 {
        self.total_log_loss
    }

    /// Sum of `-ln P` the order-0 baseline paid.
    pub fn baseline_log_loss(&self) -> f64 {
        self.baseline_log_loss
    }

    /// Counts seen by the order-0 baseline.
    pub fn baseline(&self) -> &LocalEstimator {
        &self.baseline
    }
}

/// Online predictor over an alphabet of `S`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialPredictor<S: Symbol> {
    tree: ContextTree<S>,
    context: SequenceContext,
    loss: LossTracker,
}

impl<S: Symbol> SequentialPredictor<S> {
    /// Create an untrained predictor.
    ///
    /// Fails with `InvalidConfiguration` for a non-positive fixed
    /// pseudo-count or a switch rate outside `[0, 1)`. Alphabet problems are
    /// caught when the [`Alphabet`] is built.
    pub fn new(
        alphabet: Alphabet<S>,
        max_context_length: usize,
        prior: PriorPolicy,
        switch_rate: SwitchRate,
    ) -> Result<Self> {
        let tree = ContextTree::new(alphabet, max_context_length, prior, switch_rate)?;
        Ok(Self::from_tree(tree))
    }

    /// Perks prior with the decaying switch schedule.
    pub fn with_defaults(alphabet: Alphabet<S>, max_context_length: usize) -> Result<Self> {
        Self::new(
            alphabet,
            max_context_length,
            PriorPolicy::default(),
            SwitchRate::default(),
        )
    }

    fn from_tree(tree: ContextTree<S>) -> Self {
        let context = tree.new_context();
        Self {
            tree,
            context,
            loss: LossTracker::default(),
        }
    }

    pub(crate) fn from_parts(
        tree: ContextTree<S>,
        context: SequenceContext,
        loss: LossTracker,
    ) -> Self {
        Self {
            tree,
            context,
            loss,
        }
    }

    pub(crate) fn loss(&self) -> &LossTracker {
        &self.loss
    }

    pub fn tree(&self) -> &ContextTree<S> {
        &self.tree
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        self.tree.alphabet()
    }

    pub fn max_context_length(&self) -> usize {
        self.tree.max_depth()
    }

    fn baseline_params(&self) -> EstimatorParams {
        EstimatorParams::new(self.tree.prior(), self.tree.alphabet().len())
    }

    fn update_index(&mut self, index: usize) -> UpdateResult {
        let log_prob = self.tree.train_index(&self.context, index);
        let params = self.baseline_params();
        self.loss.record(log_prob, index, &params);
        self.context.push(index);
        UpdateResult {
            step: self.tree.steps(),
            symbol_index: index,
            log_prob,
            log_loss_bits: nats_to_bits(-log_prob),
        }
    }

    /// Score `symbol`, train on it, and append it to the context.
    ///
    /// Returns the natural-log probability assigned before training.
    pub fn update(&mut self, symbol: &S) -> Result<f64> {
        Ok(self.update_with_result(symbol)?.log_prob)
    }

    /// [`SequentialPredictor::update`] with step and bit-loss details.
    pub fn update_with_result(&mut self, symbol: &S) -> Result<UpdateResult> {
        let index = self.tree.alphabet().require_index(symbol)?;
        let result = self.update_index(index);
        tracing::trace!(
            step = result.step,
            symbol = result.symbol_index,
            bits = result.log_loss_bits,
            "update"
        );
        Ok(result)
    }

    /// Update on every symbol in order.
    ///
    /// All symbols are checked first; an unknown symbol anywhere in the batch
    /// fails the whole batch with nothing applied.
    pub fn update_batch(&mut self, symbols: &[S]) -> Result<BatchResult> {
        let indices = self.indices_of(symbols)?;
        let mut total_log_loss = 0.0;
        for index in indices {
            total_log_loss -= self.update_index(index).log_prob;
        }
        let total_log_loss_bits = nats_to_bits(total_log_loss);
        Ok(BatchResult {
            symbols: symbols.len(),
            total_log_loss,
            total_log_loss_bits,
            avg_log_loss_bits: if symbols.is_empty() {
                0.0
            } else {
                total_log_loss_bits / symbols.len() as f64
            },
            final_step: self.tree.steps(),
        })
    }

    /// Append `symbol` to the context without training.
    pub fn observe(&mut self, symbol: &S) -> Result<()> {
        let index = self.tree.alphabet().require_index(symbol)?;
        self.context.push(index);
        Ok(())
    }

    /// Draw one symbol for the current context. Mutates nothing.
    pub fn sample<R: Rng + ?Sized>(&self, rejection: bool, rng: &mut R) -> S {
        self.tree.sample(&self.context, rejection, rng)
    }

    /// Sample `len` symbols, each conditioned on the ones before it.
    ///
    /// Runs on a copy of the context; the live context and the tree are
    /// unchanged afterwards.
    pub fn generate<R: Rng + ?Sized>(&self, len: usize, rejection: bool, rng: &mut R) -> Vec<S> {
        let mut context = self.context.clone();
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let index = self.tree.sample_index(&context, rejection, rng);
            context.push(index);
            if let Some(symbol) = self.tree.alphabet().symbol_at(index) {
                out.push(symbol.clone());
            }
        }
        out
    }

    /// Current context, most recent symbol last.
    pub fn context(&self) -> ContextSnapshot<S> {
        let alphabet = self.tree.alphabet();
        self.context
            .iter()
            .filter_map(|i| alphabet.symbol_at(i).cloned())
            .collect::<Vec<_>>()
            .into()
    }

    /// Replace the context. Longer inputs keep only the most recent
    /// `max_context_length` symbols. Fails without change on an unknown symbol.
    pub fn set_context(&mut self, snapshot: &ContextSnapshot<S>) -> Result<()> {
        self.set_context_symbols(snapshot.symbols())
    }

    /// [`SequentialPredictor::set_context`] from a plain slice.
    pub fn set_context_symbols(&mut self, symbols: &[S]) -> Result<()> {
        let indices = self.indices_of(symbols)?;
        self.context.replace(indices);
        Ok(())
    }

    /// Natural-log probability of `symbol` in the current context, without
    /// training.
    pub fn log_prob(&self, symbol: &S) -> Result<f64> {
        self.tree.log_prob(&self.context, symbol)
    }

    /// Probability of every symbol in the current context, in alphabet order.
    pub fn predictive_distribution(&self) -> Vec<(S, f64)> {
        self.tree
            .alphabet()
            .symbols()
            .iter()
            .cloned()
            .zip(self.tree.predictive_distribution(&self.context))
            .collect()
    }

    /// Total `-ln P` of `symbols` continuing from the current context, with
    /// no training. Neither the tree nor the live context change.
    pub fn evaluate(&self, symbols: &[S]) -> Result<f64> {
        let indices = self.indices_of(symbols)?;
        let mut context = self.context.clone();
        let mut loss = 0.0;
        for index in indices {
            loss -= self.tree.log_prob_index(&context, index);
            context.push(index);
        }
        Ok(loss)
    }

    pub fn stats(&self) -> PredictorStats {
        let steps = self.tree.steps();
        let total_log_loss_bits = nats_to_bits(self.loss.total_log_loss);
        let baseline_log_loss_bits = nats_to_bits(self.loss.baseline_log_loss);
        PredictorStats {
            steps,
            total_log_loss: self.loss.total_log_loss,
            total_log_loss_bits,
            avg_log_loss_bits: if steps == 0 {
                0.0
            } else {
                total_log_loss_bits / steps as f64
            },
            baseline_log_loss_bits,
            regret_bits: total_log_loss_bits - baseline_log_loss_bits,
            node_count: self.tree.node_count(),
            max_depth_reached: self.tree.nodes().max_depth(),
        }
    }

    /// Forget everything learned and clear the context.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.context.clear();
        self.loss = LossTracker::default();
    }

    fn indices_of(&self, symbols: &[S]) -> Result<Vec<usize>> {
        let alphabet = self.tree.alphabet();
        symbols.iter().map(|s| alphabet.require_index(s)).collect()
    }
}
