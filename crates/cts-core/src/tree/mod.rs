//! Context Tree Switching over a sparse suffix tree.
//!
//! Each node at depth `d` represents the `d` most recent symbols. It mixes its
//! own estimator with the prediction of its deeper child using a per-node
//! switching weight `w`:
//!
//! ```text
//! P_node(s) = w · P_own(s) + (1 - w) · P_child(s)
//! ```
//!
//! where `P_child` is the child's recursive mixture, or `P_own` when the
//! context cannot be extended (no child yet, or depth `D` reached). The
//! root's mixture is the model's prediction.
//!
//! After a symbol is seen the weights follow a switching posterior: the
//! Bayesian update of the two hypotheses, followed by a transfer of a fraction
//! `α` of each hypothesis' mass to the other. With `α = 0` this is an exact
//! per-node Bayesian mixture; a positive rate lets the model move back to a
//! deeper or shallower context after the data changes character.
//!
//! Nodes are created on demand, so memory grows with the number of distinct
//! suffixes actually seen, bounded by `D` new nodes per update.

mod node;
mod sample;

pub use node::{ContextTreeNode, NodeArena, NodeId, MAX_NODES};

use cts_math::{EstimatorParams, PriorPolicy, SwitchRate};
use rand::Rng;
use tracing::{debug, warn};

use crate::alphabet::{Alphabet, Symbol};
use crate::context::SequenceContext;
use crate::error::{Error, Result};

/// Root-to-deepest nodes present for one context.
#[derive(Debug, Clone)]
struct ActivePath {
    nodes: Vec<NodeId>,
    /// Depth the path would reach if every node existed: `min(D, |context|)`.
    target_depth: usize,
}

impl ActivePath {
    fn deepest(&self) -> NodeId {
        self.nodes.last().copied().unwrap_or(NodeId::ROOT)
    }
}

/// Sparse context tree with switching mixtures at every node.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTree<S: Symbol> {
    alphabet: Alphabet<S>,
    prior: PriorPolicy,
    switch_rate: SwitchRate,
    params: EstimatorParams,
    max_depth: usize,
    nodes: NodeArena,
    steps: u64,
}

impl<S: Symbol> ContextTree<S> {
    /// Create an untrained tree.
    pub fn new(
        alphabet: Alphabet<S>,
        max_context_length: usize,
        prior: PriorPolicy,
        switch_rate: SwitchRate,
    ) -> Result<Self> {
        Self::from_parts(
            alphabet,
            max_context_length,
            prior,
            switch_rate,
            NodeArena::new(),
            0,
        )
    }

    /// Rebuild a tree from stored parts, checking every structural invariant.
    pub(crate) fn from_parts(
        alphabet: Alphabet<S>,
        max_context_length: usize,
        prior: PriorPolicy,
        switch_rate: SwitchRate,
        nodes: NodeArena,
        steps: u64,
    ) -> Result<Self> {
        if !prior.is_valid() {
            return Err(Error::invalid_config(
                "symbol_prior",
                format!("pseudo-count must be positive and finite, got {}", prior),
            ));
        }
        if !switch_rate.is_valid() {
            return Err(Error::invalid_config(
                "switch_rate",
                format!("must be in [0, 1), got {}", switch_rate),
            ));
        }
        nodes
            .check(alphabet.len(), max_context_length)
            .map_err(Error::SnapshotMismatch)?;

        let params = EstimatorParams::new(prior, alphabet.len());
        Ok(Self {
            alphabet,
            prior,
            switch_rate,
            params,
            max_depth: max_context_length,
            nodes,
            steps,
        })
    }

    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    pub fn prior(&self) -> PriorPolicy {
        self.prior
    }

    pub fn switch_rate(&self) -> SwitchRate {
        self.switch_rate
    }

    /// Maximum context length D.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of completed `train_on` calls.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Empty context sized for this tree.
    pub fn new_context(&self) -> SequenceContext {
        SequenceContext::new(self.max_depth)
    }

    /// Drop all statistics, keeping the configuration.
    pub fn reset(&mut self) {
        self.nodes = NodeArena::new();
        self.steps = 0;
    }

    fn active_path(&self, context: &SequenceContext) -> ActivePath {
        let target_depth = self.max_depth.min(context.len());
        let mut nodes = Vec::with_capacity(target_depth + 1);
        nodes.push(NodeId::ROOT);

        let mut current = NodeId::ROOT;
        for depth in 1..=target_depth {
            let next = context
                .recent(depth)
                .and_then(|symbol| self.nodes.child(current, symbol));
            match next {
                Some(child) => {
                    nodes.push(child);
                    current = child;
                }
                None => break,
            }
        }

        ActivePath {
            nodes,
            target_depth,
        }
    }

    /// Own and mixed probabilities of `symbol` at every node on the path.
    fn path_probabilities(&self, path: &ActivePath, symbol: usize) -> (Vec<f64>, Vec<f64>) {
        let own: Vec<f64> = path
            .nodes
            .iter()
            .map(|&id| self.nodes.get(id).estimator.predict(symbol, &self.params))
            .collect();

        let mut mixed = own.clone();
        for j in (0..mixed.len().saturating_sub(1)).rev() {
            let node = self.nodes.get(path.nodes[j]);
            mixed[j] = node.weight.mix(own[j], mixed[j + 1]);
        }
        (own, mixed)
    }

    fn distribution_on_path(&self, path: &ActivePath) -> Vec<f64> {
        let mut ids = path.nodes.iter().rev();
        let mut mixed = match ids.next() {
            Some(&deepest) => self.nodes.get(deepest).estimator.distribution(&self.params),
            None => return vec![1.0 / self.alphabet.len() as f64; self.alphabet.len()],
        };
        for &id in ids {
            let node = self.nodes.get(id);
            let own = node.estimator.distribution(&self.params);
            for (m, o) in mixed.iter_mut().zip(own) {
                *m = node.weight.mix(o, *m);
            }
        }
        mixed
    }

    /// Probability of every symbol, in alphabet order, given `context`.
    ///
    /// Sums to 1 for any context and any training state; an untrained tree
    /// returns the prior alone.
    pub fn predictive_distribution(&self, context: &SequenceContext) -> Vec<f64> {
        self.distribution_on_path(&self.active_path(context))
    }

    /// Natural-log probability of `symbol` given `context`, without training.
    pub fn log_prob(&self, context: &SequenceContext, symbol: &S) -> Result<f64> {
        let index = self.alphabet.require_index(symbol)?;
        Ok(self.log_prob_index(context, index))
    }

    pub(crate) fn log_prob_index(&self, context: &SequenceContext, index: usize) -> f64 {
        let path = self.active_path(context);
        let (_, mixed) = self.path_probabilities(&path, index);
        mixed[0].ln()
    }

    /// Predict `symbol`, then learn from it.
    ///
    /// Returns the natural-log probability the tree assigned to `symbol`
    /// before the update. Fails without touching any statistics if `symbol`
    /// is not in the alphabet.
    pub fn train_on(&mut self, context: &SequenceContext, symbol: &S) -> Result<f64> {
        let index = self.alphabet.require_index(symbol)?;
        Ok(self.train_index(context, index))
    }

    pub(crate) fn train_index(&mut self, context: &SequenceContext, index: usize) -> f64 {
        let path = self.active_path(context);
        let (own, mixed) = self.path_probabilities(&path, index);

        self.steps += 1;
        let alpha = self.switch_rate.alpha(self.steps);

        for (j, &id) in path.nodes.iter().enumerate() {
            // The deepest node on the path predicted with child = own.
            let child = mixed.get(j + 1).copied().unwrap_or(own[j]);
            let node = self.nodes.get_mut(id);
            node.weight.update(own[j], child, alpha);
            node.estimator.observe(index);
        }

        self.grow(&path, context, index);
        mixed[0].ln()
    }

    /// Extend the path down to its target depth; new nodes see `index` once.
    fn grow(&mut self, path: &ActivePath, context: &SequenceContext, index: usize) {
        let mut parent = path.deepest();
        for depth in path.nodes.len()..=path.target_depth {
            let Some(key) = context.recent(depth) else {
                break;
            };
            let Some(child) = self.nodes.add_child(parent, key) else {
                warn!(
                    nodes = self.nodes.len(),
                    "context tree is full; not adding deeper contexts"
                );
                break;
            };
            self.nodes.get_mut(child).estimator.observe(index);
            parent = child;

            let count = self.nodes.len();
            if count.is_power_of_two() && count >= 1024 {
                debug!(nodes = count, depth, "context tree grew");
            }
        }
    }

    /// Draw one symbol from the predictive distribution for `context`.
    ///
    /// With `rejection`, symbols never counted at the deepest node reached by
    /// `context` are excluded. When that node has no counts at all the
    /// unrestricted distribution is used. Never mutates the tree.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        context: &SequenceContext,
        rejection: bool,
        rng: &mut R,
    ) -> S {
        let index = self.sample_index(context, rejection, rng);
        // `draw_index` only returns positions inside the distribution, which
        // has one entry per alphabet symbol.
        self.alphabet.symbols()[index].clone()
    }

    pub(crate) fn sample_index<R: Rng + ?Sized>(
        &self,
        context: &SequenceContext,
        rejection: bool,
        rng: &mut R,
    ) -> usize {
        let path = self.active_path(context);
        let mut dist = self.distribution_on_path(&path);

        if rejection {
            let deepest = self.nodes.get(path.deepest());
            if !sample::restrict_to_seen(&mut dist, &deepest.estimator) {
                debug!(
                    depth = deepest.depth(),
                    "no counts at sampling context; using full distribution"
                );
            }
        }

        let u: f64 = rng.random();
        sample::draw_index(&dist, u)
    }
}
