use std::{fmt::Debug, hash::Hash};

use crate::math::OrderedMap;

use super::{PdaBuildError, PdaState, StackOp, PDA};

/// Helper struct for the construction of a [`PDA`]. It stores a list of edges and a list of stack
/// operations, which are only checked for consistency once [`PDABuilder::build`] is called.
///
/// States are identified by their labels, so adding an edge between two labels that have not been
/// seen so far implicitly creates both states.
#[derive(Debug, Clone)]
pub struct PDABuilder<Q, I> {
    edges: Vec<(Q, Q)>,
    ops: Vec<(Q, StackOp<I>)>,
}

impl<Q, I> Default for PDABuilder<Q, I> {
    fn default() -> Self {
        Self {
            edges: vec![],
            ops: vec![],
        }
    }
}

impl<Q, I> PDABuilder<Q, I>
where
    Q: Clone + Eq + Hash + Debug,
    I: Clone + Eq + Debug,
{
    /// Adds a single edge from `source` to `target`.
    pub fn with_edge(mut self, source: Q, target: Q) -> Self {
        self.edges.push((source, target));
        self
    }

    /// Adds a list of edges, the order of the edges determines the order of followers.
    pub fn with_edges<E: IntoIterator<Item = (Q, Q)>>(mut self, edges: E) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Marks `state` as pushing `token`.
    pub fn with_push(mut self, state: Q, token: I) -> Self {
        self.ops.push((state, StackOp::Push(token)));
        self
    }

    /// Marks `state` as popping `token`.
    pub fn with_pop(mut self, state: Q, token: I) -> Self {
        self.ops.push((state, StackOp::Pop(token)));
        self
    }

    /// Consumes `self` and assembles a [`PDA`] with the given start and stop state. Fails if some
    /// state is given two different stack operations, if `start`/`stop` operate on the stack or
    /// if they are the same state.
    pub fn build(self, start: Q, stop: Q) -> Result<PDA<Q, I>, PdaBuildError> {
        if start == stop {
            return Err(PdaBuildError::IdenticalEndpoints(format!("{start:?}")));
        }

        let mut states: OrderedMap<Q, PdaState<Q, I>> = OrderedMap::default();
        states.entry(start.clone()).or_default();

        for (source, target) in self.edges {
            states.entry(source).or_default().followers.push(target.clone());
            states.entry(target).or_default();
        }

        for (q, op) in self.ops {
            if q == start || q == stop {
                return Err(PdaBuildError::StackOpOnEndpoint(format!("{q:?}")));
            }
            let state = states.entry(q.clone()).or_default();
            match &state.op {
                StackOp::None => state.op = op,
                existing if existing == &op => {}
                _ => return Err(PdaBuildError::ConflictingStackOp(format!("{q:?}"))),
            }
        }
        states.entry(stop.clone()).or_default();

        Ok(PDA::from_parts(start, stop, states))
    }
}
