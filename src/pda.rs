use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;
use thiserror::Error;

use crate::{math::OrderedMap, Show};

mod builder;
pub use builder::PDABuilder;

/// A read-only view onto a pushdown automaton. Each state has a list of followers and may carry
/// either a token that is pushed or a token that is popped when the state is passed. Pushing a
/// token enters a sub-automaton, popping the same token returns from it.
///
/// Every token that is pushed by a state reachable from the start must be popped on some path
/// continuing from that state, and every reachable pop must have a matching push. Otherwise the
/// conversion into a finite automaton fails, see [`crate::ConversionError`].
pub trait Pda {
    /// The type of state identities. These are used as keys in maps, so they should be cheap to clone.
    type State: Clone + Eq + Hash + Debug;
    /// The type of stack tokens.
    type Token: Clone + Eq + Debug;
    /// Iterator over the followers of a state.
    type FollowersIter<'this>: Iterator<Item = Self::State>
    where
        Self: 'this;

    /// Returns the designated start state.
    fn start(&self) -> Self::State;

    /// Returns the designated stop state.
    fn stop(&self) -> Self::State;

    /// Returns an iterator over the followers of `state` in declaration order.
    fn followers(&self, state: &Self::State) -> Self::FollowersIter<'_>;

    /// Returns the token that `state` pushes, if any.
    fn push(&self, state: &Self::State) -> Option<Self::Token>;

    /// Returns the token that `state` pops, if any.
    fn pop(&self, state: &Self::State) -> Option<Self::Token>;
}

impl<P: Pda> Pda for &P {
    type State = P::State;
    type Token = P::Token;
    type FollowersIter<'this> = P::FollowersIter<'this> where Self: 'this;

    fn start(&self) -> Self::State {
        P::start(self)
    }
    fn stop(&self) -> Self::State {
        P::stop(self)
    }
    fn followers(&self, state: &Self::State) -> Self::FollowersIter<'_> {
        P::followers(self, state)
    }
    fn push(&self, state: &Self::State) -> Option<Self::Token> {
        P::push(self, state)
    }
    fn pop(&self, state: &Self::State) -> Option<Self::Token> {
        P::pop(self, state)
    }
}

/// The stack operation a state of a [`PDA`] performs. Having this as an enum ensures that a state
/// can never push and pop at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StackOp<I> {
    /// The state leaves the stack untouched.
    #[default]
    None,
    /// The state pushes the given token.
    Push(I),
    /// The state pops the given token.
    Pop(I),
}

impl<I> StackOp<I> {
    /// Returns the pushed token, if any.
    pub fn pushed(&self) -> Option<&I> {
        match self {
            StackOp::Push(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the popped token, if any.
    pub fn popped(&self) -> Option<&I> {
        match self {
            StackOp::Pop(i) => Some(i),
            _ => None,
        }
    }
}

/// Errors that can occur when a [`PDA`] is assembled by a [`PDABuilder`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum PdaBuildError {
    /// A state was assigned two different stack operations, e.g. it pushes and pops.
    #[error("state `{0}` is assigned conflicting stack operations")]
    ConflictingStackOp(String),
    /// The start or stop state pushes or pops a token.
    #[error("start and stop state may not operate on the stack, but `{0}` does")]
    StackOpOnEndpoint(String),
    /// The start and stop state coincide.
    #[error("start and stop state must be distinct, but both are `{0}`")]
    IdenticalEndpoints(String),
}

/// Stores the information on a single state of a [`PDA`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdaState<Q, I> {
    pub(crate) followers: Vec<Q>,
    pub(crate) op: StackOp<I>,
}

impl<Q, I> Default for PdaState<Q, I> {
    fn default() -> Self {
        Self {
            followers: vec![],
            op: StackOp::None,
        }
    }
}

impl<Q, I> PdaState<Q, I> {
    /// Returns the followers of the state in declaration order.
    pub fn followers(&self) -> &[Q] {
        &self.followers
    }

    /// Returns the stack operation of the state.
    pub fn op(&self) -> &StackOp<I> {
        &self.op
    }
}

/// A pushdown automaton in which every state is identified by its label `Q`. Tokens on the
/// stack are of type `I`. States are stored in the order in which they were first mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDA<Q: Hash + Eq, I> {
    start: Q,
    stop: Q,
    states: OrderedMap<Q, PdaState<Q, I>>,
}

impl<Q, I> PDA<Q, I>
where
    Q: Clone + Eq + Hash + Debug,
    I: Clone + Eq + Debug,
{
    /// Returns a builder for a [`PDA`], this should be the main way to construct one.
    ///
    /// # Example
    /// A PDA in which `a` calls the sub-automaton `b` through `call`, which is left through `ret`.
    /// ```
    /// use pda2nfa::prelude::*;
    ///
    /// let pda = PDA::builder()
    ///     .with_edges([("start", "a"), ("a", "call"), ("call", "b"), ("b", "ret"), ("ret", "stop")])
    ///     .with_push("call", 'B')
    ///     .with_pop("ret", 'B')
    ///     .build("start", "stop")
    ///     .unwrap();
    /// assert_eq!(pda.size(), 6);
    /// ```
    pub fn builder() -> PDABuilder<Q, I> {
        PDABuilder::default()
    }

    pub(crate) fn from_parts(start: Q, stop: Q, states: OrderedMap<Q, PdaState<Q, I>>) -> Self {
        Self {
            start,
            stop,
            states,
        }
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the information stored on `state`, if it exists.
    pub fn state(&self, state: &Q) -> Option<&PdaState<Q, I>> {
        self.states.get(state)
    }

    /// Iterates over all states in the order in which they were declared.
    pub fn states(&self) -> impl Iterator<Item = (&Q, &PdaState<Q, I>)> + '_ {
        self.states.iter()
    }
}

impl<Q, I> Pda for PDA<Q, I>
where
    Q: Clone + Eq + Hash + Debug,
    I: Clone + Eq + Debug,
{
    type State = Q;
    type Token = I;
    type FollowersIter<'this> = std::iter::Cloned<std::slice::Iter<'this, Q>> where Self: 'this;

    fn start(&self) -> Q {
        self.start.clone()
    }

    fn stop(&self) -> Q {
        self.stop.clone()
    }

    fn followers(&self, state: &Q) -> Self::FollowersIter<'_> {
        self.states
            .get(state)
            .map(|s| s.followers.as_slice())
            .unwrap_or(&[])
            .iter()
            .cloned()
    }

    fn push(&self, state: &Q) -> Option<I> {
        self.states.get(state)?.op.pushed().cloned()
    }

    fn pop(&self, state: &Q) -> Option<I> {
        self.states.get(state)?.op.popped().cloned()
    }
}

impl<Q, I> std::fmt::Display for PDA<Q, I>
where
    Q: Clone + Eq + Hash + Debug + Show,
    I: Clone + Eq + Debug + Show,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .states
            .iter()
            .filter(|(_, s)| !s.followers.is_empty())
            .map(|(q, s)| {
                let title = match &s.op {
                    StackOp::None => q.show(),
                    StackOp::Push(i) => format!("{}+{}", q.show(), i.show()),
                    StackOp::Pop(i) => format!("{}-{}", q.show(), i.show()),
                };
                format!("{} -> {}", title, s.followers.iter().map(|f| f.show()).join(", "))
            });
        write!(f, "{}", lines.format("\n"))
    }
}
