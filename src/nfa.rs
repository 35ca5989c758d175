use std::hash::Hash;

use crate::math::{OrderedMap, Set};

mod explicit;
pub use explicit::{NFAFactory, NFA};

/// A read-only view onto a nondeterministic finite automaton with a designated start and stop
/// state. There are no symbols on the edges, a state simply has a (possibly empty) set of followers.
pub trait Nfa {
    /// The type of state identities.
    type State: Clone + Eq + Hash;
    /// Iterator over the followers of a state.
    type FollowersIter<'this>: Iterator<Item = Self::State>
    where
        Self: 'this;

    /// Returns the start state.
    fn start(&self) -> Self::State;

    /// Returns the stop state.
    fn stop(&self) -> Self::State;

    /// Returns an iterator over the followers of `state`.
    fn followers(&self, state: &Self::State) -> Self::FollowersIter<'_>;

    /// Collects all states reachable from the start state in depth-first pre-order, where the
    /// followers of each state are visited in the order in which [`Nfa::followers`] yields them.
    fn reachable_states(&self) -> Vec<Self::State> {
        let mut seen = Set::default();
        let mut order = vec![];
        let mut stack = vec![self.start()];
        while let Some(q) = stack.pop() {
            if !seen.insert(q.clone()) {
                continue;
            }
            let followers = self.followers(&q).collect::<Vec<_>>();
            stack.extend(followers.into_iter().rev());
            order.push(q);
        }
        order
    }

    /// Computes the inverse of the follower relation for all reachable states. Every reachable
    /// state has an entry, the start state usually with an empty list of predecessors.
    fn predecessor_map(&self) -> OrderedMap<Self::State, Vec<Self::State>> {
        let reachable = self.reachable_states();
        let mut map: OrderedMap<_, Vec<_>> =
            reachable.iter().map(|q| (q.clone(), vec![])).collect();
        for q in reachable {
            for f in self.followers(&q) {
                let preds = map.entry(f).or_default();
                if !preds.contains(&q) {
                    preds.push(q.clone());
                }
            }
        }
        map
    }
}

impl<N: Nfa> Nfa for &N {
    type State = N::State;
    type FollowersIter<'this> = N::FollowersIter<'this> where Self: 'this;

    fn start(&self) -> Self::State {
        N::start(self)
    }
    fn stop(&self) -> Self::State {
        N::stop(self)
    }
    fn followers(&self, state: &Self::State) -> Self::FollowersIter<'_> {
        N::followers(self, state)
    }
}

/// Protocol through which a finite automaton is materialized in a representation chosen by the
/// caller. States whose origin is of type `S` are translated into states of type [`NfaFactory::State`].
///
/// The conversion first creates all states and only then installs the followers of each state,
/// so implementations may rely on every follower passed to [`NfaFactory::set_followers`] already
/// being created.
pub trait NfaFactory<S> {
    /// The type of states in the produced automaton.
    type State: Clone + Eq + Hash;
    /// The type of the produced automaton.
    type Nfa: Nfa<State = Self::State>;

    /// Creates an automaton, which brings its own start and stop state for the given origins.
    fn create(&mut self, start: &S, stop: &S) -> Self::Nfa;

    /// Creates a further state in `nfa` for the given origin.
    fn create_state(&mut self, nfa: &mut Self::Nfa, origin: &S) -> Self::State;

    /// Installs the outgoing edges of `owner`, the order of `followers` is to be preserved.
    fn set_followers(&mut self, nfa: &mut Self::Nfa, owner: &Self::State, followers: Vec<Self::State>);
}
