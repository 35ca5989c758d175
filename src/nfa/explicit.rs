use std::{marker::PhantomData, hash::Hash};

use crate::{format::ListFormatter, Show};

use super::{Nfa, NfaFactory};

/// Stores the label of a state in an [`NFA`] together with the indices of its followers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NfaState<Q> {
    label: Q,
    followers: Vec<usize>,
}

/// A finite automaton whose states are indexed by `usize` and carry a label of type `Q`. Labels
/// need not be unique. The start state always has index `0`, the stop state has index `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFA<Q> {
    states: Vec<NfaState<Q>>,
}

impl<Q> NFA<Q> {
    /// Creates an automaton that consists of only a start and a stop state with the given labels.
    pub fn new(start: Q, stop: Q) -> Self {
        Self {
            states: vec![
                NfaState {
                    label: start,
                    followers: vec![],
                },
                NfaState {
                    label: stop,
                    followers: vec![],
                },
            ],
        }
    }

    /// Adds a state with the given label and returns its index.
    pub fn add_state(&mut self, label: Q) -> usize {
        self.states.push(NfaState {
            label,
            followers: vec![],
        });
        self.states.len() - 1
    }

    /// Replaces the followers of `state`. Panics if `state` does not exist.
    pub fn set_followers(&mut self, state: usize, followers: Vec<usize>) {
        assert!(
            state < self.states.len(),
            "Index {state} is out of bounds, there are only {} states",
            self.states.len()
        );
        self.states[state].followers = followers;
    }

    /// Appends `target` to the followers of `source`, unless it is already present.
    pub fn add_edge(&mut self, source: usize, target: usize) {
        let followers = &mut self.states[source].followers;
        if !followers.contains(&target) {
            followers.push(target);
        }
    }

    /// Returns the label of `state`, if it exists.
    pub fn label(&self, state: usize) -> Option<&Q> {
        self.states.get(state).map(|s| &s.label)
    }

    /// Returns the number of states, including unreachable ones.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.states.iter().map(|s| s.followers.len()).sum()
    }
}

impl<Q: Clone> NFA<Q> {
    /// Returns a factory that produces [`NFA`]s whose labels are the origins of the states.
    pub fn factory() -> NFAFactory<Q, Q, fn(&Q) -> Q> {
        NFAFactory::new(Q::clone as fn(&Q) -> Q)
    }
}

impl<Q> Nfa for NFA<Q> {
    type State = usize;
    type FollowersIter<'this> = std::iter::Copied<std::slice::Iter<'this, usize>> where Self: 'this;

    fn start(&self) -> usize {
        0
    }

    fn stop(&self) -> usize {
        1
    }

    fn followers(&self, state: &usize) -> Self::FollowersIter<'_> {
        self.states
            .get(*state)
            .map(|s| s.followers.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }
}

/// Renders the automaton through a [`ListFormatter`], using the labels as titles.
impl<Q: Show> std::fmt::Display for NFA<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listing = ListFormatter::default().format_with(self, |q| self.label(*q));
        write!(f, "{listing}")
    }
}

/// An [`NfaFactory`] that builds [`NFA`]s. The label of every created state is obtained by
/// applying `relabel` to the origin of the state.
pub struct NFAFactory<S, Q, F> {
    relabel: F,
    _marker: PhantomData<fn(&S) -> Q>,
}

impl<S, Q, F: FnMut(&S) -> Q> NFAFactory<S, Q, F> {
    /// Creates a factory labeling states through `relabel`.
    pub fn new(relabel: F) -> Self {
        Self {
            relabel,
            _marker: PhantomData,
        }
    }
}

impl<S, Q, F: FnMut(&S) -> Q> NfaFactory<S> for NFAFactory<S, Q, F> {
    type State = usize;
    type Nfa = NFA<Q>;

    fn create(&mut self, start: &S, stop: &S) -> NFA<Q> {
        NFA::new((self.relabel)(start), (self.relabel)(stop))
    }

    fn create_state(&mut self, nfa: &mut NFA<Q>, origin: &S) -> usize {
        nfa.add_state((self.relabel)(origin))
    }

    fn set_followers(&mut self, nfa: &mut NFA<Q>, owner: &usize, followers: Vec<usize>) {
        nfa.set_followers(*owner, followers);
    }
}

impl<Q: Hash + Eq> NFA<Q> {
    /// Returns the index of the first state carrying `label`, if there is one.
    pub fn find_by_label(&self, label: &Q) -> Option<usize> {
        self.states.iter().position(|s| &s.label == label)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn factory_relabels() {
        let mut factory = NFAFactory::new(|s: &u32| format!("q{s}"));
        let mut nfa = factory.create(&0, &1);
        let q = factory.create_state(&mut nfa, &7);
        factory.set_followers(&mut nfa, &0, vec![q]);
        factory.set_followers(&mut nfa, &q, vec![q, 1]);

        assert_eq!(nfa.label(q), Some(&"q7".to_string()));
        assert_eq!(nfa.find_by_label(&"q1".to_string()), Some(1));
        assert_eq!(nfa.edge_count(), 3);
        assert_eq!(nfa.to_string(), "q0 -> q7\nq7 -> q7, q1");
    }
}
