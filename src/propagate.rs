use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::trace;

use crate::{
    math::{add_all, Map},
    nfa::Nfa,
};

/// Computes for every state the union of the attributes of all states that can follow it,
/// where the attributes of a single state are given by `own`. A state's own attributes are only
/// part of its result if it can follow itself.
///
/// The computation starts at the stop state and pushes attributes backward along the edges of
/// `nfa` until nothing changes anymore, so cycles are handled. States from which the stop state
/// is unreachable do not appear in the result.
///
/// # Example
/// ```
/// use bit_set::BitSet;
/// use pda2nfa::prelude::*;
///
/// let mut nfa = NFA::new(0, 1);
/// let a = nfa.add_state(2);
/// let b = nfa.add_state(3);
/// nfa.set_followers(0, vec![a]);
/// nfa.set_followers(a, vec![b]);
/// nfa.set_followers(b, vec![1]);
///
/// let attributes = follower_attributes(&nfa, |q| BitSet::from_iter(nfa.label(*q).copied()));
/// assert_eq!(attributes[&a], BitSet::from_iter([1, 3]));
/// assert_eq!(attributes[&1], BitSet::new());
/// ```
pub fn follower_attributes<N, F>(nfa: &N, own: F) -> Map<N::State, BitSet>
where
    N: Nfa,
    F: Fn(&N::State) -> BitSet,
{
    let predecessors = nfa.predecessor_map();
    let stop = nfa.stop();

    let mut attributes: Map<N::State, BitSet> = Map::default();
    attributes.insert(stop.clone(), BitSet::new());
    let mut queue = VecDeque::from([stop]);
    let mut steps = 0usize;

    while let Some(q) = queue.pop_front() {
        steps += 1;
        let mut carried = own(&q);
        if let Some(known) = attributes.get(&q) {
            carried.union_with(known);
        }
        for p in predecessors.get(&q).into_iter().flatten() {
            let unseen = !attributes.contains_key(p);
            let entry = attributes.entry(p.clone()).or_default();
            if add_all(entry, &carried) || unseen {
                queue.push_back(p.clone());
            }
        }
    }

    trace!("propagated follower attributes in {steps} steps");
    attributes
}

/// Computes the length of a shortest path from each state to the stop state of `nfa`. The stop
/// state itself has distance `0`, states from which it is unreachable have no entry.
pub fn distance_to_stop<N: Nfa>(nfa: &N) -> Map<N::State, usize> {
    let predecessors = nfa.predecessor_map();
    let stop = nfa.stop();

    let mut distances: Map<N::State, usize> = Map::default();
    distances.insert(stop.clone(), 0);
    let mut queue = VecDeque::from([(stop, 0)]);
    while let Some((q, distance)) = queue.pop_front() {
        for p in predecessors.get(&q).into_iter().flatten() {
            if !distances.contains_key(p) {
                distances.insert(p.clone(), distance + 1);
                queue.push_back((p.clone(), distance + 1));
            }
        }
    }
    distances
}
