use std::hash::Hash;

use tracing::trace;

use crate::{
    math::Map,
    nfa::{Nfa, NfaFactory},
    propagate::distance_to_stop,
};

use super::{
    graph::{InlinedNfa, NodeId},
    FollowerOrder,
};

impl<S: Clone + Eq + Hash> InlinedNfa<S> {
    /// Clones `self` into the representation produced by `factory`. All states are created before
    /// any followers are installed, and the followers of each state are passed on in the order
    /// given by `order`.
    pub fn materialize<F>(&self, order: &FollowerOrder<S>, factory: &mut F) -> F::Nfa
    where
        F: NfaFactory<S>,
    {
        let mut result = factory.create(self.origin(Self::START), self.origin(Self::STOP));

        let mut src2dest: Map<NodeId, F::State> = Map::default();
        src2dest.insert(Self::START, result.start());
        src2dest.insert(Self::STOP, result.stop());
        for q in self.node_ids() {
            if q != Self::START && q != Self::STOP {
                let dest = factory.create_state(&mut result, self.origin(q));
                src2dest.insert(q, dest);
            }
        }

        let distances = match order {
            FollowerOrder::DistanceToStop => Some(distance_to_stop(self)),
            _ => None,
        };

        for q in self.node_ids() {
            let followers = self
                .ordered_followers(q, order, distances.as_ref())
                .into_iter()
                .map(|f| src2dest[&f].clone())
                .collect();
            factory.set_followers(&mut result, &src2dest[&q], followers);
        }
        trace!("materialized {} states", src2dest.len());
        result
    }

    fn ordered_followers(
        &self,
        q: NodeId,
        order: &FollowerOrder<S>,
        distances: Option<&Map<NodeId, usize>>,
    ) -> Vec<NodeId> {
        let mut followers = self.followers(&q).collect::<Vec<_>>();
        match order {
            FollowerOrder::Insertion => {}
            FollowerOrder::DistanceToStop => {
                if let Some(distances) = distances {
                    followers.sort_by_key(|f| distances.get(f).copied().unwrap_or(usize::MAX));
                }
            }
            FollowerOrder::ByOrigin(cmp) => {
                followers.sort_by(|l, r| cmp(self.origin(*l), self.origin(*r)));
            }
        }
        followers
    }
}
