use std::hash::Hash;

use tracing::{debug, trace};

use crate::math::{OrderedMap, Set};

use super::graph::{InlinedNfa, NodeId};

impl<S: Clone + Eq + Hash> InlinedNfa<S> {
    /// Merges states that share an origin and are interchangeable, because they have the same
    /// followers, the same predecessors, or are both self-looping with the same remaining followers.
    /// Passes over all candidate groups are repeated until one of them does not merge anything.
    /// Returns the number of states that were removed.
    pub fn normalize(&mut self) -> usize {
        let mut groups: OrderedMap<S, Vec<NodeId>> = OrderedMap::default();
        for &q in &self.states {
            groups.entry(self.nodes[q].origin.clone()).or_default().push(q);
        }
        groups.retain(|_, group| group.len() > 1);

        let mut merged = 0;
        let mut changed = true;
        while changed && !groups.is_empty() {
            changed = false;
            let keys = groups.keys().cloned().collect::<Vec<_>>();
            for key in keys {
                let mut group = groups.get(&key).cloned().unwrap_or_default();
                let mut i = 0;
                while i < group.len() {
                    if let Some(j) = (i + 1..group.len()).find(|&j| self.can_merge(group[i], group[j])) {
                        self.merge(group[i], group[j]);
                        group.remove(j);
                        merged += 1;
                        changed = true;
                    }
                    i += 1;
                }
                if group.len() > 1 {
                    groups.insert(key, group);
                } else {
                    groups.shift_remove(&key);
                }
            }
        }

        debug!("normalization removed {merged} states, {} remain", self.size());
        merged
    }

    fn can_merge(&self, i: NodeId, j: NodeId) -> bool {
        let (l, r) = (&self.nodes[i], &self.nodes[j]);
        if l.origin != r.origin {
            return false;
        }
        if l.followers == r.followers || l.predecessors == r.predecessors {
            return true;
        }
        l.followers.len() == r.followers.len()
            && l.followers.contains(&i)
            && r.followers.contains(&j)
            && l.followers.iter().filter(|&&f| f != i).collect::<Set<_>>()
                == r.followers.iter().filter(|&&f| f != j).collect::<Set<_>>()
    }

    /// Removes `remove` and lets `keep` take over all of its edges, except for a self-loop.
    fn merge(&mut self, keep: NodeId, remove: NodeId) {
        debug_assert!(remove != Self::START && remove != Self::STOP);
        trace!("merging state {remove} into {keep}");

        self.nodes[remove].followers.shift_remove(&remove);
        self.nodes[remove].predecessors.shift_remove(&remove);

        let predecessors = std::mem::take(&mut self.nodes[remove].predecessors);
        for p in predecessors {
            self.nodes[p].followers.shift_remove(&remove);
            self.nodes[p].followers.insert(keep);
            self.nodes[keep].predecessors.insert(p);
        }

        let followers = std::mem::take(&mut self.nodes[remove].followers);
        for f in followers {
            self.nodes[f].predecessors.shift_remove(&remove);
            self.nodes[f].predecessors.insert(keep);
            self.nodes[keep].followers.insert(f);
        }

        self.states.shift_remove(&remove);
    }
}
