use std::hash::Hash;

use crate::{
    math::OrderedSet,
    nfa::Nfa,
};

/// Index of a state in an [`InlinedNfa`].
pub type NodeId = usize;

/// A state of an [`InlinedNfa`]. Besides its followers, it also stores its predecessors, which
/// are kept as the inverse of the follower relation at all times.
#[derive(Debug, Clone)]
pub struct Node<S> {
    pub(super) origin: S,
    pub(super) followers: OrderedSet<NodeId>,
    pub(super) predecessors: OrderedSet<NodeId>,
}

impl<S> Node<S> {
    fn new(origin: S) -> Self {
        Self {
            origin,
            followers: OrderedSet::default(),
            predecessors: OrderedSet::default(),
        }
    }

    /// Returns the PDA state this node was inlined from.
    pub fn origin(&self) -> &S {
        &self.origin
    }

    /// Returns the followers of the node in insertion order.
    pub fn followers(&self) -> &OrderedSet<NodeId> {
        &self.followers
    }

    /// Returns the predecessors of the node in insertion order.
    pub fn predecessors(&self) -> &OrderedSet<NodeId> {
        &self.predecessors
    }
}

/// The mutable finite automaton that is produced by inlining a PDA. Nodes live in an arena and
/// are addressed by their [`NodeId`]; merging two nodes removes one of them from the set of live
/// states, but its index is never reused. Several nodes may share the same origin, as a PDA state
/// reached under different stack contexts is inlined once per context.
#[derive(Debug, Clone)]
pub struct InlinedNfa<S> {
    pub(super) nodes: Vec<Node<S>>,
    pub(super) states: OrderedSet<NodeId>,
}

impl<S: Clone + Eq + Hash> InlinedNfa<S> {
    pub(super) const START: NodeId = 0;
    pub(super) const STOP: NodeId = 1;

    pub(super) fn new(start: S, stop: S) -> Self {
        let mut nfa = Self {
            nodes: vec![],
            states: OrderedSet::default(),
        };
        nfa.add_node(start);
        nfa.add_node(stop);
        nfa
    }

    pub(super) fn add_node(&mut self, origin: S) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(origin));
        self.states.insert(id);
        id
    }

    pub(super) fn add_edge(&mut self, source: NodeId, target: NodeId) {
        self.nodes[source].followers.insert(target);
        self.nodes[target].predecessors.insert(source);
    }

    /// Returns the node with the given index, if it is still alive.
    pub fn node(&self, id: NodeId) -> Option<&Node<S>> {
        if self.states.contains(&id) {
            self.nodes.get(id)
        } else {
            None
        }
    }

    /// Returns the origin of the node with index `id`. Panics if the node was never created.
    pub fn origin(&self, id: NodeId) -> &S {
        &self.nodes[id].origin
    }

    /// Iterates over the indices of all live nodes in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.states.iter().copied()
    }

    /// Returns the number of live nodes.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Checks that predecessors and followers mirror each other and that no live node refers to
    /// a removed one.
    pub fn is_consistent(&self) -> bool {
        self.states.iter().all(|&q| {
            let node = &self.nodes[q];
            node.followers
                .iter()
                .all(|f| self.states.contains(f) && self.nodes[*f].predecessors.contains(&q))
                && node
                    .predecessors
                    .iter()
                    .all(|p| self.states.contains(p) && self.nodes[*p].followers.contains(&q))
        })
    }
}

impl<S: Clone + Eq + Hash> Nfa for InlinedNfa<S> {
    type State = NodeId;
    type FollowersIter<'this> = std::iter::Copied<indexmap::set::Iter<'this, NodeId>> where Self: 'this;

    fn start(&self) -> NodeId {
        Self::START
    }

    fn stop(&self) -> NodeId {
        Self::STOP
    }

    fn followers(&self, state: &NodeId) -> Self::FollowersIter<'_> {
        self.nodes[*state].followers.iter().copied()
    }
}
