use std::{cmp::Ordering, fmt::Debug, hash::Hash};

use thiserror::Error;

use crate::{nfa::NfaFactory, pda::Pda};

mod graph;
pub use graph::{InlinedNfa, Node, NodeId};

mod inline;
mod materialize;
mod normalize;

/// Abstracts the ways in which a conversion can fail. Both variants mean that the given PDA does
/// not balance its pushes and pops, the conversion is aborted in that case.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConversionError {
    /// A reachable state pops a token that no reachable state pushes.
    #[error("state `{state}` pops `{token}`, which is never pushed")]
    UnbalancedPop {
        /// The popping state.
        state: String,
        /// The popped token.
        token: String,
    },
    /// A reachable state pushes a token that is not popped on any path continuing from it.
    #[error("state `{state}` pushes `{token}`, which is never popped after it")]
    UnbalancedPush {
        /// The pushing state.
        state: String,
        /// The pushed token.
        token: String,
    },
}

/// Determines the order in which the followers of a state are handed to an [`NfaFactory`].
#[derive(Default)]
pub enum FollowerOrder<S> {
    /// Followers appear in the order in which the edges were created.
    #[default]
    Insertion,
    /// Followers closer to the stop state come first, ties keep the insertion order. Followers
    /// from which the stop state is unreachable come last.
    DistanceToStop,
    /// Followers are sorted by comparing their origins.
    ByOrigin(Box<dyn Fn(&S, &S) -> Ordering>),
}

/// Converts pushdown automata into finite automata. The conversion proceeds in three steps:
/// 1. [`PdaToNfa::inline`] walks the PDA and inlines every sub-automaton wherever it is entered,
///    producing an [`InlinedNfa`].
/// 2. [`InlinedNfa::normalize`] merges states that were duplicated by inlining.
/// 3. [`InlinedNfa::materialize`] clones the result into the representation of an [`NfaFactory`].
///
/// [`PdaToNfa::convert`] performs all of them in sequence.
///
/// # Example
/// ```
/// use pda2nfa::prelude::*;
///
/// let pda = PDA::builder()
///     .with_edges([("start", "a"), ("a", "call"), ("call", "b"), ("b", "ret"), ("ret", "stop")])
///     .with_push("call", 'B')
///     .with_pop("ret", 'B')
///     .build("start", "stop")
///     .unwrap();
/// let nfa = PdaToNfa::new()
///     .convert(&pda, |_| true, NFA::factory())
///     .unwrap();
/// assert_eq!(nfa.to_string(), "start -> a\na -> b\nb -> stop");
/// ```
pub struct PdaToNfa<S> {
    order: FollowerOrder<S>,
}

impl<S> Default for PdaToNfa<S> {
    fn default() -> Self {
        Self {
            order: FollowerOrder::Insertion,
        }
    }
}

impl<S: Clone + Eq + Hash + Debug> PdaToNfa<S> {
    /// Creates a conversion which keeps followers in insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the order in which followers are handed to the factory.
    pub fn with_follower_order(mut self, order: FollowerOrder<S>) -> Self {
        self.order = order;
        self
    }

    /// Inlines `pda` into an [`InlinedNfa`]. The predicate `keep` decides which states appear in
    /// the result: a state for which it returns `true` is kept as an observable state, all others
    /// are absorbed. Start and stop are always kept, states that push or pop are always absorbed.
    ///
    /// The traversal is recursive, its depth grows with the longest path through the PDA that
    /// does not revisit a kept state within the same stack frame. PDAs derived from grammars stay
    /// far below the limits of the default thread stack, but very deep generated PDAs should be
    /// converted on a thread with a larger stack.
    pub fn inline<P, K>(&self, pda: P, keep: K) -> Result<InlinedNfa<S>, ConversionError>
    where
        P: Pda<State = S>,
        K: Fn(&S) -> bool,
    {
        inline::inline(&pda, keep)
    }

    /// Converts `pda` into a finite automaton built by `factory`, see [`PdaToNfa::inline`] for the
    /// meaning of `keep`.
    pub fn convert<P, K, F>(&self, pda: P, keep: K, mut factory: F) -> Result<F::Nfa, ConversionError>
    where
        P: Pda<State = S>,
        K: Fn(&S) -> bool,
        F: NfaFactory<S>,
    {
        let mut nfa = self.inline(pda, keep)?;
        nfa.normalize();
        Ok(nfa.materialize(&self.order, &mut factory))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn convert<K: Fn(&&'static str) -> bool>(
        pda: &PDA<&'static str, &'static str>,
        keep: K,
    ) -> Result<NFA<&'static str>, ConversionError> {
        PdaToNfa::new().convert(pda, keep, NFA::factory())
    }

    #[test_log::test]
    fn linear_chain() {
        let pda = PDA::<_, &str>::builder()
            .with_edges([("start", "a"), ("a", "b"), ("b", "stop")])
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |_| true).unwrap();
        assert_eq!(nfa.to_string(), "start -> a\na -> b\nb -> stop");
    }

    #[test_log::test]
    fn absorbed_rule_call() {
        let pda = PDA::builder()
            .with_edges([
                ("start", "call"),
                ("call", "entry"),
                ("entry", "leaf"),
                ("leaf", "ret"),
                ("ret", "stop"),
            ])
            .with_push("call", "T")
            .with_pop("ret", "T")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| s == &"leaf").unwrap();
        assert_eq!(nfa.to_string(), "start -> leaf\nleaf -> stop");
        assert_eq!(nfa.size(), 3);
    }

    #[test_log::test]
    fn split_fragments_stay_apart() {
        // Rule: a1 F b1 | a2 F b2, fragment F: f
        let pda = PDA::builder()
            .with_edges([
                ("start", "a1"),
                ("start", "a2"),
                ("a1", "call1"),
                ("a2", "call2"),
                ("call1", "f"),
                ("call2", "f"),
                ("f", "ret"),
                ("ret", "b1"),
                ("ret", "b2"),
                ("b1", "stop"),
                ("b2", "stop"),
            ])
            .with_push("call1", "F1")
            .with_push("call2", "F2")
            .with_pop("ret", "F1")
            .with_pop("ret", "F2")
            .build("start", "stop");
        // a state can only pop a single token
        assert!(pda.is_err());

        let pda = PDA::builder()
            .with_edges([
                ("start", "a1"),
                ("start", "a2"),
                ("a1", "call1"),
                ("a2", "call2"),
                ("call1", "f"),
                ("call2", "f"),
                ("f", "ret1"),
                ("f", "ret2"),
                ("ret1", "b1"),
                ("ret2", "b2"),
                ("b1", "stop"),
                ("b2", "stop"),
            ])
            .with_push("call1", "F1")
            .with_push("call2", "F2")
            .with_pop("ret1", "F1")
            .with_pop("ret2", "F2")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| !s.starts_with("call") && !s.starts_with("ret")).unwrap();
        assert_eq!(
            nfa.to_string(),
            "start -> a1, a2\na1 -> 1:f\n1:f -> b1\n2:f -> b2\nb1 -> stop\na2 -> 2:f\nb2 -> stop"
        );
    }

    #[test_log::test]
    fn nested_fragments() {
        // R: a B | B d, fragment B: C, fragment C: c
        let pda = PDA::builder()
            .with_edges([
                ("start", "a"),
                ("start", "callB2"),
                ("a", "callB1"),
                ("callB1", "callC"),
                ("callB2", "callC"),
                ("callC", "c"),
                ("c", "retC"),
                ("retC", "retB1"),
                ("retC", "retB2"),
                ("retB1", "stop"),
                ("retB2", "d"),
                ("d", "stop"),
            ])
            .with_push("callB1", "B1")
            .with_push("callB2", "B2")
            .with_push("callC", "C")
            .with_pop("retC", "C")
            .with_pop("retB1", "B1")
            .with_pop("retB2", "B2")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| ["a", "c", "d"].contains(s)).unwrap();
        let listing = ListFormatter::default()
            .sort_followers()
            .format_with(&nfa, |q| nfa.label(*q));
        assert_eq!(
            listing,
            "start -> 2:c, a\na -> 1:c\n1:c -> stop\n2:c -> d\nd -> stop"
        );
    }

    #[test_log::test]
    fn shared_return_merges_contexts() {
        // both calls of B push the same token, so their returns cannot be told apart
        let pda = PDA::builder()
            .with_edges([
                ("start", "a"),
                ("start", "call2"),
                ("a", "call1"),
                ("call1", "c"),
                ("call2", "c"),
                ("c", "ret"),
                ("ret", "stop"),
                ("ret", "d"),
                ("d", "stop"),
            ])
            .with_push("call1", "B")
            .with_push("call2", "B")
            .with_pop("ret", "B")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| ["a", "c", "d"].contains(s)).unwrap();
        assert_eq!(
            nfa.to_string(),
            "start -> a, c\na -> c\nc -> stop, d\nd -> stop"
        );
    }

    #[test_log::test]
    fn recursion_terminates() {
        // R: '(' R ')' | a
        let pda = PDA::builder()
            .with_edges([
                ("start", "lp"),
                ("start", "a"),
                ("lp", "call"),
                ("call", "lp"),
                ("call", "a"),
                ("a", "ret"),
                ("a", "stop"),
                ("ret", "rp"),
                ("rp", "ret"),
                ("rp", "stop"),
            ])
            .with_push("call", "R")
            .with_pop("ret", "R")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| ["lp", "a", "rp"].contains(s)).unwrap();
        assert_eq!(
            nfa.to_string(),
            "start -> lp, 2:a\nlp -> 1:a, lp\n1:a -> rp\n2:a -> stop\nrp -> stop, rp"
        );
    }

    #[test_log::test]
    fn right_recursion_terminates() {
        // R: x R?
        let pda = PDA::builder()
            .with_edges([
                ("start", "x"),
                ("x", "call"),
                ("x", "ret"),
                ("x", "stop"),
                ("call", "x"),
                ("ret", "ret"),
                ("ret", "stop"),
            ])
            .with_push("call", "R")
            .with_pop("ret", "R")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| s == &"x").unwrap();
        assert_eq!(nfa.to_string(), "start -> x\nx -> stop, x");
    }

    #[test_log::test]
    fn left_recursion_terminates() {
        // E: E '+' b | a
        let pda = PDA::builder()
            .with_edges([
                ("start", "call"),
                ("start", "a"),
                ("call", "call"),
                ("call", "a"),
                ("a", "ret"),
                ("a", "stop"),
                ("ret", "plus"),
                ("plus", "b"),
                ("b", "ret"),
                ("b", "stop"),
            ])
            .with_push("call", "E")
            .with_pop("ret", "E")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| s == &"a" || s == &"b").unwrap();
        assert_eq!(nfa.to_string(), "start -> a\na -> b, stop\nb -> stop, b");
    }

    #[test]
    fn long_kept_chain() {
        const LEN: usize = 300;
        let pda = PDA::<usize, ()>::builder()
            .with_edges((0..=LEN).map(|i| (i, i + 1)))
            .build(0, LEN + 1)
            .unwrap();
        let nfa = PdaToNfa::new()
            .convert(&pda, |_| true, NFA::factory())
            .unwrap();
        assert_eq!(nfa.size(), LEN + 2);
        assert_eq!(nfa.edge_count(), LEN + 1);
        assert_eq!(nfa.reachable_states().len(), LEN + 2);
    }

    #[test_log::test]
    fn call_path_shares_states_with_caller() {
        // R: x | T y, fragment T: x
        let pda = PDA::builder()
            .with_edges([
                ("start", "call"),
                ("start", "x"),
                ("call", "x"),
                ("x", "ret"),
                ("x", "stop"),
                ("ret", "y"),
                ("y", "stop"),
            ])
            .with_push("call", "T")
            .with_pop("ret", "T")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| s == &"x" || s == &"y").unwrap();
        assert_eq!(nfa.to_string(), "start -> x\nx -> y, stop\ny -> stop");
    }

    #[test_log::test]
    fn unbalanced_pop_is_fatal() {
        let pda = PDA::builder()
            .with_edges([("start", "a"), ("a", "ret"), ("ret", "stop")])
            .with_pop("ret", "T")
            .build("start", "stop")
            .unwrap();
        assert_eq!(
            convert(&pda, |_| true),
            Err(ConversionError::UnbalancedPop {
                state: "\"ret\"".into(),
                token: "\"T\"".into()
            })
        );
    }

    #[test_log::test]
    fn unbalanced_push_is_fatal() {
        let pda = PDA::builder()
            .with_edges([("start", "call"), ("call", "x"), ("x", "stop")])
            .with_push("call", "T")
            .build("start", "stop")
            .unwrap();
        let expected = ConversionError::UnbalancedPush {
            state: "\"call\"".into(),
            token: "\"T\"".into(),
        };
        assert_eq!(convert(&pda, |_| true), Err(expected.clone()));
        assert_eq!(convert(&pda, |_| false), Err(expected));
    }

    #[test_log::test]
    fn push_popped_only_elsewhere_is_fatal() {
        let pda = PDA::builder()
            .with_edges([
                ("start", "c1"),
                ("start", "c2"),
                ("c1", "x"),
                ("x", "stop"),
                ("c2", "y"),
                ("y", "r"),
                ("r", "stop"),
            ])
            .with_push("c1", "T")
            .with_push("c2", "T")
            .with_pop("r", "T")
            .build("start", "stop")
            .unwrap();
        assert_eq!(
            convert(&pda, |_| true),
            Err(ConversionError::UnbalancedPush {
                state: "\"c1\"".into(),
                token: "\"T\"".into(),
            })
        );
    }

    #[test_log::test]
    fn mismatched_pop_is_abandoned() {
        let pda = PDA::builder()
            .with_edges([
                ("start", "callT"),
                ("start", "callU"),
                ("callT", "x"),
                ("x", "retU"),
                ("x", "retT"),
                ("retT", "stop"),
                ("callU", "z"),
                ("z", "retU"),
                ("retU", "y"),
                ("y", "stop"),
            ])
            .with_push("callT", "T")
            .with_push("callU", "U")
            .with_pop("retT", "T")
            .with_pop("retU", "U")
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |_| true).unwrap();
        assert_eq!(nfa.to_string(), "start -> x, z\nx -> stop\nz -> y\ny -> stop");
    }

    #[test_log::test]
    fn absorbed_cycle_contributes_nothing() {
        let pda = PDA::<_, &str>::builder()
            .with_edges([("start", "a"), ("a", "u"), ("u", "v"), ("v", "u"), ("a", "stop")])
            .build("start", "stop")
            .unwrap();
        let nfa = convert(&pda, |s| ["lp", "a", "rp"].contains(s)).unwrap();
        assert_eq!(
            nfa.to_string(),
            "start -> lp, 2:a\nlp -> 1:a, lp\n1:a -> rp\n2:a -> stop\nrp -> stop, rp"
        );
    }

    #[test_log::test]
    fn normalization_is_idempotent() {
        let pda = crate::tests::fragment_pda();
        let converter = PdaToNfa::new();
        let mut inlined = converter
            .inline(&pda, |s| s.starts_with('a') || s == &"f")
            .unwrap();
        assert_eq!(inlined.size(), 6);
        assert_eq!(inlined.normalize(), 1);
        let once = ListFormatter::default().format_with(&inlined, |q| *inlined.origin(*q));
        assert_eq!(inlined.normalize(), 0);
        let twice = ListFormatter::default().format_with(&inlined, |q| *inlined.origin(*q));
        assert_eq!(once, twice);
        assert!(inlined.is_consistent());
    }

    #[test_log::test]
    fn follower_orders() {
        let pda = PDA::<_, &str>::builder()
            .with_edges([
                ("start", "long"),
                ("start", "short"),
                ("long", "mid"),
                ("mid", "stop"),
                ("short", "stop"),
            ])
            .build("start", "stop")
            .unwrap();

        let nfa = PdaToNfa::<&str>::new()
            .with_follower_order(FollowerOrder::DistanceToStop)
            .convert(&pda, |_| true, NFA::factory())
            .unwrap();
        assert!(nfa.to_string().starts_with("start -> short, long"));

        let nfa = PdaToNfa::<&str>::new()
            .with_follower_order(FollowerOrder::ByOrigin(Box::new(|l: &&str, r: &&str| r.cmp(l))))
            .convert(&pda, |_| true, NFA::factory())
            .unwrap();
        assert!(nfa.to_string().starts_with("start -> short, long"));

        let nfa = PdaToNfa::<&str>::new()
            .convert(&pda, |_| true, NFA::factory())
            .unwrap();
        assert!(nfa.to_string().starts_with("start -> long, short"));
    }
}
