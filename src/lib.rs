//! Library for eliminating the stack from pushdown automata.
//!
//! A pushdown automaton (PDA) in the sense of this crate is a graph of states, where each state has
//! a list of followers and may additionally push or pop a token. Pushing a token models entering a
//! sub-automaton (think of calling a grammar rule), popping the same token models returning from it.
//! The central operation, [`PdaToNfa::convert`], turns such a PDA into a nondeterministic finite
//! automaton (NFA) without any stack by inlining every sub-automaton at each of its call sites. While
//! doing so, a caller supplied predicate decides which states are kept as observable states of the
//! NFA; all other states are absorbed, meaning their predecessors are connected directly to whatever
//! kept states follow them.
//!
//! Inlining the same sub-automaton through different call paths produces many states which behave
//! identically. These are merged in a subsequent normalization pass, before the result is handed to
//! an [`NfaFactory`], which builds the caller's own representation of the NFA.
//!
//! The most important traits are
//! - [`Pda`], the read-only view onto a pushdown automaton that the conversion consumes,
//! - [`Nfa`], a read-only view onto a finite automaton with a designated start and stop state,
//! - [`NfaFactory`], the protocol through which the conversion materializes its result.
//!
//! For quick experiments and tests, the crate provides [`PDA`] (built via [`PDABuilder`]) and [`NFA`],
//! which are keyed by state labels. Automata can be inspected using the formatters in [`format`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use pda2nfa::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        conversion::{ConversionError, FollowerOrder, PdaToNfa},
        format::{GraphFormatter, ListFormatter, TableFormatter},
        math,
        nfa::{Nfa, NfaFactory, NFAFactory, NFA},
        pda::{Pda, PdaBuildError, StackOp, PDABuilder, PDA},
        propagate::{distance_to_stop, follower_attributes},
        Show,
    };
}

/// This module contains type aliases for the collections that are used throughout the crate.
pub mod math;

/// Defines pushdown automata, the input of the conversion.
#[allow(clippy::upper_case_acronyms)]
pub mod pda;
pub use pda::{Pda, PDA};

/// Defines nondeterministic finite automata, the output of the conversion.
#[allow(clippy::upper_case_acronyms)]
pub mod nfa;
pub use nfa::{Nfa, NfaFactory, NFA};

/// Contains the conversion from pushdown automata to finite automata.
pub mod conversion;
pub use conversion::{ConversionError, PdaToNfa};

/// Deterministic, human readable renderings of finite automata.
pub mod format;

/// Backward propagation of per-state information.
pub mod propagate;

/// Helper trait which can be used to display states and such.
pub trait Show {
    /// Returns a human readable representation of `self`. This is used for titles of states
    /// when an automaton is formatted, so it should be short and ideally unique.
    fn show(&self) -> String;
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for u32 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for str {
    fn show(&self) -> String {
        self.to_string()
    }
}

/// A missing value is rendered as `null`, which keeps diagnostics available for partially
/// initialized automata.
impl<S: Show> Show for Option<S> {
    fn show(&self) -> String {
        match self {
            Some(s) => s.show(),
            None => "null".to_string(),
        }
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}
