use itertools::Itertools;

use crate::{nfa::Nfa, Show};

use super::unique_names;

/// Renders an automaton as a flat list with one line `title -> f1, f2` per state. States
/// without followers are omitted and the lines are separated by a single newline.
///
/// # Example
/// ```
/// use pda2nfa::prelude::*;
///
/// let mut nfa = NFA::new("start", "stop");
/// let b = nfa.add_state("b");
/// let a = nfa.add_state("a");
/// nfa.set_followers(0, vec![b, a]);
/// nfa.set_followers(a, vec![1]);
/// nfa.set_followers(b, vec![1]);
///
/// let listing = ListFormatter::default()
///     .sort_followers()
///     .format_with(&nfa, |q| nfa.label(*q));
/// assert_eq!(listing, "start -> a, b\nb -> stop\na -> stop");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFormatter {
    sort_followers: bool,
}

impl ListFormatter {
    /// Sorts the names of the followers of each state lexicographically, instead of keeping the
    /// order in which the automaton yields them.
    pub fn sort_followers(mut self) -> Self {
        self.sort_followers = true;
        self
    }

    /// Formats `nfa`, where states are titled by `title`.
    pub fn format_with<N, T, F>(&self, nfa: &N, title: F) -> String
    where
        N: Nfa,
        T: Show,
        F: Fn(&N::State) -> T,
    {
        let names = unique_names(nfa, title);
        names
            .iter()
            .filter_map(|(q, name)| {
                let mut followers = nfa
                    .followers(q)
                    .map(|f| names.get(&f).cloned().unwrap_or_else(|| None::<&str>.show()))
                    .collect_vec();
                if followers.is_empty() {
                    return None;
                }
                if self.sort_followers {
                    followers.sort();
                }
                Some(format!("{name} -> {}", followers.join(", ")))
            })
            .join("\n")
    }

    /// Formats `nfa`, using the states themselves as titles.
    pub fn format<N>(&self, nfa: &N) -> String
    where
        N: Nfa,
        N::State: Show,
    {
        self.format_with(nfa, |q| q.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn states_without_followers_are_omitted() {
        let mut nfa = NFA::new("start", "stop");
        let a = nfa.add_state("a");
        nfa.set_followers(0, vec![a]);
        nfa.set_followers(a, vec![a, 1]);

        let formatter = ListFormatter::default();
        assert_eq!(
            formatter.format_with(&nfa, |q| nfa.label(*q)),
            "start -> a\na -> a, stop"
        );
        assert_eq!(formatter.format(&nfa), "0 -> 2\n2 -> 2, 1");
    }

    #[test]
    fn missing_titles_are_placeholders() {
        let mut nfa = NFA::new("start", "stop");
        let a = nfa.add_state("a");
        nfa.set_followers(0, vec![a]);
        nfa.set_followers(a, vec![1]);

        let listing = ListFormatter::default()
            .format_with(&nfa, |q| nfa.label(*q).filter(|l| **l != "a"));
        assert_eq!(listing, "start -> null\nnull -> stop");
    }
}
