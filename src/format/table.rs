use itertools::Itertools;

use crate::{nfa::Nfa, Show};

use super::unique_names;

/// Renders an automaton as a table with one row per reachable state, listing the state's name
/// and its followers. This is easier to read than a list once automata grow larger.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormatter;

impl TableFormatter {
    /// Builds the table for `nfa`, where states are titled by `title`. States without followers
    /// are shown with a `-` in the second column.
    pub fn format_with<N, T, F>(&self, nfa: &N, title: F) -> String
    where
        N: Nfa,
        T: Show,
        F: Fn(&N::State) -> T,
    {
        let names = unique_names(nfa, title);
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["State", "Followers"]);
        for (q, name) in &names {
            let followers = nfa
                .followers(q)
                .filter_map(|f| names.get(&f))
                .join(", ");
            builder.push_record([
                name.clone(),
                if followers.is_empty() {
                    "-".to_string()
                } else {
                    followers
                },
            ]);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn one_row_per_state() {
        let mut nfa = NFA::new("start", "stop");
        let a = nfa.add_state("a");
        let b = nfa.add_state("b");
        nfa.set_followers(0, vec![a, b]);
        nfa.set_followers(a, vec![1]);
        nfa.set_followers(b, vec![b, 1]);

        let table = TableFormatter.format_with(&nfa, |q| nfa.label(*q));
        let rows = table
            .lines()
            .filter(|line| line.starts_with('│'))
            .map(|line| {
                line.split('│')
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                vec!["State", "Followers"],
                vec!["start", "a, b"],
                vec!["a", "stop"],
                vec!["stop", "-"],
                vec!["b", "b, stop"],
            ]
        );
    }
}
