use crate::{math::OrderedMap, nfa::Nfa, Show};

/// Assigns a name to every state that is reachable from the start of `nfa`. States are visited
/// in the order of [`Nfa::reachable_states`] and named by the [`Show`] representation of `title`.
/// If a title is shared by multiple states, they are called `1:title`, `2:title` and so on in the
/// order in which they are visited. All states with the same title appear together in the returned
/// map, at the position where the title was first encountered.
pub fn unique_names<N, T, F>(nfa: &N, title: F) -> OrderedMap<N::State, String>
where
    N: Nfa,
    T: Show,
    F: Fn(&N::State) -> T,
{
    let mut groups: OrderedMap<String, Vec<N::State>> = OrderedMap::default();
    for q in nfa.reachable_states() {
        groups.entry(title(&q).show()).or_default().push(q);
    }

    let mut names = OrderedMap::default();
    for (title, states) in groups {
        if states.len() == 1 {
            names.extend(states.into_iter().map(|q| (q, title.clone())));
        } else {
            for (i, q) in states.into_iter().enumerate() {
                names.insert(q, format!("{}:{title}", i + 1));
            }
        }
    }
    names
}
