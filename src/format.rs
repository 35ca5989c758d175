//! Every formatter first assigns a unique name to each reachable state, see [`unique_names`],
//! and then renders the automaton in terms of those names. The output is therefore
//! deterministic for a given automaton and title function.

mod names;
pub use names::unique_names;

mod list;
pub use list::ListFormatter;

mod graph;
pub use graph::GraphFormatter;

mod table;
pub use table::TableFormatter;
