use std::fmt::Display;

use itertools::Itertools;

use crate::{nfa::Nfa, Show};

use super::unique_names;

/// Renders an automaton in the DOT format of graphviz, see the
/// [graphviz documentation](https://graphviz.org/doc/info/lang.html). Every state becomes a node
/// labeled with its unique name and every state with followers contributes a single grouped edge
/// statement `a -> {b c}`.
#[derive(Debug, Clone)]
pub struct GraphFormatter {
    name: String,
    #[cfg_attr(not(feature = "graphviz"), allow(dead_code))]
    program: String,
}

impl Default for GraphFormatter {
    fn default() -> Self {
        Self {
            name: "NFA".into(),
            program: "dot".into(),
        }
    }
}

impl GraphFormatter {
    /// Sets the name of the produced digraph.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the layout executable used for rendering, `dot` by default. It is invoked as
    /// `<program> -Tpng -o <target> <source>`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Computes the DOT representation of `nfa`, where states are titled by `title`.
    pub fn dot_representation<N, T, F>(&self, nfa: &N, title: F) -> String
    where
        N: Nfa,
        T: Show,
        F: Fn(&N::State) -> T,
    {
        let names = unique_names(nfa, title);
        let ident = |q: &N::State| format!("n{}", names.get_index_of(q).unwrap_or(usize::MAX));

        let header = [
            format!("digraph {} {{", self.name),
            "rankdir=LR".to_string(),
        ];

        let (start, stop) = (nfa.start(), nfa.stop());
        let states = names.iter().map(|(q, name)| {
            let shape = if q == &start {
                "box"
            } else if q == &stop {
                "doublecircle"
            } else {
                "ellipse"
            };
            format!(
                "{} [{}]",
                ident(q),
                [
                    DotAttribute::Label(name.clone()),
                    DotAttribute::Shape(shape.into())
                ]
                .iter()
                .join(", ")
            )
        });

        let edges = names.keys().filter_map(|q| {
            let followers = nfa.followers(q).map(|f| ident(&f)).collect_vec();
            if followers.is_empty() {
                None
            } else {
                Some(format!("{} -> {{{}}}", ident(q), followers.join(" ")))
            }
        });

        header
            .into_iter()
            .chain(states)
            .chain(edges)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// Renders `nfa` as PNG and returns the encoded image. The image is produced by
    /// [`Self::render_to_file_name`] into a temporary file. Only available on the `graphviz`
    /// crate feature.
    #[cfg(feature = "graphviz")]
    pub fn render<N, T, F>(&self, nfa: &N, title: F) -> Result<Vec<u8>, std::io::Error>
    where
        N: Nfa,
        T: Show,
        F: Fn(&N::State) -> T,
    {
        let target = tempfile::Builder::new().suffix(".png").tempfile()?;
        self.render_to_file_name(nfa, title, target.path())?;
        std::fs::read(target.path())
    }

    /// Renders `nfa` as PNG into `target`. The DOT representation is handed to the layout
    /// program through a temporary file. Fails with [`std::io::ErrorKind::NotFound`] if the
    /// program is not installed. Only available on the `graphviz` crate feature.
    #[cfg(feature = "graphviz")]
    pub fn render_to_file_name<N, T, F>(
        &self,
        nfa: &N,
        title: F,
        target: impl AsRef<std::path::Path>,
    ) -> Result<(), std::io::Error>
    where
        N: Nfa,
        T: Show,
        F: Fn(&N::State) -> T,
    {
        use std::io::Write;
        use tracing::trace;

        let target = target.as_ref();
        let dot = self.dot_representation(nfa, title);
        let mut source = tempfile::Builder::new().suffix(".dot").tempfile()?;
        source.write_all(dot.as_bytes())?;
        source.flush()?;
        trace!("rendering {} with `{}`", target.display(), self.program);

        let status = std::process::Command::new(&self.program)
            .arg("-Tpng")
            .arg("-o")
            .arg(target)
            .arg(source.path())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!(
                    "`{}` could not render {}: {status}",
                    self.program,
                    target.display()
                ),
            ))
        }
    }
}

/// Attributes of a node in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
enum DotAttribute {
    Label(String),
    Shape(String),
}

impl Display for DotAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotAttribute::Label(s) => write!(f, "label=\"{}\"", escape(s)),
            DotAttribute::Shape(s) => write!(f, "shape=\"{s}\""),
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
