//! Provides methods and types to facilitate the compilation of a parsed
//! pattern tree into a runnable automaton.
//!
//! # Example
//!
//! ```
//! use mygrep_compiler::ast::RegexNode;
//! use mygrep_compiler::compile;
//! use mygrep_runtime::matcher;
//!
//! // approximate to `ab`
//! let tree = RegexNode::capturing_group(vec![
//!     RegexNode::literal(b'a'),
//!     RegexNode::literal(b'b'),
//! ]);
//!
//! let re = compile(tree).expect("failed to compile");
//!
//! assert!(matcher::matches(b"ab", &re));
//! assert!(!matcher::matches(b"ba", &re));
//! ```

use mygrep_runtime::{CompiledRegex, GroupLabel, StateGraph, StateId, Transitioner};

use super::ast;

/// Defines a trait for implementing compilation from a regex ast to a
/// lowered output type.
pub trait Lowerable<INPUT, OUTPUT> {
    type Error;

    fn lower(&mut self, input: INPUT) -> Result<OUTPUT, Self::Error>;
}

/// Accepts a parsed tree and compiles it into an automaton runnable with
/// the mygrep-runtime crate. Capturing constructs are numbered in order of
/// their opening, starting from the whole-match group.
pub fn compile(root: ast::RegexNode) -> Result<CompiledRegex, String> {
    NfaBuilder::default().lower(root)
}

/// The initial and accepting states of one compiled subtree. Construction
/// always yields a fresh pair; composition happens by merging or linking
/// pairs of fragments.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    initial: StateId,
    accepting: StateId,
}

/// Walks the tree emitting states into a single arena, threading the
/// capture-group counter through in preorder so labels read left to right.
#[derive(Debug, Default)]
struct NfaBuilder {
    graph: StateGraph,
    next_group: usize,
}

impl Lowerable<ast::RegexNode, CompiledRegex> for NfaBuilder {
    type Error = String;

    fn lower(&mut self, input: ast::RegexNode) -> Result<CompiledRegex, Self::Error> {
        let fragment = self.lower_node(input)?;
        let graph = std::mem::take(&mut self.graph);

        Ok(CompiledRegex::from_raw_parts(
            graph,
            fragment.initial,
            fragment.accepting,
        ))
    }
}

impl NfaBuilder {
    fn lower_node(&mut self, node: ast::RegexNode) -> Result<Fragment, String> {
        let ast::RegexNode { kind, quantifier } = node;

        let fragment = match kind {
            ast::NodeKind::Match(matcher) => self.lower_edge(Transitioner::Byte(matcher)),
            ast::NodeKind::CaretAnchor => self.lower_edge(Transitioner::StartOfString),
            ast::NodeKind::DollarAnchor => self.lower_edge(Transitioner::EndOfString),
            ast::NodeKind::Backreference(label) => {
                self.lower_edge(Transitioner::Backreference(label))
            }
            ast::NodeKind::Group(group) => self.lower_group(group)?,
            ast::NodeKind::Alternation(alternation) => self.lower_alternation(alternation)?,
        };

        Ok(self.apply_quantifier(fragment, quantifier))
    }

    /// Two fresh states joined by a single transition.
    fn lower_edge(&mut self, transitioner: Transitioner) -> Fragment {
        let initial = self.graph.insert_state_mut();
        let accepting = self.graph.insert_state_mut();
        self.graph
            .append_transition_mut(initial, accepting, transitioner);

        Fragment { initial, accepting }
    }

    fn lower_group(&mut self, group: ast::GroupNode) -> Result<Fragment, String> {
        // claimed before any child so containing groups take lower numbers.
        let label = self.claim_label(group.capturing, group.label);

        let mut children = group.children.into_iter();
        let fragment = match children.next() {
            // an empty group still matches the empty string.
            None => self.lower_edge(Transitioner::Epsilon),
            Some(first) => {
                let mut fragment = self.lower_node(first)?;

                for child in children {
                    let next = self.lower_node(child)?;
                    // the running accepting state becomes the next
                    // fragment's entry point.
                    self.graph.merge_states_mut(fragment.accepting, next.initial);
                    fragment.accepting = next.accepting;
                }

                fragment
            }
        };

        if let Some(label) = label {
            self.annotate_capture(&fragment, label);
        }

        Ok(fragment)
    }

    fn lower_alternation(&mut self, alternation: ast::AlternationNode) -> Result<Fragment, String> {
        let label = self.claim_label(alternation.capturing, alternation.label);

        let initial = self.graph.insert_state_mut();
        let accepting = self.graph.insert_state_mut();
        let fragment = Fragment { initial, accepting };

        for alternative in alternation.alternatives {
            let alt = self.lower_node(alternative)?;

            self.graph
                .append_transition_mut(initial, alt.initial, Transitioner::Epsilon);
            self.graph
                .append_transition_mut(alt.accepting, accepting, Transitioner::Epsilon);
        }

        if let Some(label) = label {
            self.annotate_capture(&fragment, label);
        }

        Ok(fragment)
    }

    /// Wraps a compiled fragment per its quantifier. The repeat epsilon is
    /// inserted ahead of the exit epsilon, and a fragment's own consuming
    /// transitions precede the optional skip, so the matcher repeats and
    /// consumes greedily.
    fn apply_quantifier(&mut self, fragment: Fragment, quantifier: ast::Quantifier) -> Fragment {
        match quantifier {
            ast::Quantifier::None => fragment,
            ast::Quantifier::Plus => {
                let initial = self.graph.insert_state_mut();
                let accepting = self.graph.insert_state_mut();

                self.graph
                    .append_transition_mut(initial, fragment.initial, Transitioner::Epsilon);
                self.graph.append_transition_mut(
                    fragment.accepting,
                    fragment.initial,
                    Transitioner::Epsilon,
                );
                self.graph.append_transition_mut(
                    fragment.accepting,
                    accepting,
                    Transitioner::Epsilon,
                );

                Fragment { initial, accepting }
            }
            ast::Quantifier::Optional => {
                self.graph.append_transition_mut(
                    fragment.initial,
                    fragment.accepting,
                    Transitioner::Epsilon,
                );

                fragment
            }
        }
    }

    /// Yields the label a capturing construct records under: the explicit
    /// label when one is present, otherwise the next free group number.
    fn claim_label(&mut self, capturing: bool, explicit: Option<GroupLabel>) -> Option<GroupLabel> {
        if !capturing {
            return None;
        }

        Some(explicit.unwrap_or_else(|| {
            let label = self.next_group.to_string();
            self.next_group += 1;
            label
        }))
    }

    fn annotate_capture(&mut self, fragment: &Fragment, label: GroupLabel) {
        self.graph
            .append_starting_group_mut(fragment.initial, label.clone());
        self.graph
            .append_ending_group_mut(fragment.accepting, label);
    }
}
