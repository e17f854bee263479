//! The tree representation a pattern parses into. Nodes carry their own
//! quantifier; grouping constructs additionally carry whether they capture
//! and an optional explicit label overriding the compiler's numbering.

use mygrep_runtime::{ByteMatcher, GroupLabel};

/// A repetition marker attached to every node. `Plus` and `Optional` are
/// never co-applied by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantifier {
    #[default]
    None,
    /// one or more, `+`
    Plus,
    /// zero or one, `?`
    Optional,
}

/// A single node of the parsed pattern tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexNode {
    pub kind: NodeKind,
    pub quantifier: Quantifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Consumes one input byte accepted by the matcher.
    Match(ByteMatcher),
    /// Zero-width, matches at input position 0.
    CaretAnchor,
    /// Zero-width, matches at the end of input.
    DollarAnchor,
    /// Consumes the bytes previously captured under the labeled group.
    Backreference(GroupLabel),
    /// Concatenation of children, optionally recording a capture.
    Group(GroupNode),
    /// Matches if any one alternative matches, optionally recording a
    /// capture.
    Alternation(AlternationNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub children: Vec<RegexNode>,
    pub capturing: bool,
    pub label: Option<GroupLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternationNode {
    pub alternatives: Vec<RegexNode>,
    pub capturing: bool,
    pub label: Option<GroupLabel>,
}

impl RegexNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            quantifier: Quantifier::None,
        }
    }

    /// A node consuming a single byte via the given matcher.
    pub fn matching(matcher: ByteMatcher) -> Self {
        Self::new(NodeKind::Match(matcher))
    }

    /// A node consuming one exact byte.
    pub fn literal(value: u8) -> Self {
        Self::matching(ByteMatcher::Literal(value))
    }

    pub fn caret_anchor() -> Self {
        Self::new(NodeKind::CaretAnchor)
    }

    pub fn dollar_anchor() -> Self {
        Self::new(NodeKind::DollarAnchor)
    }

    pub fn backreference(label: impl Into<GroupLabel>) -> Self {
        Self::new(NodeKind::Backreference(label.into()))
    }

    /// A non-capturing concatenation of the given children.
    pub fn group(children: Vec<RegexNode>) -> Self {
        Self::new(NodeKind::Group(GroupNode {
            children,
            capturing: false,
            label: None,
        }))
    }

    /// A capturing concatenation of the given children.
    pub fn capturing_group(children: Vec<RegexNode>) -> Self {
        Self::new(NodeKind::Group(GroupNode {
            children,
            capturing: true,
            label: None,
        }))
    }

    /// A non-capturing alternation over the given alternatives.
    pub fn alternation(alternatives: Vec<RegexNode>) -> Self {
        Self::new(NodeKind::Alternation(AlternationNode {
            alternatives,
            capturing: false,
            label: None,
        }))
    }

    /// Attaches a quantifier to the node, replacing any previous one.
    pub fn with_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    /// Flips a plain grouping construct to capturing. Nodes that already
    /// capture, carry a quantifier, or are not grouping constructs are
    /// wrapped in a fresh capturing group instead, so nesting such as
    /// `((a))` records one capture per pair of parentheses.
    pub fn into_capturing(self) -> Self {
        match self {
            RegexNode {
                kind: NodeKind::Group(mut group),
                quantifier: Quantifier::None,
            } if !group.capturing => {
                group.capturing = true;
                RegexNode::new(NodeKind::Group(group))
            }
            RegexNode {
                kind: NodeKind::Alternation(mut alternation),
                quantifier: Quantifier::None,
            } if !alternation.capturing => {
                alternation.capturing = true;
                RegexNode::new(NodeKind::Alternation(alternation))
            }
            other => Self::capturing_group(vec![other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_unquantified_nodes() {
        assert_eq!(Quantifier::None, RegexNode::literal(b'a').quantifier);
        assert_eq!(
            Quantifier::Plus,
            RegexNode::literal(b'a')
                .with_quantifier(Quantifier::Plus)
                .quantifier
        );
    }

    #[test]
    fn should_promote_groups_in_place_when_capturing() {
        let promoted = RegexNode::group(vec![RegexNode::literal(b'a')]).into_capturing();

        match promoted.kind {
            NodeKind::Group(group) => {
                assert!(group.capturing);
                assert_eq!(1, group.children.len());
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn should_nest_rather_than_flip_capturing_groups() {
        let inner = RegexNode::capturing_group(vec![RegexNode::literal(b'a')]);
        let outer = inner.clone().into_capturing();

        match outer.kind {
            NodeKind::Group(group) => {
                assert!(group.capturing);
                assert_eq!(vec![inner], group.children);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn should_wrap_non_grouping_nodes_when_capturing() {
        let wrapped = RegexNode::literal(b'a').into_capturing();

        match wrapped.kind {
            NodeKind::Group(group) => {
                assert!(group.capturing);
                assert_eq!(vec![RegexNode::literal(b'a')], group.children);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }
}
