//! Parses a pattern string into the [`ast::RegexNode`] tree. The grammar is
//! expressed as parcel combinators over position-tagged bytes:
//!
//! ```text
//! regex       := alternation EOF
//! alternation := sequence ('|' sequence)*
//! sequence    := term*
//! term        := atom quantifier?
//! atom        := '^' | '$' | '.' | group | char_class | escape | literal
//! group       := '(' alternation ')'
//! char_class  := '[' '^'? class_item+ ']'
//! class_item  := escaped_byte | byte '-' byte | byte
//! escape      := '\' ('d' | 'w' | digit+ | any_other_byte)
//! quantifier  := '+' | '?'
//! ```
//!
//! Combinators surface failure as a position rather than a cause, so when a
//! parse fails (or leaves input unconsumed) a single classification pass
//! over the raw pattern recovers the precise error.

use parcel::prelude::v1::*;

use mygrep_runtime::{ByteAlphabet, ByteMatcher, ByteSet};

use super::ast;

/// The reasons a pattern can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErr {
    /// The pattern ended in the middle of an escape sequence.
    IncompleteEscape,
    /// A group was opened and never closed.
    UnmatchedOpenParen,
    /// A character class was opened and never closed.
    UnmatchedOpenBracket,
    /// A character class closed without any members.
    EmptyCharacterClass,
    /// A class range introduced a lower bound and then ended.
    UnterminatedRange,
    /// A byte that no construct can begin with, at the given offset.
    UnexpectedByte { offset: usize },
    /// A failure with no more precise classification.
    Undefined(String),
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteEscape => write!(f, "incomplete escape at end of pattern"),
            Self::UnmatchedOpenParen => write!(f, "unmatched '(' in pattern"),
            Self::UnmatchedOpenBracket => write!(f, "unmatched '[' in character class"),
            Self::EmptyCharacterClass => write!(f, "empty character class"),
            Self::UnterminatedRange => write!(f, "unterminated range in character class"),
            Self::UnexpectedByte { offset } => {
                write!(f, "unexpected byte at offset {}", offset)
            }
            Self::Undefined(err) => write!(f, "undefined parse error: {}", err),
        }
    }
}

impl std::error::Error for ParseErr {}

/// Parses a pattern into its tree form, consuming the full input. The
/// result is always a capturing group (the whole-match group).
pub fn parse(pattern: &str) -> Result<ast::RegexNode, ParseErr> {
    let input: Vec<(usize, u8)> = pattern.bytes().enumerate().collect();

    match regex().parse(&input) {
        Ok(MatchStatus::Match {
            remainder, inner, ..
        }) if remainder.is_empty() => Ok(inner),
        Ok(MatchStatus::Match { remainder, .. }) => {
            let offset = remainder
                .first()
                .map(|&(pos, _)| pos)
                .unwrap_or(pattern.len());
            Err(classify_invalid(pattern.as_bytes())
                .unwrap_or(ParseErr::UnexpectedByte { offset }))
        }
        Ok(MatchStatus::NoMatch(remainder)) => {
            let offset = remainder.first().map(|&(pos, _)| pos).unwrap_or(0);
            Err(classify_invalid(pattern.as_bytes())
                .unwrap_or(ParseErr::UnexpectedByte { offset }))
        }
        Err(err) => Err(ParseErr::Undefined(format!(
            "unspecified parse error occured: {}",
            err
        ))),
    }
}

fn regex<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    alternation().map(|body| match body {
        // a plain sequence becomes the children of the whole-match group
        // directly.
        ast::RegexNode {
            kind: ast::NodeKind::Group(mut group),
            quantifier: ast::Quantifier::None,
        } if !group.capturing => {
            group.capturing = true;
            ast::RegexNode {
                kind: ast::NodeKind::Group(group),
                quantifier: ast::Quantifier::None,
            }
        }
        other => ast::RegexNode::capturing_group(vec![other]),
    })
}

// Alternation

fn alternation<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::join(
        sequence(),
        parcel::zero_or_more(parcel::right(parcel::join(expect_byte(b'|'), sequence()))),
    )
    .map(|(head, tail)| {
        if tail.is_empty() {
            head
        } else {
            let alternatives = std::iter::once(head).chain(tail).collect();
            ast::RegexNode::alternation(alternatives)
        }
    })
}

/// A run of terms. A single term stands for itself; any other count is
/// wrapped in a non-capturing group to preserve ordering.
fn sequence<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::zero_or_more(term()).map(|mut terms| {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            ast::RegexNode::group(terms)
        }
    })
}

// Terms

fn term<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::join(atom(), parcel::optional(quantifier())).map(|(node, quantifier)| {
        match quantifier {
            Some(quantifier) => node.with_quantifier(quantifier),
            None => node,
        }
    })
}

fn atom<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::or(caret_anchor(), || {
        parcel::or(dollar_anchor(), || {
            parcel::or(wildcard(), || {
                parcel::or(group(), || {
                    parcel::or(character_class(), || {
                        parcel::or(escape(), || literal())
                    })
                })
            })
        })
    })
}

fn caret_anchor<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    expect_byte(b'^').map(|_| ast::RegexNode::caret_anchor())
}

fn dollar_anchor<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    expect_byte(b'$').map(|_| ast::RegexNode::dollar_anchor())
}

fn wildcard<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    expect_byte(b'.').map(|_| ast::RegexNode::matching(ByteMatcher::Any))
}

/// Any byte that cannot begin another construct stands for itself.
fn literal<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    any_byte()
        .predicate(|b| ![b'(', b')', b'[', b'|', b'\\'].contains(b))
        .map(ast::RegexNode::literal)
}

// Groups

fn group<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    // the body parser is built behind and_then to defer construction of the
    // recursive alternation until a '(' has actually been consumed.
    expect_byte(b'(').and_then(|_| {
        parcel::left(parcel::join(alternation(), expect_byte(b')')))
            .map(ast::RegexNode::into_capturing)
    })
}

// Character Classes

enum ClassItem {
    Byte(u8),
    Range(u8, u8),
}

fn character_class<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::right(parcel::join(
        expect_byte(b'['),
        parcel::left(parcel::join(
            parcel::join(
                parcel::optional(expect_byte(b'^')).map(|negation| negation.is_some()),
                parcel::one_or_more(class_item()),
            ),
            expect_byte(b']'),
        )),
    ))
    .map(|(negated, items)| {
        let mut bytes = vec![];
        let mut ranges = vec![];
        for item in items {
            match item {
                ClassItem::Byte(b) => bytes.push(b),
                ClassItem::Range(lo, hi) => ranges.push(lo..=hi),
            }
        }

        let alphabet = match (bytes.is_empty(), ranges.is_empty()) {
            (false, true) => ByteAlphabet::Explicit(bytes),
            (true, false) => ByteAlphabet::Ranges(ranges),
            _ => ByteAlphabet::join(vec![
                ByteAlphabet::Explicit(bytes),
                ByteAlphabet::Ranges(ranges),
            ]),
        };

        let set = if negated {
            ByteSet::exclusive(alphabet)
        } else {
            ByteSet::inclusive(alphabet)
        };

        ast::RegexNode::matching(ByteMatcher::Set(set))
    })
}

fn class_item<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ClassItem> {
    parcel::or(class_escape(), || {
        parcel::or(class_range(), || class_member().map(ClassItem::Byte))
    })
}

/// Escapes inside a class always denote the escaped byte itself; there are
/// no `\d`/`\w` classes within brackets, and an escaped byte never forms a
/// range endpoint.
fn class_escape<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ClassItem> {
    parcel::right(parcel::join(expect_byte(b'\\'), any_byte())).map(ClassItem::Byte)
}

fn class_range<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ClassItem> {
    parcel::join(
        class_member(),
        parcel::right(parcel::join(expect_byte(b'-'), class_member())),
    )
    .map(|(lower_bound, upper_bound)| {
        if lower_bound <= upper_bound {
            ClassItem::Range(lower_bound, upper_bound)
        } else {
            ClassItem::Range(upper_bound, lower_bound)
        }
    })
}

fn class_member<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], u8> {
    any_byte().predicate(|b| *b != b']' && *b != b'\\')
}

// Escapes

fn escape<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::right(parcel::join(expect_byte(b'\\'), escaped_item()))
}

fn escaped_item<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::or(
        expect_byte(b'd').map(|_| ast::RegexNode::matching(ByteMatcher::Set(ByteSet::digit()))),
        || {
            parcel::or(
                expect_byte(b'w')
                    .map(|_| ast::RegexNode::matching(ByteMatcher::Set(ByteSet::word()))),
                || parcel::or(backreference(), || any_byte().map(ast::RegexNode::literal)),
            )
        },
    )
}

/// One or more decimal digits following the backslash, consumed greedily:
/// `\12` references group twelve, not group one followed by a literal `2`.
fn backreference<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::RegexNode> {
    parcel::one_or_more(decimal_digit()).map(|digits| {
        let label: String = digits.into_iter().map(char::from).collect();
        ast::RegexNode::backreference(label)
    })
}

// Quantifiers

fn quantifier<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], ast::Quantifier> {
    parcel::or(expect_byte(b'+').map(|_| ast::Quantifier::Plus), || {
        expect_byte(b'?').map(|_| ast::Quantifier::Optional)
    })
}

// Terminals

fn expect_byte<'a>(expected: u8) -> impl parcel::Parser<'a, &'a [(usize, u8)], u8> {
    move |input: &'a [(usize, u8)]| match input.first() {
        Some(&(pos, b)) if b == expected => Ok(MatchStatus::Match {
            span: pos..pos + 1,
            remainder: &input[1..],
            inner: b,
        }),
        _ => Ok(MatchStatus::NoMatch(input)),
    }
}

fn any_byte<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], u8> {
    move |input: &'a [(usize, u8)]| match input.first() {
        Some(&(pos, b)) => Ok(MatchStatus::Match {
            span: pos..pos + 1,
            remainder: &input[1..],
            inner: b,
        }),
        None => Ok(MatchStatus::NoMatch(input)),
    }
}

fn decimal_digit<'a>() -> impl parcel::Parser<'a, &'a [(usize, u8)], u8> {
    any_byte().predicate(|b| b.is_ascii_digit())
}

// Failure classification

/// Walks a pattern the combinators rejected and names the first
/// malformation a committed recursive descent would have reported. Returns
/// `None` when nothing structural is wrong (e.g. a stray `)`), in which
/// case the caller falls back to the unexpected-byte error.
fn classify_invalid(pattern: &[u8]) -> Option<ParseErr> {
    let mut open_parens = 0usize;
    let mut idx = 0;

    while idx < pattern.len() {
        match pattern[idx] {
            b'\\' => {
                if idx + 1 >= pattern.len() {
                    return Some(ParseErr::IncompleteEscape);
                }
                idx += 2;
            }
            b'(' => {
                open_parens += 1;
                idx += 1;
            }
            b')' => {
                if open_parens == 0 {
                    return None;
                }
                open_parens -= 1;
                idx += 1;
            }
            b'[' => {
                idx += 1;
                if let Some(err) = classify_class(pattern, &mut idx) {
                    return Some(err);
                }
            }
            _ => idx += 1,
        }
    }

    if open_parens > 0 {
        return Some(ParseErr::UnmatchedOpenParen);
    }

    None
}

/// Scans a class body starting just past its `[`, advancing `idx` past the
/// closing `]` on success.
fn classify_class(pattern: &[u8], idx: &mut usize) -> Option<ParseErr> {
    if pattern.get(*idx) == Some(&b'^') {
        *idx += 1;
    }

    let mut members = 0usize;
    loop {
        match pattern.get(*idx) {
            None => return Some(ParseErr::UnmatchedOpenBracket),
            Some(b']') if members == 0 => return Some(ParseErr::EmptyCharacterClass),
            Some(b']') => {
                *idx += 1;
                return None;
            }
            Some(b'\\') => {
                if *idx + 1 >= pattern.len() {
                    return Some(ParseErr::IncompleteEscape);
                }
                members += 1;
                *idx += 2;
            }
            Some(_) => {
                members += 1;
                *idx += 1;

                if pattern.get(*idx) == Some(&b'-') {
                    *idx += 1;
                    match pattern.get(*idx) {
                        None => return Some(ParseErr::UnterminatedRange),
                        // a dash right before ']' or an escape is a plain
                        // member, re-examined by the loop.
                        Some(b']') | Some(b'\\') => members += 1,
                        Some(_) => {
                            members += 1;
                            *idx += 1;
                        }
                    }
                }
            }
        }
    }
}
