//! The backtracking executor. A compiled automaton is evaluated against an
//! input buffer by an explicit depth-first search over
//! (position, state, capture) configurations, trying transitions in the
//! order the compiler listed them so that greediness falls out of edge
//! ordering alone.

use std::collections::HashMap;

use crate::{CaptureMap, CompiledRegex, GroupLabel, GroupSpan, StateId, StateSet};

/// The unit of work on the backtracking stack.
#[derive(Debug, Clone)]
struct SearchState {
    /// Current input position.
    idx: usize,
    /// Current automaton state.
    state: StateId,
    /// States reached from the current position through zero-width
    /// transitions only. Bounds epsilon cycles; reset whenever input is
    /// consumed, since the configuration is then genuinely new.
    epsilon_visited: StateSet,
    /// Groups whose start has been recorded on this branch.
    open_groups: CaptureMap,
    /// Groups closed on this branch; the source of truth for
    /// backreference resolution.
    captured: CaptureMap,
}

/// Returns true if the pattern matches anywhere in the input, trying every
/// starting position from `0` through `input.len()` inclusive, so that
/// zero-width patterns can still match at the end of input.
///
/// # Example
///
/// ```
/// use mygrep_runtime::{matcher, ByteMatcher, CompiledRegex, StateGraph, Transitioner};
///
/// let mut graph = StateGraph::new();
/// let s0 = graph.insert_state_mut();
/// let s1 = graph.insert_state_mut();
/// graph.append_transition_mut(s0, s1, Transitioner::Byte(ByteMatcher::Literal(b'a')));
/// let re = CompiledRegex::from_raw_parts(graph, s0, s1);
///
/// assert!(matcher::matches(b"cat", &re));
/// assert!(!matcher::matches(b"dog", &re));
/// ```
pub fn matches(input: &[u8], re: &CompiledRegex) -> bool {
    (0..=input.len()).any(|i| match_at(i, input, re).is_some())
}

/// Runs the pattern against the input and returns the capture groups of the
/// first successful starting position, as borrowed slices keyed by group
/// label. Group `"0"` holds the whole match. Returns `None` when no
/// position matches.
pub fn match_with_captures<'a>(
    input: &'a [u8],
    re: &CompiledRegex,
) -> Option<HashMap<GroupLabel, &'a [u8]>> {
    log::trace!("searching for accepting state {}", re.accepting_state());

    for i in 0..=input.len() {
        if let Some(captured) = match_at(i, input, re) {
            log::trace!("match found starting at {}", i);

            let captures = captured
                .into_iter()
                .filter_map(|(label, span)| match span {
                    GroupSpan::Complete { start, end } => Some((label, &input[start..end])),
                    GroupSpan::Open { .. } => None,
                })
                .collect();

            return Some(captures);
        }
    }

    None
}

/// Backtracking search for a match beginning exactly at position `i`.
/// Returns the closed capture groups of the accepting branch.
fn match_at(i: usize, input: &[u8], re: &CompiledRegex) -> Option<CaptureMap> {
    let state_cnt = re.graph().state_cnt();

    let mut stack = vec![SearchState {
        idx: i,
        state: re.initial_state(),
        epsilon_visited: StateSet::new(state_cnt),
        open_groups: CaptureMap::new(),
        captured: CaptureMap::new(),
    }];

    while let Some(mut current) = stack.pop() {
        let state = &re.graph()[current.state];

        for label in &state.starting_groups {
            current
                .open_groups
                .insert(label.clone(), GroupSpan::open(current.idx));
        }

        for label in &state.ending_groups {
            if let Some(span) = current.open_groups.get_mut(label) {
                let closed = GroupSpan::complete(span.start(), current.idx);
                *span = closed;
                current.captured.insert(label.clone(), closed);
            }
        }

        if current.state == re.accepting_state() {
            return Some(current.captured);
        }

        // walked in reverse so that popping from the stack tries the
        // first-listed transition first.
        for transition in state.transitions.iter().rev() {
            let open_groups = current.open_groups.clone();
            let captured = current.captured.clone();

            match transition
                .transitioner
                .evaluate(input, current.idx, &captured)
            {
                Some(consumed) if consumed > 0 => stack.push(SearchState {
                    idx: current.idx + consumed,
                    state: transition.to,
                    epsilon_visited: StateSet::new(state_cnt),
                    open_groups,
                    captured,
                }),
                Some(_) => {
                    if current.epsilon_visited.contains(&transition.to) {
                        continue;
                    }

                    let mut epsilon_visited = current.epsilon_visited.clone();
                    epsilon_visited.insert(transition.to);

                    stack.push(SearchState {
                        idx: current.idx,
                        state: transition.to,
                        epsilon_visited,
                        open_groups,
                        captured,
                    })
                }
                None => (),
            }
        }
    }

    None
}
