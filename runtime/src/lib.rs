//! Provides the automaton model and execution engine for compiled regular
//! expressions: byte matchers, the NFA state graph, and the backtracking
//! matcher that evaluates a [`CompiledRegex`] against an input buffer.
//!
//! # Example
//!
//! ```rust
//! use mygrep_runtime::{
//!     matcher, ByteMatcher, CompiledRegex, StateGraph, Transitioner,
//! };
//!
//! // Hand-build the automaton for the pattern `ab`.
//! let mut graph = StateGraph::new();
//! let s0 = graph.insert_state_mut();
//! let s1 = graph.insert_state_mut();
//! let s2 = graph.insert_state_mut();
//! graph.append_transition_mut(s0, s1, Transitioner::Byte(ByteMatcher::Literal(b'a')));
//! graph.append_transition_mut(s1, s2, Transitioner::Byte(ByteMatcher::Literal(b'b')));
//!
//! let re = CompiledRegex::from_raw_parts(graph, s0, s2);
//!
//! assert!(matcher::matches(b"ab", &re));
//! assert!(matcher::matches(b"xxabxx", &re));
//! assert!(!matcher::matches(b"ba", &re));
//! ```

use std::collections::HashMap;
use std::fmt::Display;

pub mod matcher;
mod sparse_set;

pub use sparse_set::StateSet;

/// The label under which a capture group records its span. Groups are
/// numbered left-to-right from the opening parenthesis, as decimal strings;
/// the whole pattern is group `"0"`.
pub type GroupLabel = String;

/// Represents a type that can be used as a comparative byte set.
trait ByteRangeSetVerifiable {
    fn in_set(&self, value: u8) -> bool;

    fn not_in_set(&self, value: u8) -> bool {
        !self.in_set(value)
    }
}

impl ByteRangeSetVerifiable for std::ops::RangeInclusive<u8> {
    fn in_set(&self, value: u8) -> bool {
        self.contains(&value)
    }
}

impl ByteRangeSetVerifiable for u8 {
    fn in_set(&self, value: u8) -> bool {
        *self == value
    }
}

impl<BRSV: ByteRangeSetVerifiable> ByteRangeSetVerifiable for Vec<BRSV> {
    fn in_set(&self, value: u8) -> bool {
        self.iter().any(|r| r.in_set(value))
    }
}

/// Denotes whether a given set is inclusive or exclusive to a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetMembership {
    /// States that a set is inclusive of a value, i.e. the value is a member
    /// of the set.
    Inclusive,
    /// States that a set is exclusive of a value, i.e. the value is not a
    /// member of the set.
    Exclusive,
}

/// Represents a runtime dispatchable set of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteAlphabet {
    /// Represents a range of values i.e. `0-9`, `a-z`, `A-Z`, etc...
    Range(std::ops::RangeInclusive<u8>),
    /// Represents an explicitly defined set of values. i.e. `[a,b,z]`
    Explicit(Vec<u8>),
    /// Represents a set of ranges of values i.e. `[0-9a-zA-Z]`, etc...
    Ranges(Vec<std::ops::RangeInclusive<u8>>),
}

impl ByteAlphabet {
    /// Joins a group of byte alphabets into a single `Ranges` variant
    /// alphabet, preserving the order members were listed in.
    pub fn join(sets: Vec<Self>) -> ByteAlphabet {
        let ranges = sets
            .into_iter()
            .flat_map(|set| match set {
                ByteAlphabet::Range(r) => vec![r],
                ByteAlphabet::Ranges(ranges) => ranges,
                ByteAlphabet::Explicit(explicit_bytes) => {
                    explicit_bytes.into_iter().map(|b| b..=b).collect()
                }
            })
            .collect();

        ByteAlphabet::Ranges(ranges)
    }
}

impl ByteRangeSetVerifiable for ByteAlphabet {
    fn in_set(&self, value: u8) -> bool {
        match self {
            ByteAlphabet::Range(r) => r.in_set(value),
            ByteAlphabet::Explicit(v) => v.in_set(value),
            ByteAlphabet::Ranges(ranges) => ranges.in_set(value),
        }
    }
}

impl Display for ByteAlphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn render_range(
            f: &mut std::fmt::Formatter<'_>,
            r: &std::ops::RangeInclusive<u8>,
        ) -> std::fmt::Result {
            if r.start() == r.end() {
                write!(f, "{}", char::from(*r.start()))
            } else {
                write!(f, "{}-{}", char::from(*r.start()), char::from(*r.end()))
            }
        }

        match self {
            ByteAlphabet::Range(r) => render_range(f, r),
            ByteAlphabet::Explicit(bytes) => {
                for b in bytes {
                    write!(f, "{}", char::from(*b))?;
                }
                Ok(())
            }
            ByteAlphabet::Ranges(ranges) => {
                for r in ranges {
                    render_range(f, r)?;
                }
                Ok(())
            }
        }
    }
}

/// Associates an alphabet of bytes with a set membership, forming a
/// character-class style byte set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSet {
    membership: SetMembership,
    set: ByteAlphabet,
}

impl ByteSet {
    pub fn inclusive(set: ByteAlphabet) -> Self {
        Self {
            membership: SetMembership::Inclusive,
            set,
        }
    }

    pub fn exclusive(set: ByteAlphabet) -> Self {
        Self {
            membership: SetMembership::Exclusive,
            set,
        }
    }

    pub fn invert_membership(self) -> Self {
        let Self { membership, set } = self;

        Self {
            membership: match membership {
                SetMembership::Inclusive => SetMembership::Exclusive,
                SetMembership::Exclusive => SetMembership::Inclusive,
            },
            set,
        }
    }

    /// The prebuilt decimal digit set, `0` through `9`.
    pub fn digit() -> Self {
        Self::inclusive(ByteAlphabet::Range(b'0'..=b'9'))
    }

    /// The prebuilt word set: underscore, ascii letters and decimal digits.
    pub fn word() -> Self {
        Self::inclusive(ByteAlphabet::Ranges(vec![
            b'_'..=b'_',
            b'a'..=b'z',
            b'A'..=b'Z',
            b'0'..=b'9',
        ]))
    }

    fn accepts(&self, value: u8) -> bool {
        self.in_set(value)
    }
}

impl ByteRangeSetVerifiable for ByteSet {
    fn in_set(&self, value: u8) -> bool {
        match &self.membership {
            SetMembership::Inclusive => self.set.in_set(value),
            SetMembership::Exclusive => self.set.not_in_set(value),
        }
    }
}

impl Display for ByteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.membership {
            SetMembership::Inclusive => write!(f, "[{}]", self.set),
            SetMembership::Exclusive => write!(f, "[^{}]", self.set),
        }
    }
}

/// The predicate attached to a byte-consuming transition, deciding whether a
/// single input byte is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteMatcher {
    /// Accepts exactly one given byte.
    Literal(u8),
    /// Accepts any byte the contained set accepts.
    Set(ByteSet),
    /// Accepts every byte.
    Any,
}

impl ByteMatcher {
    pub fn matches(&self, value: u8) -> bool {
        match self {
            ByteMatcher::Literal(b) => *b == value,
            ByteMatcher::Set(set) => set.accepts(value),
            ByteMatcher::Any => true,
        }
    }
}

impl Display for ByteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteMatcher::Literal(b) => write!(f, "{}", char::from(*b)),
            ByteMatcher::Set(set) => Display::fmt(set, f),
            ByteMatcher::Any => write!(f, "."),
        }
    }
}

/// The span recorded for a capture group on a single search branch. A group
/// opens when a state carrying its starting mark is visited and completes
/// when a state carrying its ending mark is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSpan {
    Open { start: usize },
    Complete { start: usize, end: usize },
}

impl GroupSpan {
    pub const fn open(start: usize) -> Self {
        Self::Open { start }
    }

    pub const fn complete(start: usize, end: usize) -> Self {
        Self::Complete { start, end }
    }

    /// Returns a boolean representing if the span has been closed.
    pub fn is_complete(&self) -> bool {
        matches!(self, GroupSpan::Complete { .. })
    }

    pub fn start(&self) -> usize {
        match self {
            GroupSpan::Open { start } | GroupSpan::Complete { start, .. } => *start,
        }
    }
}

/// The capture groups visible to a search branch, keyed by group label.
/// Backreference transitions resolve against completed spans only.
pub type CaptureMap = HashMap<GroupLabel, GroupSpan>;

/// The condition guarding an NFA edge. Evaluation yields the number of input
/// bytes the edge consumes, or `None` when the edge does not fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transitioner {
    /// Consumes one byte accepted by the matcher.
    Byte(ByteMatcher),
    /// Zero-width, always fires.
    Epsilon,
    /// Zero-width, fires at input position 0.
    StartOfString,
    /// Zero-width, fires at or past the end of input.
    EndOfString,
    /// Consumes the bytes previously captured under the label, provided the
    /// input at the current position repeats them exactly.
    Backreference(GroupLabel),
}

impl Transitioner {
    pub fn evaluate(&self, input: &[u8], pos: usize, captured: &CaptureMap) -> Option<usize> {
        match self {
            Transitioner::Byte(m) => (pos < input.len() && m.matches(input[pos])).then_some(1),
            Transitioner::Epsilon => Some(0),
            Transitioner::StartOfString => (pos == 0).then_some(0),
            Transitioner::EndOfString => (pos >= input.len()).then_some(0),
            Transitioner::Backreference(label) => {
                let (start, end) = match captured.get(label) {
                    Some(GroupSpan::Complete { start, end }) => (*start, *end),
                    _ => return None,
                };

                let len = end - start;
                let fits = pos + len <= input.len();

                (fits && input[start..end] == input[pos..pos + len]).then_some(len)
            }
        }
    }
}

impl Display for Transitioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transitioner::Byte(m) => Display::fmt(m, f),
            Transitioner::Epsilon => write!(f, "ε"),
            Transitioner::StartOfString => write!(f, "^"),
            Transitioner::EndOfString => write!(f, "$"),
            Transitioner::Backreference(label) => write!(f, "\\{}", label),
        }
    }
}

/// The index of a state within its owning [`StateGraph`].
pub type StateId = usize;

/// A directed edge between two states of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: StateId,
    pub transitioner: Transitioner,
}

/// A single NFA state: an ordered list of outgoing transitions plus the
/// groups that open or close when the state is visited. Transition order is
/// semantically significant, the matcher tries edges in listed order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct State {
    pub transitions: Vec<Transition>,
    pub starting_groups: Vec<GroupLabel>,
    pub ending_groups: Vec<GroupLabel>,
}

/// An append-only arena of NFA states. States reference each other by index,
/// which keeps cyclic automata (quantifier loops) in plain owned storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateGraph {
    states: Vec<State>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of states in the graph.
    pub fn state_cnt(&self) -> usize {
        self.states.len()
    }

    /// Borrows a state by its id if it exists in the graph.
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    /// Inserts a fresh state with no transitions, returning its id.
    pub fn insert_state_mut(&mut self) -> StateId {
        let next_id = self.state_cnt();
        self.states.push(State::default());

        next_id
    }

    /// Appends a transition from `source` to `target` guarded by the given
    /// transitioner.
    pub fn append_transition_mut(
        &mut self,
        source: StateId,
        target: StateId,
        transitioner: Transitioner,
    ) {
        self.states[source].transitions.push(Transition {
            to: target,
            transitioner,
        });
    }

    /// Inserts a transition ahead of `source`'s existing transitions, making
    /// it the first edge tried by the matcher.
    pub fn prepend_transition_mut(
        &mut self,
        source: StateId,
        target: StateId,
        transitioner: Transitioner,
    ) {
        self.states[source].transitions.insert(
            0,
            Transition {
                to: target,
                transitioner,
            },
        );
    }

    /// Marks a group as opening when the given state is visited.
    pub fn append_starting_group_mut(&mut self, state: StateId, label: GroupLabel) {
        self.states[state].starting_groups.push(label);
    }

    /// Marks a group as closing when the given state is visited.
    pub fn append_ending_group_mut(&mut self, state: StateId, label: GroupLabel) {
        self.states[state].ending_groups.push(label);
    }

    /// Transplants all transitions and group annotations of `src` onto
    /// `dst`, leaving `src` empty. Used to unify a fragment's entry state
    /// with the exit state of the fragment preceding it.
    pub fn merge_states_mut(&mut self, dst: StateId, src: StateId) {
        if dst == src {
            return;
        }

        let donor = std::mem::take(&mut self.states[src]);
        let target = &mut self.states[dst];

        target.transitions.extend(donor.transitions);
        target.starting_groups.extend(donor.starting_groups);
        target.ending_groups.extend(donor.ending_groups);
    }
}

impl std::ops::Index<StateId> for StateGraph {
    type Output = State;

    fn index(&self, index: StateId) -> &Self::Output {
        &self.states[index]
    }
}

/// A compiled regular expression: a state graph with its two distinguished
/// states pinned. Immutable once constructed, and safe to share across
/// threads that only run matches against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRegex {
    graph: StateGraph,
    initial: StateId,
    accepting: StateId,
}

impl CompiledRegex {
    /// Produces a compiled regex from its constituent parts.
    #[must_use]
    pub fn from_raw_parts(graph: StateGraph, initial: StateId, accepting: StateId) -> Self {
        Self {
            graph,
            initial,
            accepting,
        }
    }

    /// Returns a tuple representation of all composing parts of the regex.
    pub fn into_raw_parts(self) -> (StateGraph, StateId, StateId) {
        (self.graph, self.initial, self.accepting)
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn accepting_state(&self) -> StateId {
        self.accepting
    }

    /// Numbers every state reachable from the initial state `0, 1, 2, ...`
    /// in depth-first visitation order, following transitions in listed
    /// order. Returns a table indexed by [`StateId`]; unreachable states
    /// (such as the husks left behind by merging) map to `None`.
    pub fn assign_ids(&self) -> Vec<Option<usize>> {
        let mut ids = vec![None; self.graph.state_cnt()];
        let mut next_id = 0;
        let mut stack = vec![self.initial];

        while let Some(id) = stack.pop() {
            if ids[id].is_some() {
                continue;
            }

            ids[id] = Some(next_id);
            next_id += 1;

            // reversed so the first-listed transition is explored first.
            for transition in self.graph[id].transitions.iter().rev() {
                if ids[transition.to].is_none() {
                    stack.push(transition.to);
                }
            }
        }

        ids
    }
}

impl std::ops::Index<StateId> for CompiledRegex {
    type Output = State;

    fn index(&self, index: StateId) -> &Self::Output {
        &self.graph[index]
    }
}

impl Display for CompiledRegex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids = self.assign_ids();
        let id_of = |state: StateId| -> String {
            ids[state]
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string())
        };

        writeln!(
            f,
            "Start: {}, End: {}",
            id_of(self.initial),
            id_of(self.accepting)
        )?;
        writeln!(f, "Edges:")?;

        let mut visited = vec![false; self.graph.state_cnt()];
        let mut stack = vec![self.initial];
        while let Some(id) = stack.pop() {
            if visited[id] {
                continue;
            }
            visited[id] = true;

            let state = &self.graph[id];
            if !state.starting_groups.is_empty() || !state.ending_groups.is_empty() {
                writeln!(
                    f,
                    "Groups at state {}: start={:?}, end={:?}",
                    id_of(id),
                    state.starting_groups,
                    state.ending_groups
                )?;
            }

            for transition in &state.transitions {
                writeln!(
                    f,
                    "  {} --[{}]--> {}",
                    id_of(id),
                    transition.transitioner,
                    id_of(transition.to)
                )?;
            }

            for transition in state.transitions.iter().rev() {
                if !visited[transition.to] {
                    stack.push(transition.to);
                }
            }
        }

        Ok(())
    }
}

/// Deeply compares two compiled regexes for structural equality: a mapping
/// between reachable states must preserve group annotations (compared as
/// sorted multisets), transition count and order, destinations and
/// transitioner configuration. Primarily a test aid for comparing built
/// automata against hand-constructed expectations.
pub fn structurally_equal(left: &CompiledRegex, right: &CompiledRegex) -> bool {
    let mut mapped = HashMap::new();

    if !states_equal(
        left.graph(),
        right.graph(),
        left.initial_state(),
        right.initial_state(),
        &mut mapped,
    ) {
        return false;
    }

    match mapped.get(&left.accepting_state()) {
        Some(&counterpart) => counterpart == right.accepting_state(),
        // the accepting state was not reachable from the initial state,
        // compare the two accepting subgraphs directly.
        None => states_equal(
            left.graph(),
            right.graph(),
            left.accepting_state(),
            right.accepting_state(),
            &mut mapped,
        ),
    }
}

fn states_equal(
    left_graph: &StateGraph,
    right_graph: &StateGraph,
    left: StateId,
    right: StateId,
    mapped: &mut HashMap<StateId, StateId>,
) -> bool {
    if let Some(&counterpart) = mapped.get(&left) {
        return counterpart == right;
    }

    mapped.insert(left, right);

    let (ls, rs) = (&left_graph[left], &right_graph[right]);

    fn sorted(labels: &[GroupLabel]) -> Vec<GroupLabel> {
        let mut sorted_labels = labels.to_vec();
        sorted_labels.sort();
        sorted_labels
    }

    if sorted(&ls.starting_groups) != sorted(&rs.starting_groups)
        || sorted(&ls.ending_groups) != sorted(&rs.ending_groups)
    {
        return false;
    }

    if ls.transitions.len() != rs.transitions.len() {
        return false;
    }

    ls.transitions
        .iter()
        .zip(rs.transitions.iter())
        .all(|(lt, rt)| {
            lt.transitioner == rt.transitioner
                && states_equal(left_graph, right_graph, lt.to, rt.to, mapped)
        })
}
