use mygrep_compiler::{compile, parse};
use mygrep_runtime::{matcher, structurally_equal, CompiledRegex};

fn compile_pattern(pattern: &str) -> CompiledRegex {
    parse(pattern)
        .map_err(|e| e.to_string())
        .and_then(compile)
        .expect("failed to parse or compile pattern")
}

fn matches(input: &str, pattern: &str) -> bool {
    matcher::matches(input.as_bytes(), &compile_pattern(pattern))
}

#[test]
fn should_match_literal_and_class_scenarios() {
    let input_output = vec![
        ("\\", "\\\\", true),
        ("123", "\\d", true),
        ("123", "\\d\\d", true),
        ("a", "\\d", false),
        ("a", "\\w", true),
        ("ab", "\\w\\w", true),
        ("dog", "[abc]", false),
        ("apple", "[abc]", true),
        ("bac", "[abc]", true),
        ("dog", "[^abc]", true),
        ("apple", "[^abc]", true),
        ("bac", "[^abc]", false),
        ("1 apple", "\\d apple", true),
        ("100 apples", "\\d\\d\\d apple", true),
        ("3 dogs", "\\d \\w\\w\\ws", true),
        ("4 cats", "\\d \\w\\w\\ws", true),
        ("1apples", "\\d\\d\\d apple", false),
        ("1 orange", "\\d apple", false),
        ("1 dog", "\\d \\w\\w\\ws", false),
    ];

    for (input, pattern, expected) in input_output {
        assert_eq!(
            expected,
            matches(input, pattern),
            "input {:?} against {:?}",
            input,
            pattern
        );
    }
}

#[test]
fn should_match_wildcards_and_quantifiers() {
    let input_output = vec![
        ("cat", "c.t", true),
        ("cat", "c..t", false),
        ("caats", "ca+ts", true),
        ("caats", "c[a]+ts", true),
        ("cts", "ca+ts", false),
        ("cts", "ca?ts", true),
        ("cats", "ca?ts", true),
        ("caats", "ca?ts", false),
    ];

    for (input, pattern, expected) in input_output {
        assert_eq!(
            expected,
            matches(input, pattern),
            "input {:?} against {:?}",
            input,
            pattern
        );
    }
}

#[test]
fn should_match_anchored_patterns_at_input_boundaries() {
    let input_output = vec![
        ("log", "^log", true),
        ("slog", "^log", false),
        ("dog", "dog$", true),
        ("dogs", "dog$", false),
        ("dog", "^dog$", true),
        ("doge", "^dog$", false),
    ];

    for (input, pattern, expected) in input_output {
        assert_eq!(
            expected,
            matches(input, pattern),
            "input {:?} against {:?}",
            input,
            pattern
        );
    }
}

#[test]
fn should_match_zero_width_patterns_at_end_of_input() {
    // "$" alone matches any input, including the empty one, at its end.
    for input in ["", "a", "some longer line"] {
        assert!(matches(input, "$"), "input {:?}", input);
    }
}

#[test]
fn should_match_empty_pattern_against_any_input() {
    for input in ["", "a", "anything at all"] {
        assert!(matches(input, ""), "input {:?}", input);
    }
}

#[test]
fn should_match_within_extended_inputs() {
    // an unanchored match survives arbitrary surrounding context.
    assert!(matches("1 apple", "\\d apple"));
    assert!(matches("x 1 apple y", "\\d apple"));
    assert!(matches("prefix 1 apple", "\\d apple"));
    assert!(matches("1 apple suffix", "\\d apple"));
}

#[test]
fn should_match_alternations() {
    let input_output = vec![
        ("cat", "cat|dog", true),
        ("dog", "cat|dog", true),
        ("cow", "cat|dog", false),
        ("a cat", "a (cat|dog)", true),
        ("a dog", "a (cat|dog)", true),
        ("a cow", "a (cat|dog)", false),
    ];

    for (input, pattern, expected) in input_output {
        assert_eq!(
            expected,
            matches(input, pattern),
            "input {:?} against {:?}",
            input,
            pattern
        );
    }
}

#[test]
fn should_resolve_backreferences_against_captured_text() {
    let input_output = vec![
        ("cat and cat", "(cat) and \\1", true),
        ("cat and dog", "(cat) and \\1", false),
        ("cat and cat", "(\\w+) and \\1", true),
        ("cat and dog", "(\\w+) and \\1", false),
        ("grep grep grep", "(\\w+) \\1 \\1", true),
        ("grep grep growl", "(\\w+) \\1 \\1", false),
    ];

    for (input, pattern, expected) in input_output {
        assert_eq!(
            expected,
            matches(input, pattern),
            "input {:?} against {:?}",
            input,
            pattern
        );
    }
}

#[test]
fn should_fail_branches_with_unresolved_backreferences() {
    // a backreference into an alternative that was never taken has no
    // capture to resolve against; the branch dies, compilation does not.
    assert!(matches("ax", "(a)x|\\1"));
    assert!(!matches("q", "(a)x|\\1"));

    // a backreference with no group at all never matches anything.
    assert!(!matches("anything", "\\1"));
}

#[test]
fn should_capture_greedily() {
    let re = compile_pattern("(a+)");
    let captures = matcher::match_with_captures(b"aaa", &re).expect("no match found");

    assert_eq!(b"aaa".as_slice(), captures["1"]);
    assert_eq!(b"aaa".as_slice(), captures["0"]);
}

#[test]
fn should_expose_captures_by_group_number() {
    let re = compile_pattern("(\\d+) (\\w+)");
    let captures = matcher::match_with_captures(b"12 cats", &re).expect("no match found");

    assert_eq!(b"12 cats".as_slice(), captures["0"]);
    assert_eq!(b"12".as_slice(), captures["1"]);
    assert_eq!(b"cats".as_slice(), captures["2"]);
}

#[test]
fn should_terminate_on_zero_width_repetition() {
    // quantified zero-width bodies must not loop the search forever.
    for pattern in ["()+", "(a?)+", "(())+"] {
        assert!(matches("", pattern), "pattern {:?}", pattern);
        assert!(matches("a", pattern), "pattern {:?}", pattern);
    }
}

#[test]
fn should_match_single_byte_class_ranges() {
    assert!(matches("a", "[a-a]"));
    assert!(!matches("b", "[a-a]"));

    // reversed bounds are swapped rather than rejected.
    assert!(matches("a", "[b-a]"));
    assert!(matches("b", "[b-a]"));
    assert!(!matches("c", "[b-a]"));
}

#[test]
fn should_match_compound_list_scenario() {
    let pattern = "^I see (\\d (cat|dog|cow)s?(, | and )?)+$";

    assert!(matches("I see 1 cat, 2 dogs and 3 cows", pattern));
    assert!(matches("I see 1 cat", pattern));
    assert!(!matches("I see 1 fish", pattern));
    assert!(!matches("we see 1 cat", pattern));
}

#[test]
fn should_produce_stable_answers_across_repeated_runs() {
    let re = compile_pattern("(cat) and \\1");

    for _ in 0..3 {
        assert!(matcher::matches(b"cat and cat", &re));
        assert!(!matcher::matches(b"cat and dog", &re));
    }
}

#[test]
fn should_recompile_to_structurally_equal_automata() {
    for pattern in ["", "a+b?", "((ab)|c)+", "^\\d (cat|dog)s?$", "[a-z]+\\1"] {
        let first = compile_pattern(pattern);
        let second = compile_pattern(pattern);

        assert!(
            structurally_equal(&first, &second),
            "pattern {:?}",
            pattern
        );
    }
}

#[test]
fn should_mark_whole_match_group_on_every_compiled_pattern() {
    for pattern in ["", "a", "a|b", "(a)(b)", "\\d+"] {
        let re = compile_pattern(pattern);

        assert!(
            re[re.initial_state()]
                .starting_groups
                .contains(&"0".to_string()),
            "pattern {:?}",
            pattern
        );
        assert!(
            re[re.accepting_state()]
                .ending_groups
                .contains(&"0".to_string()),
            "pattern {:?}",
            pattern
        );
    }
}
