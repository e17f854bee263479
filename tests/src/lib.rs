//! End-to-end scenarios exercising the full pattern pipeline: parse,
//! compile, match.

#[cfg(test)]
mod pattern_matching;
