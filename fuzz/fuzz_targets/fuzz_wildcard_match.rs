//! Fuzz target for IAM wildcard matching.
//!
//! Goal: matching never panics, and a pattern without wildcards only matches itself.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_wildcard_match
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scpguard_domain::matcher::{CaseMode, wildcard_match};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    pattern: &'a str,
    value: &'a str,
    insensitive: bool,
}

fuzz_target!(|input: Input<'_>| {
    let mode = if input.insensitive {
        CaseMode::Insensitive
    } else {
        CaseMode::Sensitive
    };
    let matched = wildcard_match(input.pattern, input.value, mode);

    if !input.pattern.contains(['*', '?']) && !input.insensitive {
        assert_eq!(matched, input.pattern == input.value);
    }
});
