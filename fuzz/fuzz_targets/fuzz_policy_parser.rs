//! Fuzz target for SCP document parsing.
//!
//! Goal: The parser should **never panic** on any input.
//! It may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Policy files are JSON, so only UTF-8 input is interesting.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = scpguard_policies::fuzz::parse_policy_text(text);
    }
});
