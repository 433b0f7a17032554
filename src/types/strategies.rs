//! Proptest generators for matches.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use super::{Match, MatchSource};

const BASES: [&str; 4] = ["a.rs", "src/b.rs", "src/c/d.ts", "docs/guide.md"];

pub fn arb_source() -> impl Strategy<Value = MatchSource> {
    prop_oneof![Just(MatchSource::SemanticIndex), Just(MatchSource::Filesystem)]
}

/// One of a few locations, spelled in any of the equivalent ways the
/// sources produce.
pub fn arb_location() -> impl Strategy<Value = String> {
    (0..BASES.len(), 0..5u8).prop_map(|(base, style)| {
        let base = BASES[base];
        match style {
            0 => base.to_string(),
            1 => format!("./{}", base),
            2 => base.replace('/', "\\"),
            3 => base.replace('/', "//"),
            _ => format!(" {} ", base),
        }
    })
}

pub fn arb_snippet() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c ]{0,6}",
        "\\PC{0,24}",
        Just("```rust\nfn main() {}\n```".to_string()),
    ]
}

pub fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
    (1_500_000_000i64..1_900_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

pub fn arb_match() -> impl Strategy<Value = Match> {
    (
        arb_source(),
        arb_location(),
        arb_snippet(),
        proptest::option::of(0.0f64..=1.0),
        proptest::option::of(arb_time()),
    )
        .prop_map(|(source, location, snippet, raw_score, modified_at)| {
            let mut item = Match::new(source, &location, snippet);
            item.raw_score = raw_score;
            item.modified_at = modified_at;
            item
        })
}

/// Three matches sharing one location.
pub fn arb_same_location() -> impl Strategy<Value = (Match, Match, Match)> {
    (arb_match(), arb_match(), arb_match()).prop_map(|(a, mut b, mut c)| {
        b.location = a.location.clone();
        c.location = a.location.clone();
        (a, b, c)
    })
}

pub fn arb_matches() -> impl Strategy<Value = Vec<Match>> {
    proptest::collection::vec(arb_match(), 0..12)
}
