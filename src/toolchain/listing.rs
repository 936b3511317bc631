use crate::build::types::{Listing, ListingLine};
use regex::Regex;
use std::sync::OnceLock;

/// Keeps the raw listing text and pulls out the rows that start with an
/// `ADDR:` column.
pub fn parse_listing(text: &str) -> Listing {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\s*\$?([0-9A-Fa-f]{4,8}):\s?(.*)$").expect("valid regex")
    });

    let lines = text
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line)?;
            let address = u64::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
            Some(ListingLine {
                address,
                source: caps.get(2)?.as_str().trim_end().to_string(),
            })
        })
        .collect();

    Listing {
        lines,
        text: text.to_string(),
    }
}
