//! Candidate link extraction from free-form text.

use crate::links::patterns::LINK_PATTERNS;
use std::collections::HashSet;

/// Scan free-form text for recognized platform links.
///
/// Applies every registry pattern globally, merges the matches sorted by
/// their byte offset in the text, and removes exact-string duplicates, so the
/// result is an ordered set in first-seen order. A URL that matches several
/// patterns contributes once, under the highest-priority pattern. Pure
/// function of the input: no network, no error path, empty input yields an
/// empty vector.
pub fn extract_links(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, usize, String)> = Vec::new();
    for pattern in LINK_PATTERNS.iter() {
        for m in pattern.regex.find_iter(text) {
            found.push((m.start(), m.end(), m.as_str().to_string()));
        }
    }
    // Stable sort: equal offsets keep registry priority order.
    found.sort_by_key(|(start, _, _)| *start);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut covered_until = 0usize;
    for (start, end, url) in found {
        // A lower-priority match starting inside an accepted one is the same
        // URL seen through a different pattern.
        if start < covered_until {
            continue;
        }
        covered_until = covered_until.max(end);
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }
    links
}
