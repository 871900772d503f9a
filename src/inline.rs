use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::{FormatKind, InlineFormat};

static TRIPLE_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*\*[^*]+\*\*\*").unwrap());
static TRIPLE_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"___[^_]+___").unwrap());
static DOUBLE_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*[^*]+\*\*").unwrap());
static DOUBLE_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__[^_]+__").unwrap());
static SINGLE_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]+\*").unwrap());
static SINGLE_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_[^_]+_").unwrap());
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());
static LINK_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").unwrap());

/// Resolve all emphasis/code/link spans of one text.
///
/// Matchers run in priority order, each recording its matches in an
/// exclusion set so a lower-priority pass cannot re-read text already
/// claimed. Unmatched markers are left as plain text.
pub(crate) fn resolve(text: &str) -> Vec<InlineFormat> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut spans: Vec<InlineFormat> = Vec::new();

    // Triple markers resolve to a bold plus an italic span over the same range.
    for re in [&TRIPLE_STAR, &TRIPLE_UNDERSCORE] {
        for range in matches(re, text, &claimed, None, false) {
            spans.push(InlineFormat::emphasis(
                FormatKind::Bold,
                range.start,
                range.end,
                3,
            ));
            spans.push(InlineFormat::emphasis(
                FormatKind::Italic,
                range.start,
                range.end,
                3,
            ));
            claimed.push(range);
        }
    }

    for re in [&DOUBLE_STAR, &DOUBLE_UNDERSCORE] {
        for range in matches(re, text, &claimed, None, false) {
            spans.push(InlineFormat::emphasis(
                FormatKind::Bold,
                range.start,
                range.end,
                2,
            ));
            claimed.push(range);
        }
    }

    // Single markers are guarded against being part of a double/triple run.
    for (re, mark) in [(&SINGLE_STAR, '*'), (&SINGLE_UNDERSCORE, '_')] {
        for range in matches(re, text, &claimed, Some(mark), false) {
            spans.push(InlineFormat::emphasis(
                FormatKind::Italic,
                range.start,
                range.end,
                1,
            ));
            claimed.push(range);
        }
    }

    for range in matches(&CODE_SPAN, text, &claimed, None, false) {
        spans.push(InlineFormat::code(range.start, range.end));
        claimed.push(range);
    }

    // Links run last and may wrap ranges the earlier passes claimed.
    for range in matches(&LINK_SPAN, text, &claimed, None, true) {
        if let Some(caps) = LINK_SPAN.captures(&text[range.clone()]) {
            let url = caps.get(2).map_or("", |m| m.as_str()).to_string();
            spans.push(InlineFormat::link(range.start, range.end, url));
        }
        claimed.push(range);
    }

    // Order by start ascending, length descending, then drop exact duplicates.
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
    });
    let mut seen: HashSet<(usize, usize, FormatKind)> = HashSet::new();
    spans.retain(|span| seen.insert((span.start, span.end, span.kind)));
    spans
}

/// One matcher pass: every admissible match of `re`, in document order.
///
/// A rejected candidate resumes the scan one byte past its start so it
/// never swallows a later legitimate opener.
fn matches(
    re: &Regex,
    text: &str,
    claimed: &[Range<usize>],
    lone_marker: Option<char>,
    may_nest: bool,
) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(m) = re.find_at(text, pos) {
        let range = m.range();
        let part_of_longer_run =
            lone_marker.is_some_and(|mark| adjacent_to_marker(text, &range, mark));
        if part_of_longer_run || !admissible(&range, claimed, may_nest) {
            pos = range.start + 1;
        } else {
            pos = range.end;
            found.push(range);
        }
    }
    found
}

/// A candidate must be disjoint from every claimed interval. A nesting
/// pass (links) may instead fully contain the intervals it overlaps, so a
/// link can wrap text that already carries emphasis.
fn admissible(candidate: &Range<usize>, claimed: &[Range<usize>], may_nest: bool) -> bool {
    claimed.iter().all(|c| {
        candidate.end <= c.start
            || c.end <= candidate.start
            || (may_nest && candidate.start <= c.start && c.end <= candidate.end)
    })
}

fn adjacent_to_marker(text: &str, range: &Range<usize>, mark: char) -> bool {
    text[..range.start].ends_with(mark) || text[range.end..].starts_with(mark)
}
