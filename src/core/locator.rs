//! Snippet location inside full file text.
//!
//! Two passes: an exact byte-for-byte search, then a whitespace-collapsing
//! fuzzy search. Both passes require the hit to be unique; an ambiguous
//! snippet is a rejection, never a guess.

use memchr::memmem;

/// Outcome of locating a snippet in source text.
///
/// `Found` spans are byte offsets `[start, end)` into the original source,
/// valid for direct `replace_range` splicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetMatch {
    Found { start: usize, end: usize },
    NotFound,
    Ambiguous,
    InvalidMatch,
}

/// Find the unique span of `target` inside `source`.
///
/// Exact occurrences win: if the target appears verbatim exactly once, that
/// span is returned and the fuzzy pass never runs. Two or more verbatim
/// occurrences are `Ambiguous`. Only when there are zero verbatim occurrences
/// does the whitespace-tolerant pass run.
pub fn locate(source: &str, target: &str) -> SnippetMatch {
    if target.trim().is_empty() {
        return SnippetMatch::InvalidMatch;
    }

    let finder = memmem::Finder::new(target.as_bytes());
    if let Some(start) = finder.find(source.as_bytes()) {
        let end = start + target.len();
        if finder.find(&source.as_bytes()[end..]).is_some() {
            return SnippetMatch::Ambiguous;
        }
        return SnippetMatch::Found { start, end };
    }

    locate_fuzzy(source, target)
}

/// Whitespace-collapsed view of a string with byte-level offset maps back
/// into the original.
struct Collapsed {
    text: String,
    /// Original byte offset where collapsed byte `i` begins.
    starts: Vec<usize>,
    /// Original byte offset just past collapsed byte `i`.
    ends: Vec<usize>,
}

/// Collapse every maximal whitespace run to a single space and trim.
///
/// Each byte of the collapsed text records the original span it stands for:
/// a collapsed space covers its whole whitespace run, a regular character
/// covers itself. Leading and trailing runs are dropped entirely.
fn collapse(input: &str) -> Collapsed {
    let mut text = String::with_capacity(input.len());
    let mut starts = Vec::with_capacity(input.len());
    let mut ends = Vec::with_capacity(input.len());
    let mut ws_run: Option<usize> = None;

    for (idx, ch) in input.char_indices() {
        if ch.is_whitespace() {
            ws_run.get_or_insert(idx);
            continue;
        }
        if let Some(run_start) = ws_run.take() {
            // Interior run only; a leading run has nothing before it to join.
            if !text.is_empty() {
                text.push(' ');
                starts.push(run_start);
                ends.push(idx);
            }
        }
        let char_end = idx + ch.len_utf8();
        for _ in 0..ch.len_utf8() {
            starts.push(idx);
            ends.push(char_end);
        }
        text.push(ch);
    }
    // A trailing run left in ws_run is dropped, mirroring trim().

    Collapsed { text, starts, ends }
}

/// Fuzzy pass: search the collapsed target inside the collapsed source and
/// map the hit back to original byte offsets.
///
/// The offset maps make the mapping exact by construction; a hit that falls
/// outside them (cannot happen for a well-formed collapse, but guarded
/// anyway) is reported as `NotFound` rather than applied speculatively.
fn locate_fuzzy(source: &str, target: &str) -> SnippetMatch {
    let haystack = collapse(source);
    let needle = collapse(target).text;
    if needle.is_empty() {
        return SnippetMatch::NotFound;
    }

    let Some(at) = haystack.text.find(&needle) else {
        return SnippetMatch::NotFound;
    };
    // Same uniqueness rule as the exact pass: a second collapsed occurrence
    // past the first hit's end makes the snippet ambiguous.
    if haystack.text[at + needle.len()..].contains(&needle) {
        return SnippetMatch::Ambiguous;
    }

    match (
        haystack.starts.get(at).copied(),
        haystack.ends.get(at + needle.len() - 1).copied(),
    ) {
        (Some(start), Some(end)) => SnippetMatch::Found { start, end },
        _ => SnippetMatch::NotFound,
    }
}
