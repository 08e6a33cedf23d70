//! The recovery strategies, cheapest first.

use crate::yaml::parse_mapping;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").ok());

static TOP_LEVEL_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w-]*\s*:(\s|$)").ok());

static INDENTED_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s+(- )?[A-Za-z_][\w-]*\s*:(\s|$)").ok());

/// The whole reply is a YAML mapping.
pub(crate) fn direct(raw: &str) -> Option<Map<String, Value>> {
    parse_mapping(raw)
}

/// The first fenced code block (language tag optional) that holds a mapping.
pub(crate) fn fenced_block(raw: &str) -> Option<Map<String, Value>> {
    let re = FENCED_BLOCK.as_ref()?;
    re.captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find_map(|body| parse_mapping(body.as_str()))
}

/// A contiguous run of key lines embedded in prose.
///
/// A run starts at a top-level key line and takes key lines (top-level or
/// indented) plus continuation lines that directly follow them. Two
/// consecutive other lines end it; blank lines count as such. A run with
/// fewer than two key lines is discarded and scanning resumes after it.
pub(crate) fn line_scan(raw: &str) -> Option<Map<String, Value>> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut start = 0;

    while start < lines.len() {
        let Some(offset) = lines[start..].iter().position(|l| is_top_level_key(l)) else {
            break;
        };
        let begin = start + offset;
        let run = scan_run(&lines, begin);

        if run.keys >= 2 {
            let block = lines[begin..run.end].join("\n");
            if let Some(map) = parse_mapping(&block) {
                tracing::debug!(lines = run.end - begin, keys = run.keys, "Line scan found a mapping");
                return Some(map);
            }
        }
        start = run.end.max(begin + 1);
    }
    None
}

/// Parse from each top-level key line to the end of the text.
pub(crate) fn first_key(raw: &str) -> Option<Map<String, Value>> {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        if is_top_level_key(line.trim_end_matches(['\r', '\n'])) {
            if let Some(map) = parse_mapping(&raw[offset..]) {
                return Some(map);
            }
        }
        offset += line.len();
    }
    None
}

struct Run {
    /// One past the last line kept.
    end: usize,
    keys: usize,
}

fn scan_run(lines: &[&str], begin: usize) -> Run {
    let mut run = Run { end: begin, keys: 0 };
    let mut misses = 0;
    let mut follows_kept = false;

    for (i, line) in lines.iter().enumerate().skip(begin) {
        if is_top_level_key(line) || is_indented_key(line) {
            run.keys += 1;
            run.end = i + 1;
            misses = 0;
            follows_kept = true;
        } else if follows_kept && is_continuation(line) {
            run.end = i + 1;
            misses = 0;
        } else {
            misses += 1;
            follows_kept = false;
            if misses >= 2 {
                break;
            }
        }
    }
    run
}

fn is_top_level_key(line: &str) -> bool {
    TOP_LEVEL_KEY.as_ref().is_some_and(|re| re.is_match(line))
}

fn is_indented_key(line: &str) -> bool {
    INDENTED_KEY.as_ref().is_some_and(|re| re.is_match(line))
}

/// Whitespace-led text, or a zero-indent list item.
fn is_continuation(line: &str) -> bool {
    let indented = line.starts_with(char::is_whitespace) && !line.trim().is_empty();
    indented || line.starts_with("- ")
}
