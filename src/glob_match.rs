//! Shell pattern matching against in-memory strings: `case` items, `[[ ==
//! ]]`/`[[ != ]]`, and the parameter-expansion pattern operators (`${v#p}`,
//! `${v/p/r}`, …). Distinct from pathname expansion (`src/expand.rs`, which
//! walks the real filesystem via the `glob` crate) — this module never
//! touches disk, so it is implemented as a glob-to-regex translation using
//! `regex-lite` (already a teacher dependency, previously used by the
//! deleted `src/commands/find/matcher.rs` for the same non-filesystem
//! matching need).

use regex_lite::Regex;

/// Translates a POSIX shell glob pattern (`*`, `?`, `[...]`, and bash's
/// `extglob`-independent basics) into an anchored regex matching the whole
/// string.
fn glob_to_regex(pattern: &str, anchor_start: bool, anchor_end: bool) -> String {
    let mut out = String::new();
    if anchor_start {
        out.push('^');
    }
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i + 1;
                let negate = j < chars.len() && (chars[j] == '!' || chars[j] == '^');
                if negate {
                    j += 1;
                }
                let class_start = j;
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    // Unterminated bracket: treat '[' as a literal.
                    out.push_str("\\[");
                    i += 1;
                    continue;
                }
                out.push('[');
                if negate {
                    out.push('^');
                }
                let body: String = chars[class_start..j].iter().collect();
                out.push_str(&body.replace('\\', "\\\\"));
                out.push(']');
                i = j;
            }
            c => {
                if "\\.+()|{}^$".contains(c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
        i += 1;
    }
    if anchor_end {
        out.push('$');
    }
    out
}

/// Whole-string match used by `case` items and `[[ s == pattern ]]`.
pub fn matches(pattern: &str, text: &str) -> bool {
    match Regex::new(&glob_to_regex(pattern, true, true)) {
        Ok(re) => re.is_match(text),
        Err(_) => pattern == text,
    }
}

/// Longest (greedy) or shortest (non-greedy) prefix of `text` matched by
/// `pattern`, for `${var#pattern}`/`${var##pattern}`. Returns the byte
/// length of the matched prefix, if any.
pub fn match_prefix_len(pattern: &str, text: &str, greedy: bool) -> Option<usize> {
    let candidates: Vec<usize> = if greedy {
        (0..=text.len()).rev().filter(|i| text.is_char_boundary(*i)).collect()
    } else {
        (0..=text.len()).filter(|i| text.is_char_boundary(*i)).collect()
    };
    for end in candidates {
        if matches(pattern, &text[..end]) {
            return Some(end);
        }
    }
    None
}

/// Longest or shortest suffix of `text` matched by `pattern`, for
/// `${var%pattern}`/`${var%%pattern}`.
pub fn match_suffix_len(pattern: &str, text: &str, greedy: bool) -> Option<usize> {
    let candidates: Vec<usize> = if greedy {
        (0..=text.len()).filter(|i| text.is_char_boundary(*i)).collect()
    } else {
        (0..=text.len()).rev().filter(|i| text.is_char_boundary(*i)).collect()
    };
    for start in candidates {
        if matches(pattern, &text[start..]) {
            return Some(start);
        }
    }
    None
}

/// First (leftmost, then by the same greedy/non-greedy rule as prefix
/// matching) substring matched by `pattern`, for `${var/pattern/repl}`.
pub fn find_first(pattern: &str, text: &str) -> Option<(usize, usize)> {
    for start in 0..=text.len() {
        if !text.is_char_boundary(start) {
            continue;
        }
        if let Some(len) = match_prefix_len(pattern, &text[start..], true) {
            return Some((start, start + len));
        }
    }
    None
}

/// All non-overlapping matches left-to-right, for `${var//pattern/repl}`.
pub fn find_all(pattern: &str, text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        if !text.is_char_boundary(pos) {
            pos += 1;
            continue;
        }
        match match_prefix_len(pattern, &text[pos..], true) {
            Some(len) if len > 0 => {
                out.push((pos, pos + len));
                pos += len;
            }
            Some(_) => pos += text[pos..].chars().next().map_or(1, |c| c.len_utf8()),
            None => pos += text[pos..].chars().next().map_or(1, |c| c.len_utf8()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_anything() {
        assert!(matches("*.txt", "a.txt"));
        assert!(!matches("*.txt", "a.txt.bak"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(matches("a?c", "abc"));
        assert!(!matches("a?c", "abbc"));
    }

    #[test]
    fn bracket_class() {
        assert!(matches("[abc]", "b"));
        assert!(!matches("[!abc]", "b"));
    }

    #[test]
    fn prefix_suffix_removal() {
        assert_eq!(match_prefix_len("*/", "a/b/c", true), Some(4));
        assert_eq!(match_prefix_len("*/", "a/b/c", false), Some(2));
        assert_eq!(match_suffix_len(".*", "a.b.c", true), Some(1));
        assert_eq!(match_suffix_len(".*", "a.b.c", false), Some(3));
    }
}
