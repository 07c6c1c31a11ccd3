//! Text-object resolution. Resolvers only read the block under the cursor and
//! return the range an operator should act on.

use std::ops::Range;

use crate::document::{Document, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObject {
    InnerWord,
    InsidePair { open: char, close: char },
}

impl TextObject {
    /// Object named by the key typed after `i` in an operator sequence.
    pub fn from_key(ch: char) -> Option<Self> {
        let object = match ch {
            'w' => TextObject::InnerWord,
            '"' | '\'' => TextObject::InsidePair {
                open: ch,
                close: ch,
            },
            '(' | ')' => TextObject::InsidePair {
                open: '(',
                close: ')',
            },
            '{' | '}' => TextObject::InsidePair {
                open: '{',
                close: '}',
            },
            _ => return None,
        };
        Some(object)
    }

    pub fn resolve(self, doc: &dyn Document, head: Pos) -> Option<Range<Pos>> {
        match self {
            TextObject::InnerWord => inner_word(doc, head),
            TextObject::InsidePair { open, close } => inside_pair(doc, head, open, close),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Run of word characters around the cursor. At the block end the word just
/// before the cursor counts.
pub fn inner_word(doc: &dyn Document, head: Pos) -> Option<Range<Pos>> {
    let bounds = doc.block_bounds(head)?;
    let chars = doc
        .text_between(bounds.start, bounds.end)
        .chars()
        .collect::<Vec<_>>();
    let offset = head - bounds.start;
    if chars.get(offset).is_some_and(|ch| !is_word_char(*ch)) {
        return None;
    }

    let mut left = offset;
    while left > 0 && is_word_char(chars[left - 1]) {
        left -= 1;
    }
    let mut right = offset;
    while right < chars.len() && is_word_char(chars[right]) {
        right += 1;
    }
    (left < right).then(|| bounds.start + left..bounds.start + right)
}

/// Exclusive interior of the pair enclosing the cursor within its block.
pub fn inside_pair(doc: &dyn Document, head: Pos, open: char, close: char) -> Option<Range<Pos>> {
    let bounds = doc.block_bounds(head)?;
    let chars = doc
        .text_between(bounds.start, bounds.end)
        .chars()
        .collect::<Vec<_>>();
    let offset = head - bounds.start;
    let (left, right) = if open == close {
        enclosing_quotes(&chars, offset, open)?
    } else {
        enclosing_brackets(&chars, offset, open, close)?
    };
    Some(bounds.start + left + 1..bounds.start + right)
}

/// Quotes pair up left to right; the pair whose span covers the cursor wins.
fn enclosing_quotes(chars: &[char], offset: usize, quote: char) -> Option<(usize, usize)> {
    let quotes = chars
        .iter()
        .enumerate()
        .filter(|(_, ch)| **ch == quote)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    quotes
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|(left, right)| *left <= offset && offset <= *right)
}

fn enclosing_brackets(
    chars: &[char],
    offset: usize,
    open: char,
    close: char,
) -> Option<(usize, usize)> {
    let scan_from = offset.min(chars.len().checked_sub(1)?);
    let mut depth = 0usize;
    let mut left = None;
    for idx in (0..=scan_from).rev() {
        let ch = chars[idx];
        if ch == close && idx != offset {
            depth += 1;
        } else if ch == open {
            if depth == 0 {
                left = Some(idx);
                break;
            }
            depth -= 1;
        }
    }
    let left = left?;

    depth = 0;
    for (idx, ch) in chars.iter().enumerate().skip(left + 1) {
        if *ch == open {
            depth += 1;
        } else if *ch == close {
            if depth == 0 {
                return Some((left, idx));
            }
            depth -= 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn doc(text: &str) -> MemoryDocument {
        MemoryDocument::from_text(text)
    }

    #[test]
    fn inner_word_should_expand_across_word_chars() {
        let doc = doc("hello world");
        assert_eq!(inner_word(&doc, 3), Some(1..6));
        assert_eq!(inner_word(&doc, 9), Some(7..12));
        assert_eq!(inner_word(&doc, 12), Some(7..12));
    }

    #[test]
    fn inner_word_on_separator_should_not_resolve() {
        let doc = doc("hello world");
        assert_eq!(inner_word(&doc, 6), None);
        let empty = MemoryDocument::new();
        assert_eq!(inner_word(&empty, 1), None);
    }

    #[test]
    fn inside_pair_should_return_exclusive_interior() {
        let doc = doc("call(a, b) done");
        assert_eq!(inside_pair(&doc, 7, '(', ')'), Some(6..10));
        assert_eq!(doc.text_between(6, 10), "a, b");
    }

    #[test]
    fn inside_pair_should_skip_nested_brackets() {
        let doc = doc("{ a { b } c }");
        assert_eq!(inside_pair(&doc, 4, '{', '}'), Some(2..13));
        assert_eq!(inside_pair(&doc, 7, '{', '}'), Some(6..9));
        assert_eq!(inside_pair(&doc, 10, '{', '}'), Some(2..13));
    }

    #[test]
    fn inside_pair_should_accept_cursor_on_delimiter() {
        let doc = doc("x(ab)y");
        assert_eq!(inside_pair(&doc, 2, '(', ')'), Some(3..5));
        assert_eq!(inside_pair(&doc, 5, '(', ')'), Some(3..5));
    }

    #[test]
    fn inside_quotes_should_pair_by_parity() {
        let doc = doc(r#"say "hi" and "bye""#);
        assert_eq!(inside_pair(&doc, 6, '"', '"'), Some(6..8));
        assert_eq!(inside_pair(&doc, 16, '"', '"'), Some(15..18));
        assert_eq!(inside_pair(&doc, 11, '"', '"'), None);
    }

    #[test]
    fn unmatched_pair_should_not_resolve() {
        let doc = doc("(open only");
        assert_eq!(inside_pair(&doc, 4, '(', ')'), None);
        assert_eq!(inside_pair(&doc, 4, '\'', '\''), None);
    }

    #[test]
    fn from_key_should_map_both_bracket_sides() {
        assert_eq!(TextObject::from_key(')'), TextObject::from_key('('));
        assert_eq!(TextObject::from_key('w'), Some(TextObject::InnerWord));
        assert_eq!(TextObject::from_key('q'), None);
    }
}
