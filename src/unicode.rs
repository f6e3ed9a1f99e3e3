//! Character-level Unicode classification and text utilities for Japanese text.

/// Script class of a single codepoint, as seen by the conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Alphabet,
    Number,
    Hiragana,
    Katakana,
    Kanji,
    Other,
}

/// Check the full Hiragana block (U+3040..U+309F). This includes a few unassigned
/// codepoints (U+3040, U+3097-3098) but these never appear in IME input or
/// dictionary readings, so the simpler block-level check is preferred over an
/// exact range (U+3041..U+3096 + U+3099..U+309F) for clarity.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF) plus the half-width forms
/// (U+FF66..U+FF9F). The block includes rarely-used symbols (゠ U+30A0,
/// ヿ U+30FF) but no unassigned codepoints; the prolonged sound mark ー is
/// katakana here.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c) || ('\u{FF66}'..='\u{FF9F}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
}

/// Classify one codepoint. Full-width digits and Latin letters classify with
/// their half-width counterparts, since surrounding text freely mixes widths.
pub fn script_type(c: char) -> ScriptType {
    if c.is_ascii_digit() || ('０'..='９').contains(&c) {
        ScriptType::Number
    } else if c.is_ascii_alphabetic() || ('ａ'..='ｚ').contains(&c) || ('Ａ'..='Ｚ').contains(&c) {
        ScriptType::Alphabet
    } else if is_hiragana(c) {
        ScriptType::Hiragana
    } else if is_katakana(c) {
        ScriptType::Katakana
    } else if is_kanji(c) {
        ScriptType::Kanji
    } else {
        ScriptType::Other
    }
}

/// Character count of `s` (not byte length).
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Substring of `s` addressed in characters: `char_len` characters starting
/// at `char_offset`. Out-of-range offsets clamp to the end of the string.
pub fn utf8_substring(s: &str, char_offset: usize, char_len: usize) -> &str {
    let start = s
        .char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let end = s[start..]
        .char_indices()
        .nth(char_len)
        .map(|(i, _)| start + i)
        .unwrap_or(s.len());
    &s[start..end]
}

/// Extract the maximal suffix of `text` whose codepoints share one script
/// type. Exactly one trailing ASCII space is tolerated (and excluded from
/// the token); a second consecutive trailing space fails, as does empty
/// input.
///
///   ""     -> None
///   "x "   -> ("x", Alphabet)
///   "x  "  -> None
///   "C60"  -> ("60", Number)
///   "200x" -> ("x", Alphabet)
pub fn extract_last_token_of_same_script(text: &str) -> Option<(String, ScriptType)> {
    let mut iter = text.chars().rev().peekable();
    let mut first = *iter.peek()?;
    if first == ' ' {
        iter.next();
        match iter.peek() {
            None | Some(' ') => return None,
            Some(&c) => first = c,
        }
    }

    let script = script_type(first);
    let mut reverse_token = Vec::new();
    for c in iter {
        if c == ' ' || script_type(c) != script {
            break;
        }
        reverse_token.push(c);
    }
    Some((reverse_token.into_iter().rev().collect(), script))
}

/// Fold full-width ASCII (U+FF01..U+FF5E) to its half-width form.
/// Everything else is passed through unchanged.
pub fn fullwidth_ascii_to_halfwidth(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{FF01}'..='\u{FF5E}').contains(&c) {
                char::from_u32(c as u32 - 0xFF01 + 0x21).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_type_classification() {
        assert_eq!(script_type('a'), ScriptType::Alphabet);
        assert_eq!(script_type('Z'), ScriptType::Alphabet);
        assert_eq!(script_type('ｘ'), ScriptType::Alphabet);
        assert_eq!(script_type('7'), ScriptType::Number);
        assert_eq!(script_type('３'), ScriptType::Number);
        assert_eq!(script_type('あ'), ScriptType::Hiragana);
        assert_eq!(script_type('ア'), ScriptType::Katakana);
        assert_eq!(script_type('ー'), ScriptType::Katakana);
        assert_eq!(script_type('ｱ'), ScriptType::Katakana);
        assert_eq!(script_type('漢'), ScriptType::Kanji);
        assert_eq!(script_type('!'), ScriptType::Other);
        assert_eq!(script_type(' '), ScriptType::Other);
    }

    #[test]
    fn test_utf8_substring() {
        assert_eq!(utf8_substring("わたしは", 0, 2), "わた");
        assert_eq!(utf8_substring("わたしは", 2, 2), "しは");
        assert_eq!(utf8_substring("わたしは", 2, 10), "しは");
        assert_eq!(utf8_substring("わたしは", 4, 1), "");
        assert_eq!(utf8_substring("", 0, 3), "");
        assert_eq!(utf8_substring("abc漢", 2, 2), "c漢");
    }

    #[test]
    fn test_char_len() {
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("わたしは"), 4);
    }

    #[test]
    fn test_extract_last_token_examples() {
        assert_eq!(extract_last_token_of_same_script(""), None);
        assert_eq!(
            extract_last_token_of_same_script("x "),
            Some(("x".to_string(), ScriptType::Alphabet))
        );
        assert_eq!(extract_last_token_of_same_script("x  "), None);
        assert_eq!(
            extract_last_token_of_same_script("C60"),
            Some(("60".to_string(), ScriptType::Number))
        );
        assert_eq!(
            extract_last_token_of_same_script("200x"),
            Some(("x".to_string(), ScriptType::Alphabet))
        );
    }

    #[test]
    fn test_extract_last_token_single_space_only() {
        assert_eq!(extract_last_token_of_same_script(" "), None);
    }

    #[test]
    fn test_extract_last_token_stops_at_space() {
        assert_eq!(
            extract_last_token_of_same_script("foo bar"),
            Some(("bar".to_string(), ScriptType::Alphabet))
        );
    }

    #[test]
    fn test_extract_last_token_non_ascii_scripts() {
        assert_eq!(
            extract_last_token_of_same_script("ひらがな"),
            Some(("ひらがな".to_string(), ScriptType::Hiragana))
        );
        assert_eq!(
            extract_last_token_of_same_script("これは漢字"),
            Some(("漢字".to_string(), ScriptType::Kanji))
        );
    }

    #[test]
    fn test_fullwidth_ascii_to_halfwidth() {
        assert_eq!(fullwidth_ascii_to_halfwidth("Ｈｅｌｌｏ"), "Hello");
        assert_eq!(fullwidth_ascii_to_halfwidth("１２３"), "123");
        assert_eq!(fullwidth_ascii_to_halfwidth("abc"), "abc");
        assert_eq!(fullwidth_ascii_to_halfwidth("あア漢"), "あア漢");
        assert_eq!(fullwidth_ascii_to_halfwidth(""), "");
    }
}
