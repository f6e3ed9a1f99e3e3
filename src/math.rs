//! Math-expression normalisation for reverse conversion.

/// Fold a math expression to its ASCII canonical form: full-width digits
/// and operators become half-width, and the operator look-alikes `ー`
/// (prolonged sound mark), `・`, `×`, and `÷` fold to `-`, `/`, `*`, `/`.
/// Returns `None` as soon as a codepoint outside the math set is seen.
pub fn normalize_math_expression(s: &str) -> Option<String> {
    let mut key = String::with_capacity(s.len());
    for c in s.chars() {
        let folded = match c {
            '0'..='9' => c,
            '０'..='９' => char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c),
            '+' | '＋' => '+',
            '-' | 'ー' => '-',
            '*' | '＊' | '×' => '*',
            '/' | '／' | '・' | '÷' => '/',
            '(' | '（' => '(',
            ')' | '）' => ')',
            '=' | '＝' => '=',
            _ => return None,
        };
        key.push(folded);
    }
    Some(key)
}
