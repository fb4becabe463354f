//! Typographic character replacements.
//!
//! Applied to the processed body handed to the note builder; never to raw
//! content (which is preserved for diffing), never inside fenced code
//! blocks or inline code spans, and never on separator rules (`---` lines,
//! which delimit flashcard fronts and backs).

/// Ordered replacement table. At each position the first matching token
/// wins, so multi-character tokens are listed before their prefixes.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("(TM)", "™"),
    ("(C)", "©"),
    ("(R)", "®"),
    ("...", "…"),
    ("--", "—"),
    ("->", "→"),
    ("<-", "←"),
    ("=>", "⇒"),
    ("<=", "⇐"),
];

/// Apply the typographic substitutions to `text`.
pub fn apply_typographic_replacements(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut fence: Option<&str> = None;

    for line in text.split_inclusive('\n') {
        let stripped = line.trim_end_matches('\n');
        let trimmed = stripped.trim_start();

        if let Some(open) = fence {
            out.push_str(line);
            if trimmed.starts_with(open) {
                fence = None;
            }
            continue;
        }
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(if trimmed.starts_with("```") { "```" } else { "~~~" });
            out.push_str(line);
            continue;
        }
        // Separator rules stay intact.
        if !stripped.is_empty() && stripped.chars().all(|c| c == '-') && stripped.len() >= 3 {
            out.push_str(line);
            continue;
        }

        out.push_str(&replace_line(stripped));
        if line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Replace within one line, skipping inline code spans.
fn replace_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut in_code = false;

    'outer: while i < bytes.len() {
        if bytes[i] == b'`' {
            in_code = !in_code;
            out.push('`');
            i += 1;
            continue;
        }
        if !in_code {
            for (token, replacement) in REPLACEMENTS {
                if line[i..].starts_with(token) {
                    out.push_str(replacement);
                    i += token.len();
                    continue 'outer;
                }
            }
        }
        let ch = line[i..].chars().next().expect("in-bounds char");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}
