//! Balanced-delimiter scanning over script text.
//!
//! Works on bytes: every delimiter we care about is ASCII, and UTF-8
//! continuation bytes never collide with ASCII, so byte offsets returned here
//! are always valid `str` boundaries.

/// Return the object literal starting at `start`, which must index a `{`.
///
/// Nesting depth counts braces only; anything inside a string literal
/// (`"…"`, `'…'` or `` `…` ``, with backslash escapes) is skipped, so a `;` or
/// `}` in a product name cannot end the span early. `None` if the object is
/// never closed.
pub fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offsets of `marker` where it stands as a whole identifier path,
/// i.e. not embedded in a longer name such as `window.__INITIAL_STATE__X`
/// or `mywindow.__INITIAL_STATE__`.
pub fn token_positions<'a>(text: &'a str, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(marker).filter_map(move |(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + marker.len()..].chars().next();
        let open_before = before.is_none_or(|c| !is_ident_char(c) && c != '.');
        let open_after = after.is_none_or(|c| !is_ident_char(c));
        (open_before && open_after).then_some(i)
    })
}

/// Offset of the `{` that opens the value assigned at `after_marker`:
/// optional whitespace, a lone `=` (not `==`/`===`), optional whitespace, `{`.
pub fn assigned_object_start(text: &str, after_marker: usize) -> Option<usize> {
    let rest = &text[after_marker..];
    let trimmed = rest.trim_start();
    let eq_at = after_marker + (rest.len() - trimmed.len());
    let after_eq = trimmed.strip_prefix('=')?;
    if after_eq.starts_with('=') {
        return None;
    }
    let value = after_eq.trim_start();
    if !value.starts_with('{') {
        return None;
    }
    Some(eq_at + 1 + (after_eq.len() - value.len()))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
