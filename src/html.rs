//! Minimal, allocation-light helpers for pulling tables out of HTML

/// ASCII-only lowercase; byte offsets stay valid against the original
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Offset of the next `<tag` whose name ends at a boundary, so `th` does
/// not match `<thead>`
fn find_open_tag(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let pattern = format!("<{}", tag);
    let mut pos = from;
    loop {
        let start = lc.get(pos..)?.find(&pattern)? + pos;
        let after = start + pattern.len();
        match lc[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(start),
            None => return None,
            _ => pos = after,
        }
    }
}

/// Byte range of the next `<tag ...>...</tag>` block at or after `from`.
/// Nested blocks of the same tag are not tracked.
pub fn next_tag_block_ci(s: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower(s);
    let tag = to_lower(tag);
    let start = find_open_tag(&lc, &tag, from)?;
    let open_end = s[start..].find('>')? + start + 1;
    let close = format!("</{}>", tag);
    let end = match lc[open_end..].find(&close) {
        Some(rel) => open_end + rel + close.len(),
        // Unclosed element; runs to the next sibling or the end of input
        None => find_open_tag(&lc, &tag, open_end).unwrap_or(s.len()),
    };
    Some((start, end))
}

/// Every top-level `<tag>` block in `s`
pub fn tag_blocks<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some((start, end)) = next_tag_block_ci(s, tag, from) {
        out.push(&s[start..end]);
        from = end;
    }
    out
}

/// Value of `name="..."` on the first tag of `block`
pub fn attribute(block: &str, name: &str) -> Option<String> {
    let open_end = block.find('>')?;
    let tag = &block[..open_end];
    let lc = to_lower(tag);
    let name = to_lower(name);

    let mut pos = 0;
    while let Some(rel) = lc[pos..].find(&name) {
        let at = pos + rel;
        pos = at + name.len();
        let preceded_by_space = lc[..at].chars().last().map_or(false, char::is_whitespace);
        let rest = lc[pos..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }
        let value_start = tag.len() - rest.len() + 1;
        let value = tag[value_start..].trim_start();
        let quote = value.chars().next()?;
        let text = if quote == '"' || quote == '\'' {
            let body = &value[1..];
            &body[..body.find(quote)?]
        } else {
            value.split(|c: char| c.is_whitespace()).next().unwrap_or("")
        };
        return Some(decode_entities(text));
    }
    None
}

/// Text content with tags removed, entities decoded and whitespace collapsed
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Decode the named entities common in listing pages and numeric references
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, semi + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
