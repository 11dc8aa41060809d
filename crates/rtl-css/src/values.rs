//! Declaration rules: which property names and values flip, and how.

/// Properties whose whole value is a single `left`/`right` keyword.
const SIDE_KEYWORD_PROPERTIES: &[&str] = &[
    "float",
    "clear",
    "text-align",
    "text-align-last",
    "caption-side",
];

/// `top right bottom left` shorthands.
const BOX_SHORTHANDS: &[&str] = &[
    "margin",
    "padding",
    "border-width",
    "border-style",
    "border-color",
    "inset",
    "scroll-margin",
    "scroll-padding",
];

const RESIZE_CURSORS: &[(&str, &str)] = &[
    ("e-resize", "w-resize"),
    ("ne-resize", "nw-resize"),
    ("se-resize", "sw-resize"),
];

/// `padding-left` → `padding-right`. `None` when the name has no side.
pub(crate) fn mirror_property(property: &str) -> Option<String> {
    // custom properties are opaque
    if property.starts_with("--") {
        return None;
    }
    let mut changed = false;
    let segments: Vec<&str> = property
        .split('-')
        .map(|segment| match swap_side(segment) {
            Some(swapped) => {
                changed = true;
                swapped
            }
            None => segment,
        })
        .collect();
    changed.then(|| segments.join("-"))
}

/// Mirrored value for `property`, or `None` when it reads the same either way.
pub(crate) fn mirror_value(property: &str, value: &str) -> Option<String> {
    let property = property.to_ascii_lowercase();
    let property = unprefixed(&property);

    let mirrored = match property {
        p if SIDE_KEYWORD_PROPERTIES.contains(&p) => swap_side(value).map(str::to_string),
        "direction" => swap_direction(value).map(str::to_string),
        "cursor" => Some(mirror_cursor(value)),
        p if BOX_SHORTHANDS.contains(&p) => mirror_box(value),
        "border-radius" => Some(mirror_radius(value)),
        "box-shadow" | "text-shadow" => Some(mirror_shadows(value)),
        "background-position" | "background-position-x" => Some(swap_side_words(value)),
        _ => None,
    };
    mirrored.filter(|m| m != value)
}

fn swap_side(word: &str) -> Option<&'static str> {
    if word.eq_ignore_ascii_case("left") {
        Some("right")
    } else if word.eq_ignore_ascii_case("right") {
        Some("left")
    } else {
        None
    }
}

fn swap_direction(word: &str) -> Option<&'static str> {
    if word.eq_ignore_ascii_case("ltr") {
        Some("rtl")
    } else if word.eq_ignore_ascii_case("rtl") {
        Some("ltr")
    } else {
        None
    }
}

/// `-webkit-box-shadow` → `box-shadow`
fn unprefixed(property: &str) -> &str {
    if property.starts_with("--") {
        return property;
    }
    match property.strip_prefix('-').and_then(|rest| rest.split_once('-')) {
        Some((_vendor, name)) => name,
        None => property,
    }
}

/// Split at top-level separators, outside parentheses and strings. Empty
/// pieces are dropped.
fn split_top_level(value: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (idx, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && is_separator(c) => {
                pieces.push(value[start..idx].trim());
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(value[start..].trim());
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn words(value: &str) -> Vec<&str> {
    split_top_level(value, char::is_whitespace)
}

fn mirror_box(value: &str) -> Option<String> {
    match words(value).as_slice() {
        [top, right, bottom, left] => Some(format!("{top} {left} {bottom} {right}")),
        _ => None,
    }
}

fn mirror_radius(value: &str) -> String {
    split_top_level(value, |c| c == '/')
        .into_iter()
        .map(|side| {
            let corners = match words(side).as_slice() {
                [a, b, c, d] => vec![*b, *a, *d, *c],
                [a, b, c] => vec![*b, *a, *b, *c],
                [a, b] => vec![*b, *a],
                other => other.to_vec(),
            };
            corners.join(" ")
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn mirror_shadows(value: &str) -> String {
    split_top_level(value, |c| c == ',')
        .into_iter()
        .map(|shadow| {
            let mut parts: Vec<String> = words(shadow).into_iter().map(str::to_string).collect();
            // the first length is the horizontal offset
            if let Some(offset) = parts.iter_mut().find(|part| is_length(part.as_str())) {
                let negated = negate(offset);
                *offset = negated;
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn mirror_cursor(value: &str) -> String {
    split_top_level(value, |c| c == ',')
        .into_iter()
        .map(|cursor| {
            RESIZE_CURSORS
                .iter()
                .find_map(|(a, b)| {
                    if cursor.eq_ignore_ascii_case(a) {
                        Some(*b)
                    } else if cursor.eq_ignore_ascii_case(b) {
                        Some(*a)
                    } else {
                        None
                    }
                })
                .unwrap_or(cursor)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Swap standalone `left`/`right` words, leaving everything else in place.
fn swap_side_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = None;
    for (idx, c) in value.char_indices() {
        if c.is_ascii_alphabetic() || c == '-' {
            word_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = word_start.take() {
            let word = &value[start..idx];
            out.push_str(swap_side(word).unwrap_or(word));
        }
        out.push(c);
    }
    if let Some(start) = word_start {
        let word = &value[start..];
        out.push_str(swap_side(word).unwrap_or(word));
    }
    out
}

fn is_length(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
}

fn negate(length: &str) -> String {
    if let Some(positive) = length.strip_prefix('-') {
        return positive.to_string();
    }
    let length = length.strip_prefix('+').unwrap_or(length);
    let number = length.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
    if number.chars().all(|c| c == '0' || c == '.') {
        length.to_string()
    } else {
        format!("-{length}")
    }
}
