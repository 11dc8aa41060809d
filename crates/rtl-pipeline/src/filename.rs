//! Output filenames for RTL assets
//!
//! Patterns are expanded in a single left-to-right pass over a token table,
//! so a token's replacement is never re-scanned for other tokens.
//!
//! Example: `[name]/[filebase].[contenthash].rtl.css` with unit `main` and
//! asset `app/bundle.css` → `main/bundle.0f3a9c21de.rtl.css`

use camino::Utf8Path;
use md5::{Digest, Md5};

use crate::config::FilenameRule;
use crate::unit::UnitMeta;

/// Number of hex characters kept from the content digest.
const CONTENT_HASH_LEN: usize = 10;

struct TokenContext<'a> {
    original: &'a str,
    unit: &'a UnitMeta,
    content: &'a str,
}

type Resolver = fn(&TokenContext<'_>) -> String;

const TOKENS: &[(&str, Resolver)] = &[
    ("[contenthash]", |ctx| content_hash(ctx.content)),
    ("[id]", |ctx| ctx.unit.id.to_string()),
    ("[name]", |ctx| ctx.unit.display_name()),
    ("[file]", |ctx| ctx.original.to_string()),
    ("[filebase]", |ctx| file_stem(ctx.original).to_string()),
];

/// Only recognised as the very end of a pattern.
const TRAILING_EXT: &str = ".[ext]";

/// Derive the RTL asset name for `original`.
///
/// `content` is the text that will be written under the derived name; it
/// feeds `[contenthash]`. A `Replace` rule whose search text does not occur
/// returns `original` unchanged, and callers must not write in that case.
pub fn derive(original: &str, unit: &UnitMeta, content: &str, rule: &FilenameRule) -> String {
    match rule {
        FilenameRule::Replace { search, replace } => {
            if search.is_empty() {
                original.to_string()
            } else {
                original.replacen(search.as_str(), replace, 1)
            }
        }
        FilenameRule::Pattern(pattern) if !pattern.is_empty() => {
            let ctx = TokenContext {
                original,
                unit,
                content,
            };
            expand(pattern, &ctx)
        }
        _ => default_name(original),
    }
}

/// First ten hex characters of the MD5 digest of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hash = hex::encode(Md5::digest(content.as_bytes()));
    hash.truncate(CONTENT_HASH_LEN);
    hash
}

fn expand(pattern: &str, ctx: &TokenContext<'_>) -> String {
    let (body, trailing_ext) = match pattern.strip_suffix(TRAILING_EXT) {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let mut out = String::with_capacity(pattern.len() + ctx.original.len());
    let mut rest = body;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match TOKENS.iter().find(|(token, _)| tail.starts_with(token)) {
            Some((token, resolve)) => {
                out.push_str(&resolve(ctx));
                rest = &tail[token.len()..];
            }
            None => {
                out.push('[');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    if trailing_ext {
        if let Some(ext) = Utf8Path::new(ctx.original).extension() {
            out.push('.');
            out.push_str(ext);
        }
    }
    out
}

fn file_stem(name: &str) -> &str {
    Utf8Path::new(name).file_stem().unwrap_or(name)
}

/// `dir/name.ext` → `dir/name.rtl.ext`, `name` → `name.rtl`
fn default_name(original: &str) -> String {
    let path = Utf8Path::new(original);
    let Some(file_name) = path.file_name() else {
        return format!("{original}.rtl");
    };
    // file_name is always a suffix of the original (camino ignores a trailing `/`)
    let prefix_len = original
        .trim_end_matches('/')
        .len()
        .saturating_sub(file_name.len());
    let prefix = &original[..prefix_len];

    match path.extension() {
        Some(ext) => format!("{prefix}{}.rtl.{ext}", file_stem(original)),
        None => format!("{prefix}{file_name}.rtl"),
    }
}
