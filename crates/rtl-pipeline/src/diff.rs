//! Structural diff between a stylesheet and its mirrored variant
//!
//! Both sides are parsed with lightningcss and compared positionally: rule
//! `i` of the original against rule `i` of the mirrored text, then
//! declaration `j` against declaration `j`, each declaration by its printed
//! form. Only declarations whose printed form changed are emitted, grouped
//! under the mirrored rule's selector. `@media` and `@supports` blocks are
//! compared recursively and wrapped around whatever changed inside them.

use lightningcss::declaration::DeclarationBlock;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use tracing::warn;

/// Either side of the diff failed to parse or print.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("cannot parse the original stylesheet: {0}")]
    Original(String),

    #[error("cannot parse the mirrored stylesheet: {0}")]
    Mirrored(String),

    #[error("cannot print `{0}`")]
    Print(String),
}

/// Keep only the declarations of `transformed` that differ from `original`.
///
/// Each changed rule becomes `selector {\n  declaration;\n}\n`. Identical
/// inputs produce an empty string.
pub fn diff(original: &str, transformed: &str) -> Result<String, DiffError> {
    let original = StyleSheet::parse(original, ParserOptions::default())
        .map_err(|e| DiffError::Original(e.to_string()))?;
    let transformed = StyleSheet::parse(transformed, ParserOptions::default())
        .map_err(|e| DiffError::Mirrored(e.to_string()))?;

    let mut out = String::new();
    diff_rules(&original.rules, &transformed.rules, &mut out)?;
    Ok(out)
}

fn diff_rules(
    original: &CssRuleList<'_>,
    transformed: &CssRuleList<'_>,
    out: &mut String,
) -> Result<(), DiffError> {
    if original.0.len() != transformed.0.len() {
        warn!(
            original = original.0.len(),
            transformed = transformed.0.len(),
            "rule count differs, comparing the common prefix positionally"
        );
    }

    for (original, transformed) in original.0.iter().zip(&transformed.0) {
        match (original, transformed) {
            (CssRule::Style(original), CssRule::Style(transformed)) => {
                let changed = changed_declarations(&original.declarations, &transformed.declarations)?;
                let selector = print(&transformed.selectors)?;
                write_block(&selector, &changed, out);
            }
            (CssRule::Media(original), CssRule::Media(transformed)) => {
                let header = format!("@media {}", print(&transformed.query)?);
                diff_group(&header, &original.rules, &transformed.rules, out)?;
            }
            (CssRule::Supports(original), CssRule::Supports(transformed)) => {
                let header = format!("@supports {}", print(&transformed.condition)?);
                diff_group(&header, &original.rules, &transformed.rules, out)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn diff_group(
    header: &str,
    original: &CssRuleList<'_>,
    transformed: &CssRuleList<'_>,
    out: &mut String,
) -> Result<(), DiffError> {
    let mut inner = String::new();
    diff_rules(original, transformed, &mut inner)?;
    if !inner.is_empty() {
        out.push_str(header);
        out.push_str(" {\n");
        out.push_str(&inner);
        out.push_str("}\n");
    }
    Ok(())
}

/// Printed declarations of `transformed` whose counterpart in `original`
/// prints differently. Unmatched declarations count as changed.
fn changed_declarations(
    original: &DeclarationBlock<'_>,
    transformed: &DeclarationBlock<'_>,
) -> Result<Vec<String>, DiffError> {
    let original = printed_declarations(original)?;
    let transformed = printed_declarations(transformed)?;
    if original.len() != transformed.len() {
        warn!(
            original = original.len(),
            transformed = transformed.len(),
            "declaration count differs, unmatched declarations count as changed"
        );
    }

    Ok(transformed
        .into_iter()
        .enumerate()
        .filter(|(j, decl)| original.get(*j) != Some(decl))
        .map(|(_, decl)| decl)
        .collect())
}

fn printed_declarations(block: &DeclarationBlock<'_>) -> Result<Vec<String>, DiffError> {
    block
        .iter()
        .map(|(property, important)| {
            property
                .to_css_string(important, PrinterOptions::default())
                .map_err(|e| DiffError::Print(e.to_string()))
        })
        .collect()
}

fn print<T: ToCss>(value: &T) -> Result<String, DiffError> {
    value
        .to_css_string(PrinterOptions::default())
        .map_err(|e| DiffError::Print(e.to_string()))
}

fn write_block(selector: &str, declarations: &[String], out: &mut String) {
    if declarations.is_empty() {
        return;
    }
    out.push_str(selector);
    out.push_str(" {\n");
    for decl in declarations {
        out.push_str("  ");
        out.push_str(decl);
        out.push_str(";\n");
    }
    out.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_changed_declarations() {
        let out = diff(".foo { padding-left: 10px; }", ".foo { padding-right: 10px; }").unwrap();
        assert_eq!(out, ".foo {\n  padding-right: 10px;\n}\n");
    }

    #[test]
    fn test_identical_input_is_empty() {
        let css = "a { color: red; float: left }\n@media print { b { margin: 0 } }";
        assert_eq!(diff(css, css).unwrap(), "");
        assert_eq!(diff("", "").unwrap(), "");
    }

    #[test]
    fn test_formatting_differences_are_not_changes() {
        let out = diff(".a{color:red;float:left}", ".a {\n  color: red;\n  float: left;\n}\n").unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_unchanged_rules_are_dropped() {
        let original = ".a { color: red }\n.b { float: left; color: blue }\n.c { top: 0 }";
        let mirrored = ".a { color: red }\n.b { float: right; color: blue }\n.c { top: 0 }";
        assert_eq!(diff(original, mirrored).unwrap(), ".b {\n  float: right;\n}\n");
    }

    #[test]
    fn test_multiple_changes_keep_order() {
        let original = ".a { left: 0; color: red; margin-left: 1px }\n.b { text-align: left }";
        let mirrored = ".a { right: 0; color: red; margin-right: 1px }\n.b { text-align: right }";
        assert_eq!(
            diff(original, mirrored).unwrap(),
            ".a {\n  right: 0;\n  margin-right: 1px;\n}\n.b {\n  text-align: right;\n}\n"
        );
    }

    #[test]
    fn test_uses_mirrored_selector() {
        let out = diff(".float-left { float: left }", ".float-right { float: right }").unwrap();
        assert_eq!(out, ".float-right {\n  float: right;\n}\n");
    }

    #[test]
    fn test_important_is_kept() {
        let out = diff(".a { float: left !important }", ".a { float: right !important }").unwrap();
        assert_eq!(out, ".a {\n  float: right !important;\n}\n");
    }

    #[test]
    fn test_media_blocks_are_wrapped() {
        let original = "@media print { .a { left: 0 } .b { top: 0 } }";
        let mirrored = "@media print { .a { right: 0 } .b { top: 0 } }";
        assert_eq!(
            diff(original, mirrored).unwrap(),
            "@media print {\n.a {\n  right: 0;\n}\n}\n"
        );
    }

    #[test]
    fn test_comments_do_not_shift_positions() {
        let original = "/*rtl:begin*/ .a { left: 0 }";
        let mirrored = ".a { right: 0 }";
        assert_eq!(diff(original, mirrored).unwrap(), ".a {\n  right: 0;\n}\n");
    }

    #[test]
    fn test_extra_mirrored_declarations_count_as_changed() {
        let out = diff(".a { margin: 0 }", ".a { margin: 0; direction: rtl }").unwrap();
        assert_eq!(out, ".a {\n  direction: rtl;\n}\n");
    }

    #[test]
    fn test_parse_errors_name_the_side() {
        assert!(matches!(
            diff("..broken { left: 0 }", ".a { right: 0 }"),
            Err(DiffError::Original(_))
        ));
        assert!(matches!(
            diff(".a { left: 0 }", "..broken { right: 0 }"),
            Err(DiffError::Mirrored(_))
        ));
    }
}
