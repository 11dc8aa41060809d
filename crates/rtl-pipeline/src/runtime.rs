//! Runtime bootstrap patch
//!
//! Rewrites the stylesheet suffix in a generated chunk loader so a global
//! flag picks the variant at runtime:
//! `href = id + ".css"` → `href = id + (IS_RTL ? ".rtl.css" : ".css")`

/// Flag consulted by the patched loader unless configured otherwise.
pub const DEFAULT_RTL_FLAG: &str = "IS_RTL";

const CSS_SUFFIX: &str = "\".css\"";

/// The conditional expression that replaces every `".css"` literal.
pub fn suffix_expression(flag: &str) -> String {
    format!("({flag} ? \".rtl.css\" : {CSS_SUFFIX})")
}

/// Patch `source`, or `None` when there is nothing to patch or the patch is
/// already present.
pub fn patch_loader(source: &str, flag: &str) -> Option<String> {
    let expression = suffix_expression(flag);
    if source.contains(&expression) || !source.contains(CSS_SUFFIX) {
        return None;
    }
    Some(source.replace(CSS_SUFFIX, &expression))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_loader() {
        let source = r#"var href = "" + chunkId + ".css";"#;
        let patched = patch_loader(source, DEFAULT_RTL_FLAG).unwrap();
        assert_eq!(
            patched,
            r#"var href = "" + chunkId + (IS_RTL ? ".rtl.css" : ".css");"#
        );
    }

    #[test]
    fn test_patch_is_applied_once() {
        let source = r#"a + ".css""#;
        let patched = patch_loader(source, "DIR_RTL").unwrap();
        assert!(patched.contains("DIR_RTL ? \".rtl.css\""));
        assert_eq!(patch_loader(&patched, "DIR_RTL"), None);
    }

    #[test]
    fn test_nothing_to_patch() {
        assert_eq!(patch_loader("console.log(1)", DEFAULT_RTL_FLAG), None);
    }
}
