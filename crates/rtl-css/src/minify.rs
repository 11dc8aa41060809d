//! lightningcss minifier

use std::collections::HashSet;

use lightningcss::stylesheet::{self, ParserOptions, PrinterOptions, StyleSheet};
use rtl_pipeline::{Minifier, MinifyError, MinifyOptions};
use tracing::trace;

/// Minifies with lightningcss, printing the most compact form.
#[derive(Debug, Default, Clone, Copy)]
pub struct LightningMinifier;

impl Minifier for LightningMinifier {
    async fn minify(&self, css: &str, options: &MinifyOptions) -> Result<String, MinifyError> {
        minify_css(css, options)
    }
}

/// Parse, optionally restructure, and print `css` minified.
pub fn minify_css(css: &str, options: &MinifyOptions) -> Result<String, MinifyError> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| MinifyError::Syntax(e.to_string()))?;

    if options.structural {
        let unused_symbols: HashSet<String> = options.unused_symbols.iter().cloned().collect();
        sheet
            .minify(stylesheet::MinifyOptions {
                unused_symbols,
                ..Default::default()
            })
            .map_err(|e| MinifyError::Engine(e.to_string()))?;
    }

    let printer_options = PrinterOptions {
        minify: true,
        ..Default::default()
    };
    let printed = sheet
        .to_css(printer_options)
        .map_err(|e| MinifyError::Engine(e.to_string()))?;

    trace!(before = css.len(), after = printed.code.len(), "minified");
    Ok(printed.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        let css = ".box {\n  padding-left: 10px;\n}\n";
        let min = minify_css(css, &MinifyOptions::default()).unwrap();
        assert_eq!(min, ".box{padding-left:10px}");
    }

    #[test]
    fn test_unused_symbols_are_dropped() {
        let css = ".a { color: red }\n.unused { color: red }\n";

        let options = MinifyOptions {
            structural: true,
            unused_symbols: ["unused".to_string()].into(),
        };
        assert_eq!(minify_css(css, &options).unwrap(), ".a{color:red}");

        let options = MinifyOptions {
            structural: false,
            ..options
        };
        assert_eq!(
            minify_css(css, &options).unwrap(),
            ".a{color:red}.unused{color:red}"
        );
    }

    #[test]
    fn test_invalid_selector_is_a_syntax_error() {
        let err = minify_css("..broken { color: red }", &MinifyOptions::default()).unwrap_err();
        assert!(matches!(err, MinifyError::Syntax(_)));
    }

    #[tokio::test]
    async fn test_minifier_trait() {
        let min = LightningMinifier
            .minify("a { margin: 0 }", &MinifyOptions::default())
            .await
            .unwrap();
        assert_eq!(min, "a{margin:0}");
    }
}
