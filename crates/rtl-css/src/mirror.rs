//! Span-splicing RTL rewrite engine
//!
//! The stylesheet is outlined once; every rule that flips produces an edit
//! over the byte span it replaces, and the edits are spliced back into the
//! untouched source. Whitespace, comments and ordering survive as written.
//!
//! Directives:
//! - `/*rtl:ignore*/` leaves the next declaration, rule or at-rule alone
//! - `/*rtl:begin:ignore*/` … `/*rtl:end:ignore*/` leaves everything between alone

use std::ops::Range;
use std::sync::Arc;

use rtl_pipeline::{DirectionalTransform, TransformError, TransformExtension, TransformOptions};
use tracing::{debug, trace};

use crate::rename::Renamer;
use crate::syntax::{AtBlock, AtRule, Comment, Declaration, Item, Node, Rule, Stylesheet};
use crate::values;

/// The built-in directional rewrite engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct MirrorEngine;

impl DirectionalTransform for MirrorEngine {
    async fn transform(
        &self,
        css: &str,
        options: &TransformOptions,
        extensions: &[Arc<dyn TransformExtension>],
    ) -> Result<String, TransformError> {
        mirror(css, options, extensions)
    }
}

/// Mirror `css` from left-to-right to right-to-left.
pub fn mirror(
    css: &str,
    options: &TransformOptions,
    extensions: &[Arc<dyn TransformExtension>],
) -> Result<String, TransformError> {
    let sheet = Stylesheet::parse(css).map_err(|e| TransformError::Parse {
        offset: e.offset,
        message: e.kind.to_string(),
    })?;
    let mut rewriter = Rewriter {
        clean: options.clean,
        extensions,
        renamer: options.auto_rename.then(|| Renamer::new(&options.string_map)),
        edits: Vec::new(),
    };
    rewriter.nodes(&sheet.nodes);
    debug!(edits = rewriter.edits.len(), "mirrored stylesheet");
    Ok(splice(css, rewriter.edits))
}

struct Edit {
    span: Range<usize>,
    text: String,
}

fn splice(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.span.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.span.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.text);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Ignore state for one block level.
#[derive(Default)]
struct Ignore {
    next: bool,
    block: bool,
}

impl Ignore {
    fn directive(&mut self, name: &str) {
        match name {
            "ignore" => self.next = true,
            "begin:ignore" => self.block = true,
            "end:ignore" => self.block = false,
            other => trace!(directive = other, "unknown rtl directive"),
        }
    }

    /// Whether the construct that follows stays as is. Consumes a pending `ignore`.
    fn skip(&mut self) -> bool {
        std::mem::take(&mut self.next) || self.block
    }
}

struct Rewriter<'o> {
    clean: bool,
    extensions: &'o [Arc<dyn TransformExtension>],
    renamer: Option<Renamer>,
    edits: Vec<Edit>,
}

impl Rewriter<'_> {
    fn replace(&mut self, span: Range<usize>, text: String) {
        self.edits.push(Edit { span, text });
    }

    fn comment(&mut self, comment: &Comment<'_>, ignore: &mut Ignore) {
        let Some(directive) = comment.directive() else {
            return;
        };
        ignore.directive(directive);
        if self.clean {
            self.replace(comment.span.clone(), String::new());
        }
    }

    fn nodes(&mut self, nodes: &[Node<'_>]) {
        let mut ignore = Ignore::default();
        for node in nodes {
            match node {
                Node::Comment(comment) => self.comment(comment, &mut ignore),
                Node::Rule(rule) => {
                    if !ignore.skip() {
                        self.rule(rule);
                    }
                }
                Node::AtRule(at_rule) => {
                    if !ignore.skip() {
                        self.at_rule(at_rule);
                    }
                }
            }
        }
    }

    fn items(&mut self, items: &[Item<'_>]) {
        let mut ignore = Ignore::default();
        for item in items {
            match item {
                Item::Comment(comment) => self.comment(comment, &mut ignore),
                Item::Declaration(decl) => {
                    if !ignore.skip() {
                        self.declaration(decl);
                    }
                }
                Item::Rule(rule) => {
                    if !ignore.skip() {
                        self.rule(rule);
                    }
                }
                Item::AtRule(at_rule) => {
                    if !ignore.skip() {
                        self.at_rule(at_rule);
                    }
                }
            }
        }
    }

    fn rule(&mut self, rule: &Rule<'_>) {
        let renamed = self
            .extensions
            .iter()
            .find_map(|ext| ext.selector(rule.selector))
            .or_else(|| self.renamer.as_ref()?.rename(rule.selector));
        if let Some(selector) = renamed.filter(|s| s != rule.selector) {
            self.replace(rule.selector_span.clone(), selector);
        }
        self.items(&rule.items);
    }

    fn at_rule(&mut self, at_rule: &AtRule<'_>) {
        match &at_rule.block {
            Some(AtBlock::Declarations(items)) => self.items(items),
            Some(AtBlock::Nodes(nodes)) => self.nodes(nodes),
            None => {}
        }
    }

    fn declaration(&mut self, decl: &Declaration<'_>) {
        let handled = self.extensions.iter().find_map(|ext| {
            let replacement = ext.declaration(decl.property, decl.value)?;
            trace!(extension = ext.name(), property = decl.property, "extension rewrite");
            Some(replacement)
        });

        let (property, value) = match handled {
            Some((property, value)) => (
                Some(property).filter(|p| p != decl.property),
                Some(value).filter(|v| v != decl.value),
            ),
            None => (
                values::mirror_property(decl.property),
                values::mirror_value(decl.property, decl.value),
            ),
        };

        if let Some(property) = property {
            self.replace(decl.property_span.clone(), property);
        }
        if let Some(value) = value {
            self.replace(decl.value_span.clone(), value);
        }
    }
}
