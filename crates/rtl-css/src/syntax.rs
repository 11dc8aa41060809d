//! Span-keeping stylesheet outline
//!
//! Tokenizes with cssparser and groups the tokens into rules, at-rules,
//! declarations and comments without interpreting any values. Every piece
//! keeps its byte span in the source, so the mirror engine can splice
//! replacements back in while preserving formatting.

use std::ops::Range;

use cssparser::{Parser, ParserInput, Token};

/// At-rules whose block holds declarations rather than nested rules.
const DECLARATION_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "counter-style",
    "font-palette-values",
    "property",
    "viewport",
];

/// A failure, with the byte offset where the offending construct starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unclosed block")]
    UnclosedBlock,
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("unclosed string")]
    UnclosedString,
    #[error("malformed url")]
    BadUrl,
    #[error("unexpected `}}`")]
    UnexpectedClose,
    #[error("expected `{{` after selector")]
    MissingBlock,
    #[error("declaration is missing `:`")]
    MissingColon,
    #[error("expected a declaration")]
    ExpectedDeclaration,
}

impl ParseError {
    fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

type BlockError<'i> = cssparser::ParseError<'i, ()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet<'a> {
    pub source: &'a str,
    pub nodes: Vec<Node<'a>>,
}

/// A top-level (or grouping at-rule nested) node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Rule(Rule<'a>),
    AtRule(AtRule<'a>),
    Comment(Comment<'a>),
}

/// Something inside a declaration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<'a> {
    Declaration(Declaration<'a>),
    Comment(Comment<'a>),
    /// A nested rule (CSS nesting).
    Rule(Rule<'a>),
    AtRule(AtRule<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    /// Text between `/*` and `*/`
    pub text: &'a str,
    /// Span including the delimiters
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<'a> {
    pub selector: &'a str,
    pub selector_span: Range<usize>,
    pub items: Vec<Item<'a>>,
    /// From the first selector byte through the closing `}`
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub property: &'a str,
    pub property_span: Range<usize>,
    /// Value without any trailing `!important`
    pub value: &'a str,
    pub value_span: Range<usize>,
    pub important: bool,
    /// Raw declaration text without the terminating `;`
    pub text: &'a str,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule<'a> {
    pub name: &'a str,
    pub prelude: &'a str,
    pub block: Option<AtBlock<'a>>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtBlock<'a> {
    Declarations(Vec<Item<'a>>),
    Nodes(Vec<Node<'a>>),
}

impl<'a> Stylesheet<'a> {
    pub fn parse(source: &'a str) -> Result<Self, ParseError> {
        let mut input = ParserInput::new(source);
        let mut parser = Parser::new(&mut input);
        let nodes = Outline { source }.nodes(&mut parser)?;
        Ok(Self { source, nodes })
    }
}

impl<'a> Rule<'a> {
    /// Declarations in source order, skipping comments and nested rules.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration<'a>> {
        self.items.iter().filter_map(|item| match item {
            Item::Declaration(decl) => Some(decl),
            _ => None,
        })
    }
}

impl Comment<'_> {
    /// The `rtl:` directive this comment carries, if any.
    pub fn directive(&self) -> Option<&str> {
        self.text.trim().strip_prefix("rtl:").map(str::trim)
    }
}

fn is_block_opener(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
    )
}

/// Consume the rest of the block just opened.
fn skip_block<'i>(input: &mut Parser<'i, '_>) {
    let _ = input.parse_nested_block(|_| Ok::<(), BlockError<'i>>(()));
}

/// Whether the construct at the cursor opens a block before it ends.
fn opens_block(input: &mut Parser<'_, '_>) -> bool {
    let state = input.state();
    let nested = loop {
        match input.next_including_whitespace_and_comments() {
            Ok(Token::CurlyBracketBlock) => break true,
            Ok(Token::Semicolon) | Err(_) => break false,
            Ok(_) => {}
        }
    };
    input.reset(&state);
    nested
}

struct Outline<'i> {
    source: &'i str,
}

impl<'i> Outline<'i> {
    fn nodes(&self, input: &mut Parser<'i, '_>) -> Result<Vec<Node<'i>>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            let state = input.state();
            let start = state.position().byte_index();
            let token = match input.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => return Ok(nodes),
            };
            match token {
                Token::WhiteSpace(_) | Token::Semicolon | Token::CDO | Token::CDC => {}
                Token::Comment(text) => nodes.push(Node::Comment(self.comment(text, start, input)?)),
                Token::AtKeyword(_) => {
                    nodes.push(Node::AtRule(self.at_rule(start, input, false)?));
                }
                Token::CloseCurlyBracket => {
                    return Err(ParseError::new(ParseErrorKind::UnexpectedClose, start));
                }
                _ => {
                    input.reset(&state);
                    nodes.push(Node::Rule(self.rule(input)?));
                }
            }
        }
    }

    fn items(&self, input: &mut Parser<'i, '_>) -> Result<Vec<Item<'i>>, ParseError> {
        let mut items = Vec::new();
        loop {
            let state = input.state();
            let start = state.position().byte_index();
            let token = match input.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => return Ok(items),
            };
            match token {
                Token::WhiteSpace(_) | Token::Semicolon => {}
                Token::Comment(text) => items.push(Item::Comment(self.comment(text, start, input)?)),
                Token::AtKeyword(_) => items.push(Item::AtRule(self.at_rule(start, input, true)?)),
                token => {
                    input.reset(&state);
                    if opens_block(input) {
                        items.push(Item::Rule(self.rule(input)?));
                    } else if matches!(token, Token::Ident(_)) {
                        items.push(Item::Declaration(self.declaration(input)?));
                    } else {
                        return Err(ParseError::new(ParseErrorKind::ExpectedDeclaration, start));
                    }
                }
            }
        }
    }

    fn comment(
        &self,
        text: &'i str,
        start: usize,
        input: &Parser<'i, '_>,
    ) -> Result<Comment<'i>, ParseError> {
        let span = start..input.position().byte_index();
        if span.len() < 4 || !self.source[span.clone()].ends_with("*/") {
            return Err(ParseError::new(ParseErrorKind::UnclosedComment, start));
        }
        Ok(Comment { text, span })
    }

    /// Reject tokens the tokenizer only produces for malformed input.
    fn check(token: &Token<'_>, offset: usize) -> Result<(), ParseError> {
        match token {
            Token::BadString(_) => Err(ParseError::new(ParseErrorKind::UnclosedString, offset)),
            Token::BadUrl(_) => Err(ParseError::new(ParseErrorKind::BadUrl, offset)),
            _ => Ok(()),
        }
    }

    /// Consume significant tokens up to (and including) a `{` block opener,
    /// or up to a `;` or the end of input. Returns the span of the consumed
    /// text without surrounding whitespace and comments, and the offset of
    /// the `{` when there is one.
    fn prelude(
        &self,
        input: &mut Parser<'i, '_>,
        mut span: Range<usize>,
    ) -> Result<(Range<usize>, Option<usize>), ParseError> {
        let mut significant = false;
        loop {
            let before = input.position().byte_index();
            let token = match input.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => return Ok((span, None)),
            };
            match token {
                Token::CurlyBracketBlock => return Ok((span, Some(before))),
                Token::Semicolon => return Ok((span, None)),
                Token::WhiteSpace(_) | Token::Comment(_) => {}
                Token::CloseCurlyBracket => {
                    return Err(ParseError::new(ParseErrorKind::UnexpectedClose, before));
                }
                token => {
                    Self::check(&token, before)?;
                    if is_block_opener(&token) {
                        skip_block(input);
                    }
                    if !significant {
                        span.start = before;
                        significant = true;
                    }
                    span.end = input.position().byte_index();
                }
            }
        }
    }

    /// Walk the block just opened at `open`, requiring its closing `}`.
    fn block<T>(
        &self,
        input: &mut Parser<'i, '_>,
        open: usize,
        walk: impl FnOnce(&Self, &mut Parser<'i, '_>) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let unclosed = ParseError::new(ParseErrorKind::UnclosedBlock, open);
        let mut inner_end = 0;
        let walked = input
            .parse_nested_block(|block| {
                let walked = walk(self, block);
                inner_end = block.position().byte_index();
                Ok::<_, BlockError<'i>>(walked)
            })
            .map_err(|_| unclosed.clone())??;
        // the closing `}` is consumed by the outer parser, past the inner end
        if input.position().byte_index() <= inner_end {
            return Err(unclosed);
        }
        Ok(walked)
    }

    fn rule(&self, input: &mut Parser<'i, '_>) -> Result<Rule<'i>, ParseError> {
        let start = input.position().byte_index();
        let (selector_span, open) = self.prelude(input, start..start)?;
        let Some(open) = open else {
            return Err(ParseError::new(ParseErrorKind::MissingBlock, start));
        };
        let items = self.block(input, open, Self::items)?;
        Ok(Rule {
            selector: &self.source[selector_span.clone()],
            selector_span,
            items,
            span: start..input.position().byte_index(),
        })
    }

    /// An at-rule whose keyword was just consumed from `start`. Inside a
    /// declaration block (`nested`), its block holds declarations too.
    fn at_rule(
        &self,
        start: usize,
        input: &mut Parser<'i, '_>,
        nested: bool,
    ) -> Result<AtRule<'i>, ParseError> {
        let name_end = input.position().byte_index();
        let name = &self.source[start + 1..name_end];
        let (prelude, open) = self.prelude(input, name_end..name_end)?;

        let block = match open {
            None => None,
            Some(open)
                if nested || DECLARATION_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) =>
            {
                Some(AtBlock::Declarations(self.block(input, open, Self::items)?))
            }
            Some(open) => Some(AtBlock::Nodes(self.block(input, open, Self::nodes)?)),
        };
        let end = input.position().byte_index();
        Ok(AtRule {
            name,
            prelude: &self.source[prelude],
            block,
            span: start..end,
        })
    }

    /// A declaration starting at the property identifier under the cursor.
    fn declaration(&self, input: &mut Parser<'i, '_>) -> Result<Declaration<'i>, ParseError> {
        let start = input.position().byte_index();
        let _ = input.next_including_whitespace_and_comments();
        let property_span = start..input.position().byte_index();

        loop {
            match input.next_including_whitespace_and_comments() {
                Ok(Token::Colon) => break,
                Ok(Token::WhiteSpace(_) | Token::Comment(_)) => {}
                _ => return Err(ParseError::new(ParseErrorKind::MissingColon, start)),
            }
        }

        let colon_end = input.position().byte_index();
        let (raw, _) = self.prelude(input, colon_end..colon_end)?;
        let text_span = start..raw.end.max(colon_end);

        let raw_value = &self.source[raw.clone()];
        let (value_span, important) = match raw_value.rfind('!') {
            Some(bang) if raw_value[bang + 1..].trim().eq_ignore_ascii_case("important") => {
                let value = raw_value[..bang].trim_end();
                (raw.start..raw.start + value.len(), true)
            }
            _ => (raw, false),
        };

        Ok(Declaration {
            property: &self.source[property_span.clone()],
            property_span,
            value: &self.source[value_span.clone()],
            value_span,
            important,
            text: &self.source[text_span.clone()],
            span: text_span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule<'a>(sheet: &'a Stylesheet<'a>, index: usize) -> &'a Rule<'a> {
        match &sheet.nodes[index] {
            Node::Rule(rule) => rule,
            other => panic!("expected rule, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_and_declarations() {
        let sheet = Stylesheet::parse(".foo, .bar { padding-left: 10px; color : red }").unwrap();
        assert_eq!(sheet.nodes.len(), 1);
        let rule = rule(&sheet, 0);
        assert_eq!(rule.selector, ".foo, .bar");

        let decls: Vec<_> = rule.declarations().collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "padding-left");
        assert_eq!(decls[0].value, "10px");
        assert_eq!(decls[0].text, "padding-left: 10px");
        assert_eq!(decls[1].text, "color : red");
        assert_eq!(&sheet.source[decls[1].value_span.clone()], "red");
    }

    #[test]
    fn test_important_is_split_from_value() {
        let sheet = Stylesheet::parse("a{float:left !important}").unwrap();
        let decl = rule(&sheet, 0).declarations().next().unwrap();
        assert!(decl.important);
        assert_eq!(decl.value, "left");
        assert_eq!(decl.text, "float:left !important");

        let sheet = Stylesheet::parse(r#"a{content:"!important"}"#).unwrap();
        let decl = rule(&sheet, 0).declarations().next().unwrap();
        assert!(!decl.important);
    }

    #[test]
    fn test_semicolons_inside_urls_and_strings() {
        let css = r#"a { background: url(data:image/png;base64,AAA); content: "x;}y" }"#;
        let sheet = Stylesheet::parse(css).unwrap();
        let decls: Vec<_> = rule(&sheet, 0).declarations().collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, "url(data:image/png;base64,AAA)");
        assert_eq!(decls[1].value, r#""x;}y""#);
    }

    #[test]
    fn test_functions_stay_whole() {
        let sheet = Stylesheet::parse("a { width: calc(100% - var(--gap, 1px)) }").unwrap();
        let decl = rule(&sheet, 0).declarations().next().unwrap();
        assert_eq!(decl.value, "calc(100% - var(--gap, 1px))");
    }

    #[test]
    fn test_at_rules() {
        let css = "@charset \"utf-8\";\n@media (min-width: 10px) { .a { left: 0 } }\n@font-face { font-family: X }";
        let sheet = Stylesheet::parse(css).unwrap();
        assert_eq!(sheet.nodes.len(), 3);

        let Node::AtRule(charset) = &sheet.nodes[0] else { panic!() };
        assert_eq!(charset.name, "charset");
        assert!(charset.block.is_none());

        let Node::AtRule(media) = &sheet.nodes[1] else { panic!() };
        assert_eq!(media.prelude, "(min-width: 10px)");
        let Some(AtBlock::Nodes(inner)) = &media.block else { panic!() };
        assert_eq!(inner.len(), 1);

        let Node::AtRule(font) = &sheet.nodes[2] else { panic!() };
        let Some(AtBlock::Declarations(items)) = &font.block else { panic!() };
        assert!(matches!(&items[0], Item::Declaration(decl) if decl.property == "font-family"));
    }

    #[test]
    fn test_comments_are_kept_with_spans() {
        let css = "/* top */ a { /*rtl:ignore*/ left: 0 }";
        let sheet = Stylesheet::parse(css).unwrap();
        let Node::Comment(top) = &sheet.nodes[0] else { panic!() };
        assert_eq!(top.text, " top ");
        assert_eq!(&css[top.span.clone()], "/* top */");

        let Item::Comment(directive) = &rule(&sheet, 1).items[0] else { panic!() };
        assert_eq!(directive.directive(), Some("ignore"));
    }

    #[test]
    fn test_nested_rules() {
        let sheet = Stylesheet::parse(".a { left: 0; &:hover { right: 0 } }").unwrap();
        let outer = rule(&sheet, 0);
        assert_eq!(outer.declarations().count(), 1);
        assert!(matches!(&outer.items[1], Item::Rule(nested) if nested.selector == "&:hover"));
        assert_eq!(outer.span, 0..36);

        let sheet = Stylesheet::parse(".a { @media print { left: 0 } }").unwrap();
        let Item::AtRule(media) = &rule(&sheet, 0).items[0] else { panic!() };
        assert!(matches!(&media.block, Some(AtBlock::Declarations(items)) if items.len() == 1));
    }

    #[test]
    fn test_errors() {
        let err = Stylesheet::parse(".a { left: 0").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedBlock);
        assert_eq!(err.offset, 3);

        let err = Stylesheet::parse(".a { .b { left: 0 }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedBlock);
        assert_eq!(err.offset, 3);

        let err = Stylesheet::parse("a { b }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);

        let err = Stylesheet::parse("a { } }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedClose);

        let err = Stylesheet::parse("/* never closed").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedComment);

        let err = Stylesheet::parse("color: red;").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingBlock);

        let err = Stylesheet::parse("a { content: \"x\n }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedString);
    }

    #[test]
    fn test_empty_input() {
        assert!(Stylesheet::parse("").unwrap().nodes.is_empty());
        assert!(Stylesheet::parse("  \n ").unwrap().nodes.is_empty());
    }
}
