use std::collections::BTreeMap;

use crate::ast::Node;
use crate::error::InvalidSyntax;
use crate::lexer::{self, Span, Spanned, Token};

/// An alias imported from another declaration site, re-parsed in the
/// context that declared it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedAlias {
    pub type_str: String,
    pub context: ParsingContext,
}

/// Ambient names visible to a type string.
///
/// Qualified names use `.` as separator (`app.models.User`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsingContext {
    /// Namespace of the declaration the type string belongs to.
    pub namespace: Option<String>,
    /// Short name (or leading segment) to qualified name.
    pub imports: BTreeMap<String, String>,
    /// Aliases declared next to the type string.
    pub local_aliases: BTreeMap<String, String>,
    pub imported_aliases: BTreeMap<String, ImportedAlias>,
    /// Generic parameters bound to already-parsed nodes.
    pub generics: BTreeMap<String, Node>,
}

impl ParsingContext {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        ParsingContext {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn with_import(mut self, short: impl Into<String>, qualified: impl Into<String>) -> Self {
        self.imports.insert(short.into(), qualified.into());
        self
    }

    pub fn with_local_alias(mut self, name: impl Into<String>, type_str: impl Into<String>) -> Self {
        self.local_aliases.insert(name.into(), type_str.into());
        self
    }

    pub fn with_imported_alias(
        mut self,
        name: impl Into<String>,
        type_str: impl Into<String>,
        context: ParsingContext,
    ) -> Self {
        self.imported_aliases.insert(
            name.into(),
            ImportedAlias {
                type_str: type_str.into(),
                context,
            },
        );
        self
    }

    pub fn with_generic(mut self, name: impl Into<String>, node: Node) -> Self {
        self.generics.insert(name.into(), node);
        self
    }

    /// Qualified names `ident` may refer to, most specific first.
    pub fn candidates(&self, ident: &str) -> Vec<String> {
        if let Some(absolute) = ident.strip_prefix('.') {
            return vec![absolute.to_owned()];
        }
        let mut out = Vec::new();
        let (head, rest) = match ident.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (ident, None),
        };
        if let Some(qualified) = self.imports.get(head) {
            out.push(match rest {
                Some(rest) => format!("{}.{}", qualified, rest),
                None => qualified.clone(),
            });
        }
        if let Some(ns) = &self.namespace {
            out.push(format!("{}.{}", ns, ident));
        }
        out.push(ident.to_owned());
        out
    }
}

/// Cursor over the token sequence of one type string.
pub struct ParserState<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    context: &'a ParsingContext,
    /// Nesting depth, carried into alias and object expansions.
    pub(crate) depth: usize,
    /// Aliases and object types currently being expanded.
    pub(crate) expanding: Vec<String>,
}

impl<'a> ParserState<'a> {
    pub fn new(input: &'a str, context: &'a ParsingContext) -> Result<Self, InvalidSyntax> {
        Ok(ParserState {
            input,
            tokens: lexer::tokenize(input)?,
            pos: 0,
            context,
            depth: 0,
            expanding: Vec::new(),
        })
    }

    /// State for a nested type string (alias body, field type) that
    /// inherits depth and the expansion stack.
    pub(crate) fn nested<'b>(
        &self,
        input: &'b str,
        context: &'b ParsingContext,
        expanding: Option<String>,
    ) -> Result<ParserState<'b>, InvalidSyntax> {
        let mut state = ParserState::new(input, context)?;
        state.depth = self.depth;
        state.expanding = self.expanding.clone();
        state.expanding.extend(expanding);
        Ok(state)
    }

    pub fn input(&self) -> &str {
        self.input
    }

    pub fn context(&self) -> &'a ParsingContext {
        self.context
    }

    pub fn is_expanding(&self, key: &str) -> bool {
        self.expanding.iter().any(|k| k == key)
    }

    pub fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek(&self) -> &Token {
        &self.cur().token
    }

    /// Token `n` positions ahead of the cursor; `Eof` past the end.
    pub fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].token
    }

    pub fn span(&self) -> Span {
        self.cur().span
    }

    pub fn at_end(&self) -> bool {
        self.peek() == &Token::Eof
    }

    /// Move past the current token. Advancing past the end is fatal.
    pub fn advance(&mut self) -> Result<Spanned, InvalidSyntax> {
        if self.at_end() {
            return Err(self.err("unexpected end of input"));
        }
        let t = self.tokens[self.pos].clone();
        self.pos += 1;
        Ok(t)
    }

    pub fn expect(&mut self, expected: Token) -> Result<Spanned, InvalidSyntax> {
        if self.peek() == &expected {
            self.advance()
        } else {
            Err(self.err(format!("expected '{}', got '{}'", expected, self.peek())))
        }
    }

    /// Consume `token` if it is next.
    pub fn eat(&mut self, token: &Token) -> Result<bool, InvalidSyntax> {
        if self.peek() == token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn is_ident(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Ident(x) if x == w)
    }

    pub fn ident(&self) -> Option<&str> {
        match self.peek() {
            Token::Ident(w) => Some(w),
            _ => None,
        }
    }

    pub fn take_ident(&mut self) -> Result<String, InvalidSyntax> {
        if let Token::Ident(w) = self.peek().clone() {
            self.advance()?;
            Ok(w)
        } else {
            Err(self.err(format!("expected identifier, got '{}'", self.peek())))
        }
    }

    /// Error pointing at the current token.
    pub fn err(&self, msg: impl Into<String>) -> InvalidSyntax {
        let cur = self.cur();
        InvalidSyntax::new(msg, self.input, cur.span.start, cur.text())
    }

    /// Error pointing at an earlier token.
    pub fn err_at(&self, at: &Spanned, msg: impl Into<String>) -> InvalidSyntax {
        InvalidSyntax::new(msg, self.input, at.span.start, at.text())
    }

    /// Attach a position to an invariant error from a node constructor.
    pub fn locate(&self, at: &Spanned, err: InvalidSyntax) -> InvalidSyntax {
        err.at(self.input, at.span.start, &at.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advancing_past_end_is_fatal() {
        let ctx = ParsingContext::default();
        let mut state = ParserState::new("int", &ctx).unwrap();
        assert!(state.advance().is_ok());
        assert!(state.at_end());
        let err = state.advance().unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn lookahead_saturates_at_eof() {
        let ctx = ParsingContext::default();
        let state = ParserState::new("a", &ctx).unwrap();
        assert_eq!(state.peek_at(0), &Token::Ident("a".into()));
        assert_eq!(state.peek_at(5), &Token::Eof);
    }

    #[test]
    fn candidates_follow_imports_then_namespace() {
        let ctx = ParsingContext::in_namespace("app.http")
            .with_import("User", "app.models.User")
            .with_import("dto", "app.dto");
        assert_eq!(
            ctx.candidates("User"),
            vec!["app.models.User", "app.http.User", "User"]
        );
        assert_eq!(
            ctx.candidates("dto.Page"),
            vec!["app.dto.Page", "app.http.dto.Page", "dto.Page"]
        );
        assert_eq!(ctx.candidates(".Root"), vec!["Root"]);
    }
}
