#![allow(clippy::result_large_err)]
//! castor-core: the Castor type language.
//!
//! Turns type strings such as `array{id: positive-int, tags?: string[]}`
//! into immutable [`Node`] trees.
//!
//! # Public API
//!
//! - [`tokenize()`] -- type string to tokens
//! - [`Parser`] -- tokens to [`Node`], through an ordered consumer chain
//! - [`TypeRegistry`] -- host enums, date/time types, constants, aliases
//!   and object types visible to the parser
//! - [`NodeRegistry`] -- memoized lookup table behind [`Node::LazyRef`]
//! - [`Value`] -- typed host-side values
//! - [`InvalidSyntax`] -- every compile-time failure

pub mod ast;
pub mod error;
pub mod host;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod validator;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{
    BuiltIn, CastingStrategy, DateTimeFormat, Direction, Discriminator, LiteralValue, Node,
    Property, StructKind,
};
pub use error::InvalidSyntax;
pub use host::{CastError, FieldDecl, TypeRegistry, TypeShape, TypeSource};
pub use lexer::tokenize;
pub use parser::{Consumer, Parser, ParserConfig, ParserState, ParsingContext};
pub use registry::{NodeRegistry, RegistryError};
pub use validator::{Pattern, Validator};
pub use value::{HostInstance, Value};
