//! Host type system seen by the parser and the executor.
//!
//! Rust has no runtime reflection, so the shapes the parser expands and
//! the materialization the executor performs come from a registry the
//! host fills up front: enums, date/time types, class constants, global
//! aliases, and object types implementing [`TypeSource`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{DateTimeFormat, LiteralValue};
use crate::validator::Validator;
use crate::value::{HostInstance, Value};

/// A field or constructor parameter of a host object type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    /// Type string, parsed in the context of the declaring type.
    pub type_str: String,
    pub optional: bool,
    /// A public field that backs a constructor parameter of the same name.
    pub promoted: bool,
    pub validators: Vec<Validator>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        FieldDecl {
            name: name.into(),
            type_str: type_str.into(),
            optional: false,
            promoted: false,
            validators: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn promoted(mut self) -> Self {
        self.promoted = true;
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// How a host type is shaped for the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// `constructor` lists the constructor parameters in order, or `None`
    /// when the type has no constructor and is built field by field.
    /// `fields` lists the public readable fields.
    Object {
        constructor: Option<Vec<FieldDecl>>,
        fields: Vec<FieldDecl>,
    },
    /// A collection type built from a list of `item`.
    Collection { item: String },
}

/// Error raised by a host type while building or flattening an instance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct CastError(pub String);

impl CastError {
    pub fn new(message: impl Into<String>) -> Self {
        CastError(message.into())
    }

    fn unsupported(class: &str, what: &str) -> Self {
        CastError(format!("{} does not support {}", class, what))
    }
}

/// The capability a host type supplies in place of reflection.
///
/// Only the methods matching the type's [`TypeShape`] need to be
/// implemented; the rest report an unsupported strategy.
pub trait TypeSource: Send + Sync {
    fn name(&self) -> &str;

    fn shape(&self) -> TypeShape;

    /// Constructor strategy: called with the parsed input values by name.
    fn construct(&self, args: &BTreeMap<String, Value>) -> Result<HostInstance, CastError> {
        let _ = args;
        Err(CastError::unsupported(self.name(), "construction"))
    }

    /// Assign-properties strategy: build a default instance with the
    /// given public field values applied.
    fn assign(&self, fields: &BTreeMap<String, Value>) -> Result<HostInstance, CastError> {
        let _ = fields;
        Err(CastError::unsupported(self.name(), "property assignment"))
    }

    /// Collection strategy.
    fn collect(&self, items: Vec<Value>) -> Result<HostInstance, CastError> {
        let _ = items;
        Err(CastError::unsupported(self.name(), "collection building"))
    }

    /// Flatten an instance into its readable fields (object shapes) or a
    /// single `"items"` list (collections).
    fn destructure(&self, instance: &HostInstance) -> Result<BTreeMap<String, Value>, CastError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub cases: Vec<String>,
}

impl EnumDef {
    pub fn has_case(&self, case: &str) -> bool {
        self.cases.iter().any(|c| c == case)
    }
}

/// A global alias: a type string re-parsed on every use.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDef {
    pub name: String,
    pub type_str: String,
}

#[derive(Default, Clone)]
pub struct TypeRegistry {
    enums: BTreeMap<String, EnumDef>,
    datetimes: BTreeMap<String, DateTimeFormat>,
    constants: BTreeMap<String, LiteralValue>,
    aliases: BTreeMap<String, AliasDef>,
    objects: BTreeMap<String, Arc<dyn TypeSource>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("datetimes", &self.datetimes.keys().collect::<Vec<_>>())
            .field("constants", &self.constants.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases.keys().collect::<Vec<_>>())
            .field("objects", &self.objects.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_enum(&mut self, name: impl Into<String>, cases: &[&str]) -> &mut Self {
        let name = name.into();
        self.enums.insert(
            name.clone(),
            EnumDef {
                name,
                cases: cases.iter().map(|c| (*c).to_owned()).collect(),
            },
        );
        self
    }

    pub fn register_datetime(&mut self, name: impl Into<String>, format: DateTimeFormat) -> &mut Self {
        self.datetimes.insert(name.into(), format);
        self
    }

    /// Register `Class::CONST`. Enum-case values must name a registered
    /// enum by the time the constant is referenced.
    pub fn register_constant(
        &mut self,
        class: &str,
        constant: &str,
        value: LiteralValue,
    ) -> &mut Self {
        self.constants
            .insert(format!("{}::{}", class, constant), value);
        self
    }

    pub fn register_alias(&mut self, name: impl Into<String>, type_str: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.aliases.insert(
            name.clone(),
            AliasDef {
                name,
                type_str: type_str.into(),
            },
        );
        self
    }

    pub fn register_object(&mut self, source: Arc<dyn TypeSource>) -> &mut Self {
        self.objects.insert(source.name().to_owned(), source);
        self
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn datetime(&self, name: &str) -> Option<&DateTimeFormat> {
        self.datetimes.get(name)
    }

    pub fn constant(&self, class: &str, constant: &str) -> Option<&LiteralValue> {
        self.constants.get(&format!("{}::{}", class, constant))
    }

    /// Constants of `class` whose name starts with `prefix`, in name order.
    pub fn constants_with_prefix<'a>(
        &'a self,
        class: &str,
        prefix: &str,
    ) -> Vec<(&'a str, &'a LiteralValue)> {
        let start = format!("{}::{}", class, prefix);
        self.constants
            .range(start.clone()..)
            .take_while(|(k, _)| k.starts_with(&start))
            .map(|(k, v)| (&k[class.len() + 2..], v))
            .collect()
    }

    pub fn alias(&self, name: &str) -> Option<&AliasDef> {
        self.aliases.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&Arc<dyn TypeSource>> {
        self.objects.get(name)
    }
}
