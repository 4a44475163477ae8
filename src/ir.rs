// Source-independent type IR. No syntax nodes here.
//
// Serializes to the flat record shape `{name, nullable?, literal?, properties?, params?, types?}`
// so a registry can be cached as JSON and loaded back.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One type expression. Immutable once built; the `with_*`/`into_*` builders consume `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TypeRecord", try_from = "TypeRecord")]
pub struct Type {
    name: String,  // string, number, boolean, any, Date, User, Array, Object, Union, ...
    nullable: bool,
    shape: Shape,
}

/// Kind-specific payload. At most one of literal/properties/params/types exists per node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Value,
    Literal(String),         // string literal types: exactly this value
    Object(Vec<Property>),   // declaration order
    Generic(Vec<Type>),      // type arguments, e.g. Array<T>
    Union(Vec<Type>),        // member types
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Recorded from `key?:` but not consulted by the validator compiler.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Type {
    pub const OBJECT: &'static str = "Object";
    pub const UNION: &'static str = "Union";

    pub fn value(name: impl Into<String>) -> Self {
        Self { name: name.into(), nullable: false, shape: Shape::Value }
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Self { name: Self::OBJECT.into(), nullable: false, shape: Shape::Object(properties) }
    }

    pub fn generic(name: impl Into<String>, params: Vec<Type>) -> Self {
        Self { name: name.into(), nullable: false, shape: Shape::Generic(params) }
    }

    pub fn union(types: Vec<Type>) -> Self {
        Self { name: Self::UNION.into(), nullable: false, shape: Shape::Union(types) }
    }

    /// Narrows a value type to exactly one string.
    pub fn with_literal(self, literal: impl Into<String>) -> Self {
        Self { shape: Shape::Literal(literal.into()), ..self }
    }

    pub fn into_nullable(self) -> Self {
        Self { nullable: true, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn literal(&self) -> Option<&str> {
        match &self.shape {
            Shape::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&[Property]> {
        match &self.shape {
            Shape::Object(properties) => Some(properties),
            _ => None,
        }
    }

    pub fn params(&self) -> Option<&[Type]> {
        match &self.shape {
            Shape::Generic(params) => Some(params),
            _ => None,
        }
    }

    pub fn types(&self) -> Option<&[Type]> {
        match &self.shape {
            Shape::Union(types) => Some(types),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Object(_))
    }
}

impl Property {
    pub fn new(key: impl Into<String>, ty: Type) -> Self {
        Self { key: key.into(), ty, optional: false }
    }

    pub fn optional(self) -> Self {
        Self { optional: true, ..self }
    }
}

/// Renders Flow-like syntax, e.g. `?Array<string>` or `{ a: string; b?: "x" | number }`.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("?")?;
        }
        match &self.shape {
            Shape::Value => f.write_str(&self.name),
            Shape::Literal(text) => write!(f, "{text:?}"),
            Shape::Object(properties) => {
                f.write_str("{")?;
                for (i, p) in properties.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    let opt = if p.optional { "?" } else { "" };
                    write!(f, "{sep}{}{opt}: {}", p.key, p.ty)?;
                }
                f.write_str(if properties.is_empty() { "}" } else { " }" })
            }
            Shape::Generic(params) => {
                write!(f, "{}<", self.name)?;
                write_joined(f, params, ", ")?;
                f.write_str(">")
            }
            Shape::Union(types) => {
                if self.nullable {
                    f.write_str("(")?;
                }
                write_joined(f, types, " | ")?;
                if self.nullable {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Alias name → type, in order of first declaration. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    types: IndexMap<String, Type>,
}

impl Registry {
    /// Later definitions replace earlier ones; returns the replaced type.
    pub(crate) fn insert(&mut self, name: String, ty: Type) -> Option<Type> {
        self.types.insert(name, ty)
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::ops::Index<&str> for Registry {
    type Output = Type;

    fn index(&self, name: &str) -> &Type {
        &self.types[name]
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WIRE RECORD
// ————————————————————————————————————————————————————————————————————————————

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeRecord {
    name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Vec<Property>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Vec<Type>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    types: Option<Vec<Type>>,
}

impl From<Type> for TypeRecord {
    fn from(ty: Type) -> Self {
        let mut record = TypeRecord {
            name: ty.name,
            nullable: ty.nullable,
            literal: None,
            properties: None,
            params: None,
            types: None,
        };
        match ty.shape {
            Shape::Value => {}
            Shape::Literal(text) => record.literal = Some(text),
            Shape::Object(properties) => record.properties = Some(properties),
            Shape::Generic(params) => record.params = Some(params),
            Shape::Union(types) => record.types = Some(types),
        }
        record
    }
}

impl TryFrom<TypeRecord> for Type {
    type Error = String;

    fn try_from(record: TypeRecord) -> Result<Self, Self::Error> {
        let TypeRecord { name, nullable, literal, properties, params, types } = record;
        let shape = match (literal, properties, params, types) {
            (None, None, None, None) => Shape::Value,
            (Some(text), None, None, None) => Shape::Literal(text),
            (None, Some(properties), None, None) if name == Type::OBJECT => Shape::Object(properties),
            (None, Some(_), None, None) => {
                return Err(format!("type `{name}` has properties but is not named `{}`", Type::OBJECT));
            }
            (None, None, Some(params), None) => Shape::Generic(params),
            (None, None, None, Some(types)) if name == Type::UNION => Shape::Union(types),
            (None, None, None, Some(_)) => {
                return Err(format!("type `{name}` has member types but is not named `{}`", Type::UNION));
            }
            _ => {
                return Err(format!(
                    "type `{name}` sets more than one of `literal`, `properties`, `params`, `types`"
                ));
            }
        };
        Ok(Type { name, nullable, shape })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> Type {
        Type::object(vec![
            Property::new("username", Type::value("string")),
            Property::new("age", Type::value("number").into_nullable()).optional(),
            Property::new("posts", Type::generic("Array", vec![Type::value("Post")])),
            Property::new(
                "status",
                Type::union(vec![
                    Type::value("StringLiteral").with_literal("on"),
                    Type::value("StringLiteral").with_literal("off"),
                ]),
            ),
        ])
    }

    #[test]
    fn accessors_follow_the_shape() {
        let ty = user();
        assert!(ty.is_object());
        assert_eq!(ty.name(), "Object");
        assert_eq!(ty.properties().map(<[_]>::len), Some(4));
        assert!(ty.params().is_none() && ty.types().is_none() && ty.literal().is_none());

        let posts = &ty.properties().unwrap()[2].ty;
        assert_eq!(posts.params().unwrap()[0].name(), "Post");
        let status = &ty.properties().unwrap()[3].ty;
        assert_eq!(status.types().unwrap()[1].literal(), Some("off"));
    }

    #[test]
    fn serializes_as_flat_records() {
        let value = serde_json::to_value(user()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Object",
                "properties": [
                    { "key": "username", "type": { "name": "string" } },
                    { "key": "age", "type": { "name": "number", "nullable": true }, "optional": true },
                    { "key": "posts", "type": { "name": "Array", "params": [{ "name": "Post" }] } },
                    { "key": "status", "type": { "name": "Union", "types": [
                        { "name": "StringLiteral", "literal": "on" },
                        { "name": "StringLiteral", "literal": "off" }
                    ] } }
                ]
            })
        );
        let back: Type = serde_json::from_value(value).unwrap();
        assert_eq!(back, user());
    }

    #[test]
    fn records_with_two_payloads_are_rejected() {
        let bad = json!({ "name": "Array", "params": [], "types": [] });
        let err = serde_json::from_value::<Type>(bad).unwrap_err();
        assert!(err.to_string().contains("more than one"), "{err}");

        let misnamed = json!({ "name": "User", "properties": [] });
        assert!(serde_json::from_value::<Type>(misnamed).is_err());
    }

    #[test]
    fn display_reads_like_source() {
        assert_eq!(
            user().to_string(),
            r#"{ username: string; age?: ?number; posts: Array<Post>; status: "on" | "off" }"#
        );
        let maybe_union = Type::union(vec![Type::value("A"), Type::value("B")]).into_nullable();
        assert_eq!(maybe_union.to_string(), "?(A | B)");
    }

    #[test]
    fn registry_keeps_first_declaration_order() {
        let mut registry = Registry::default();
        registry.insert("B".into(), Type::value("string"));
        registry.insert("A".into(), Type::value("number"));
        let replaced = registry.insert("B".into(), Type::value("boolean"));
        assert_eq!(replaced.map(|t| t.name().to_string()).as_deref(), Some("string"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["B", "A"]);
        assert_eq!(registry["B"].name(), "boolean");
    }
}
