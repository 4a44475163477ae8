//! Type extractor: reduces the type aliases of a parsed file into the [`ir`](crate::ir) model.
//!
//! Unknown statements and annotation kinds never fail extraction; they are skipped
//! or degraded to a named value type. Only the syntax adapter can reject a file.

use std::path::Path;

use crate::error::{Error, ParseError};
use crate::ir::{Property, Registry, Type};
use crate::syntax::{self, Annotation, AnnotationKind, ObjectProperty, Program, Statement, TypeAlias};

/// Collects every top-level type alias (exported or not) in source order.
pub fn extract(program: &Program) -> Registry {
    let mut registry = Registry::default();
    for statement in &program.body {
        let Some(alias) = declaration(statement) else {
            tracing::trace!("skipping non-alias statement");
            continue;
        };
        let name = alias.id.name.clone();
        if registry.insert(name, to_type(&alias.right)).is_some() {
            tracing::debug!(alias = %alias.id.name, "duplicate type alias, keeping the later definition");
        }
    }
    tracing::debug!(count = registry.len(), "extracted type aliases");
    registry
}

/// Parses `source` and extracts its aliases.
pub fn extract_source(source: &str) -> Result<Registry, ParseError> {
    syntax::parse(source).map(|program| extract(&program))
}

/// Reads a file synchronously and returns a type for each alias found, keyed by alias name.
/// Meant to run once at startup.
pub fn read_file(path: impl AsRef<Path>) -> Result<Registry, Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "reading type aliases");
    Ok(extract_source(&source)?)
}

fn declaration(statement: &Statement) -> Option<&TypeAlias> {
    let statement = match statement {
        Statement::Export(inner) => inner.as_ref(),
        other => other,
    };
    match statement {
        Statement::TypeAlias(alias) => Some(alias),
        _ => None,
    }
}

pub fn to_type(annotation: &Annotation) -> Type {
    match annotation {
        Annotation::Object(object) => {
            Type::object(object.properties.iter().map(to_property).collect())
        }
        Annotation::Generic { id, type_parameters } => match type_parameters {
            Some(args) => Type::generic(&id.name, args.iter().map(to_type).collect()),
            None => Type::value(&id.name),
        },
        Annotation::Nullable(inner) => to_type(inner).into_nullable(),
        Annotation::StringLiteral { value, .. } => value_type(annotation).with_literal(value),
        Annotation::Union(members) => Type::union(members.iter().map(to_type).collect()),
        // intersections, tuples, typeof, functions, ...: named after their kind
        other => value_type(other),
    }
}

fn to_property(member: &ObjectProperty) -> Property {
    Property {
        key: member.key.name.clone(),
        ty: to_type(&member.value),
        optional: member.optional,
    }
}

fn value_type(annotation: &Annotation) -> Type {
    Type::value(short_name(annotation.kind()))
}

fn short_name(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::String => "string",
        AnnotationKind::Number => "number",
        AnnotationKind::Boolean => "boolean",
        AnnotationKind::Any => "any",
        other => other.token().trim_end_matches("TypeAnnotation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Shape;
    use indoc::indoc;

    const EXAMPLE_TYPES: &str = include_str!("../fixtures/example_types.js");
    const USER: &str = include_str!("../fixtures/user.js");

    #[test]
    fn exported_and_plain_aliases_are_found() {
        let registry = extract_source(EXAMPLE_TYPES).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["PhoneNumber", "User"]);
        assert_eq!(registry["PhoneNumber"], Type::value("string"));
    }

    #[test]
    fn object_properties_keep_declaration_order() {
        let registry = extract_source(EXAMPLE_TYPES).unwrap();
        let user = &registry["User"];
        let keys: Vec<_> = user.properties().unwrap().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["username", "age", "phone", "created"]);
        let created = &user.properties().unwrap()[3].ty;
        assert_eq!(created, &Type::value("Date").into_nullable());
    }

    #[test]
    fn every_supported_annotation_kind_reduces() {
        let registry = extract_source(USER).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["ID", "User"]);
        let props = registry["User"].properties().unwrap();
        let by_key = |key: &str| &props.iter().find(|p| p.key == key).unwrap().ty;

        assert_eq!(by_key("id"), &Type::value("ID"));
        assert_eq!(by_key("username"), &Type::value("string").into_nullable());
        assert_eq!(
            by_key("name"),
            &Type::object(vec![
                Property::new("first", Type::value("string")),
                Property::new("last", Type::value("string")),
            ])
        );
        assert_eq!(by_key("posts"), &Type::generic("Array", vec![Type::value("Post")]));
        assert_eq!(by_key("test"), &Type::value("StringLiteral").with_literal("test"));
        assert_eq!(by_key("something"), &Type::value("any"));
        assert_eq!(by_key("save"), &Type::value("Function"));
        assert!(props.iter().find(|p| p.key == "age").unwrap().optional);
    }

    #[test]
    fn unions_keep_members_apart_from_params() {
        let registry = extract_source(r#"type Level = "low" | "high" | ?number;"#).unwrap();
        let level = &registry["Level"];
        assert_eq!(level.name(), "Union");
        assert!(level.params().is_none());
        let members = level.types().unwrap();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].literal(), Some("low"));
        assert!(members[2].is_nullable());
    }

    #[test]
    fn unsupported_kinds_degrade_to_named_values() {
        let registry = extract_source(indoc! {"
            type T = [string, number];
            type I = A & B;
            type O = typeof thing;
            type V = void;
            type M = mixed;
            type N = 42;
            type Z = null;
        "})
        .unwrap();
        let names: Vec<_> = registry.iter().map(|(_, ty)| ty.name()).collect();
        assert_eq!(
            names,
            ["Tuple", "Intersection", "Typeof", "Void", "Mixed", "NumberLiteral", "NullLiteral"]
        );
        assert!(registry.iter().all(|(_, ty)| *ty.shape() == Shape::Value));
    }

    #[test]
    fn ordinary_flow_syntax_never_loses_the_file() {
        for src in [
            "type Cb = (string, number) => void;\ntype User = { a: string };",
            "type Box = { items: Array<*> };\ntype User = { a: string };",
            "var q = /[\"']/g;\ntype User = { a: string };",
        ] {
            let registry = extract_source(src).unwrap();
            assert!(registry.contains("User"), "{src}");
        }
    }

    #[test]
    fn mixed_library_file_extracts_its_aliases() {
        let registry = extract_source(include_str!("../fixtures/library.js")).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Handler", "Reducer", "Box", "Account"]);
        assert_eq!(registry["Handler"], Type::value("Function"));
        assert_eq!(
            registry["Box"].properties().unwrap()[0].ty,
            Type::generic("Array", vec![Type::value("Exists")])
        );
        let account = registry["Account"].properties().unwrap();
        assert_eq!(account[1].ty, Type::value("Function"));
        assert_eq!(account[3].ty, Type::generic("Array", vec![Type::value("string")]));
    }

    #[test]
    fn generic_without_arguments_is_a_plain_value() {
        let registry = extract_source("type D = Date; type E = Array<>;").unwrap();
        assert_eq!(registry["D"], Type::value("Date"));
        assert_eq!(registry["E"], Type::generic("Array", vec![]));
    }

    #[test]
    fn duplicate_aliases_keep_the_last_definition() {
        let registry = extract_source("type A = string;\ntype B = number;\ntype A = boolean;").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry["A"], Type::value("boolean"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        for src in [EXAMPLE_TYPES, USER, include_str!("../fixtures/member_offer.js")] {
            assert_eq!(extract_source(src).unwrap(), extract_source(src).unwrap());
        }
    }

    #[test]
    fn tokenizer_failures_propagate() {
        let err = extract_source("type A = string;\n\u{1} type B = number;").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn read_file_reports_missing_files() {
        let err = read_file("fixtures/does-not-exist.js").unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err:?}");
    }
}
