//! Built-in checks. Each constructor returns a [`Validator`] that is `Ok(())` on
//! success and a human-readable message on failure.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Validator, ValidatorMap};

pub const MISSING: &str = "missing";

/// Built-in entries for `string`, `number`, `boolean` and `Date`.
pub(crate) static BUILTINS: Lazy<ValidatorMap> = Lazy::new(|| {
    ValidatorMap::from([
        ("string".to_string(), validate_type_of("string")),
        ("number".to_string(), validate_type_of("number")),
        ("boolean".to_string(), validate_type_of("boolean")),
        (ClassRef::DATE.name().to_string(), validate_instance_of(ClassRef::DATE)),
    ])
});

/// The process-wide built-in table.
pub fn builtins() -> &'static ValidatorMap {
    &BUILTINS
}

/// Absent keys and `null` both count as missing.
pub fn exists(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// JavaScript `typeof` of a JSON value; `undefined` for an absent key.
pub fn type_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => "object",
    }
}

pub fn validate_exists() -> Validator {
    Validator::new(|value| if exists(value) { Ok(()) } else { Err(MISSING.to_string()) })
}

pub fn validate_type_of(type_name: impl Into<String>) -> Validator {
    let expected = type_name.into();
    Validator::new(move |value| {
        let actual = type_of(value);
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} but found {actual}"))
        }
    })
}

pub fn validate_instance_of(class: ClassRef) -> Validator {
    Validator::new(move |value| match value {
        Some(v) if class.is_instance(v) => Ok(()),
        _ => Err(format!("expected {} but was not instance", class.name())),
    })
}

pub fn validate_regex(pattern: Regex) -> Validator {
    Validator::new(move |value| {
        let text = as_text(value);
        if pattern.is_match(&text) {
            Ok(())
        } else {
            Err(format!("could not match {text} against {pattern}"))
        }
    })
}

/// Accepts every value, absent or not.
pub fn validate_any() -> Validator {
    Validator::new(|_| Ok(()))
}

/// Strings as-is, everything else as compact JSON.
fn as_text(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NOMINAL CHECKS
// ————————————————————————————————————————————————————————————————————————————

/// A named class check. JSON has no nominal types, so each class decides which
/// encodings count as an instance.
#[derive(Debug, Clone, Copy)]
pub struct ClassRef {
    name: &'static str,
    test: fn(&Value) -> bool,
}

impl ClassRef {
    /// RFC 3339 timestamps and `YYYY-MM-DD` dates.
    pub const DATE: ClassRef = ClassRef::new("Date", is_date);

    pub const fn new(name: &'static str, test: fn(&Value) -> bool) -> Self {
        Self { name, test }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_instance(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

fn is_date(value: &Value) -> bool {
    let Value::String(s) = value else { return false };
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exists_treats_null_as_missing() {
        let v = validate_exists();
        assert_eq!(v.check(None), Err("missing".to_string()));
        assert_eq!(v.check(Some(&Value::Null)), Err("missing".to_string()));
        assert_eq!(v.check(Some(&json!(0))), Ok(()));
        assert_eq!(v.check(Some(&json!(""))), Ok(()));
    }

    #[test]
    fn type_of_follows_javascript() {
        assert_eq!(type_of(Some(&json!([1]))), "object");
        assert_eq!(type_of(Some(&json!({}))), "object");
        assert_eq!(type_of(Some(&json!(1.5))), "number");
        assert_eq!(type_of(None), "undefined");

        let v = validate_type_of("number");
        assert_eq!(v.check(Some(&json!(23))), Ok(()));
        assert_eq!(v.check(Some(&json!("hello"))), Err("expected number but found string".into()));
    }

    #[test]
    fn dates_are_instances_only_in_date_encodings() {
        let v = validate_instance_of(ClassRef::DATE);
        assert_eq!(v.check(Some(&json!("2015-05-27T20:19:51.843Z"))), Ok(()));
        assert_eq!(v.check(Some(&json!("2015-05-27"))), Ok(()));
        assert_eq!(
            v.check(Some(&json!(1432757991843u64))),
            Err("expected Date but was not instance".into())
        );
        assert!(v.check(Some(&json!("yesterday"))).is_err());
    }

    #[test]
    fn regex_coerces_to_text() {
        let v = validate_regex(Regex::new(r"^\d{10}$").unwrap());
        assert_eq!(v.check(Some(&json!("8014114399"))), Ok(()));
        assert_eq!(v.check(Some(&json!(8014114399u64))), Ok(()));
        assert_eq!(
            v.check(Some(&json!("801-411-4399"))),
            Err(r"could not match 801-411-4399 against ^\d{10}$".into())
        );
    }

    #[test]
    fn builtin_table_covers_the_primitives() {
        let names: Vec<_> = builtins().keys().map(String::as_str).collect();
        assert_eq!(names, ["string", "number", "boolean", "Date"]);
        assert!(builtins()["boolean"].check(Some(&json!(true))).is_ok());
    }

    #[test]
    fn custom_classes_plug_in() {
        let uuid = ClassRef::new("Uuid", |v| v.as_str().is_some_and(|s| s.len() == 36));
        let v = validate_instance_of(uuid);
        assert!(v.check(Some(&json!("123e4567-e89b-12d3-a456-426614174000"))).is_ok());
        assert_eq!(v.check(Some(&json!(1))), Err("expected Uuid but was not instance".into()));
    }
}
