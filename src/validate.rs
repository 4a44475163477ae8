//! Validator compiler.
//!
//! Turns an object-shaped [`Type`] plus a name → [`Validator`] map into one keyed
//! check per property, then runs every check against candidate JSON objects.
//!
//! Policy, per property:
//! - absent or `null` and the type is not nullable → `"missing"`, the mapped
//!   validator is not called;
//! - absent or `null` and the type is nullable → valid;
//! - otherwise → whatever the mapped validator returns.
//!
//! `Property::optional` plays no part; only `?T` allows a key to be left out.
//! Failures are data (`Vec<KeyedError>`); `ConfigError` is reserved for setup mistakes.
pub mod builtin;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::ir::{Property, Registry, Type};

pub use builtin::{
    ClassRef, MISSING, builtins, exists, type_of, validate_any, validate_exists,
    validate_instance_of, validate_regex, validate_type_of,
};

/// Outcome of a single check: `Err` holds the failure message.
pub type Outcome = Result<(), String>;

/// A pure check over one value; `None` means the key was absent.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(Option<&Value>) -> Outcome + Send + Sync>);

impl Validator {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(Option<&Value>) -> Outcome + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    pub fn check(&self, value: Option<&Value>) -> Outcome {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Type name → validator. Caller entries are merged under the built-ins.
pub type ValidatorMap = IndexMap<String, Validator>;

/// A validator bound to one property key, with the existence policy applied.
#[derive(Debug, Clone)]
pub struct KeyedValidator {
    key: String,
    validator: Validator,
}

impl KeyedValidator {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn check(&self, value: Option<&Value>) -> Outcome {
        self.validator.check(value)
    }
}

/// One failed property. Displays as `<key>: <error>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedError {
    pub key: String,
    /// The offending value; `None` when the key was absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub error: String,
}

impl fmt::Display for KeyedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILE
// ————————————————————————————————————————————————————————————————————————————

/// One keyed validator per property of `ty`, in declaration order.
///
/// Fails before any candidate is seen if `ty` is not an object type or a property
/// names a type with no validator in `map` or the built-ins.
pub fn validators(map: &ValidatorMap, ty: &Type) -> Result<Vec<KeyedValidator>, ConfigError> {
    let properties = ty
        .properties()
        .ok_or_else(|| ConfigError::NotAnObject { name: ty.name().to_string() })?;
    let full_map = merged(map);
    properties.iter().map(|prop| keyed(&full_map, prop)).collect()
}

/// Built-ins are applied last, so they replace caller entries of the same name.
fn merged(map: &ValidatorMap) -> ValidatorMap {
    let mut full = map.clone();
    for (name, validator) in builtin::builtins() {
        if full.insert(name.clone(), validator.clone()).is_some() {
            tracing::debug!(%name, "built-in validator replaces caller entry");
        }
    }
    full
}

fn keyed(map: &ValidatorMap, prop: &Property) -> Result<KeyedValidator, ConfigError> {
    let name = prop.ty.name();
    let validator = map.get(name).cloned().ok_or_else(|| ConfigError::MissingValidator {
        key: prop.key.clone(),
        name: name.to_string(),
    })?;
    let nullable = prop.ty.is_nullable();
    let guarded = Validator::new(move |value| {
        if exists(value) {
            validator.check(value)
        } else if nullable {
            Ok(())
        } else {
            Err(MISSING.to_string())
        }
    });
    Ok(KeyedValidator { key: prop.key.clone(), validator: guarded })
}

/// Runs every validator against `candidate[key]` and collects each failure, in order.
/// A candidate that is not an object has every key absent.
pub fn validate_all(validators: &[KeyedValidator], candidate: &Value) -> Vec<KeyedError> {
    validators
        .iter()
        .filter_map(|kv| {
            let value = candidate.get(kv.key());
            match kv.check(value) {
                Err(error) if !error.is_empty() => Some(KeyedError {
                    key: kv.key().to_string(),
                    value: value.cloned(),
                    error,
                }),
                _ => None,
            }
        })
        .collect()
}

/// The validation function for one type: call it with your object, get back its errors.
#[derive(Debug, Clone)]
pub struct CompiledValidator {
    validators: Vec<KeyedValidator>,
}

impl CompiledValidator {
    pub fn validate(&self, candidate: &Value) -> Vec<KeyedError> {
        validate_all(&self.validators, candidate)
    }

    pub fn is_valid(&self, candidate: &Value) -> bool {
        self.validate(candidate).is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.validators.iter().map(KeyedValidator::key)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

pub fn compile_one(map: &ValidatorMap, ty: &Type) -> Result<CompiledValidator, ConfigError> {
    Ok(CompiledValidator { validators: validators(map, ty)? })
}

/// Compiles every object-shaped alias in `registry`. Aliases of other shapes
/// (`type PhoneNumber = string`) have no keys and are left out.
pub fn compile_all(
    map: &ValidatorMap,
    registry: &Registry,
) -> Result<IndexMap<String, CompiledValidator>, ConfigError> {
    let mut compiled = IndexMap::new();
    for (name, ty) in registry.iter() {
        if !ty.is_object() {
            tracing::debug!(alias = name, ty = %ty, "not an object type, no validator compiled");
            continue;
        }
        compiled.insert(name.to_string(), compile_one(map, ty)?);
    }
    tracing::debug!(count = compiled.len(), "compiled validators");
    Ok(compiled)
}

// ------------------------------- Tests ------------------------------------ //
