//! Extract Flow type aliases from annotated JavaScript and compile them into
//! validators for plain JSON objects.
//!
//! ```text
//! source text ─ syntax ─▶ Program ─ extract ─▶ Registry ─ validate ─▶ CompiledValidator
//! ```
pub mod error;
pub mod extract;
pub mod ir;
pub mod path_de;
pub mod syntax;
pub mod validate;

pub use error::{ConfigError, Error, ParseError};
pub use extract::{extract, extract_source, read_file};
pub use ir::{Property, Registry, Shape, Type};
pub use path_de::{read_registry, registry_from_str};
pub use validate::{
    ClassRef, CompiledValidator, KeyedError, KeyedValidator, Validator, ValidatorMap, compile_all,
    compile_one, validate_all, validate_any, validate_exists, validate_instance_of, validate_regex,
    validate_type_of, validators,
};
