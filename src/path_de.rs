use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::ir::Registry;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

/// Loads a registry previously written as JSON (e.g. by `flow-osi types`).
pub fn registry_from_str(src: &str) -> Result<Registry, Error> {
    from_str_with_path(src).map_err(Error::Registry)
}

pub fn read_registry(path: impl AsRef<Path>) -> Result<Registry, Error> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    registry_from_str(&src)
}
