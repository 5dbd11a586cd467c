//! Reading declarations and instances from JSON text, files and the
//! environment.
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::LoadError;
use crate::instance::ShapeInstance;
use crate::registry::{Declarations, Registry};
use crate::shape::ShapeType;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| LoadError::Json {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn declarations_from_str(src: &str) -> Result<Declarations, LoadError> {
    from_str_with_path(src)
}

pub fn registry_from_str(src: &str) -> Result<Registry, LoadError> {
    let decls = declarations_from_str(src)?;
    Ok(Registry::from_declarations(&decls)?)
}

pub fn registry_from_path(path: impl AsRef<Path>) -> Result<Registry, LoadError> {
    let path = path.as_ref();
    let src = read(path)?;
    let registry = registry_from_str(&src)?;
    tracing::debug!(path = %path.display(), shapes = registry.len(), "loaded declarations");
    Ok(registry)
}

impl Registry {
    /// Look a shape up by name, as a [`LoadError`] when it is missing.
    pub fn require(&self, name: &str) -> Result<&ShapeType, LoadError> {
        self.get(name).ok_or_else(|| LoadError::UnknownShape(name.to_string()))
    }
}

impl ShapeType {
    /// Parse `src` as JSON and construct an instance from it.
    pub fn from_json_str(&self, src: &str) -> Result<ShapeInstance, LoadError> {
        let json: serde_json::Value = from_str_with_path(src)?;
        Ok(self.from_json(json)?)
    }

    /// Construct an instance from the JSON file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ShapeInstance, LoadError> {
        self.from_json_str(&read(path.as_ref())?)
    }

    /// Construct an instance from JSON held in the environment variable `var`.
    pub fn from_env(&self, var: &str) -> Result<ShapeInstance, LoadError> {
        let src = std::env::var(var).map_err(|_| LoadError::MissingEnv(var.to_string()))?;
        self.from_json_str(&src)
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path)
        .map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldSpec, Ty};
    use crate::validate::Reason;
    use serde_json::json;
    use std::io::Write;

    const DECLS: &str = r#"{
        "shapes": {
            "Point": { "x": "int", "y": { "type": "int", "optional": true, "default": 0 } },
            "Line": { "a": "Point", "b": "Point" }
        }
    }"#;

    fn point() -> ShapeType {
        ShapeType::builder()
            .field("x", Ty::INT)
            .field("y", FieldSpec::new(Ty::INT).optional().default(0))
            .build()
            .unwrap()
    }

    #[test]
    fn structural_errors_carry_their_json_path() {
        let err = declarations_from_str(r#"{"shapes": {"A": {"x": {"type": 1}}}}"#).unwrap_err();
        match &err {
            LoadError::Json { path, .. } => assert!(path.starts_with("shapes.A.x"), "{path}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        assert!(matches!(
            declarations_from_str(r#"{"shapes": {}, "extra": 1}"#),
            Err(LoadError::Json { .. })
        ));
    }

    #[test]
    fn registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DECLS.as_bytes()).unwrap();
        let reg = registry_from_path(file.path()).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.require("Point").unwrap(), &point());
        assert!(matches!(reg.require("Circle"), Err(LoadError::UnknownShape(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = registry_from_path(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn load_instance_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, r#"{"x": 3}"#).unwrap();
        let inst = point().load(&path).unwrap();
        assert_eq!(inst.data(), &json!({"x": 3, "y": 0}));
    }

    #[test]
    fn load_surfaces_validation_errors() {
        let err = point().from_json_str(r#"{"x": 1, "z": 2}"#).unwrap_err();
        match err {
            LoadError::Validation(e) => {
                assert_eq!(e.reason(), &Reason::UnknownField);
                assert_eq!(e.to_string(), "z: unknown field");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_env_reads_json() {
        let var = "SHAPE_IDL_LOAD_TEST_POINT";
        unsafe { std::env::set_var(var, r#"{"x": 7, "y": 8}"#) };
        let inst = point().from_env(var).unwrap();
        assert_eq!(inst.to_json_string(), r#"{"x":7,"y":8}"#);
        unsafe { std::env::remove_var(var) };
        assert!(matches!(point().from_env(var), Err(LoadError::MissingEnv(_))));
    }
}
