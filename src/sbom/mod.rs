//! # SBOM Dependency Resolution
//!
//! Projects a CycloneDX-style SBOM's flat `components` list into the
//! statement's `resolvedDependencies`. Only the flat list is read; the
//! SBOM's dependency-graph section is deliberately ignored, matching the
//! historical converter.

use crate::error::{Error, Result};
use crate::statement::ResolvedDependency;
use serde_json::Value;

/// Project each SBOM component to `{name, uri: bom-ref}`.
///
/// No SBOM at all is a valid state and yields an empty list; a supplied but
/// malformed document is fatal.
pub fn resolve_dependencies(sbom: Option<&Value>) -> Result<Vec<ResolvedDependency>> {
    let Some(doc) = sbom else {
        return Ok(Vec::new());
    };

    let components = doc
        .get("components")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::DependencyResolution("SBOM has no `components` array".to_string())
        })?;

    components
        .iter()
        .enumerate()
        .map(|(index, component)| {
            let name = component
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::DependencyResolution(format!("component {index} has no `name`"))
                })?;
            let uri = component
                .get("bom-ref")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::DependencyResolution(format!(
                        "component {index} ({name}) has no `bom-ref`"
                    ))
                })?;
            Ok(ResolvedDependency {
                name: name.to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_sbom_is_empty_not_an_error() {
        assert_eq!(resolve_dependencies(None).unwrap(), Vec::new());
    }

    #[test]
    fn test_components_project_to_name_and_bom_ref() {
        let sbom = json!({
            "bomFormat": "CycloneDX",
            "components": [
                {"name": "libfoo", "bom-ref": "pkg:generic/libfoo@1.0", "version": "1.0"}
            ]
        });
        let deps = resolve_dependencies(Some(&sbom)).unwrap();
        assert_eq!(
            deps,
            vec![ResolvedDependency {
                name: "libfoo".to_string(),
                uri: "pkg:generic/libfoo@1.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let sbom = json!({
            "components": [
                {"name": "z", "bom-ref": "pkg:generic/z@1"},
                {"name": "a", "bom-ref": "pkg:generic/a@1"}
            ]
        });
        let deps = resolve_dependencies(Some(&sbom)).unwrap();
        assert_eq!(deps[0].name, "z");
        assert_eq!(deps[1].name, "a");
    }

    #[test]
    fn test_missing_components_is_fatal() {
        let sbom = json!({"bomFormat": "CycloneDX"});
        assert!(matches!(
            resolve_dependencies(Some(&sbom)),
            Err(Error::DependencyResolution(_))
        ));
    }

    #[test]
    fn test_component_without_bom_ref_is_fatal() {
        let sbom = json!({"components": [{"name": "libfoo"}]});
        assert!(matches!(
            resolve_dependencies(Some(&sbom)),
            Err(Error::DependencyResolution(_))
        ));
    }
}
