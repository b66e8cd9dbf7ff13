//! Editing of ArgoCD Application manifests.
//!
//! The image updater skips a service while its application carries the
//! annotation `argocd-image-updater.argoproj.io/{service}.ignore-tags: "*"`.
//! Pausing adds that annotation, resuming removes it. Nothing else in the
//! document is touched.

use anyhow::Result;
use serde_yml::Mapping;
use serde_yml::Value;

use crate::error::Error;

/// Value of the ignore-tags annotation while a service is paused.
pub const PAUSED_VALUE: &str = "*";

/// Marker emitted at the top of every serialized manifest.
const DOCUMENT_START: &str = "---\n";

/// Annotation that suppresses image updates for `service`.
pub fn annotation_key(service: &str) -> String {
    format!("argocd-image-updater.argoproj.io/{service}.ignore-tags")
}

/// Location of a service's application manifest in the GitOps repository.
pub fn manifest_path(env: &str, service: &str) -> String {
    format!("envs/{env}/{service}/application.yaml")
}

/// Directory holding one subdirectory per service of an environment.
pub fn environment_dir(env: &str) -> String {
    format!("envs/{env}")
}

/// Set or remove `metadata.annotations[key]` and re-serialize the document.
///
/// With `present` the annotation is set to [`PAUSED_VALUE`], creating the
/// annotations mapping if needed. Without it the key is removed; a missing key
/// or annotations mapping is not an error. Key order is kept as in the source
/// document and new keys are appended, so applying the same toggle twice
/// yields identical bytes.
pub fn toggle_annotation(document: &str, key: &str, present: bool) -> Result<String> {
    let mut doc: Value =
        serde_yml::from_str(document).map_err(|e| Error::Parse(e.to_string()))?;

    let Value::Mapping(root) = &mut doc else {
        return Err(Error::Parse("document root is not a mapping".to_string()).into());
    };

    if let Some(metadata) = child_mapping(root, "metadata", present)? {
        if let Some(annotations) = child_mapping(metadata, "annotations", present)? {
            if present {
                annotations.insert(
                    Value::String(key.to_string()),
                    Value::String(PAUSED_VALUE.to_string()),
                );
            } else {
                annotations.shift_remove(key);
            }
        }
    }

    serialize(&doc)
}

/// Serialize block style with a leading document-start marker.
fn serialize(doc: &Value) -> Result<String> {
    let body = serde_yml::to_string(doc).map_err(|e| Error::Parse(e.to_string()))?;
    let body = body.strip_prefix(DOCUMENT_START).unwrap_or(&body);
    Ok(format!("{DOCUMENT_START}{body}"))
}

/// Look up the mapping stored under `name`, optionally creating it when it is
/// missing or null.
fn child_mapping<'a>(
    parent: &'a mut Mapping,
    name: &str,
    create: bool,
) -> Result<Option<&'a mut Mapping>, Error> {
    if create && matches!(parent.get(name), None | Some(Value::Null)) {
        parent.insert(Value::String(name.to_string()), Value::Mapping(Mapping::new()));
    }

    match parent.get_mut(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Some(_) => Err(Error::Parse(format!("`{name}` is not a mapping"))),
    }
}
