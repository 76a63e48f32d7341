//! @acp:module "Operation Catalog"
//! @acp:summary "Built-in and user-supplied operation descriptors"
//! @acp:domain cli
//! @acp:layer data
//!
//! Operation catalog
//!
//! The built-in descriptors ship embedded in the binary. Extra catalog files
//! named in the configuration are layered on top; a later descriptor with the
//! same name replaces the earlier one.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CmdletError, Result};
use crate::operation::OperationDescriptor;

const BUILTIN_CATALOG: &str = include_str!("../../catalog/compute.json");

/// On-disk catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
}

/// Descriptors available to the CLI, in declaration order
#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    operations: Vec<OperationDescriptor>,
}

impl OperationCatalog {
    /// The descriptors shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        let mut catalog = Self::default();
        for op in file.operations {
            catalog.insert(op)?;
        }
        Ok(catalog)
    }

    /// Load a catalog file (JSON, or YAML by extension)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        if is_yaml {
            let file: CatalogFile = serde_yaml::from_str(&content)?;
            let mut catalog = Self::default();
            for op in file.operations {
                catalog.insert(op)?;
            }
            Ok(catalog)
        } else {
            Self::from_json(&content)
        }
    }

    /// Add a descriptor, replacing any existing one with the same name
    pub fn insert(&mut self, descriptor: OperationDescriptor) -> Result<()> {
        descriptor.validate()?;
        match self
            .operations
            .iter_mut()
            .find(|op| op.name == descriptor.name)
        {
            Some(existing) => {
                tracing::debug!(operation = %descriptor.name, "catalog entry overridden");
                *existing = descriptor;
            }
            None => self.operations.push(descriptor),
        }
        Ok(())
    }

    /// Layer another catalog over this one
    pub fn extend(&mut self, other: OperationCatalog) -> Result<()> {
        for op in other.operations {
            self.insert(op)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Look up by command name or provider action name
    pub fn find(&self, name: &str) -> Result<&OperationDescriptor> {
        self.get(name)
            .or_else(|| {
                self.operations
                    .iter()
                    .find(|op| op.action.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| CmdletError::UnknownOperation(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = OperationCatalog::builtin().unwrap();
        assert!(catalog.len() >= 10);

        let attach = catalog.get("attach-volume").unwrap();
        assert!(attach.mutating);
        assert_eq!(attach.default_selector, "Attachment");

        let zones = catalog.get("describe-availability-zones").unwrap();
        assert!(zones.is_paginated());
        assert!(!zones.mutating);

        for op in catalog.iter() {
            assert!(
                !(op.mutating && op.is_paginated()),
                "{} is both mutating and paginated",
                op.name
            );
        }
    }

    #[test]
    fn test_find_by_action_name() {
        let catalog = OperationCatalog::builtin().unwrap();
        assert_eq!(catalog.find("AttachVolume").unwrap().name, "attach-volume");
        assert!(matches!(
            catalog.find("reboot-everything"),
            Err(CmdletError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_yaml_catalog_overrides_builtin() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "operations:\n  - name: describe-volumes\n    action: DescribeVolumes\n    defaultSelector: '*'\n  - name: describe-snapshots\n    action: DescribeSnapshots\n    pagination: {{}}"
        )
        .unwrap();

        let mut catalog = OperationCatalog::builtin().unwrap();
        let before = catalog.len();
        catalog.extend(OperationCatalog::load(file.path()).unwrap()).unwrap();

        assert_eq!(catalog.len(), before + 1);
        assert_eq!(catalog.get("describe-volumes").unwrap().default_selector, "*");
        assert!(catalog.get("describe-snapshots").unwrap().is_paginated());
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let bad = r#"{"operations": [{"name": "x", "action": "X",
            "passThru": {"parameter": "Missing"}}]}"#;
        assert!(matches!(
            OperationCatalog::from_json(bad),
            Err(CmdletError::Config(_))
        ));
    }

    #[test]
    fn test_overlapping_request_fields_rejected() {
        let overlapping = r#"{"operations": [{"name": "modify-thing", "action": "ModifyThing",
            "parameters": [
                {"name": "Enable", "kind": "boolean"},
                {"name": "EnableValue", "kind": "boolean", "field": "Enable.Value"}
            ]}]}"#;
        assert!(matches!(
            OperationCatalog::from_json(overlapping),
            Err(CmdletError::Config(_))
        ));
    }
}
