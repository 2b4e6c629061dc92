//! Template registry: one immutable [`TemplateBundle`] per component type.
//!
//! The registry is built once at startup, optionally with system
//! instructions replaced by override files from the config, and is
//! read-only afterwards.

mod builtin;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use componentgen_shared::{ComponentGenError, ComponentType, Result, TemplateOverrides};

/// System instructions plus metadata guidance for one component type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateBundle {
    pub component_type: ComponentType,
    pub system_instructions: String,
    pub metadata_guidance: String,
}

impl TemplateBundle {
    /// Fail with a configuration error if the bundle has no system instructions.
    pub fn ensure_instructions(&self) -> Result<()> {
        if self.system_instructions.trim().is_empty() {
            return Err(ComponentGenError::configuration(format!(
                "template bundle for {} has no system instructions",
                self.component_type
            )));
        }
        Ok(())
    }
}

/// Fixed mapping from component type to template bundle.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    bundles: BTreeMap<ComponentType, TemplateBundle>,
}

impl TemplateRegistry {
    /// Registry holding the built-in bundle for every component type.
    pub fn builtin() -> Self {
        let bundles = ComponentType::ALL
            .into_iter()
            .map(|ct| {
                let bundle = TemplateBundle {
                    component_type: ct,
                    system_instructions: builtin::system_instructions(ct).to_string(),
                    metadata_guidance: builtin::metadata_guidance(ct),
                };
                (ct, bundle)
            })
            .collect();
        Self { bundles }
    }

    /// Built-in registry with system instructions replaced by the configured
    /// override files.
    ///
    /// Override content is taken verbatim. An empty file is accepted here and
    /// rejected later by [`TemplateBundle::ensure_instructions`].
    pub fn with_overrides(overrides: &TemplateOverrides) -> Result<Self> {
        let mut registry = Self::builtin();

        for ct in ComponentType::ALL {
            let Some(path) = overrides.path_for(ct) else {
                continue;
            };
            let path = Path::new(path);
            let content =
                std::fs::read_to_string(path).map_err(|e| ComponentGenError::io(path, e))?;

            if let Some(bundle) = registry.bundles.get_mut(&ct) {
                info!(component_type = %ct, path = %path.display(), "using instruction override");
                bundle.system_instructions = content;
            }
        }

        Ok(registry)
    }

    /// Registered tags, in registry order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.bundles.keys().map(|ct| ct.as_str()).collect()
    }

    /// Map a requested tag onto a registered component type.
    pub fn component_type(&self, tag: &str) -> Result<ComponentType> {
        ComponentType::from_tag(tag)
            .filter(|ct| self.bundles.contains_key(ct))
            .ok_or_else(|| self.unknown(tag))
    }

    /// Resolve the bundle for a requested tag.
    pub fn resolve(&self, tag: &str) -> Result<&TemplateBundle> {
        let ct = self.component_type(tag)?;
        self.bundle(ct)
    }

    /// Bundle for an already-parsed component type.
    pub fn bundle(&self, component_type: ComponentType) -> Result<&TemplateBundle> {
        debug!(%component_type, "resolving template bundle");
        self.bundles
            .get(&component_type)
            .ok_or_else(|| self.unknown(component_type.as_str()))
    }

    fn unknown(&self, tag: &str) -> ComponentGenError {
        ComponentGenError::UnknownComponentType {
            requested: tag.to_string(),
            available: self.keys().into_iter().map(String::from).collect(),
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
