//! Structured path model used to decide which files enter the context.
//!
//! A path relative to the app root is split into typed directory segments
//! plus a file name, then classified by its role in the component tree.

use std::path::{Component, Path};

use componentgen_shared::ComponentFamily;

/// Directory holding build output.
pub const BUILD_OUTPUT_DIR: &str = "dist";
/// Directory holding installed dependencies.
pub const DEPENDENCY_CACHE_DIR: &str = "node_modules";

const ACTIONS_DIR: &str = "actions";
const SOURCES_DIR: &str = "sources";

/// Marker identifying shared helper modules of a component family.
const SHARED_HELPER_MARKER: &str = "common";

/// Extensions of root-level files that count as source modules.
const MODULE_EXTENSIONS: [&str; 2] = ["mjs", "ts"];

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// Directory markers whose subtrees never enter the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionMarker {
    BuildOutput,
    DependencyCache,
}

impl ExclusionMarker {
    /// Marker for a directory name, if it is one.
    pub fn for_dir_name(name: &str) -> Option<Self> {
        match name {
            BUILD_OUTPUT_DIR => Some(Self::BuildOutput),
            DEPENDENCY_CACHE_DIR => Some(Self::DependencyCache),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildOutput => BUILD_OUTPUT_DIR,
            Self::DependencyCache => DEPENDENCY_CACHE_DIR,
        }
    }
}

/// A typed directory segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DirSegment {
    Excluded(ExclusionMarker),
    ComponentDir(ComponentFamily),
    Named(String),
}

impl DirSegment {
    fn parse(name: &str) -> Self {
        if let Some(marker) = ExclusionMarker::for_dir_name(name) {
            return Self::Excluded(marker);
        }
        match name {
            ACTIONS_DIR => Self::ComponentDir(ComponentFamily::Action),
            SOURCES_DIR => Self::ComponentDir(ComponentFamily::Source),
            other => Self::Named(other.to_string()),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Excluded(marker) => marker.as_str(),
            Self::ComponentDir(ComponentFamily::Action) => ACTIONS_DIR,
            Self::ComponentDir(_) => SOURCES_DIR,
            Self::Named(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// SourcePath
// ---------------------------------------------------------------------------

/// A file path relative to the app root, split into typed segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath {
    dirs: Vec<DirSegment>,
    file_name: String,
}

/// Role of a file within the app tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    /// Inside a build-output or dependency-cache directory.
    Excluded(ExclusionMarker),
    /// Nested under an `actions/` or `sources/` directory.
    ComponentScoped {
        families: Vec<ComponentFamily>,
        shared_helper: bool,
    },
    /// Everything else.
    RootLevel { module_source: bool },
}

impl SourcePath {
    /// Build from a path relative to the app root.
    ///
    /// Returns `None` for an empty path or one that contains anything other
    /// than plain names (`..`, roots, prefixes).
    pub fn from_relative(rel: &Path) -> Option<Self> {
        let mut names = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => names.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }

        let file_name = names.pop()?;
        let dirs = names.iter().map(|n| DirSegment::parse(n)).collect();
        Some(Self { dirs, file_name })
    }

    /// Forward-slash label, as shown in the context document.
    pub fn label(&self) -> String {
        self.dirs
            .iter()
            .map(DirSegment::name)
            .chain(std::iter::once(self.file_name.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Classify the path by its role in the app tree.
    pub fn classify(&self) -> PathClass {
        if let Some(marker) = self.dirs.iter().find_map(|d| match d {
            DirSegment::Excluded(marker) => Some(*marker),
            _ => None,
        }) {
            return PathClass::Excluded(marker);
        }

        let families: Vec<ComponentFamily> = self
            .dirs
            .iter()
            .filter_map(|d| match d {
                DirSegment::ComponentDir(family) => Some(*family),
                _ => None,
            })
            .collect();

        if families.is_empty() {
            return PathClass::RootLevel {
                module_source: self.has_module_extension(),
            };
        }

        // Any segment, file name included, may carry the marker.
        let shared_helper = self
            .dirs
            .iter()
            .map(DirSegment::name)
            .chain(std::iter::once(self.file_name.as_str()))
            .any(|name| name.contains(SHARED_HELPER_MARKER));

        PathClass::ComponentScoped {
            families,
            shared_helper,
        }
    }

    fn has_module_extension(&self) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
    }
}

// ---------------------------------------------------------------------------
// Inclusion decision
// ---------------------------------------------------------------------------

/// Why a file was left out of the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Excluded(ExclusionMarker),
    /// App generation never sees per-action or per-source code.
    ComponentScopedForApp,
    /// Belongs to a different component family.
    OtherFamily,
    /// A component's own implementation, not a shared helper.
    NotSharedHelper,
    /// Root-level file without a module extension.
    NotModuleSource,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excluded(marker) => write!(f, "inside {}/", marker.as_str()),
            Self::ComponentScopedForApp => f.write_str("component code hidden from app generation"),
            Self::OtherFamily => f.write_str("other component family"),
            Self::NotSharedHelper => f.write_str("not a shared helper"),
            Self::NotModuleSource => f.write_str("not a module source file"),
        }
    }
}

/// Inclusion decision for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_include(&self) -> bool {
        matches!(self, Self::Include)
    }
}

/// Decide whether a file enters the context for the given family.
pub fn decide(path: &SourcePath, family: ComponentFamily) -> Decision {
    match path.classify() {
        PathClass::Excluded(marker) => Decision::Skip(SkipReason::Excluded(marker)),
        PathClass::ComponentScoped { .. } if family == ComponentFamily::App => {
            Decision::Skip(SkipReason::ComponentScopedForApp)
        }
        PathClass::ComponentScoped { families, .. } if !families.contains(&family) => {
            Decision::Skip(SkipReason::OtherFamily)
        }
        PathClass::ComponentScoped {
            shared_helper: false,
            ..
        } => Decision::Skip(SkipReason::NotSharedHelper),
        PathClass::ComponentScoped { .. } => Decision::Include,
        PathClass::RootLevel {
            module_source: true,
        } => Decision::Include,
        PathClass::RootLevel {
            module_source: false,
        } => Decision::Skip(SkipReason::NotModuleSource),
    }
}
