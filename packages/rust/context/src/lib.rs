//! Context assembly: walks an app's source tree and concatenates the files
//! relevant to the requested component type into one labeled document.

pub mod document;
pub mod path;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

use componentgen_shared::{ComponentGenError, ComponentType, Result};

pub use document::{ContextDocument, ContextEntry};
pub use path::{Decision, ExclusionMarker, PathClass, SkipReason, SourcePath, decide};

/// A file discovered under the app root and the decision taken for it.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    /// Path on disk.
    pub path: PathBuf,
    /// Label relative to the app root.
    pub label: String,
    pub decision: Decision,
}

/// Walks `<components_root>/<app>` and builds [`ContextDocument`]s.
#[derive(Debug, Clone)]
pub struct Assembler {
    components_root: PathBuf,
}

impl Assembler {
    pub fn new(components_root: impl Into<PathBuf>) -> Self {
        Self {
            components_root: components_root.into(),
        }
    }

    /// Source root of an app. The app identifier is expected to be a single
    /// validated path segment.
    pub fn app_root(&self, app: &str) -> PathBuf {
        self.components_root.join(app)
    }

    /// Walk the app tree and decide, for every file, whether it enters the
    /// context. File contents are not read.
    #[instrument(skip_all, fields(app = %app, component_type = %component_type))]
    pub fn plan(&self, app: &str, component_type: ComponentType) -> Result<Vec<PlannedFile>> {
        let root = self.app_root(app);
        let family = component_type.family();
        debug!(root = %root.display(), family = family.as_str(), "walking app tree");

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded_dir(entry));

        let mut planned = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(&root, e))?;
            if entry.depth() == 0 || is_directory(&entry) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&root)
                .map_err(|_| unexpected_path(entry.path()))?;
            let source = SourcePath::from_relative(rel).ok_or_else(|| unexpected_path(rel))?;
            let decision = decide(&source, family);
            let label = source.label();

            match decision {
                Decision::Include => debug!(%label, "including file"),
                Decision::Skip(reason) => debug!(%label, %reason, "skipping file"),
            }

            planned.push(PlannedFile {
                path: entry.into_path(),
                label,
                decision,
            });
        }

        Ok(planned)
    }

    /// Assemble the context document for an app and component type.
    ///
    /// Any file that cannot be read fails the whole assembly.
    #[instrument(skip_all, fields(app = %app, component_type = %component_type))]
    pub fn assemble(&self, app: &str, component_type: ComponentType) -> Result<ContextDocument> {
        let planned = self.plan(app, component_type)?;

        let mut document = ContextDocument::new();
        for file in planned.into_iter().filter(|f| f.decision.is_include()) {
            let content = std::fs::read_to_string(&file.path)
                .map_err(|e| ComponentGenError::file_access(&file.path, e))?;
            document.push(file.label, content);
        }

        info!(
            files = document.len(),
            family = component_type.family().as_str(),
            digest = %document.digest(),
            "context assembled"
        );

        Ok(document)
    }
}

/// Convenience wrapper: assemble with a one-off [`Assembler`].
pub fn assemble(
    components_root: &Path,
    app: &str,
    component_type: ComponentType,
) -> Result<ContextDocument> {
    Assembler::new(components_root).assemble(app, component_type)
}

/// Build-output and dependency-cache directories are pruned without being
/// descended into.
fn is_excluded_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    match ExclusionMarker::for_dir_name(&entry.file_name().to_string_lossy()) {
        Some(marker) => {
            debug!(path = %entry.path().display(), marker = marker.as_str(), "pruning directory");
            true
        }
        None => false,
    }
}

/// Directories, including symlinks to directories, are walked or ignored but
/// never read as files.
fn is_directory(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir())
}

fn walk_error(root: &Path, err: walkdir::Error) -> ComponentGenError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    ComponentGenError::file_access(path, source)
}

fn unexpected_path(path: &Path) -> ComponentGenError {
    ComponentGenError::file_access(
        path,
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path escapes the app root",
        ),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "google_drive";

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cg-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(APP).join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn labels(doc: &ContextDocument) -> Vec<&str> {
        doc.entries().iter().map(|e| e.label.as_str()).collect()
    }

    /// `actions/common/util.mjs`, `actions/list-drives/code.mjs`,
    /// `sources/common/base.mjs` and a root-level `app.mjs`.
    fn drive_tree() -> PathBuf {
        let root = temp_root();
        write(&root, "actions/common/util.mjs", "export const util = 1;\n");
        write(&root, "actions/list-drives/code.mjs", "export default { key: 'list' };\n");
        write(&root, "sources/common/base.mjs", "export default { base: true };\n");
        write(&root, "app.mjs", "export default { type: 'app', app: 'google_drive' };\n");
        root
    }

    #[test]
    fn action_includes_shared_helpers_and_root_modules() {
        let root = drive_tree();
        let doc = assemble(&root, APP, ComponentType::Action).unwrap();

        assert_eq!(labels(&doc), vec!["actions/common/util.mjs", "app.mjs"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn app_excludes_component_scoped_files() {
        let root = drive_tree();
        let doc = assemble(&root, APP, ComponentType::App).unwrap();

        assert_eq!(labels(&doc), vec!["app.mjs"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn source_variants_make_identical_decisions() {
        let root = temp_root();
        write(&root, "sources/common/base.mjs", "export default {};\n");
        write(&root, "sources/new-item/code.mjs", "export default {};\n");

        let assembler = Assembler::new(&root);
        let decisions = |ct| {
            assembler
                .plan(APP, ct)
                .unwrap()
                .into_iter()
                .map(|f| (f.label, f.decision))
                .collect::<Vec<_>>()
        };

        let webhook = decisions(ComponentType::WebhookSource);
        let polling = decisions(ComponentType::PollingSource);
        assert_eq!(webhook, polling);
        assert_eq!(
            webhook,
            vec![
                ("sources/common/base.mjs".to_string(), Decision::Include),
                (
                    "sources/new-item/code.mjs".to_string(),
                    Decision::Skip(SkipReason::NotSharedHelper)
                ),
            ]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn build_output_and_dependencies_never_included() {
        let root = temp_root();
        write(&root, "app.mjs", "app");
        write(&root, "dist/app.mjs", "built");
        write(&root, "dist/actions/common/util.mjs", "built");
        write(&root, "node_modules/pkg/index.ts", "dep");
        write(&root, "actions/common/node_modules/dep/common.mjs", "dep");
        write(&root, "sources/common/dist/base.mjs", "built");

        for ct in ComponentType::ALL {
            let doc = assemble(&root, APP, ct).unwrap();
            assert_eq!(labels(&doc), vec!["app.mjs"], "component type {ct}");

            let planned = Assembler::new(&root).plan(APP, ct).unwrap();
            assert!(
                planned
                    .iter()
                    .all(|f| !f.label.contains("dist/") && !f.label.contains("node_modules/")),
                "pruned directories must not be walked"
            );
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn blocks_reproduce_content_verbatim() {
        let root = temp_root();
        let content = "// leading comment\r\nexport default {\n  weird: \"### not a heading\",\n};";
        write(&root, "app.mjs", content);
        write(&root, "common/types.ts", "export type Id = string;\n");

        let doc = assemble(&root, APP, ComponentType::Action).unwrap();
        assert_eq!(labels(&doc), vec!["app.mjs", "common/types.ts"]);
        assert_eq!(doc.entries()[0].content, content);
        assert_eq!(
            doc.render(),
            format!(
                "### app.mjs\n\n{content}\n### common/types.ts\n\nexport type Id = string;\n\n"
            )
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn labels_strip_app_root_even_when_app_name_repeats() {
        let root = temp_root();
        write(&root, "google_drive/google_drive.mjs", "nested");

        let doc = assemble(&root, APP, ComponentType::App).unwrap();
        assert_eq!(labels(&doc), vec!["google_drive/google_drive.mjs"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn non_utf8_file_fails_whole_assembly() {
        let root = temp_root();
        write(&root, "app.mjs", "fine");
        let bad = root.join(APP).join("zz.mjs");
        std::fs::write(&bad, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = assemble(&root, APP, ComponentType::Action).unwrap_err();
        match err {
            ComponentGenError::FileAccess { path, .. } => assert_eq!(path, bad),
            other => panic!("expected FileAccess, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_fails_whole_assembly() {
        let root = temp_root();
        write(&root, "app.mjs", "fine");
        let link = root.join(APP).join("gone.mjs");
        std::os::unix::fs::symlink(root.join("does-not-exist.mjs"), &link).unwrap();

        let err = assemble(&root, APP, ComponentType::App).unwrap_err();
        match err {
            ComponentGenError::FileAccess { path, source } => {
                assert_eq!(path, link);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected FileAccess, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_app_root_is_file_access_error() {
        let root = temp_root();
        let err = assemble(&root, "no_such_app", ComponentType::Action).unwrap_err();
        assert!(matches!(err, ComponentGenError::FileAccess { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn plan_reports_every_walked_file() {
        let root = drive_tree();
        write(&root, "package.json", "{}");

        let planned = Assembler::new(&root).plan(APP, ComponentType::Action).unwrap();
        let summary: Vec<(&str, bool)> = planned
            .iter()
            .map(|f| (f.label.as_str(), f.decision.is_include()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("actions/common/util.mjs", true),
                ("actions/list-drives/code.mjs", false),
                ("app.mjs", true),
                ("package.json", false),
                ("sources/common/base.mjs", false),
            ]
        );

        let _ = std::fs::remove_dir_all(&root);
    }
}
