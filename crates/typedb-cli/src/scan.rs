//! Discovery and loading of unit manifests.
//!
//! A scan root is walked for manifest files. Every manifest describes one compilation unit: its
//! package, its imports, and its (possibly nested) type declarations. Loading happens in two
//! phases. All declared types from all units go into one [`TypeStore`] first, so that
//! cross-unit references resolve to real definitions. Only then are the units lowered into
//! [`CompilationUnit`]s whose declarations carry store bindings.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typedb_config::ScanConfig;
use typedb_hir::{AnnotationDecl, ClassDecl, CompilationUnit, EnumDecl, ImportDecl, TypeDecl};
use typedb_types::{erase_type_arguments, StubLoader, TypeKind, TypeStore, TypeStub};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitManifest {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub types: Vec<DeclStub>,
}

impl UnitManifest {
    /// Every declaration in the unit, outer declarations before the ones nested in them.
    pub fn declarations(&self) -> Vec<&DeclStub> {
        let mut out = Vec::new();
        for decl in &self.types {
            decl.walk(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl DeclKind {
    fn type_kind(self) -> TypeKind {
        match self {
            DeclKind::Class => TypeKind::Class,
            DeclKind::Interface => TypeKind::Interface,
            DeclKind::Enum => TypeKind::Enum,
            DeclKind::Annotation => TypeKind::Annotation,
        }
    }
}

/// A declared type: its stub plus the declaration kind and nested declarations.
///
/// The declaration kind wins over any `kind` written in the stub itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclStub {
    #[serde(default)]
    pub decl: DeclKind,
    #[serde(flatten)]
    pub stub: TypeStub,
    #[serde(default)]
    pub members: Vec<DeclStub>,
}

impl DeclStub {
    /// The declared qualified name without its type parameter list.
    pub fn type_name(&self) -> Cow<'_, str> {
        erase_type_arguments(&self.stub.name)
    }

    fn simple_name(&self) -> String {
        let erased = self.type_name();
        erased
            .rsplit_once('.')
            .map_or(&*erased, |(_, name)| name)
            .to_string()
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a DeclStub>) {
        out.push(self);
        for member in &self.members {
            member.walk(out);
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("type {name} is already declared in {first}")]
    DuplicateType { name: String, first: String },
    #[error("failed to load type {name}: {source}")]
    Load {
        name: String,
        #[source]
        source: typedb_types::ResolveError,
    },
}

/// A problem attributed to one file. The affected file (or declaration) is skipped.
#[derive(Debug)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub error: ScanError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}: {}", self.path.display(), self.error)
    }
}

#[derive(Debug)]
pub struct ScannedUnit {
    pub path: PathBuf,
    pub manifest: UnitManifest,
}

/// Manifest files under `root`, sorted by path. Unreadable entries become diagnostics.
pub fn discover_manifests(
    root: &Path,
    config: &ScanConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                diagnostics.push(Diagnostic {
                    path,
                    error: ScanError::Walk(err),
                });
                continue;
            }
        };
        if entry.file_type().is_file() && config.accepts(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}

pub fn read_manifest(path: &Path) -> Result<UnitManifest, ScanError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Discover and parse every manifest under `root`.
pub fn scan_root(
    root: &Path,
    config: &ScanConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ScannedUnit> {
    let files = discover_manifests(root, config, diagnostics);
    tracing::debug!(target: "typedb.scan", root = %root.display(), files = files.len(), "discovered manifests");

    let mut units = Vec::with_capacity(files.len());
    for path in files {
        match read_manifest(&path) {
            Ok(manifest) => units.push(ScannedUnit { path, manifest }),
            Err(error) => {
                tracing::debug!(target: "typedb.scan", path = %path.display(), %error, "skipping manifest");
                diagnostics.push(Diagnostic { path, error });
            }
        }
    }
    units
}

/// Load every declared type into `store`, then lower the units.
///
/// Declarations are keyed by their erased name, so `p.G<T>` and `p.G` name the same type. A type
/// declared by more than one unit keeps its first definition; later declarations still lower,
/// bound to that definition.
pub fn load_units(
    units: &[ScannedUnit],
    store: &mut TypeStore,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CompilationUnit> {
    let mut stubs: HashMap<String, TypeStub> = HashMap::new();
    let mut declared_in: HashMap<String, &Path> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for unit in units {
        for decl in unit.manifest.declarations() {
            let name = decl.type_name().into_owned();
            if let Some(first) = declared_in.get(&name) {
                diagnostics.push(Diagnostic {
                    path: unit.path.clone(),
                    error: ScanError::DuplicateType {
                        first: first.display().to_string(),
                        name,
                    },
                });
                continue;
            }
            let mut stub = decl.stub.clone();
            stub.name = name.clone();
            stub.kind = decl.decl.type_kind();
            declared_in.insert(name.clone(), &unit.path);
            order.push(name.clone());
            stubs.insert(name, stub);
        }
    }

    {
        let mut loader = StubLoader::new(store, &stubs);
        for name in &order {
            if let Err(source) = loader.ensure_type(name) {
                let path = declared_in
                    .get(name)
                    .map(|path| path.to_path_buf())
                    .unwrap_or_default();
                diagnostics.push(Diagnostic {
                    path,
                    error: ScanError::Load {
                        name: name.clone(),
                        source,
                    },
                });
            }
        }
    }
    tracing::debug!(target: "typedb.scan", types = order.len(), store = store.len(), "loaded declared types");

    // Declared types belong to their unit's package, nested ones included.
    for unit in units {
        let Some(package) = unit.manifest.package.as_deref() else {
            continue;
        };
        for decl in unit.manifest.declarations() {
            let name = decl.type_name();
            let owned_here = declared_in
                .get(name.as_ref())
                .is_some_and(|path| *path == unit.path.as_path());
            if !owned_here {
                continue;
            }
            if let Some(id) = store.type_id(&name) {
                store.set_package(id, package);
            }
        }
    }

    units
        .iter()
        .map(|unit| lower_unit(&unit.manifest, store))
        .collect()
}

fn lower_unit(manifest: &UnitManifest, store: &TypeStore) -> CompilationUnit {
    let mut unit = CompilationUnit::new(manifest.package.clone());
    unit.imports = manifest.imports.clone();
    unit.types = manifest
        .types
        .iter()
        .map(|decl| lower_decl(decl, store))
        .collect();
    unit
}

fn lower_decl(decl: &DeclStub, store: &TypeStore) -> TypeDecl {
    let binding = store.type_id(&decl.type_name());
    let name = decl.simple_name();
    let members = || {
        decl.members
            .iter()
            .map(|member| lower_decl(member, store))
            .collect::<Vec<_>>()
    };

    match decl.decl {
        DeclKind::Class | DeclKind::Interface => {
            let mut class = ClassDecl::new(name, binding);
            class.is_interface = decl.decl == DeclKind::Interface;
            class.members = members();
            TypeDecl::Class(class)
        }
        DeclKind::Enum => {
            let mut enum_decl = EnumDecl::new(name, binding);
            enum_decl.members = members();
            TypeDecl::Enum(enum_decl)
        }
        DeclKind::Annotation => TypeDecl::Annotation(AnnotationDecl { name, binding }),
    }
}

/// Everything loaded from one scan root.
#[derive(Debug)]
pub struct LoadedRoot {
    pub store: TypeStore,
    pub units: Vec<CompilationUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn load_root(root: &Path, config: &ScanConfig) -> LoadedRoot {
    let mut diagnostics = Vec::new();
    let scanned = scan_root(root, config, &mut diagnostics);
    let mut store = TypeStore::with_primitives();
    let units = load_units(&scanned, &mut store, &mut diagnostics);
    LoadedRoot {
        store,
        units,
        diagnostics,
    }
}
