use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;
use typedb_hir::{CompilationUnit, ImportDecl, TypeDecl};
use typedb_types::{ResolveError, Resolver, TypeRef};

use crate::canonical_key;
use crate::descriptor::TypeDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Walk each interface at most once per method collection, keyed by canonical key.
    ///
    /// Off by default: a shared ancestor reached along several paths is re-walked once per
    /// path. Turning this on can change which of two conflicting inherited methods is kept.
    pub skip_visited_interfaces: bool,
}

/// Registry mapping canonical type keys to shared [`TypeDescriptor`]s.
///
/// The catalog is single-threaded: it hands out `Rc`s and mutates its map through a `RefCell`,
/// so lazily resolving a cross reference only needs `&TypeCatalog`. Every call that resolves a
/// key returns the same `Rc` for the lifetime of the catalog.
pub struct TypeCatalog<R> {
    resolver: R,
    options: CatalogOptions,
    entries: RefCell<IndexMap<String, Rc<TypeDescriptor>>>,
}

impl<R: Resolver> TypeCatalog<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, CatalogOptions::default())
    }

    pub fn with_options(resolver: R, options: CatalogOptions) -> Self {
        Self {
            resolver,
            options,
            entries: RefCell::new(IndexMap::new()),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Return the descriptor registered under `ty`'s canonical key, building and registering
    /// it first if needed.
    pub fn get_or_add(&self, ty: TypeRef) -> Rc<TypeDescriptor> {
        let key = canonical_key(self.resolver.qualified_name(ty));
        if let Some(existing) = self.entries.borrow().get(&key) {
            return Rc::clone(existing);
        }

        // Building only consults the resolver, so no borrow of `entries` is held across it.
        let descriptor = Rc::new(TypeDescriptor::new(
            &self.resolver,
            ty,
            key.clone(),
            &self.options,
        ));
        tracing::trace!(
            target: "typedb.catalog",
            key = %key,
            methods = descriptor.methods().len(),
            "registered type"
        );
        self.entries
            .borrow_mut()
            .insert(key, Rc::clone(&descriptor));
        descriptor
    }

    /// Like [`TypeCatalog::get_or_add`] but never registers anything.
    ///
    /// Returns the registered descriptor when there is one, otherwise a transient descriptor
    /// owned by the caller.
    pub fn get_or_new(&self, ty: TypeRef) -> Rc<TypeDescriptor> {
        if let Some(existing) = self.lookup(ty) {
            return existing;
        }
        let key = canonical_key(self.resolver.qualified_name(ty));
        Rc::new(TypeDescriptor::new(&self.resolver, ty, key, &self.options))
    }

    pub fn lookup(&self, ty: TypeRef) -> Option<Rc<TypeDescriptor>> {
        self.lookup_name(self.resolver.qualified_name(ty))
    }

    /// Probe by qualified name; type arguments are erased the same way as for handles.
    pub fn lookup_name(&self, qualified_name: &str) -> Option<Rc<TypeDescriptor>> {
        self.entries
            .borrow()
            .get(&canonical_key(qualified_name))
            .cloned()
    }

    /// Snapshot of every registered descriptor. Order is unspecified.
    pub fn all(&self) -> Vec<Rc<TypeDescriptor>> {
        self.entries.borrow().values().cloned().collect()
    }

    /// Registered descriptors grouped by package, each group sorted by qualified name.
    pub fn by_package(&self) -> BTreeMap<String, Vec<Rc<TypeDescriptor>>> {
        let mut packages: BTreeMap<String, Vec<Rc<TypeDescriptor>>> = BTreeMap::new();
        for descriptor in self.all() {
            packages
                .entry(descriptor.package_name().to_string())
                .or_default()
                .push(descriptor);
        }
        for types in packages.values_mut() {
            types.sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));
        }
        packages
    }

    /// Register a declared type and, recursively, the types nested in it.
    ///
    /// Declarations without a binding are skipped, but their nested declarations are still
    /// visited. When the type is already registered (for example because an earlier type used
    /// it as a parameter) the existing descriptor is kept and only gains the import context.
    pub fn register_declaration(&self, decl: &TypeDecl, imports: &[ImportDecl]) {
        match decl {
            TypeDecl::Class(typedb_hir::ClassDecl {
                name,
                binding,
                members,
                ..
            })
            | TypeDecl::Enum(typedb_hir::EnumDecl {
                name,
                binding,
                members,
            }) => {
                match binding {
                    Some(ty) => {
                        let descriptor = self.get_or_add(*ty);
                        if !descriptor.attach_imports(imports) {
                            tracing::trace!(
                                target: "typedb.catalog",
                                key = descriptor.key(),
                                "type declared more than once; keeping first import context"
                            );
                        }
                    }
                    None => {
                        tracing::debug!(
                            target: "typedb.catalog",
                            name = %name,
                            "skipping declaration without a binding"
                        );
                    }
                }
                for member in members {
                    self.register_declaration(member, imports);
                }
            }
            TypeDecl::Annotation(_) => {}
        }
    }

    pub fn register_unit(&self, unit: &CompilationUnit) {
        for decl in &unit.types {
            self.register_declaration(decl, &unit.imports);
        }
    }
}

impl<R> std::fmt::Debug for TypeCatalog<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("options", &self.options)
            .field("len", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}
