use std::cell::OnceCell;
use std::collections::HashSet;
use std::rc::Rc;

use typedb_hir::ImportDecl;
use typedb_types::{Resolver, TypeRef, PRIMITIVE_TYPE_NAMES};

use crate::canonical_key;
use crate::catalog::{CatalogOptions, TypeCatalog};
use crate::method::MethodDescriptor;

/// Snapshot of a resolved type held by a [`TypeCatalog`].
#[derive(Debug)]
pub struct TypeDescriptor {
    key: String,
    ty: TypeRef,
    qualified_name: String,
    package_name: String,
    methods: Vec<MethodDescriptor>,
    /// Lexical context of the declaration that registered this type; set at most once.
    imports: OnceCell<Vec<ImportDecl>>,
}

impl TypeDescriptor {
    pub(crate) fn new<R: Resolver + ?Sized>(
        resolver: &R,
        ty: TypeRef,
        key: String,
        options: &CatalogOptions,
    ) -> Self {
        let mut methods = Vec::new();
        collect_methods_with(resolver, ty, &mut methods, options);
        Self {
            key,
            ty,
            qualified_name: resolver.qualified_name(ty).to_string(),
            package_name: resolver.package_name(ty).to_string(),
            methods,
            imports: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The resolver handle this descriptor was first built from.
    pub fn type_ref(&self) -> TypeRef {
        self.ty
    }

    /// Qualified name of the first binding registered under this key. For generic types this
    /// may carry the type arguments of whichever instantiation got there first.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn display_name(&self) -> String {
        self.qualified_name.replace("java.lang.", "")
    }

    /// Primitives, `void`, and `java.lang` types, which need no import to be used.
    pub fn is_built_in(&self) -> bool {
        PRIMITIVE_TYPE_NAMES.contains(&self.display_name().as_str())
            || self.package_name == "java.lang"
            || self.package_name.starts_with("java.lang.")
    }

    /// Effective method surface, most-derived declarations first.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name() == name)
    }

    pub fn imports(&self) -> &[ImportDecl] {
        self.imports.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn attach_imports(&self, imports: &[ImportDecl]) -> bool {
        self.imports.set(imports.to_vec()).is_ok()
    }

    /// Directly implemented interfaces, registered in `catalog` on first access.
    pub fn interfaces<R: Resolver>(&self, catalog: &TypeCatalog<R>) -> Vec<Rc<TypeDescriptor>> {
        let interfaces = catalog.resolver().interfaces(self.ty).to_vec();
        interfaces
            .into_iter()
            .map(|iface| catalog.get_or_add(iface))
            .collect()
    }
}

/// Append the effective method surface of `ty` to `methods`.
///
/// Declared methods of `ty` are visited first, in declaration order, then each interface is
/// walked depth-first in declaration order against the same accumulator. A method is only
/// appended when nothing already collected is the same method or overrides it. Works on raw
/// resolver handles and never touches a catalog.
pub fn collect_methods<R: Resolver + ?Sized>(
    resolver: &R,
    ty: TypeRef,
    methods: &mut Vec<MethodDescriptor>,
) {
    collect_methods_with(resolver, ty, methods, &CatalogOptions::default());
}

pub fn collect_methods_with<R: Resolver + ?Sized>(
    resolver: &R,
    ty: TypeRef,
    methods: &mut Vec<MethodDescriptor>,
    options: &CatalogOptions,
) {
    let mut collector = MethodCollector {
        resolver,
        path: Vec::new(),
        visited: options.skip_visited_interfaces.then(HashSet::new),
    };
    collector.collect(ty, methods);
}

struct MethodCollector<'r, R: ?Sized> {
    resolver: &'r R,
    /// Canonical keys of the types currently being walked.
    path: Vec<String>,
    /// Present when shared ancestors are walked once per call instead of once per path.
    visited: Option<HashSet<String>>,
}

impl<R: Resolver + ?Sized> MethodCollector<'_, R> {
    fn collect(&mut self, ty: TypeRef, methods: &mut Vec<MethodDescriptor>) {
        let resolver = self.resolver;
        let key = canonical_key(resolver.qualified_name(ty));
        if self.path.contains(&key) {
            tracing::debug!(target: "typedb.catalog", key = %key, "interface cycle; not descending");
            return;
        }
        if let Some(visited) = &mut self.visited {
            if !visited.insert(key.clone()) {
                tracing::trace!(target: "typedb.catalog", key = %key, "interface already walked");
                return;
            }
        }

        for &method in resolver.declared_methods(ty) {
            let found = methods
                .iter()
                .any(|existing| existing.is_same_or_overrides(method, resolver));
            if !found {
                methods.push(MethodDescriptor::new(resolver, method));
            }
        }

        self.path.push(key);
        for &iface in resolver.interfaces(ty) {
            self.collect(iface, methods);
        }
        self.path.pop();
    }
}
