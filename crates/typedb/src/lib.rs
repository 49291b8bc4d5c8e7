//! Queryable catalog of resolved type metadata.
//!
//! [`TypeCatalog`] maps the canonical key of a type (its qualified name with the generic
//! argument list erased) to a single shared [`TypeDescriptor`]. A descriptor snapshots the
//! type's effective method surface: its own declared methods plus everything inherited through
//! its interfaces, with overridden methods suppressed (see [`collect_methods`]).
//!
//! Cross references (interfaces, parameter types, return types) are kept as resolver handles and
//! only turned into descriptors when asked for, so mutually-referencing types never recurse
//! during construction.

mod catalog;
mod descriptor;
mod method;

pub use catalog::{CatalogError, CatalogOptions, TypeCatalog};
pub use descriptor::{collect_methods, collect_methods_with, TypeDescriptor};
pub use method::{MethodDescriptor, NameStyle, ParameterDescriptor};

pub use typedb_hir::{CompilationUnit, ImportDecl, TypeDecl};
pub use typedb_types::{MethodRef, ResolveError, Resolver, TypeRef};

/// Catalog key for a qualified type name.
///
/// Everything from the first `<` through the last `>` is removed, so every instantiation of a
/// generic type (`List<String>`, `List<Integer>`) shares one key and one descriptor.
pub fn canonical_key(qualified_name: &str) -> String {
    typedb_types::erase_type_arguments(qualified_name).into_owned()
}
