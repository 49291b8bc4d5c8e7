//! Resolved program entities consumed by the type catalog.
//!
//! The catalog never parses source text. It talks to a [`Resolver`], which hands out opaque
//! [`TypeRef`] / [`MethodRef`] handles and answers identity, naming and override queries about
//! them. [`TypeStore`] is the in-memory resolver used by the CLI and by tests; [`stub`] builds a
//! store from serializable declaration stubs.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod stub;

pub use stub::{MethodStub, ParamStub, StubLoader, TypeStub, TypeStubProvider};

/// Names that are never qualified and never live in a package.
pub const PRIMITIVE_TYPE_NAMES: &[&str] = &[
    "void", "boolean", "char", "byte", "short", "int", "long", "float", "double",
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(u32);

impl TypeRef {
    fn from_raw(raw: u32) -> Self {
        TypeRef(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef(u32);

impl MethodRef {
    fn from_raw(raw: u32) -> Self {
        MethodRef(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodRef({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cannot resolve return type of `{method}`")]
    UnresolvedReturnType { method: String },
    #[error("unknown type `{name}`")]
    UnknownType { name: String },
}

/// Capability contract of the semantic resolver.
///
/// Handles are only valid for the resolver that produced them. Equality of handles is identity
/// equality of the underlying bindings.
pub trait Resolver {
    fn qualified_name(&self, ty: TypeRef) -> &str;

    fn package_name(&self, ty: TypeRef) -> &str;

    /// Directly implemented (or, for interfaces, extended) interfaces, in declaration order.
    fn interfaces(&self, ty: TypeRef) -> &[TypeRef];

    /// Methods declared directly on `ty`, in declaration order.
    fn declared_methods(&self, ty: TypeRef) -> &[MethodRef];

    fn method_name(&self, method: MethodRef) -> &str;

    fn is_constructor(&self, method: MethodRef) -> bool;

    /// Whether `method` overrides `other` for dispatch purposes.
    fn overrides(&self, method: MethodRef, other: MethodRef) -> bool;

    fn parameter_types(&self, method: MethodRef) -> &[TypeRef];

    /// Parallel to [`Resolver::parameter_types`]; callers zip the two and stop at the shorter.
    fn parameter_names(&self, method: MethodRef) -> &[String];

    fn return_type(&self, method: MethodRef) -> Result<TypeRef, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn qualified_name(&self, ty: TypeRef) -> &str {
        (**self).qualified_name(ty)
    }

    fn package_name(&self, ty: TypeRef) -> &str {
        (**self).package_name(ty)
    }

    fn interfaces(&self, ty: TypeRef) -> &[TypeRef] {
        (**self).interfaces(ty)
    }

    fn declared_methods(&self, ty: TypeRef) -> &[MethodRef] {
        (**self).declared_methods(ty)
    }

    fn method_name(&self, method: MethodRef) -> &str {
        (**self).method_name(method)
    }

    fn is_constructor(&self, method: MethodRef) -> bool {
        (**self).is_constructor(method)
    }

    fn overrides(&self, method: MethodRef, other: MethodRef) -> bool {
        (**self).overrides(method, other)
    }

    fn parameter_types(&self, method: MethodRef) -> &[TypeRef] {
        (**self).parameter_types(method)
    }

    fn parameter_names(&self, method: MethodRef) -> &[String] {
        (**self).parameter_names(method)
    }

    fn return_type(&self, method: MethodRef) -> Result<TypeRef, ResolveError> {
        (**self).return_type(method)
    }
}

/// Remove the span from the first `<` through the last `>`.
///
/// Nested argument lists are erased wholesale rather than parsed, so `a.Map<K, List<V>>` and
/// `a.Map<String, Integer>` both become `a.Map`. Names without a closing bracket after the first
/// `<` are returned unchanged.
pub fn erase_type_arguments(name: &str) -> Cow<'_, str> {
    let Some(open) = name.find('<') else {
        return Cow::Borrowed(name);
    };
    match name.rfind('>') {
        Some(close) if close > open => {
            let mut erased = String::with_capacity(name.len() - (close - open + 1));
            erased.push_str(&name[..open]);
            erased.push_str(&name[close + 1..]);
            Cow::Owned(erased)
        }
        _ => Cow::Borrowed(name),
    }
}

/// Package portion of a qualified type name. Primitives and unqualified names have none.
pub fn package_of(name: &str) -> &str {
    let erased_len = name.find('<').unwrap_or(name.len());
    let head = name[..erased_len].trim_end_matches("[]");
    if PRIMITIVE_TYPE_NAMES.contains(&head) {
        return "";
    }
    match head.rsplit_once('.') {
        Some((package, _)) => package,
        None => "",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
    Primitive,
    /// Referenced but never defined.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub is_constructor: bool,
    pub params: Vec<TypeRef>,
    pub param_names: Vec<String>,
    /// `None` models a return type the front end could not bind.
    pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone)]
struct TypeData {
    name: String,
    package: String,
    kind: TypeKind,
    interfaces: Vec<TypeRef>,
    methods: Vec<MethodRef>,
    /// Set for parameterized instantiations; members come from the generic declaration.
    generic: Option<TypeRef>,
}

#[derive(Debug, Clone)]
struct MethodData {
    declaring: TypeRef,
    def: MethodDef,
}

/// Arena-backed [`Resolver`].
///
/// Type handles are interned by qualified name, so referencing a type before it is defined
/// yields a placeholder whose id survives the later definition.
#[derive(Debug, Clone, Default)]
pub struct TypeStore {
    types: Vec<TypeData>,
    methods: Vec<MethodData>,
    by_name: HashMap<String, TypeRef>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the primitive types.
    pub fn with_primitives() -> Self {
        let mut store = Self::new();
        for name in PRIMITIVE_TYPE_NAMES {
            store.intern_type(name);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Return the handle for `name`, allocating a placeholder if it is not known yet.
    pub fn intern_type(&mut self, name: &str) -> TypeRef {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let kind = if PRIMITIVE_TYPE_NAMES.contains(&name) {
            TypeKind::Primitive
        } else {
            TypeKind::Unknown
        };
        self.alloc(TypeData {
            name: name.to_string(),
            package: package_of(name).to_string(),
            kind,
            interfaces: Vec::new(),
            methods: Vec::new(),
            generic: None,
        })
    }

    pub fn type_id(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    /// Kind of `ty`; instantiations report the kind of their generic declaration.
    pub fn kind(&self, ty: TypeRef) -> TypeKind {
        self.types[self.origin(ty).idx()].kind
    }

    /// Define (or redefine) `id`. Methods previously declared on `id` are detached.
    pub fn define_type(&mut self, id: TypeRef, def: TypeDef) {
        let TypeDef {
            name,
            kind,
            interfaces,
            methods,
        } = def;

        let method_ids = methods
            .into_iter()
            .map(|def| self.alloc_method(id, def))
            .collect();

        if self.types[id.idx()].name != name {
            self.by_name.remove(&self.types[id.idx()].name);
            self.by_name.insert(name.clone(), id);
        }

        let data = &mut self.types[id.idx()];
        data.package = package_of(&name).to_string();
        data.name = name;
        data.kind = kind;
        data.interfaces = interfaces;
        data.methods = method_ids;
        data.generic = None;
    }

    /// Intern `def.name` and define it, returning the (stable) handle.
    pub fn upsert_type(&mut self, def: TypeDef) -> TypeRef {
        let id = self.intern_type(&def.name);
        self.define_type(id, def);
        id
    }

    /// Override the package derived from the qualified name.
    ///
    /// Needed for nested types, whose enclosing type's name would otherwise be taken for the
    /// package. A later [`TypeStore::define_type`] derives the package from the name again.
    /// Setting it on an instantiation sets it on the declaration.
    pub fn set_package(&mut self, ty: TypeRef, package: impl Into<String>) {
        let ty = self.origin(ty);
        self.types[ty.idx()].package = package.into();
    }

    /// Append a method to `declaring`'s declared methods.
    pub fn add_method(&mut self, declaring: TypeRef, def: MethodDef) -> MethodRef {
        let id = self.alloc_method(declaring, def);
        self.types[declaring.idx()].methods.push(id);
        id
    }

    /// Parameterized instantiation `G<A, B>` of the generic declaration `generic`.
    ///
    /// The instantiation is a distinct handle with its own qualified name. Its kind, package,
    /// interfaces and declared methods are read from the declaration, so they follow any later
    /// definition of it.
    pub fn instantiate(&mut self, generic: TypeRef, args: &[TypeRef]) -> TypeRef {
        let base = self.origin(generic);
        let args = args
            .iter()
            .map(|arg| self.types[arg.idx()].name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let name = format!("{}<{}>", self.types[base.idx()].name, args);
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        self.alloc(TypeData {
            name,
            package: String::new(),
            kind: TypeKind::Unknown,
            interfaces: Vec::new(),
            methods: Vec::new(),
            generic: Some(base),
        })
    }

    pub fn declaring_type(&self, method: MethodRef) -> TypeRef {
        self.methods[method.idx()].declaring
    }

    /// Whether `sub` reaches `sup` through one or more interface edges, comparing erased names.
    pub fn is_strict_subtype(&self, sub: TypeRef, sup: TypeRef) -> bool {
        let target = erase_type_arguments(self.qualified_name(sup));
        let mut seen = HashSet::new();
        let mut queue: VecDeque<TypeRef> = self.interfaces(sub).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            let next = self.origin(next);
            if !seen.insert(next) {
                continue;
            }
            if erase_type_arguments(self.qualified_name(next)) == target {
                return true;
            }
            queue.extend(self.interfaces(next).iter().copied());
        }
        false
    }

    fn origin(&self, ty: TypeRef) -> TypeRef {
        self.types[ty.idx()].generic.unwrap_or(ty)
    }

    fn alloc(&mut self, data: TypeData) -> TypeRef {
        let raw: u32 = self
            .types
            .len()
            .try_into()
            .expect("too many types in TypeStore");
        let id = TypeRef::from_raw(raw);
        self.by_name.insert(data.name.clone(), id);
        self.types.push(data);
        id
    }

    fn alloc_method(&mut self, declaring: TypeRef, def: MethodDef) -> MethodRef {
        let raw: u32 = self
            .methods
            .len()
            .try_into()
            .expect("too many methods in TypeStore");
        self.methods.push(MethodData { declaring, def });
        MethodRef::from_raw(raw)
    }

    fn method(&self, method: MethodRef) -> &MethodDef {
        &self.methods[method.idx()].def
    }
}

impl Resolver for TypeStore {
    fn qualified_name(&self, ty: TypeRef) -> &str {
        &self.types[ty.idx()].name
    }

    fn package_name(&self, ty: TypeRef) -> &str {
        &self.types[self.origin(ty).idx()].package
    }

    fn interfaces(&self, ty: TypeRef) -> &[TypeRef] {
        &self.types[self.origin(ty).idx()].interfaces
    }

    fn declared_methods(&self, ty: TypeRef) -> &[MethodRef] {
        &self.types[self.origin(ty).idx()].methods
    }

    fn method_name(&self, method: MethodRef) -> &str {
        &self.method(method).name
    }

    fn is_constructor(&self, method: MethodRef) -> bool {
        self.method(method).is_constructor
    }

    fn overrides(&self, method: MethodRef, other: MethodRef) -> bool {
        if method == other {
            return false;
        }
        let (a, b) = (self.method(method), self.method(other));
        if a.is_constructor || b.is_constructor || a.name != b.name {
            return false;
        }
        if a.params.len() != b.params.len() {
            return false;
        }
        let same_params = a.params.iter().zip(&b.params).all(|(x, y)| {
            erase_type_arguments(self.qualified_name(*x))
                == erase_type_arguments(self.qualified_name(*y))
        });
        same_params && self.is_strict_subtype(self.declaring_type(method), self.declaring_type(other))
    }

    fn parameter_types(&self, method: MethodRef) -> &[TypeRef] {
        &self.method(method).params
    }

    fn parameter_names(&self, method: MethodRef) -> &[String] {
        &self.method(method).param_names
    }

    fn return_type(&self, method: MethodRef) -> Result<TypeRef, ResolveError> {
        self.method(method)
            .return_type
            .ok_or_else(|| ResolveError::UnresolvedReturnType {
                method: format!(
                    "{}.{}",
                    self.qualified_name(self.declaring_type(method)),
                    self.method_name(method)
                ),
            })
    }
}
