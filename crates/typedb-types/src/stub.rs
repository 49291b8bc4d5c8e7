//! Loading [`TypeStore`] entries from serializable declaration stubs.
//!
//! Stubs reference other types by qualified name. Names are resolved through the
//! [`TypeStubProvider`] first, so a referenced type that has a stub is fully defined before the
//! referencing type finishes loading; anything else becomes a placeholder.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{erase_type_arguments, MethodDef, ResolveError, TypeDef, TypeKind, TypeRef, TypeStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStub {
    /// Qualified name, e.g. `com.example.Foo`.
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodStub>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStub {
    pub name: String,
    #[serde(default)]
    pub constructor: bool,
    #[serde(default)]
    pub params: Vec<ParamStub>,
    /// Missing for a non-constructor means the return type could not be bound.
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamStub {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

pub trait TypeStubProvider {
    fn lookup_type(&self, name: &str) -> Option<&TypeStub>;
}

impl TypeStubProvider for HashMap<String, TypeStub> {
    fn lookup_type(&self, name: &str) -> Option<&TypeStub> {
        self.get(name)
    }
}

pub struct StubLoader<'a, P: ?Sized> {
    store: &'a mut TypeStore,
    provider: &'a P,
    loaded: HashSet<String>,
}

impl<'a, P: TypeStubProvider + ?Sized> StubLoader<'a, P> {
    pub fn new(store: &'a mut TypeStore, provider: &'a P) -> Self {
        Self {
            store,
            provider,
            loaded: HashSet::new(),
        }
    }

    /// Load the stub for `name` (and everything it references) into the store.
    pub fn ensure_type(&mut self, name: &str) -> Result<TypeRef, ResolveError> {
        if self.loaded.contains(name) {
            return Ok(self.store.intern_type(name));
        }
        let provider = self.provider;
        let stub = provider
            .lookup_type(name)
            .ok_or_else(|| ResolveError::UnknownType {
                name: name.to_string(),
            })?;
        Ok(self.load(stub))
    }

    /// Define `stub` in the store, resolving every referenced name.
    ///
    /// A declaration written with its type parameters (`p.G<T>`) is defined under the erased
    /// name, so references to any instantiation share its handle.
    pub fn load(&mut self, stub: &TypeStub) -> TypeRef {
        let name = erase_type_arguments(&stub.name).into_owned();
        let id = self.store.intern_type(&name);
        if !self.loaded.insert(name.clone()) {
            return id;
        }
        tracing::trace!(target: "typedb.types", name = %name, "loading type stub");

        let interfaces = stub
            .interfaces
            .iter()
            .map(|name| self.resolve_type_name(name))
            .collect();

        let methods = stub
            .methods
            .iter()
            .map(|method| {
                let params = method
                    .params
                    .iter()
                    .map(|param| self.resolve_type_name(&param.ty))
                    .collect();
                let param_names = method.params.iter().map(|param| param.name.clone()).collect();
                let return_type = match &method.returns {
                    Some(name) => Some(self.resolve_type_name(name)),
                    None if method.constructor => Some(self.store.intern_type("void")),
                    None => None,
                };
                MethodDef {
                    name: method.name.clone(),
                    is_constructor: method.constructor,
                    params,
                    param_names,
                    return_type,
                }
            })
            .collect();

        self.store.define_type(
            id,
            TypeDef {
                name,
                kind: stub.kind,
                interfaces,
                methods,
            },
        );
        id
    }

    /// Resolve a type name as written in a stub.
    ///
    /// `G<A,B>` resolves to an instantiation of `G` when `G` has a stub; everything unknown is
    /// interned as a placeholder.
    pub fn resolve_type_name(&mut self, name: &str) -> TypeRef {
        let name = name.trim();
        if let Some((base, args)) = split_type_arguments(name) {
            let base = self.resolve_type_name(base);
            let args: Vec<TypeRef> = args
                .into_iter()
                .map(|arg| self.resolve_type_name(arg))
                .collect();
            return self.store.instantiate(base, &args);
        }

        match self.ensure_type(name) {
            Ok(id) => id,
            Err(_) => {
                let erased = erase_type_arguments(name);
                if erased != name {
                    tracing::debug!(
                        target: "typedb.types",
                        name,
                        "unsupported generic syntax; interning as placeholder"
                    );
                }
                self.store.intern_type(name)
            }
        }
    }
}

/// Split `G<A, H<B, C>>` into `("G", ["A", "H<B, C>"])`.
///
/// Only names that end with their argument list qualify.
fn split_type_arguments(name: &str) -> Option<(&str, Vec<&str>)> {
    let open = name.find('<')?;
    if !name.ends_with('>') || open == 0 {
        return None;
    }
    let inner = &name[open + 1..name.len() - 1];

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(inner[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(inner[start..].trim());
    if args.iter().any(|arg| arg.is_empty()) {
        return None;
    }
    Some((&name[..open], args))
}
