use std::rc::Rc;

use typedb_types::{MethodRef, Resolver, TypeRef};

use crate::catalog::{CatalogError, TypeCatalog};
use crate::descriptor::TypeDescriptor;

/// How type names are rendered in [`MethodDescriptor::signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameStyle {
    Qualified,
    /// Qualified names with `java.lang.` dropped.
    #[default]
    Display,
}

impl NameStyle {
    pub fn render(self, descriptor: &TypeDescriptor) -> String {
        match self {
            NameStyle::Qualified => descriptor.qualified_name().to_string(),
            NameStyle::Display => descriptor.display_name(),
        }
    }
}

/// Snapshot of a resolved method.
///
/// Parameter and return types stay as resolver handles until asked for, so building the method
/// list of a type never forces descriptors for every type mentioned in its signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    method: MethodRef,
    name: String,
    is_constructor: bool,
    parameters: Vec<ParameterDescriptor>,
}

impl MethodDescriptor {
    pub fn new<R: Resolver + ?Sized>(resolver: &R, method: MethodRef) -> Self {
        let parameters = resolver
            .parameter_types(method)
            .iter()
            .zip(resolver.parameter_names(method))
            .map(|(ty, name)| ParameterDescriptor::new(name.clone(), *ty))
            .collect();

        Self {
            method,
            name: resolver.method_name(method).to_string(),
            is_constructor: resolver.is_constructor(method),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    pub fn method_ref(&self) -> MethodRef {
        self.method
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Whether `candidate` is this method or is overridden by it.
    ///
    /// Only this direction is checked: methods are collected from the most-derived type
    /// outwards, so a candidate found later can never override one already collected.
    pub fn is_same_or_overrides<R: Resolver + ?Sized>(
        &self,
        candidate: MethodRef,
        resolver: &R,
    ) -> bool {
        candidate == self.method || resolver.overrides(self.method, candidate)
    }

    /// Resolve the return type through `catalog`, registering it if needed.
    pub fn return_type<R: Resolver>(
        &self,
        catalog: &TypeCatalog<R>,
    ) -> Result<Rc<TypeDescriptor>, CatalogError> {
        let ty = catalog.resolver().return_type(self.method)?;
        Ok(catalog.get_or_add(ty))
    }

    /// `name(T a, U b) -> R`, with `<unresolved>` standing in for a return type that cannot
    /// be bound.
    pub fn signature<R: Resolver>(&self, catalog: &TypeCatalog<R>, style: NameStyle) -> String {
        let params = self
            .parameters
            .iter()
            .map(|param| format!("{} {}", style.render(&param.type_info(catalog)), param.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let ret = match self.return_type(catalog) {
            Ok(ret) => style.render(&ret),
            Err(_) => "<unresolved>".to_string(),
        };
        format!("{}({}) -> {}", self.name, params, ret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    ty: TypeRef,
}

impl ParameterDescriptor {
    pub fn new(name: String, ty: TypeRef) -> Self {
        Self { name, ty }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> TypeRef {
        self.ty
    }

    /// The catalog is only consulted here, never when the parameter is constructed.
    pub fn type_info<R: Resolver>(&self, catalog: &TypeCatalog<R>) -> Rc<TypeDescriptor> {
        catalog.get_or_add(self.ty)
    }
}
