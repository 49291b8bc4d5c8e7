//! Declarations handed to the catalog by the scanning pass.
//!
//! A [`CompilationUnit`] carries its lexical import context and its top-level [`TypeDecl`]s.
//! Each declaration holds the resolver binding for the declared type, if the front end could
//! produce one, plus its nested type declarations.

use std::fmt;

use serde::{Deserialize, Serialize};
use typedb_types::TypeRef;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(package: Option<String>) -> Self {
        Self {
            package,
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Every declaration in the unit, outer declarations before the ones nested in them.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeDecl> {
        let mut stack: Vec<&TypeDecl> = self.types.iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.members().iter().rev());
            Some(next)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub path: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_star: bool,
}

impl ImportDecl {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
            is_star: false,
        }
    }

    pub fn star(package: impl Into<String>) -> Self {
        Self {
            path: package.into(),
            is_static: false,
            is_star: true,
        }
    }
}

impl fmt::Display for ImportDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("import ")?;
        if self.is_static {
            f.write_str("static ")?;
        }
        f.write_str(&self.path)?;
        if self.is_star {
            f.write_str(".*")?;
        }
        f.write_str(";")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDecl {
    /// Classes and interfaces.
    Class(ClassDecl),
    Enum(EnumDecl),
    /// Annotation types never reach the catalog.
    Annotation(AnnotationDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Class(decl) => &decl.name,
            TypeDecl::Enum(decl) => &decl.name,
            TypeDecl::Annotation(decl) => &decl.name,
        }
    }

    /// `None` when the front end could not bind the declaration.
    pub fn binding(&self) -> Option<TypeRef> {
        match self {
            TypeDecl::Class(decl) => decl.binding,
            TypeDecl::Enum(decl) => decl.binding,
            TypeDecl::Annotation(decl) => decl.binding,
        }
    }

    pub fn members(&self) -> &[TypeDecl] {
        match self {
            TypeDecl::Class(decl) => &decl.members,
            TypeDecl::Enum(decl) => &decl.members,
            TypeDecl::Annotation(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub is_interface: bool,
    pub binding: Option<TypeRef>,
    /// Nested type declarations, in source order.
    pub members: Vec<TypeDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, binding: Option<TypeRef>) -> Self {
        Self {
            name: name.into(),
            is_interface: false,
            binding,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub binding: Option<TypeRef>,
    pub members: Vec<TypeDecl>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>, binding: Option<TypeRef>) -> Self {
        Self {
            name: name.into(),
            binding,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDecl {
    pub name: String,
    pub binding: Option<TypeRef>,
}
