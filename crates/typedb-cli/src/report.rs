//! Per-package rendering of a populated catalog.

use std::fmt;

use serde::Serialize;
use typedb::{MethodDescriptor, NameStyle, TypeCatalog, TypeDescriptor};
use typedb_config::ReportConfig;
use typedb_types::Resolver;

/// Placeholder for a return type the resolver could not bind.
pub const UNRESOLVED: &str = "<unresolved>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub package: String,
    pub types: Vec<TypeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub name: String,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodReport {
    pub name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub constructor: bool,
    pub parameters: Vec<ParameterReport>,
    /// `None` when the return type is unresolved.
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterReport {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

pub fn name_style(config: &ReportConfig) -> NameStyle {
    if config.strip_java_lang {
        NameStyle::Display
    } else {
        NameStyle::Qualified
    }
}

pub fn method_report<R: Resolver>(
    method: &MethodDescriptor,
    catalog: &TypeCatalog<R>,
    style: NameStyle,
) -> MethodReport {
    MethodReport {
        name: method.name().to_string(),
        constructor: method.is_constructor(),
        parameters: method
            .parameters()
            .iter()
            .map(|param| ParameterReport {
                name: param.name().to_string(),
                ty: style.render(&param.type_info(catalog)),
            })
            .collect(),
        returns: method
            .return_type(catalog)
            .ok()
            .map(|ret| style.render(&ret)),
    }
}

pub fn type_report<R: Resolver>(
    descriptor: &TypeDescriptor,
    catalog: &TypeCatalog<R>,
    config: &ReportConfig,
) -> TypeReport {
    let style = name_style(config);
    TypeReport {
        name: style.render(descriptor),
        interfaces: descriptor
            .interfaces(catalog)
            .iter()
            .map(|iface| style.render(iface))
            .collect(),
        methods: descriptor
            .methods()
            .iter()
            .filter(|method| config.show_constructors || !method.is_constructor())
            .map(|method| method_report(method, catalog, style))
            .collect(),
    }
}

/// Report every type registered at the time of the call, grouped by package.
///
/// Types that only get registered while rendering (interfaces and signature types reached
/// lazily) are not part of the report.
pub fn build_report<R: Resolver>(
    catalog: &TypeCatalog<R>,
    config: &ReportConfig,
) -> Vec<PackageReport> {
    catalog
        .by_package()
        .into_iter()
        .map(|(package, types)| PackageReport {
            package,
            types: types
                .iter()
                .map(|descriptor| type_report(descriptor, catalog, config))
                .collect(),
        })
        .collect()
}

impl fmt::Display for MethodReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.parameters.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", param.ty, param.name)?;
        }
        write!(f, ") -> {}", self.returns.as_deref().unwrap_or(UNRESOLVED))
    }
}

impl fmt::Display for TypeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}", self.name)?;
        if !self.interfaces.is_empty() {
            write!(f, " : {}", self.interfaces.join(", "))?;
        }
        writeln!(f)?;
        for method in &self.methods {
            writeln!(f, "    - {method}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PackageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Package: {}:", self.package)?;
        for ty in &self.types {
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}
