use typedb_types::{MethodDef, TypeRef, TypeStore};

mod catalog;
mod collection;

/// Non-constructor method definition; parameters are `(name, type)` pairs.
pub(crate) fn method(name: &str, params: &[(&str, TypeRef)], ret: Option<TypeRef>) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        is_constructor: false,
        params: params.iter().map(|(_, ty)| *ty).collect(),
        param_names: params.iter().map(|(name, _)| name.to_string()).collect(),
        return_type: ret,
    }
}

pub(crate) fn void(store: &mut TypeStore) -> Option<TypeRef> {
    Some(store.intern_type("void"))
}
