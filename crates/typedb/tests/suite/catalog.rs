use std::rc::Rc;

use pretty_assertions::assert_eq;
use typedb::{canonical_key, TypeCatalog};
use typedb_types::{Resolver, TypeDef, TypeKind, TypeStore};

use super::{method, void};

fn generic_list(store: &mut TypeStore) -> typedb_types::TypeRef {
    let int = store.intern_type("int");
    store.upsert_type(TypeDef {
        name: "java.util.List".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("size", &[], Some(int))],
    })
}

#[test]
fn instantiations_share_one_descriptor() {
    let mut store = TypeStore::new();
    let list = generic_list(&mut store);
    let string = store.intern_type("java.lang.String");
    let integer = store.intern_type("java.lang.Integer");
    let list_string = store.instantiate(list, &[string]);
    let list_integer = store.instantiate(list, &[integer]);
    assert_ne!(list_string, list_integer);

    let catalog = TypeCatalog::new(&store);
    let first = catalog.get_or_add(list_string);
    let second = catalog.get_or_add(list_integer);
    let raw = catalog.get_or_add(list);

    assert!(Rc::ptr_eq(&first, &second));
    assert!(Rc::ptr_eq(&first, &raw));
    assert_eq!(catalog.len(), 1);
    assert_eq!(first.key(), "java.util.List");
    // The first instantiation to arrive names the entry.
    assert_eq!(first.qualified_name(), "java.util.List<java.lang.String>");
    assert_eq!(
        canonical_key(store.qualified_name(list_string)),
        canonical_key(store.qualified_name(list_integer))
    );
}

#[test]
fn lookup_never_registers() {
    let mut store = TypeStore::new();
    let list = generic_list(&mut store);
    let catalog = TypeCatalog::new(&store);

    assert!(catalog.lookup(list).is_none());
    assert!(catalog.is_empty());

    let added = catalog.get_or_add(list);
    let found = catalog.lookup(list).expect("registered type should be found");
    assert!(Rc::ptr_eq(&added, &found));
    let by_name = catalog
        .lookup_name("java.util.List<java.lang.Object>")
        .expect("lookup by name erases type arguments");
    assert!(Rc::ptr_eq(&added, &by_name));
}

#[test]
fn get_or_new_leaves_the_registry_untouched() {
    let mut store = TypeStore::new();
    let list = generic_list(&mut store);
    let catalog = TypeCatalog::new(&store);

    let transient = catalog.get_or_new(list);
    assert_eq!(transient.methods().len(), 1);
    assert!(catalog.is_empty());

    let registered = catalog.get_or_add(list);
    assert!(!Rc::ptr_eq(&transient, &registered));

    let again = catalog.get_or_new(list);
    assert!(Rc::ptr_eq(&again, &registered));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn interfaces_are_registered_lazily() {
    let mut store = TypeStore::new();
    let ret = void(&mut store);
    let base = store.upsert_type(TypeDef {
        name: "p.base.Base".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("m", &[], ret)],
    });
    let derived = store.upsert_type(TypeDef {
        name: "p.Derived".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![base],
        methods: vec![],
    });

    let catalog = TypeCatalog::new(&store);
    let descriptor = catalog.get_or_add(derived);
    assert_eq!(descriptor.methods().len(), 1);
    assert!(catalog.lookup(base).is_none());

    let interfaces = descriptor.interfaces(&catalog);
    assert_eq!(interfaces.len(), 1);
    let registered = catalog.lookup(base).expect("interface registered on access");
    assert!(Rc::ptr_eq(&interfaces[0], &registered));
}

#[test]
fn mutually_referencing_types_do_not_recurse_on_construction() {
    let mut store = TypeStore::new();
    let a = store.intern_type("p.A");
    let b = store.intern_type("p.B");
    store.define_type(
        a,
        TypeDef {
            name: "p.A".to_string(),
            kind: TypeKind::Class,
            interfaces: vec![],
            methods: vec![method("b", &[("other", b)], Some(b))],
        },
    );
    store.define_type(
        b,
        TypeDef {
            name: "p.B".to_string(),
            kind: TypeKind::Class,
            interfaces: vec![],
            methods: vec![method("a", &[("other", a)], Some(a))],
        },
    );

    let catalog = TypeCatalog::new(&store);
    let a_desc = catalog.get_or_add(a);
    assert_eq!(catalog.len(), 1);

    let b_desc = a_desc.methods()[0].return_type(&catalog).unwrap();
    let back = b_desc.methods()[0].parameters()[0].type_info(&catalog);
    assert!(Rc::ptr_eq(&a_desc, &back));
    assert_eq!(catalog.len(), 2);
}

#[test]
fn by_package_groups_and_sorts() {
    let mut store = TypeStore::new();
    let zed = store.upsert_type(TypeDef {
        name: "p.one.Zed".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![],
        methods: vec![],
    });
    let alpha = store.upsert_type(TypeDef {
        name: "p.one.Alpha".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![],
        methods: vec![],
    });
    let other = store.upsert_type(TypeDef {
        name: "p.another.Other".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![],
        methods: vec![],
    });

    let catalog = TypeCatalog::new(&store);
    for ty in [zed, other, alpha] {
        catalog.get_or_add(ty);
    }

    let packages = catalog.by_package();
    let layout: Vec<(&str, Vec<&str>)> = packages
        .iter()
        .map(|(pkg, types)| {
            (
                pkg.as_str(),
                types.iter().map(|t| t.qualified_name()).collect(),
            )
        })
        .collect();
    assert_eq!(
        layout,
        vec![
            ("p.another", vec!["p.another.Other"]),
            ("p.one", vec!["p.one.Alpha", "p.one.Zed"]),
        ]
    );
    assert_eq!(catalog.all().len(), 3);
}
