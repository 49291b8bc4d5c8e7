use std::collections::HashMap;

use pretty_assertions::assert_eq;
use typedb::{collect_methods, CatalogOptions, MethodDescriptor, TypeCatalog};
use typedb_types::{
    MethodStub, ParamStub, Resolver, StubLoader, TypeDef, TypeKind, TypeStore, TypeStub,
};

use super::{method, void};

fn names(methods: &[MethodDescriptor]) -> Vec<&str> {
    methods.iter().map(MethodDescriptor::name).collect()
}

#[test]
fn override_on_the_type_suppresses_the_interface_method() {
    let mut store = TypeStore::new();
    let ret = void(&mut store);
    let b = store.upsert_type(TypeDef {
        name: "p.B".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("m", &[], ret)],
    });
    let a = store.upsert_type(TypeDef {
        name: "p.A".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![b],
        methods: vec![method("m", &[], ret)],
    });

    let mut collected = Vec::new();
    collect_methods(&store, a, &mut collected);

    assert_eq!(names(&collected), vec!["m"]);
    assert_eq!(collected[0].method_ref(), store.declared_methods(a)[0]);
    assert_eq!(store.declaring_type(collected[0].method_ref()), a);
}

#[test]
fn overloads_are_not_overrides() {
    let mut store = TypeStore::with_primitives();
    let int = store.type_id("int").unwrap();
    let ret = void(&mut store);
    let b = store.upsert_type(TypeDef {
        name: "p.B".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("m", &[("x", int)], ret)],
    });
    let a = store.upsert_type(TypeDef {
        name: "p.A".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![b],
        methods: vec![method("m", &[], ret)],
    });

    let mut collected = Vec::new();
    collect_methods(&store, a, &mut collected);
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[1].parameters()[0].name(), "x");
}

fn diamond(store: &mut TypeStore) -> typedb_types::TypeRef {
    let ret = void(store);
    let d = store.upsert_type(TypeDef {
        name: "p.D".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("n", &[], ret)],
    });
    let b = store.upsert_type(TypeDef {
        name: "p.B".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![d],
        methods: vec![method("fromB", &[], ret)],
    });
    let c = store.upsert_type(TypeDef {
        name: "p.C".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![d],
        methods: vec![method("fromC", &[], ret)],
    });
    store.upsert_type(TypeDef {
        name: "p.A".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![b, c],
        methods: vec![],
    })
}

#[test]
fn diamond_ancestor_method_is_collected_once() {
    let mut store = TypeStore::new();
    let a = diamond(&mut store);

    let mut collected = Vec::new();
    collect_methods(&store, a, &mut collected);
    assert_eq!(names(&collected), vec!["fromB", "n", "fromC"]);
}

#[test]
fn skipping_visited_interfaces_keeps_the_same_surface_for_diamonds() {
    let mut store = TypeStore::new();
    let a = diamond(&mut store);

    let exhaustive = TypeCatalog::new(&store);
    let memoized = TypeCatalog::with_options(
        &store,
        CatalogOptions {
            skip_visited_interfaces: true,
        },
    );

    let left = exhaustive.get_or_add(a);
    let right = memoized.get_or_add(a);
    assert_eq!(names(left.methods()), names(right.methods()));
}

#[test]
fn override_on_an_earlier_interface_suppresses_a_later_ancestor() {
    let mut store = TypeStore::new();
    let ret = void(&mut store);
    let d = store.upsert_type(TypeDef {
        name: "p.D".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![],
        methods: vec![method("m", &[], ret)],
    });
    let b = store.upsert_type(TypeDef {
        name: "p.B".to_string(),
        kind: TypeKind::Interface,
        interfaces: vec![d],
        methods: vec![method("m", &[], ret)],
    });
    let a = store.upsert_type(TypeDef {
        name: "p.A".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![b, d],
        methods: vec![],
    });

    let mut collected = Vec::new();
    collect_methods(&store, a, &mut collected);
    assert_eq!(collected.len(), 1);
    assert_eq!(store.declaring_type(collected[0].method_ref()), b);
}

#[test]
fn three_declared_methods_without_interfaces() {
    let mut store = TypeStore::new();
    let ret = void(&mut store);
    let ty = store.upsert_type(TypeDef {
        name: "p.Solo".to_string(),
        kind: TypeKind::Class,
        interfaces: vec![],
        methods: vec![
            method("first", &[], ret),
            method("second", &[], ret),
            method("third", &[], ret),
        ],
    });

    let catalog = TypeCatalog::new(&store);
    assert_eq!(
        names(catalog.get_or_add(ty).methods()),
        vec!["first", "second", "third"]
    );
}

fn stub_method(name: &str, params: &[(&str, &str)], returns: &str) -> MethodStub {
    MethodStub {
        name: name.to_string(),
        constructor: false,
        params: params
            .iter()
            .map(|(name, ty)| ParamStub {
                name: name.to_string(),
                ty: ty.to_string(),
            })
            .collect(),
        returns: Some(returns.to_string()),
    }
}

#[test]
fn implementation_of_two_parameterized_interfaces() {
    let stubs: HashMap<String, TypeStub> = [
        TypeStub {
            name: "p.base.IFace1".to_string(),
            kind: TypeKind::Interface,
            interfaces: vec![],
            methods: vec![
                stub_method("doIt", &[("a", "int")], "T"),
                stub_method("doIt1a", &[], "int"),
            ],
        },
        TypeStub {
            name: "p.base.IFace2".to_string(),
            kind: TypeKind::Interface,
            interfaces: vec![],
            methods: vec![
                stub_method("doIt2", &[], "T"),
                stub_method("doIt3", &[("inst", "p.base.IF3")], "U"),
            ],
        },
        TypeStub {
            name: "p.impl.Impl".to_string(),
            kind: TypeKind::Class,
            interfaces: vec![
                "p.base.IFace1<java.lang.Integer>".to_string(),
                "p.base.IFace2<java.lang.Double,java.lang.Boolean>".to_string(),
            ],
            methods: vec![
                MethodStub {
                    name: "<init>".to_string(),
                    constructor: true,
                    params: vec![],
                    returns: None,
                },
                stub_method("getMap", &[], "java.util.Map<java.lang.String,java.lang.Double>"),
            ],
        },
    ]
    .into_iter()
    .map(|stub| (stub.name.clone(), stub))
    .collect();

    let mut store = TypeStore::with_primitives();
    let imp = StubLoader::new(&mut store, &stubs)
        .ensure_type("p.impl.Impl")
        .unwrap();

    let catalog = TypeCatalog::new(&store);
    let descriptor = catalog.get_or_add(imp);
    assert_eq!(
        names(descriptor.methods()),
        vec!["<init>", "getMap", "doIt", "doIt1a", "doIt2", "doIt3"]
    );

    let interfaces = descriptor.interfaces(&catalog);
    let interface_names: Vec<&str> = interfaces.iter().map(|d| d.qualified_name()).collect();
    assert_eq!(
        interface_names,
        vec![
            "p.base.IFace1<java.lang.Integer>",
            "p.base.IFace2<java.lang.Double,java.lang.Boolean>"
        ]
    );
    assert_eq!(interfaces[0].key(), "p.base.IFace1");
    assert_eq!(names(interfaces[1].methods()), vec!["doIt2", "doIt3"]);
}

#[test]
fn implementation_overriding_every_interface_method_keeps_only_its_own() {
    let stubs: HashMap<String, TypeStub> = [
        TypeStub {
            name: "p.PType1".to_string(),
            kind: TypeKind::Interface,
            interfaces: vec![],
            methods: vec![stub_method("doIt", &[("a", "int")], "T")],
        },
        TypeStub {
            name: "p.CType".to_string(),
            kind: TypeKind::Class,
            interfaces: vec!["p.PType1<java.lang.Integer>".to_string()],
            methods: vec![stub_method("doIt", &[("a", "int")], "java.lang.Integer")],
        },
    ]
    .into_iter()
    .map(|stub| (stub.name.clone(), stub))
    .collect();

    let mut store = TypeStore::with_primitives();
    let ty = StubLoader::new(&mut store, &stubs)
        .ensure_type("p.CType")
        .unwrap();

    let catalog = TypeCatalog::new(&store);
    let descriptor = catalog.get_or_add(ty);
    assert_eq!(names(descriptor.methods()), vec!["doIt"]);
    let ret = descriptor.methods()[0].return_type(&catalog).unwrap();
    assert_eq!(ret.display_name(), "Integer");
    assert!(ret.is_built_in());
}
