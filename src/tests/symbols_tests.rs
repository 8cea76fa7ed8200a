use crate::graph::{IndexingVisitor, RecursiveDescentVisitor};
use crate::symbols::{Declaration, DeclarationKind, SymbolTable};
use crate::syntax::NodeId;
use crate::tests::helpers::parse;

fn decl(name: &str, kind: DeclarationKind, node: u32) -> Declaration {
    Declaration {
        name: name.to_string(),
        kind,
        uri: "/ws/A.groovy".to_string(),
        node: NodeId(node),
        range: None,
        qualified: None,
    }
}

#[test]
fn duplicate_names_accumulate_in_insertion_order() {
    let mut table = SymbolTable::new();
    table.add_declaration(decl("value", DeclarationKind::Field, 1));
    table.add_declaration(decl("value", DeclarationKind::Variable, 2));
    table.add_declaration(decl("other", DeclarationKind::Variable, 3));

    let hits = table.find("value");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].node, NodeId(1));
    assert_eq!(hits[1].node, NodeId(2));
    assert_eq!(table.len(), 3);
    assert!(table.find("missing").is_empty());
}

#[test]
fn prefix_matching() {
    let mut table = SymbolTable::new();
    table.add_declaration(decl("getName", DeclarationKind::Method, 1));
    table.add_declaration(decl("getAge", DeclarationKind::Method, 2));
    table.add_declaration(decl("setName", DeclarationKind::Method, 3));

    let mut names: Vec<_> = table.matching("get").map(|d| d.name.clone()).collect();
    names.sort();
    assert_eq!(names, ["getAge", "getName"]);
    assert_eq!(table.matching("").count(), 3);
}

#[test]
fn indexing_registers_class_method_field_and_variable() {
    let uri = "/ws/Account.groovy";
    let unit = parse(
        uri,
        "class Account {\n\
             int balance;\n\
             void deposit(int amount) {\n\
                 int next = balance + amount;\n\
             }\n\
         }\n",
    );
    let (_, symbols) = RecursiveDescentVisitor.index(&unit, uri);

    let kind_of = |name: &str| symbols.find(name).first().map(|d| d.kind);
    assert_eq!(kind_of("Account"), Some(DeclarationKind::Class));
    assert_eq!(kind_of("deposit"), Some(DeclarationKind::Method));
    assert_eq!(kind_of("balance"), Some(DeclarationKind::Field));
    assert_eq!(kind_of("next"), Some(DeclarationKind::Variable));
}

#[test]
fn multi_target_declarations_are_not_registered() {
    let uri = "/ws/Multi.groovy";
    let unit = parse(
        uri,
        "class Multi {\n\
             void fill() {\n\
                 int a = 1, b = 2;\n\
                 int alone = 3;\n\
             }\n\
         }\n",
    );
    let (_, symbols) = RecursiveDescentVisitor.index(&unit, uri);

    assert!(symbols.find("a").is_empty());
    assert!(symbols.find("b").is_empty());
    assert_eq!(
        symbols.find("alone").first().map(|d| d.kind),
        Some(DeclarationKind::Variable)
    );
}

#[test]
fn imports_declare_their_last_segment_with_the_qualified_target() {
    let uri = "/ws/Imports.groovy";
    let unit = parse(
        uri,
        "import java.util.List;\n\
         import java.util.concurrent.*;\n\
         class Imports {}\n",
    );
    let (_, symbols) = RecursiveDescentVisitor.index(&unit, uri);

    let list = symbols.find("List").first().cloned().unwrap();
    assert_eq!(list.kind, DeclarationKind::Import);
    assert_eq!(list.qualified.as_deref(), Some("java.util.List"));

    // Wildcard imports declare no name at all.
    let imports: Vec<_> = symbols
        .all()
        .filter(|d| d.kind == DeclarationKind::Import)
        .collect();
    assert_eq!(imports.len(), 1);
}

#[test]
fn script_files_declare_a_wrapper_class_named_after_the_file() {
    let uri = "/ws/deploy.groovy";
    let unit = parse(uri, "int steps = 4;\n");
    let (graph, symbols) = RecursiveDescentVisitor.index(&unit, uri);

    let wrapper = symbols.find("deploy").first().cloned().unwrap();
    assert_eq!(wrapper.kind, DeclarationKind::Class);
    // The wrapper is synthetic: it has no source range and is registered in
    // the class list without being position-indexed.
    assert!(wrapper.range.is_none());
    assert_eq!(graph.classes(), &[unit.tree.root()][..]);
    assert!(!graph.nodes().contains(&unit.tree.root()));
}

#[test]
fn nested_classes_appear_in_the_class_list() {
    let uri = "/ws/Outer.groovy";
    let unit = parse(
        uri,
        "class Outer {\n\
             class Inner {}\n\
         }\n",
    );
    let (graph, symbols) = RecursiveDescentVisitor.index(&unit, uri);

    assert_eq!(graph.classes().len(), 2);
    assert!(!symbols.find("Outer").is_empty());
    assert!(!symbols.find("Inner").is_empty());
}
