use std::path::PathBuf;

use tempfile::TempDir;

use crate::compiler::{ClasspathEntry, FileState, SYNTHETIC_CONTEXT};
use crate::config::{NavConfig, RuntimeDescriptor};
use crate::tests::helpers::{service_in, write_source};

#[test]
fn gradle_layout_yields_main_and_test_contexts() {
    let tmp = TempDir::new().unwrap();
    let main_uri = write_source(
        tmp.path(),
        "src/main/groovy/App.groovy",
        "class App {}\n",
    );
    let test_uri = write_source(
        tmp.path(),
        "src/test/groovy/AppTest.groovy",
        "class AppTest {}\n",
    );

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();
    let compiler = service.compiler();

    let test_ctx = compiler.context("test").unwrap();
    assert_eq!(test_ctx.depends_on, ["main"]);
    assert_eq!(compiler.context_members("main"), [main_uri.clone()]);
    assert_eq!(compiler.context_members("test"), [test_uri.clone()]);

    // Test code sees its own files plus, transitively, main's.
    let reachable = compiler.reachable_members("test");
    assert!(reachable.contains(&main_uri));
    assert!(reachable.contains(&test_uri));
    assert!(!compiler.reachable_members("main").contains(&test_uri));

    assert_eq!(
        compiler.state(&main_uri),
        Some(FileState::Compiled { with_errors: false })
    );
}

#[test]
fn flat_layout_falls_back_to_the_synthetic_context() {
    let tmp = TempDir::new().unwrap();
    let uri = write_source(tmp.path(), "build.groovy", "class Build {}\n");

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();

    assert_eq!(
        service.get_context_for_file(&uri).as_deref(),
        Some(SYNTHETIC_CONTEXT)
    );
    assert!(service.compiler().unit(&uri).is_some());
}

#[test]
fn context_lookup_uses_the_longest_source_prefix() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main/groovy/A.groovy", "class A {}\n");
    let test_uri = write_source(
        tmp.path(),
        "src/test/groovy/ATest.groovy",
        "class ATest {}\n",
    );

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();

    assert_eq!(service.get_context_for_file(&test_uri).as_deref(), Some("test"));
    assert_eq!(
        service.get_context_for_file("/elsewhere/B.groovy"),
        None
    );
}

#[test]
fn update_with_identical_content_republishes_an_equivalent_unit() {
    let tmp = TempDir::new().unwrap();
    let content = "class Stable {\n    int field;\n    void touch() {}\n}\n";
    let uri = write_source(tmp.path(), "src/main/groovy/Stable.groovy", content);

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();

    let before = service.compiler().unit(&uri).unwrap();
    service.update_file(&uri, content).unwrap();
    let after = service.compiler().unit(&uri).unwrap();

    assert_eq!(before.tree.len(), after.tree.len());
    assert_eq!(before.graph.nodes().len(), after.graph.nodes().len());
    let names = |unit: &crate::compiler::CompiledUnit| {
        let mut v: Vec<_> = unit.symbols.all().map(|d| d.name.clone()).collect();
        v.sort();
        v
    };
    assert_eq!(names(&before), names(&after));
}

#[test]
fn updating_an_unseen_file_creates_the_synthetic_context() {
    let tmp = TempDir::new().unwrap();
    let service = service_in(&tmp, NavConfig::default());

    let uri = tmp.path().join("Ad.groovy").to_string_lossy().into_owned();
    service.update_file(&uri, "class Ad {}\n").unwrap();

    assert_eq!(
        service.get_context_for_file(&uri).as_deref(),
        Some(SYNTHETIC_CONTEXT)
    );
    let unit = service.compiler().unit(&uri).unwrap();
    assert!(!unit.symbols.find("Ad").is_empty());
}

#[test]
fn small_context_edits_recompile_the_whole_context() {
    let tmp = TempDir::new().unwrap();
    let a_uri = write_source(tmp.path(), "src/main/groovy/A.groovy", "class A {}\n");
    let b_uri = write_source(tmp.path(), "src/main/groovy/B.groovy", "class B {}\n");

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();

    service.update_file(&a_uri, "class A { int v; }\n").unwrap();

    // Below the threshold the sibling was recompiled too, so nothing in the
    // context is left stale.
    assert_eq!(
        service.compiler().state(&b_uri),
        Some(FileState::Compiled { with_errors: false })
    );
    let a = service.compiler().unit(&a_uri).unwrap();
    assert!(!a.symbols.find("v").is_empty());
}

#[test]
fn large_context_edits_only_touch_the_changed_file() {
    let tmp = TempDir::new().unwrap();
    let mut uris = Vec::new();
    for i in 0..4 {
        uris.push(write_source(
            tmp.path(),
            &format!("src/main/groovy/C{i}.groovy"),
            &format!("class C{i} {{}}\n"),
        ));
    }

    let config = NavConfig {
        full_recompile_threshold: 2,
        ..NavConfig::default()
    };
    let service = service_in(&tmp, config);
    service.initialize_workspace(tmp.path()).unwrap();

    let before = service.compiler().unit(&uris[1]).unwrap();
    service
        .update_file(&uris[0], "class C0 { int v; }\n")
        .unwrap();

    // The sibling unit was not republished.
    let after = service.compiler().unit(&uris[1]).unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    let c0 = service.compiler().unit(&uris[0]).unwrap();
    assert!(!c0.symbols.find("v").is_empty());
}

#[test]
fn incremental_edits_mark_siblings_stale_for_the_next_pass() {
    let tmp = TempDir::new().unwrap();
    let mut uris = Vec::new();
    for i in 0..4 {
        uris.push(write_source(
            tmp.path(),
            &format!("src/main/groovy/D{i}.groovy"),
            &format!("class D{i} {{}}\n"),
        ));
    }

    let config = NavConfig {
        full_recompile_threshold: 2,
        ..NavConfig::default()
    };
    let service = service_in(&tmp, config);
    service.initialize_workspace(tmp.path()).unwrap();

    let sibling_before = service.compiler().unit(&uris[1]).unwrap();
    service
        .update_file(&uris[0], "class D0 { int v; }\n")
        .unwrap();

    // The sibling keeps its published unit but is now marked for the next
    // recompilation pass that reaches it.
    assert_eq!(service.compiler().state(&uris[1]), Some(FileState::Stale));
    let sibling_mid = service.compiler().unit(&uris[1]).unwrap();
    assert!(std::sync::Arc::ptr_eq(&sibling_before, &sibling_mid));

    service
        .update_file(&uris[0], "class D0 { int v; int w; }\n")
        .unwrap();
    assert_eq!(
        service.compiler().state(&uris[1]),
        Some(FileState::Compiled { with_errors: false })
    );
    let sibling_after = service.compiler().unit(&uris[1]).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&sibling_before, &sibling_after));
}

#[test]
fn broken_files_surface_diagnostics_without_blocking_neighbors() {
    let tmp = TempDir::new().unwrap();
    let good_uri = write_source(tmp.path(), "src/main/groovy/Good.groovy", "class Good {}\n");
    let bad_uri = write_source(
        tmp.path(),
        "src/main/groovy/Bad.groovy",
        "class Bad {{{ wha\n",
    );

    let service = service_in(&tmp, NavConfig::default());
    service.initialize_workspace(tmp.path()).unwrap();

    assert!(!service.diagnostics(&bad_uri).is_empty());
    assert_eq!(
        service.compiler().state(&bad_uri),
        Some(FileState::Compiled { with_errors: true })
    );
    assert_eq!(
        service.compiler().state(&good_uri),
        Some(FileState::Compiled { with_errors: false })
    );
    assert!(service.diagnostics(&good_uri).is_empty());
}

#[test]
fn lib_jars_precede_extra_entries_and_the_runtime_comes_last() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "lib/zeta.jar", "");
    write_source(tmp.path(), "lib/alpha.jar", "");
    write_source(tmp.path(), "Job.groovy", "class Job {}\n");

    let config = NavConfig {
        extra_classpath: vec![PathBuf::from("/opt/classes")],
        runtime: Some(RuntimeDescriptor {
            image: PathBuf::from("/opt/jdk/lib/modules"),
            sources: None,
            packages: vec!["java.".to_string()],
        }),
        ..NavConfig::default()
    };
    let service = service_in(&tmp, config);
    service.initialize_workspace(tmp.path()).unwrap();

    let entries = service.compiler().effective_classpath(SYNTHETIC_CONTEXT);
    let shape: Vec<String> = entries
        .iter()
        .map(|e| match e {
            ClasspathEntry::Jar(p) => format!("jar:{}", p.file_name().unwrap().to_string_lossy()),
            ClasspathEntry::Dir(p) => format!("dir:{}", p.display()),
            ClasspathEntry::Runtime(_) => "runtime".to_string(),
        })
        .collect();
    assert_eq!(
        shape,
        ["jar:alpha.jar", "jar:zeta.jar", "dir:/opt/classes", "runtime"]
    );
}
