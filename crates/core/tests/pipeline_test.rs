//! Integration tests for reference resolution and suite filtering

use quarry_core::{
    Config, Error, Orchestrator, PluginRegistry, ReferenceResolution, ReferenceResolutionResult,
    Resolver, Runnable,
    error::PluginResult,
    interfaces::{Discoverer, Plugin},
    orchestrator,
    plugins,
    resolver::{HintParser, extend_directory},
};
use anyhow::anyhow;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Resolver answering the same way for every reference
struct Scripted {
    name: &'static str,
    answer: Answer,
}

#[derive(Clone, Copy)]
enum Answer {
    NotFound,
    Exec,
    Boom,
    ExistingFilesOnly,
}

impl Plugin for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "scripted resolver"
    }
}

impl Resolver for Scripted {
    fn resolve(&self, reference: &str) -> PluginResult<ReferenceResolution> {
        match self.answer {
            Answer::NotFound => Ok(ReferenceResolution::not_found(reference)),
            Answer::Exec => Ok(ReferenceResolution::success(
                reference,
                vec![Runnable::new("exec-test", reference)],
            )),
            Answer::Boom => Err(anyhow!("RuntimeError: boom").into()),
            Answer::ExistingFilesOnly if Path::new(reference).is_file() => Ok(
                ReferenceResolution::success(reference, vec![Runnable::new("exec-test", reference)]),
            ),
            Answer::ExistingFilesOnly => Ok(ReferenceResolution::not_found(reference)),
        }
    }
}

fn registry(resolvers: &[(&'static str, Answer)]) -> PluginRegistry<dyn Resolver> {
    let mut registry = PluginRegistry::new("resolver");
    for &(name, answer) in resolvers {
        registry.register(name, move |_| {
            Ok(Box::new(Scripted { name, answer }) as Box<dyn Resolver>)
        });
    }
    registry
}

fn orchestrator(resolvers: &[(&'static str, Answer)]) -> Orchestrator {
    Orchestrator::new(registry(resolvers), PluginRegistry::<dyn Discoverer>::new("discoverer"))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_single_python_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("t.py");
    fs::write(
        &path,
        "import unittest\n\n\nclass C(unittest.TestCase):\n\n    def m(self):\n        pass\n\n    def test_m(self):\n        \"\"\":avocado: tags=fast\"\"\"\n        pass\n",
    )
    .unwrap();
    let reference = path_string(&path);

    let resolutions = Orchestrator::builtin()
        .resolve(&[reference.clone()], None, false, &Config::default())
        .unwrap();

    // exec-test rejects the non executable file, python-unittest accepts it
    let success = resolutions.last().unwrap();
    assert_eq!(success.result(), ReferenceResolutionResult::Success);
    assert_eq!(success.origin(), "python-unittest");
    assert_eq!(
        success.resolutions(),
        &[Runnable::new("python-unittest", format!("{reference}:C.test_m")).with_flat_tag("fast")]
    );
    assert!(resolutions[..resolutions.len() - 1]
        .iter()
        .all(|r| r.result() == ReferenceResolutionResult::NotFound));
}

#[test]
fn test_directory_expansion_order() {
    let temp = TempDir::new().unwrap();
    for name in ["b.py", "a.py", ".hidden.py"] {
        fs::write(temp.path().join(name), "").unwrap();
    }
    let expanded = extend_directory(&path_string(temp.path()));
    assert_eq!(
        expanded,
        vec![path_string(&temp.path().join("a.py")), path_string(&temp.path().join("b.py"))]
    );

    let resolutions = orchestrator(&[("a", Answer::NotFound)])
        .resolve(&[path_string(temp.path())], None, false, &Config::default())
        .unwrap();
    let references: Vec<&str> = resolutions.iter().map(|r| r.reference()).collect();
    assert_eq!(references, expanded);
}

#[test]
fn test_resolver_fall_through() {
    let resolutions = orchestrator(&[("a", Answer::NotFound), ("b", Answer::Exec)])
        .resolve(&["/usr/bin/true".to_string()], None, true, &Config::default())
        .unwrap();

    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0].result(), ReferenceResolutionResult::NotFound);
    assert_eq!(resolutions[0].origin(), "a");
    assert_eq!(resolutions[1].result(), ReferenceResolutionResult::Success);
    assert_eq!(resolutions[1].resolutions()[0].kind(), "exec-test");
}

#[test]
fn test_plugin_exception_isolation() {
    let resolutions = orchestrator(&[("A", Answer::Boom), ("B", Answer::Exec)])
        .resolve(&["/usr/bin/true".to_string()], None, false, &Config::default())
        .unwrap();

    assert_eq!(resolutions[0].result(), ReferenceResolutionResult::Error);
    assert_eq!(resolutions[0].origin(), "A");
    assert!(resolutions[0].info().unwrap().contains("boom"));
    assert_eq!(resolutions[1].result(), ReferenceResolutionResult::Success);
}

#[test]
fn test_configured_order_and_disable() {
    let config = Config::default()
        .with("plugins.resolver.order", quarry_core::config::SettingValue::list(["b", "a"]));
    let resolutions = orchestrator(&[("a", Answer::Exec), ("b", Answer::NotFound)])
        .resolve(&["x".to_string()], None, true, &config)
        .unwrap();
    let origins: Vec<&str> = resolutions.iter().map(|r| r.origin()).collect();
    assert_eq!(origins, vec!["b", "a"]);

    let config = Config::default()
        .with("plugins.disable", quarry_core::config::SettingValue::list(["resolver.a"]));
    let resolutions = orchestrator(&[("a", Answer::Exec), ("b", Answer::NotFound)])
        .resolve(&["x".to_string()], None, true, &config)
        .unwrap();
    let origins: Vec<&str> = resolutions.iter().map(|r| r.origin()).collect();
    assert_eq!(origins, vec!["b"]);
}

#[test]
fn test_tag_filter_key_val() {
    let r1 = Runnable::new("exec-test", "r1")
        .with_tag_value("arch", "x86_64")
        .with_flat_tag("safe");
    let r2 = Runnable::new("exec-test", "r2")
        .with_tag_value("arch", "aarch64")
        .with_flat_tag("safe");
    let r3 = Runnable::new("exec-test", "r3");
    let resolutions = vec![ReferenceResolution::success(
        "ref",
        vec![r1.clone(), r2.clone(), r3.clone()],
    )];

    let filtered = quarry_core::tags::filter_by_tags(&resolutions, &["safe,arch:x86_64"], false, false);
    assert_eq!(filtered, vec![r1.clone()]);

    let filtered = quarry_core::tags::filter_by_tags(&resolutions, &["safe,arch:-x86_64"], false, false);
    assert_eq!(filtered, vec![r2.clone()]);

    let no_expressions: [&str; 0] = [];
    let filtered = quarry_core::tags::filter_by_tags(&resolutions, &no_expressions, true, false);
    assert_eq!(filtered, vec![r1, r2, r3]);
}

#[test]
fn test_strict_missing_reference() {
    let temp = TempDir::new().unwrap();
    let exists = temp.path().join("exists.py");
    fs::write(&exists, "").unwrap();
    let absent = path_string(&temp.path().join("absent.py"));

    let err = orchestrator(&[("files", Answer::ExistingFilesOnly)])
        .resolve(&[path_string(&exists), absent.clone()], None, false, &Config::default())
        .unwrap_err();

    match err {
        Error::MissingReferences(missing) => assert_eq!(missing, vec![absent.clone()]),
        other => panic!("unexpected error: {other}"),
    }

    // Lenient mode keeps the NOTFOUND resolution instead
    let resolutions = orchestrator(&[("files", Answer::ExistingFilesOnly)])
        .resolve(&[path_string(&exists), absent], None, true, &Config::default())
        .unwrap();
    assert_eq!(resolutions.len(), 2);
}

#[test]
fn test_hint_file_supplies_references() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("one.t"), "").unwrap();
    let hint_path = temp.path().join(".quarry.hint");
    fs::write(
        &hint_path,
        format!(
            "[kinds]\ntap = {}/*.t\n\n[tap]\nuri = $testpath\n",
            temp.path().display()
        ),
    )
    .unwrap();
    let hint = HintParser::from_file(&hint_path).unwrap();

    let resolutions = orchestrator(&[("a", Answer::NotFound)])
        .resolve(&[], Some(&hint), false, &Config::default())
        .unwrap();

    assert_eq!(resolutions.len(), 1);
    assert_eq!(resolutions[0].origin(), "hint");
    assert_eq!(resolutions[0].resolutions()[0].kind(), "tap");
}

#[test]
fn test_discovery_without_references() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("test_x.py"),
        "import unittest\nclass X(unittest.TestCase):\n    def test_a(self):\n        pass\n",
    )
    .unwrap();
    let config = Config::default().with("discoverer.test_dir", path_string(temp.path()));

    let resolutions = Orchestrator::builtin()
        .resolve(&[], None, false, &config)
        .unwrap();
    let runnables = orchestrator::resolutions_to_runnables(&resolutions);

    assert_eq!(runnables.len(), 1);
    assert_eq!(runnables[0].kind(), "python-unittest");
    assert!(resolutions.iter().all(|r| r.reference().is_empty()));
    assert_eq!(resolutions[0].origin(), "python-unittest-discoverer");
    assert_eq!(plugins::discoverers().entries().len(), 3);
}
