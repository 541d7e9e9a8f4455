//! Python `unittest` test finder
//!
//! Python sources are scanned line by line, never imported. A class is a
//! test class when one of its bases mentions `TestCase` or is a test
//! class defined earlier in the same file. Docstrings may carry
//! directives:
//!
//! ```text
//! :avocado: tags=fast,arch:x86_64
//! :avocado: disable
//! :avocado: enable
//! ```

use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use regex::Regex;

use crate::{
    error::PluginResult,
    interfaces::{Plugin, Resolver},
    resolver::{Access, check_file, reference_split},
    tags::parse_tag_list,
    types::{ReferenceResolution, Runnable, Tags},
};

pub const PYTHON_UNITTEST_KIND: &str = "python-unittest";

/// A test method and the tags from its and its class's docstrings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethod {
    pub name: String,
    pub tags: Tags,
}

/// A test class in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestClass {
    pub name: String,
    pub methods: Vec<TestMethod>,
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^class\s+([A-Za-z_]\w*)\s*(?:\(([^)]*)\))?\s*:").expect("valid class regex")
    })
}

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s+(?:async\s+)?def\s+(test\w*)\s*\(").expect("valid method regex")
    })
}

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*:avocado:[ \t]+([A-Za-z0-9][A-Za-z0-9_:,=\-.]*)\s*$")
            .expect("valid directive regex")
    })
}

/// Directives found in a docstring, in order
pub fn docstring_directives(docstring: &str) -> Vec<String> {
    docstring
        .lines()
        .filter_map(|line| directive_re().captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Tags declared by `tags=` directives
pub fn docstring_tags(directives: &[String]) -> Tags {
    let mut tags = Tags::new();
    for directive in directives {
        if let Some(list) = directive.strip_prefix("tags=") {
            for (key, values) in parse_tag_list(list) {
                let slot = tags.entry(key).or_insert(None);
                if let Some(values) = values {
                    slot.get_or_insert_with(Default::default).extend(values);
                }
            }
        }
    }
    tags
}

fn merge_tags(into: &mut Tags, from: &Tags) {
    for (key, values) in from {
        let slot = into.entry(key.clone()).or_insert(None);
        if let Some(values) = values {
            slot.get_or_insert_with(Default::default)
                .extend(values.iter().cloned());
        }
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Docstring starting at `lines[start]`, if that line opens one.
///
/// Returns the docstring text and the index of its last line.
fn docstring_at(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let first = lines.get(start)?.trim_start();
    let first = first
        .strip_prefix('r')
        .or_else(|| first.strip_prefix('R'))
        .unwrap_or(first);
    let quote = ["\"\"\"", "'''"]
        .into_iter()
        .find(|quote| first.starts_with(quote))?;

    let rest = &first[quote.len()..];
    if let Some(end) = rest.find(quote) {
        return Some((rest[..end].to_string(), start));
    }

    let mut text = vec![rest.to_string()];
    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        if let Some(end) = line.find(quote) {
            text.push(line[..end].to_string());
            return Some((text.join("\n"), index));
        }
        text.push(line.to_string());
    }
    Some((text.join("\n"), lines.len().saturating_sub(1)))
}

/// Index of the first non-blank line after the header that ends at `from`
fn body_start(lines: &[&str], from: usize) -> usize {
    let mut index = from + 1;
    while index < lines.len() && lines[index].trim().is_empty() {
        index += 1;
    }
    index
}

/// Find the `unittest` test classes and methods of a Python source
pub fn find_python_unittests(source: &str) -> Vec<TestClass> {
    let lines: Vec<&str> = source.lines().collect();
    let mut classes: Vec<TestClass> = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let Some(caps) = class_re().captures(lines[index]) else {
            index += 1;
            continue;
        };
        let name = caps[1].to_string();
        let bases: Vec<&str> = caps
            .get(2)
            .map(|m| m.as_str().split(',').map(str::trim).collect())
            .unwrap_or_default();

        let mut directives = Vec::new();
        let mut cursor = body_start(&lines, index);
        if let Some((docstring, end)) = docstring_at(&lines, cursor) {
            directives = docstring_directives(&docstring);
            cursor = end + 1;
        }

        let parent = bases.iter().find_map(|base| {
            classes
                .iter()
                .find(|class| class.name == *base || base.ends_with(&format!(".{}", class.name)))
        });
        let is_test = if directives.iter().any(|d| d == "disable") {
            false
        } else {
            directives.iter().any(|d| d == "enable" || d == "recursive")
                || parent.is_some()
                || bases.iter().any(|base| base.contains("TestCase"))
        };
        let class_tags = docstring_tags(&directives);

        // Collect the class body
        let mut methods: Vec<TestMethod> = Vec::new();
        while cursor < lines.len() {
            let line = lines[cursor];
            if !line.trim().is_empty() && indentation(line) == 0 && !line.trim_start().starts_with('#') {
                break;
            }
            if let Some(caps) = method_re().captures(line) {
                let method = caps[1].to_string();
                let mut tags = Tags::new();
                let header_end = (cursor..lines.len())
                    .find(|&i| lines[i].trim_end().ends_with(':'))
                    .unwrap_or(cursor);
                if let Some((docstring, end)) = docstring_at(&lines, body_start(&lines, header_end)) {
                    tags = docstring_tags(&docstring_directives(&docstring));
                    cursor = end;
                }
                merge_tags(&mut tags, &class_tags);
                methods.retain(|m| m.name != method);
                methods.push(TestMethod { name: method, tags });
            }
            cursor += 1;
        }

        if is_test {
            let mut all_methods: Vec<TestMethod> = parent
                .map(|class| {
                    class
                        .methods
                        .iter()
                        .filter(|inherited| methods.iter().all(|own| own.name != inherited.name))
                        .cloned()
                        .map(|mut inherited| {
                            merge_tags(&mut inherited.tags, &class_tags);
                            inherited
                        })
                        .collect()
                })
                .unwrap_or_default();
            all_methods.extend(methods);
            classes.push(TestClass {
                name,
                methods: all_methods,
            });
        }
        index = cursor;
    }

    classes.retain(|class| !class.methods.is_empty());
    classes
}

/// Resolves `file.py` and `file.py:Class.method_regex` references
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonUnittestResolver;

impl Plugin for PythonUnittestResolver {
    fn name(&self) -> &str {
        "python-unittest"
    }

    fn description(&self) -> &str {
        "Test resolver for Python Unittests"
    }
}

impl Resolver for PythonUnittestResolver {
    fn resolve(&self, reference: &str) -> PluginResult<ReferenceResolution> {
        let (module_path, selector) = reference_split(reference);
        let selector = selector
            .map(|selector| {
                Regex::new(selector).with_context(|| format!("invalid test selector \"{selector}\""))
            })
            .transpose()?;

        let path = Path::new(module_path);
        if let Err(not_found) = check_file(path, reference, Some(".py"), Access::Readable) {
            return Ok(not_found);
        }

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {module_path}"))?;

        let mut runnables = Vec::new();
        for class in find_python_unittests(&source) {
            for method in class.methods {
                let class_method = format!("{}.{}", class.name, method.name);
                if selector.as_ref().is_some_and(|re| !re.is_match(&class_method)) {
                    continue;
                }
                runnables.push(
                    Runnable::new(PYTHON_UNITTEST_KIND, format!("{module_path}:{class_method}"))
                        .with_tags(method.tags),
                );
            }
        }

        Ok(ReferenceResolution::success(reference, runnables))
    }
}
