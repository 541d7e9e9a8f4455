//! Hint files
//!
//! A hint file pre-declares how files should be run, skipping the
//! resolver plugins:
//!
//! ```ini
//! [kinds]
//! tap = tests/*.t
//! exec-test = scripts/*.sh, bin/check
//!
//! [tap]
//! uri = $testpath
//! args = --verbose
//! kwargs = LANG=C
//! ```
//!
//! Every file matched by a kind's globs becomes one successful
//! resolution, with `$testpath` substituted in the templates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    config::{IniDocument, parse_list},
    error::{Error, Result},
    types::{ReferenceResolution, Runnable},
};

/// Origin recorded on resolutions coming from a hint file
pub const HINT_ORIGIN: &str = "hint";

const TESTPATH: &str = "$testpath";

/// Runnable template of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
struct KindTemplate {
    uri: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl KindTemplate {
    fn runnable(&self, kind: &str, testpath: &str) -> Runnable {
        let fill = |template: &str| template.replace(TESTPATH, testpath);
        let mut runnable = Runnable::new(kind, fill(&self.uri))
            .with_args(self.args.iter().map(|arg| fill(arg)));
        for (key, value) in &self.kwargs {
            runnable = runnable.with_kwarg(key.clone(), fill(value));
        }
        runnable
    }
}

#[derive(Debug, Clone)]
pub struct HintParser {
    path: PathBuf,
    kinds: Vec<(String, Vec<String>, KindTemplate)>,
}

impl HintParser {
    /// Parse and validate the hint file at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::HintError(format!("could not read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents, path)
    }

    /// Parse a hint document; `origin` is used in messages
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let document = IniDocument::parse(contents, origin)
            .map_err(|e| Error::HintError(e.to_string()))?;

        if !document.has_section("kinds") {
            return Err(Error::HintError(format!(
                "{}: missing [kinds] section",
                origin.display()
            )));
        }

        let mut kinds = Vec::new();
        for (kind, patterns) in document.items("kinds") {
            if !document.has_section(kind) {
                return Err(Error::HintError(format!(
                    "{}: missing section for kind \"{}\"",
                    origin.display(),
                    kind
                )));
            }

            let kwargs = parse_list(document.get(kind, "kwargs").unwrap_or_default())
                .into_iter()
                .map(|pair| match pair.split_once('=') {
                    Some((key, value)) => Ok((key.trim().to_string(), value.trim().to_string())),
                    None => Err(Error::HintError(format!(
                        "{}: kwargs of kind \"{}\" must be key=value pairs, got \"{}\"",
                        origin.display(),
                        kind,
                        pair
                    ))),
                })
                .collect::<Result<BTreeMap<_, _>>>()?;

            let template = KindTemplate {
                uri: document.get(kind, "uri").unwrap_or(TESTPATH).to_string(),
                args: parse_list(document.get(kind, "args").unwrap_or_default()),
                kwargs,
            };
            kinds.push((kind.to_string(), parse_list(patterns), template));
        }

        Ok(Self {
            path: origin.to_path_buf(),
            kinds,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One successful resolution per file matched by the kinds' globs
    pub fn get_resolutions(&self) -> Vec<ReferenceResolution> {
        let mut resolutions = Vec::new();
        for (kind, patterns, template) in &self.kinds {
            for pattern in patterns {
                let matches = match glob::glob(pattern) {
                    Ok(matches) => matches,
                    Err(e) => {
                        warn!("Invalid pattern \"{}\" in hint file {:?}: {}", pattern, self.path, e);
                        continue;
                    }
                };
                for testpath in matches.filter_map(|entry| entry.ok()) {
                    let testpath = testpath.to_string_lossy().into_owned();
                    debug!("Hint matched {} as {}", testpath, kind);
                    let runnable = template.runnable(kind, &testpath);
                    resolutions.push(
                        ReferenceResolution::success(testpath, vec![runnable])
                            .with_origin(HINT_ORIGIN),
                    );
                }
            }
        }
        resolutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolutions_from_globs() {
        let temp = TempDir::new().unwrap();
        for name in ["b.t", "a.t", "other.sh"] {
            fs::write(temp.path().join(name), "").unwrap();
        }
        let root = temp.path().display();
        let contents = format!(
            "[kinds]\ntap = {root}/*.t\n\n[tap]\nuri = $testpath\nargs = -v, $testpath\nkwargs = MODE=hint, FILE=$testpath\n"
        );

        let hint = HintParser::parse(&contents, Path::new(".quarry.hint")).unwrap();
        let resolutions = hint.get_resolutions();
        assert_eq!(resolutions.len(), 2);

        let first = &resolutions[0];
        let expected_path = temp.path().join("a.t").to_string_lossy().into_owned();
        assert_eq!(first.reference(), expected_path);
        assert_eq!(first.origin(), HINT_ORIGIN);
        assert!(first.is_success());

        let runnable = &first.resolutions()[0];
        assert_eq!(runnable.kind(), "tap");
        assert_eq!(runnable.uri(), Some(expected_path.as_str()));
        assert_eq!(runnable.args(), &["-v".to_string(), expected_path.clone()]);
        assert_eq!(runnable.kwargs()["FILE"], expected_path);
        assert_eq!(runnable.kwargs()["MODE"], "hint");
    }

    #[test]
    fn test_missing_kinds_section() {
        let err = HintParser::parse("[tap]\nuri = x\n", Path::new("h")).unwrap_err();
        assert!(matches!(err, Error::HintError(ref msg) if msg.contains("[kinds]")));
    }

    #[test]
    fn test_missing_kind_section() {
        let err = HintParser::parse("[kinds]\ntap = *.t\n", Path::new("h")).unwrap_err();
        assert!(matches!(err, Error::HintError(ref msg) if msg.contains("\"tap\"")));
    }

    #[test]
    fn test_unreadable_file() {
        let err = HintParser::from_file(Path::new("/does/not/exist.hint")).unwrap_err();
        assert!(matches!(err, Error::HintError(_)));
    }
}
