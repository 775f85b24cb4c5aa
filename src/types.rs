//! Public and internal types for the artixform API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a component (project output or external module) in the dependency graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uniquely identifies one artifact within one component. Used as the result cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId {
    pub component: ComponentId,
    pub name: String,
    pub extension: String,
    pub classifier: Option<String>,
}

impl ArtifactId {
    pub fn new(component: ComponentId, name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            component,
            name: name.into(),
            extension: extension.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Identity for a file that belongs to `component`, split into name and extension.
    ///
    /// Produced (transformed) files are identified this way: the component stays the
    /// same, the coordinates come from the output file name.
    pub fn for_file(component: ComponentId, file: &Path) -> Self {
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(component, name, extension)
    }

    /// File name these coordinates describe (`name[-classifier][.extension]`).
    pub fn file_name(&self) -> String {
        let mut out = self.name.clone();
        if let Some(c) = &self.classifier {
            out.push('-');
            out.push_str(c);
        }
        if !self.extension.is_empty() {
            out.push('.');
            out.push_str(&self.extension);
        }
        out
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name(), self.component)
    }
}

/// Attribute set an artifact variant is published or produced as (e.g. `artifactType=classes`).
///
/// Ordered so display and serialization are stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Parse `key=value`. Used for CLI `--attr` flags and settings.
    pub fn parse_pair(s: &str) -> Option<(String, String)> {
        let (k, v) = s.split_once('=')?;
        let k = k.trim();
        if k.is_empty() {
            return None;
        }
        Some((k.to_string(), v.trim().to_string()))
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where an artifact comes from. Local artifacts are built inside this build; external ones were resolved from a repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactOrigin {
    Local,
    External,
}

/// A single resolved file belonging to a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub id: ArtifactId,
    pub file: PathBuf,
    pub attributes: Attributes,
    pub origin: ArtifactOrigin,
}

impl ResolvedArtifact {
    pub fn new(id: ArtifactId, file: impl Into<PathBuf>, attributes: Attributes) -> Self {
        Self {
            id,
            file: file.into(),
            attributes,
            origin: ArtifactOrigin::External,
        }
    }

    pub fn local(mut self) -> Self {
        self.origin = ArtifactOrigin::Local;
        self
    }

    pub fn is_local(&self) -> bool {
        self.origin == ArtifactOrigin::Local
    }
}

/// Names the set being visited. Reported to listeners before a visit and to visitors at end of collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VisitSource {
    pub display_name: String,
}

impl VisitSource {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for VisitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Listener's answer to "do you want the contents of this set?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitType {
    /// Visit every artifact.
    Visit,
    /// Only build-dependency information is wanted; skip contents (and all transform work).
    NoContents,
}

/// Work queue options.
#[derive(Clone, Debug)]
pub struct QueueOpts {
    /// Maximum number of operations running at once. Clamped to at least 1.
    pub max_workers: usize,
}

impl Default for QueueOpts {
    fn default() -> Self {
        Self {
            max_workers: crate::utils::config::WorkerThreadLimits::current().effective(None),
        }
    }
}

/// Full options (CLI). Built from defaults, `.artixform.toml`, environment, then flags.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// Override worker count. When None, derived from rayon's pool size and the FD limit.
    pub num_workers: Option<usize>,
    /// Directory transform steps write into. When None, `<package>-out` under the input dir.
    pub out_dir: Option<PathBuf>,
    /// Transform steps, in chain order (`copy`, `digest`, `filter:<glob>`, `with-deps`).
    pub steps: Vec<String>,
    /// Target attributes attached to every produced file.
    pub target_attributes: Attributes,
    /// Exclude patterns (glob syntax) applied during artifact discovery.
    pub exclude: Vec<String>,
    /// Show progress bar and debug logging.
    pub verbose: bool,
    /// Write module metadata for the transformed outputs to this file.
    pub metadata_path: Option<PathBuf>,
}
