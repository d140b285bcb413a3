//! Artifact family matching.
//!
//! A stage's output is addressed by a path *prefix*; the files it actually
//! writes carry further extensions (`.bam`, `.R1.fq.gz`, ...). The matcher
//! decides which directory entries sharing that prefix belong to the family.

use regex::Regex;
use std::io;
use std::path::Path;
use tracing::debug;

/// Rule deciding which entries next to an output prefix count as its artifacts.
#[derive(Debug, Clone, Default)]
pub enum ArtifactMatcher {
    /// Any entry named `prefix.*`.
    #[default]
    DottedFamily,
    /// Only an entry named exactly `prefix`.
    Exact,
    /// Entries named `prefix` + one of the listed extensions. The family is
    /// present only once every extension exists.
    Extensions(Vec<String>),
    /// Entries named `prefix` + a remainder matched by the regex.
    /// Anchor the pattern (`^...$`) to match whole remainders.
    Pattern(Regex),
}

impl ArtifactMatcher {
    /// Creates an extension-set matcher, e.g. `[".R1.fq.gz", ".R2.fq.gz"]`.
    #[must_use]
    pub fn extensions(exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Extensions(exts.into_iter().map(Into::into).collect())
    }

    /// Creates a regex matcher over the remainder after the prefix.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Returns the remainders (text after `prefix`) of every matching entry,
    /// sorted.
    ///
    /// A missing directory yields an empty family.
    pub fn find_family(&self, prefix: &str) -> io::Result<Vec<String>> {
        let remainders = list_remainders(prefix)?;
        let family = remainders
            .into_iter()
            .filter(|rest| match self {
                Self::DottedFamily => rest.starts_with('.'),
                Self::Exact => rest.is_empty(),
                Self::Extensions(exts) => exts.iter().any(|ext| ext == rest),
                Self::Pattern(re) => re.is_match(rest),
            })
            .collect();
        Ok(family)
    }

    /// Returns true if the artifact family for `prefix` exists.
    ///
    /// Unreadable directories count as absent, so the stage runs again.
    #[must_use]
    pub fn is_present(&self, prefix: &str) -> bool {
        match self.find_family(prefix) {
            Ok(family) => match self {
                Self::Extensions(exts) => {
                    !exts.is_empty() && exts.iter().all(|ext| family.contains(ext))
                }
                _ => !family.is_empty(),
            },
            Err(e) => {
                debug!(prefix = %prefix, error = %e, "artifact lookup failed");
                false
            }
        }
    }
}

/// Splits a composed prefix into its directory and file-name stem.
fn split_prefix(prefix: &str) -> (&Path, &str) {
    match prefix.rfind('/') {
        Some(0) => (Path::new("/"), &prefix[1..]),
        Some(idx) => (Path::new(&prefix[..idx]), &prefix[idx + 1..]),
        None => (Path::new("."), prefix),
    }
}

fn list_remainders(prefix: &str) -> io::Result<Vec<String>> {
    let (dir, stem) = split_prefix(prefix);
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut remainders = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(rest) = name.strip_prefix(stem) {
            remainders.push(rest.to_string());
        }
    }
    remainders.sort();
    Ok(remainders)
}
