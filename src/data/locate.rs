use std::path::{Path, PathBuf};

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::config::SchoolProfile;

// ---------------------------------------------------------------------------
// Match strategies
// ---------------------------------------------------------------------------

/// How a candidate name is compared to the target name.
///
/// Non-ASCII names may be stored composed (NFC, most file systems) or
/// decomposed (NFD, macOS HFS+ and files copied from it), so plain string
/// equality is not enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Both names equal after NFC normalization.
    ExactNfc,
    /// Both names equal after NFD normalization.
    ExactNfd,
    /// The NFC-normalized target occurs inside the NFC-normalized candidate.
    Contains,
}

impl MatchStrategy {
    /// All strategies in priority order.
    pub const ALL: [MatchStrategy; 3] = [Self::ExactNfc, Self::ExactNfd, Self::Contains];

    /// Exact strategies only.
    pub const EXACT: [MatchStrategy; 2] = [Self::ExactNfc, Self::ExactNfd];

    pub fn matches(self, candidate: &str, target: &str) -> bool {
        match self {
            Self::ExactNfc => nfc(candidate) == nfc(target),
            Self::ExactNfd => nfd(candidate) == nfd(target),
            Self::Contains => nfc(candidate).contains(&nfc(target)),
        }
    }
}

pub fn nfc(s: &str) -> String {
    s.nfc().collect()
}

pub fn nfd(s: &str) -> String {
    s.nfd().collect()
}

/// Index of the first candidate matching `target`.
///
/// Strategies are tried in the order given; within one strategy candidates
/// are tried in the order given. The first hit wins, so an exact match always
/// beats a substring match when `strategies` lists the exact ones first.
pub fn match_name<S: AsRef<str>>(
    candidates: &[S],
    target: &str,
    strategies: &[MatchStrategy],
) -> Option<usize> {
    strategies.iter().find_map(|strategy| {
        candidates
            .iter()
            .position(|c| strategy.matches(c.as_ref(), target))
    })
}

/// Resolve a sheet name to a school (index into `schools`).
///
/// Exact matches against every school are tried before any substring match,
/// so a school whose name is contained in another's cannot steal its sheet.
/// Within each pass, configuration order breaks ties.
pub fn assign_school(sheet: &str, schools: &[SchoolProfile]) -> Option<usize> {
    let exact = schools
        .iter()
        .position(|s| MatchStrategy::EXACT.iter().any(|m| m.matches(sheet, &s.name)));
    exact.or_else(|| {
        schools
            .iter()
            .position(|s| MatchStrategy::Contains.matches(sheet, &s.name))
    })
}

// ---------------------------------------------------------------------------
// FileLocator
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("listing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Finds directory entries by logical name, tolerant of NFC/NFD differences.
#[derive(Debug, Clone)]
pub struct FileLocator<'a> {
    dir: &'a Path,
    strategies: &'a [MatchStrategy],
    extension: Option<&'a str>,
}

impl<'a> FileLocator<'a> {
    pub fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            strategies: &MatchStrategy::ALL,
            extension: None,
        }
    }

    pub fn with_strategies(mut self, strategies: &'a [MatchStrategy]) -> Self {
        self.strategies = strategies;
        self
    }

    /// Only consider entries with this extension (case-insensitive).
    pub fn with_extension(mut self, extension: &'a str) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Entry names in the directory, sorted so that "first match" is stable
    /// across platforms.
    pub fn entries(&self) -> Result<Vec<String>, LocateError> {
        if !self.dir.is_dir() {
            return Err(LocateError::DirectoryNotFound(self.dir.to_path_buf()));
        }
        let io_err = |source| LocateError::Io {
            path: self.dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.extension_ok(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve `target` to a path. `Ok(None)` means the directory exists but
    /// nothing matched.
    pub fn find(&self, target: &str) -> Result<Option<PathBuf>, LocateError> {
        let names = self.entries()?;
        let found = match_name(&names, target, self.strategies).map(|i| self.dir.join(&names[i]));
        if found.is_none() {
            log::debug!("'{target}' not found in {}", self.dir.display());
        }
        Ok(found)
    }

    fn extension_ok(&self, name: &str) -> bool {
        match self.extension {
            None => true,
            Some(ext) => Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
        }
    }
}
