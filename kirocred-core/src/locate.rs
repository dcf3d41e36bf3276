//! Credential store location.
//!
//! kiro-cli and its Amazon Q predecessor keep their database in different
//! places. [`StoreLocator`] expands `~` in user-supplied paths and otherwise
//! probes the known install locations in order.
//!
//! # Example
//!
//! ```
//! use kirocred_core::StoreLocator;
//! use std::path::PathBuf;
//!
//! let locator = StoreLocator::new(Some(PathBuf::from("/home/u")), Vec::new());
//! let path = locator.resolve_store_path(Some("~/data.db")).unwrap();
//! assert_eq!(path, PathBuf::from("/home/u/data.db"));
//! ```

use directories::BaseDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CredentialError;

/// Default database locations, relative to the home directory, in probe order.
pub fn default_candidates() -> Vec<PathBuf> {
    #[allow(unused_mut)]
    let mut candidates = vec![
        PathBuf::from(".local/share/kiro-cli/data.sqlite3"),
        PathBuf::from(".local/share/amazon-q/data.sqlite3"),
    ];

    #[cfg(target_os = "macos")]
    candidates.extend([
        PathBuf::from("Library/Application Support/kiro-cli/data.sqlite3"),
        PathBuf::from("Library/Application Support/amazon-q/data.sqlite3"),
    ]);

    candidates
}

/// Resolves the on-disk path of the credential store.
///
/// The home directory and candidate list are injected so resolution can be
/// exercised against a temporary directory.
#[derive(Debug, Clone)]
pub struct StoreLocator {
    home: Option<PathBuf>,
    candidates: Vec<PathBuf>,
}

impl StoreLocator {
    /// Create a locator for the given home directory.
    ///
    /// Relative candidates are joined onto `home`; absolute ones are probed
    /// as-is. An empty list selects [`default_candidates`].
    pub fn new(home: Option<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        let candidates = if candidates.is_empty() {
            default_candidates()
        } else {
            candidates
        };
        Self { home, candidates }
    }

    /// Create a locator for the current user with the default candidates.
    pub fn from_env() -> Self {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::new(home, default_candidates())
    }

    /// The home directory used for expansion, if known.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Expand a leading `~` against the home directory.
    ///
    /// Paths without the marker are returned unchanged; `~user` forms are not
    /// expanded.
    pub fn expand_home(&self, raw: &str) -> Result<PathBuf, CredentialError> {
        let Some(rest) = raw.strip_prefix('~') else {
            return Ok(PathBuf::from(raw));
        };
        let rest = if rest.is_empty() {
            rest
        } else if let Some(stripped) = rest.strip_prefix(['/', '\\']) {
            stripped
        } else {
            return Ok(PathBuf::from(raw));
        };

        let home = self
            .home
            .as_deref()
            .ok_or(CredentialError::HomeDirectoryUnavailable)?;
        Ok(if rest.is_empty() {
            home.to_path_buf()
        } else {
            home.join(rest)
        })
    }

    /// Absolute candidate paths in probe order.
    pub fn candidate_paths(&self) -> Result<Vec<PathBuf>, CredentialError> {
        self.candidates
            .iter()
            .map(|candidate| {
                if candidate.is_absolute() {
                    Ok(candidate.clone())
                } else {
                    self.home
                        .as_deref()
                        .map(|home| home.join(candidate))
                        .ok_or(CredentialError::HomeDirectoryUnavailable)
                }
            })
            .collect()
    }

    /// Resolve the store path.
    ///
    /// With an override, `~` is expanded and the result returned without
    /// checking it exists. Without one, the first existing candidate wins; if
    /// none exists the first candidate is returned so the caller's not-found
    /// error names an actionable path.
    pub fn resolve_store_path(
        &self,
        candidate_override: Option<&str>,
    ) -> Result<PathBuf, CredentialError> {
        if let Some(raw) = candidate_override.filter(|raw| !raw.trim().is_empty()) {
            let path = self.expand_home(raw.trim())?;
            debug!(path = %path.display(), "using explicit credential store path");
            return Ok(path);
        }

        let candidates = self.candidate_paths()?;
        if let Some(found) = candidates.iter().find(|path| path.exists()) {
            debug!(path = %found.display(), "found credential store");
            return Ok(found.clone());
        }

        let best_guess = candidates
            .into_iter()
            .next()
            .ok_or(CredentialError::HomeDirectoryUnavailable)?;
        debug!(path = %best_guess.display(), "no credential store found, using default location");
        Ok(best_guess)
    }
}

impl Default for StoreLocator {
    fn default() -> Self {
        Self::from_env()
    }
}
