//! Requirement-file resolution for source installs
//!
//! `--with-requirements` either names files explicitly or asks for the
//! defaults shipped with the source being installed. Defaults come from the
//! source directory itself or, for archives, from a temporary extraction that
//! lives as long as the returned [`ResolvedRequirements`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use super::download::{download_file, extract_named_files};
use crate::error::{InstallerError, Result};
use crate::logging::Logger;

/// File names looked up, in install order
pub const REQUIREMENT_FILE_NAMES: [&str; 2] = ["dev-requirements.txt", "requirements.txt"];

/// What the command line asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequirementsSpec {
    #[default]
    None,
    /// `-r` without values: discover the defaults in the source
    Default,
    /// `-r a.txt b.txt`
    Explicit(Vec<String>),
}

impl RequirementsSpec {
    /// Map clap's `Option<Vec<String>>` (flag absent / bare flag / values)
    pub fn from_flag(values: Option<Vec<String>>) -> Self {
        match values {
            None => RequirementsSpec::None,
            Some(values) if values.is_empty() => RequirementsSpec::Default,
            Some(values) => RequirementsSpec::Explicit(values),
        }
    }

    pub fn is_requested(&self) -> bool {
        !matches!(self, RequirementsSpec::None)
    }
}

/// Requirement files ready to hand to pip
#[derive(Debug, Default)]
pub struct ResolvedRequirements {
    files: Vec<String>,
    // Keeps extracted files on disk until installation is over.
    _workdir: Option<TempDir>,
}

impl ResolvedRequirements {
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

/// Resolves [`RequirementsSpec`] against the install source
pub struct RequirementsResolver<'a> {
    logger: &'a Logger,
    download_timeout: Duration,
}

impl<'a> RequirementsResolver<'a> {
    pub fn new(logger: &'a Logger, download_timeout: Duration) -> Self {
        Self {
            logger,
            download_timeout,
        }
    }

    pub fn resolve(
        &self,
        spec: &RequirementsSpec,
        source: Option<&str>,
    ) -> Result<ResolvedRequirements> {
        match spec {
            RequirementsSpec::None => Ok(ResolvedRequirements::default()),
            RequirementsSpec::Explicit(files) => Ok(ResolvedRequirements {
                files: files.clone(),
                _workdir: None,
            }),
            RequirementsSpec::Default => match source {
                Some(source) if Path::new(source).is_dir() => Ok(ResolvedRequirements {
                    files: existing_requirement_files(Path::new(source)),
                    _workdir: None,
                }),
                Some(source) => self.from_archive(source),
                None => {
                    self.logger.warn(
                        "Default requirement files requested without a source; none will be installed.",
                    );
                    Ok(ResolvedRequirements::default())
                }
            },
        }
    }

    fn from_archive(&self, source: &str) -> Result<ResolvedRequirements> {
        let workdir = tempfile::tempdir()?;
        let archive = workdir.path().join("cli_source");

        let local = Path::new(source);
        if local.is_file() {
            self.logger.debug(format!("Using local archive {source}"));
            fs::copy(local, &archive)?;
        } else {
            download_file(source, &archive, self.logger, self.download_timeout)?;
        }

        let extract_root = workdir.path().join("extracted");
        let extracted = extract_named_files(&archive, &extract_root, &REQUIREMENT_FILE_NAMES);
        fs::remove_file(&archive)?;
        // Report the source rather than the temporary copy.
        extracted.map_err(|e| match e {
            InstallerError::Extract { source: cause, .. } => InstallerError::Extract {
                archive: PathBuf::from(source),
                source: cause,
            },
            other => other,
        })?;

        let files = locate_in_extraction(&extract_root);
        if files.is_empty() {
            self.logger
                .warn(format!("No requirement files found in {source}"));
        }
        Ok(ResolvedRequirements {
            files,
            _workdir: Some(workdir),
        })
    }
}

/// Requirement files present directly in `dir`, in install order
pub fn existing_requirement_files(dir: &Path) -> Vec<String> {
    REQUIREMENT_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .map(|path| path.display().to_string())
        .collect()
}

/// Look in the extraction root first, then one level underneath
///
/// GitHub archives wrap everything in a single `<repo>-<branch>/` directory.
fn locate_in_extraction(root: &Path) -> Vec<String> {
    let files = existing_requirement_files(root);
    if !files.is_empty() {
        return files;
    }

    let mut subdirs: Vec<PathBuf> = fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_dir())
                .collect()
        })
        .unwrap_or_default();
    subdirs.sort();

    subdirs
        .iter()
        .map(|dir| existing_requirement_files(dir))
        .find(|files| !files.is_empty())
        .unwrap_or_default()
}
