//! Domain inventory
//! Reads the available and enabled directories to work out which domains exist and which are live

use crate::config::SiteConfig;
use crate::error::InventoryError;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A domain as seen on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    /// File name in the available directory, which is also the server name
    pub name: String,
    pub enabled: bool,
    /// Resolved target of the enabled symlink, when there is one
    pub link_target: Option<PathBuf>,
}

/// What currently sits at a domain's path in the enabled directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledEntry {
    Missing,
    Symlink,
    /// A regular file or directory, never touched automatically
    Other,
}

/// Read-only view over the two sites directories
pub struct Inventory<'a> {
    config: &'a SiteConfig,
}

impl<'a> Inventory<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Sorted file names in the available directory (non-recursive, files only)
    pub fn available_domains(&self) -> Result<Vec<String>, InventoryError> {
        let dir = &self.config.available_dir;
        if !dir.is_dir() {
            return Err(InventoryError::MissingDirectory(dir.clone()));
        }

        let entries = fs::read_dir(dir).map_err(|source| InventoryError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut domains = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| InventoryError::Io {
                path: dir.clone(),
                source,
            })?;
            // Follows symlinks, matching what nginx would read
            if entry.path().is_file() {
                domains.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        domains.sort();
        Ok(domains)
    }

    /// Names of links in the enabled directory that resolve into the available directory.
    ///
    /// Containment is a plain string-prefix test on the resolved target, so a sibling
    /// such as `sites-available-old/` also counts. A missing enabled directory yields
    /// an empty set.
    pub fn enabled_domains(&self) -> Result<BTreeSet<String>, InventoryError> {
        Ok(self
            .enabled_links()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn enabled_links(&self) -> Result<Vec<(String, PathBuf)>, InventoryError> {
        let dir = &self.config.enabled_dir;
        if !dir.is_dir() {
            debug!("Enabled directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).map_err(|source| InventoryError::Io {
            path: dir.clone(),
            source,
        })?;

        let prefix = self.config.available_dir.to_string_lossy().into_owned();
        let mut links = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|source| InventoryError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();

            if !is_symlink(&path) {
                continue;
            }

            // Dangling links have no resolved target and are skipped
            let Ok(target) = fs::canonicalize(&path) else {
                debug!("Skipping dangling link {}", path.display());
                continue;
            };

            if target.to_string_lossy().starts_with(&prefix) {
                links.push((entry.file_name().to_string_lossy().into_owned(), target));
            }
        }

        Ok(links)
    }

    /// Every available domain with its enabled status
    pub fn records(&self) -> Result<Vec<DomainRecord>, InventoryError> {
        let links = self.enabled_links()?;

        Ok(self
            .available_domains()?
            .into_iter()
            .map(|name| {
                let link_target = links
                    .iter()
                    .find(|(link, _)| *link == name)
                    .map(|(_, target)| target.clone());
                DomainRecord {
                    enabled: link_target.is_some(),
                    name,
                    link_target,
                }
            })
            .collect())
    }

    /// What occupies the enabled-directory path for `domain`
    pub fn enabled_entry(&self, domain: &str) -> EnabledEntry {
        let path = self.config.enabled_path(domain);
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_symlink() => EnabledEntry::Symlink,
            Ok(_) => EnabledEntry::Other,
            Err(e) if e.kind() == io::ErrorKind::NotFound => EnabledEntry::Missing,
            // Unreadable but present
            Err(_) => EnabledEntry::Other,
        }
    }

    /// Whether the available-directory file for `domain` exists
    pub fn config_exists(&self, domain: &str) -> bool {
        self.config.available_path(domain).exists()
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}
