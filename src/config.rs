//! Site configuration
//! Directory layout and external programs used by the manager

use std::io;
use std::path::{Path, PathBuf};

/// Paths and programs the manager operates on
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Every known server block, enabled or not
    pub available_dir: PathBuf,
    /// Symlinks into `available_dir` that nginx actually loads
    pub enabled_dir: PathBuf,
    /// Directory used for the per-domain access/error logs in the template
    pub log_dir: PathBuf,
    /// Privilege elevation program; `None` runs commands directly
    pub elevate: Option<String>,
    pub nginx_bin: String,
    pub systemctl_bin: String,
    pub service: String,
    pub certbot_bin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            available_dir: PathBuf::from("/etc/nginx/sites-available"),
            enabled_dir: PathBuf::from("/etc/nginx/sites-enabled"),
            log_dir: PathBuf::from("/var/log/nginx"),
            elevate: Some("sudo".to_string()),
            nginx_bin: "nginx".to_string(),
            systemctl_bin: "systemctl".to_string(),
            service: "nginx".to_string(),
            certbot_bin: "certbot".to_string(),
        }
    }
}

impl SiteConfig {
    /// Config rooted in arbitrary directories, programs left at their defaults
    pub fn with_dirs<P: AsRef<Path>>(available_dir: P, enabled_dir: P, log_dir: P) -> Self {
        Self {
            available_dir: available_dir.as_ref().to_path_buf(),
            enabled_dir: enabled_dir.as_ref().to_path_buf(),
            log_dir: log_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Path of a domain's config file in the available directory
    pub fn available_path(&self, domain: &str) -> PathBuf {
        self.available_dir.join(domain)
    }

    /// Path of a domain's symlink in the enabled directory
    pub fn enabled_path(&self, domain: &str) -> PathBuf {
        self.enabled_dir.join(domain)
    }

    /// Resolve relative directories against the current working directory.
    ///
    /// Symlinks are created with the available path as their target, so it must be absolute.
    pub fn absolutized(self) -> io::Result<Self> {
        Ok(self.rooted_at(&std::env::current_dir()?))
    }

    /// Resolve relative directories against `base`
    pub fn rooted_at(self, base: &Path) -> Self {
        let root = |dir: PathBuf| if dir.is_relative() { base.join(dir) } else { dir };
        Self {
            available_dir: root(self.available_dir),
            enabled_dir: root(self.enabled_dir),
            log_dir: root(self.log_dir),
            ..self
        }
    }

    /// The command the operator runs by hand to obtain a certificate
    pub fn certbot_command(&self, domain: &str) -> String {
        self.elevated(format!("{} --nginx -d {}", self.certbot_bin, domain))
    }

    /// The command that shows whether certificate renewal is scheduled
    pub fn renewal_check_command(&self) -> String {
        self.elevated(format!("{} status certbot.timer", self.systemctl_bin))
    }

    fn elevated(&self, command: String) -> String {
        match &self.elevate {
            Some(elevate) => format!("{} {}", elevate, command),
            None => command,
        }
    }
}
