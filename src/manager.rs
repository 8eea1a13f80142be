//! Site manager
//! The menu operations, each a fixed sequence of steps: prompt, mutate, validate, reload.
//!
//! Operations return an [`Outcome`] naming where the sequence stopped, so every failure
//! path can be exercised without a terminal.

use crate::config::SiteConfig;
use crate::console::Console;
use crate::error::RunError;
use crate::inventory::{EnabledEntry, Inventory};
use crate::runner::{CommandExecutor, Invocation, PrivilegedRunner};
use crate::template::{normalize_upstream, render_server_block};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, info, warn};

/// Where an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Stopped before anything was changed
    Cancelled(Cancel),
    /// A command failed; earlier steps may have changed the filesystem
    Failed {
        step: Step,
        rollback: Option<Rollback>,
    },
}

impl Outcome {
    fn failed(step: Step) -> Self {
        Outcome::Failed {
            step,
            rollback: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancel {
    EmptyInput,
    InvalidName,
    NoDomains,
    InvalidSelection,
    NotConfirmed,
    AlreadyEnabled,
    NotEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    WriteConfig,
    CreateLink,
    RemoveConfig,
    Validate,
    Reload,
}

/// Result of undoing a freshly created symlink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// Removed, and verified gone
    Reverted,
    /// The link may still be in place
    Incomplete,
}

/// Runs the site operations against one configuration
pub struct SiteManager<E> {
    config: SiteConfig,
    runner: PrivilegedRunner<E>,
}

impl<E: CommandExecutor> SiteManager<E> {
    pub fn new(config: SiteConfig, executor: E) -> Self {
        let runner = PrivilegedRunner::new(executor, config.elevate.clone());
        Self { config, runner }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn runner(&self) -> &PrivilegedRunner<E> {
        &self.runner
    }

    pub fn inventory(&self) -> Inventory<'_> {
        Inventory::new(&self.config)
    }

    /// Print every available domain with its enabled status
    pub fn list_domains<C: Console>(&self, console: &mut C) -> io::Result<Outcome> {
        console.clear();
        console.say("\n--- Listing all configured domains ---");

        let records = match self.inventory().records() {
            Ok(records) => records,
            Err(e) => {
                console.say(&format!("Error: {}", e));
                Vec::new()
            }
        };

        if records.is_empty() {
            console.say("No domain configurations found in sites-available.");
            return Ok(Outcome::Cancelled(Cancel::NoDomains));
        }

        console.say("Available domains:");
        for (i, record) in records.iter().enumerate() {
            let status = if record.enabled { "(Enabled)" } else { "(Disabled)" };
            console.say(&format!("  {}. {} {}", i + 1, record.name, status));
        }
        console.say("--------------------------------------");

        Ok(Outcome::Completed)
    }

    /// Write a new reverse-proxy server block and validate it. The domain stays disabled.
    pub fn add_domain<C: Console>(&self, console: &mut C) -> io::Result<Outcome> {
        console.clear();
        console.say("\n--- Adding a new domain (Reverse Proxy Template) ---");

        let server_name = console.prompt("Enter the domain name (e.g., ai.example.eu): ")?;
        let upstream = console.prompt(
            "Enter the internal URL where Nginx should proxy requests (e.g., localhost:3210 or 127.0.0.1:3210): ",
        )?;

        if server_name.is_empty() || upstream.is_empty() {
            console.say("Domain name and proxy pass URL cannot be empty. Aborting.");
            return Ok(Outcome::Cancelled(Cancel::EmptyInput));
        }

        if !is_valid_file_name(&server_name) {
            console.say(&format!(
                "'{}' cannot be used as a configuration file name. Aborting.",
                server_name
            ));
            return Ok(Outcome::Cancelled(Cancel::InvalidName));
        }

        let config_path = self.config.available_path(&server_name);

        if config_path.exists() {
            console.say(&format!(
                "Warning: Configuration file '{}' already exists.",
                config_path.display()
            ));
            if !console.confirm("Overwrite existing configuration? (y/n): ")? {
                console.say("Aborting domain creation.");
                return Ok(Outcome::Cancelled(Cancel::NotConfirmed));
            }
        }

        let upstream = normalize_upstream(&upstream);
        if let Cow::Owned(adjusted) = &upstream {
            console.say(&format!("Automatically adjusted proxy_pass_url to: {}", adjusted));
        }

        let content = render_server_block(&server_name, &upstream, &self.config.log_dir);

        console.say(&format!(
            "Creating Nginx server block configuration for {} at {}...",
            server_name,
            config_path.display()
        ));
        let write = Invocation::new("tee", [path_arg(&config_path)]).with_stdin(content);
        if !self.run_step(console, &write) {
            console.say(&format!("Error writing config file: {}", config_path.display()));
            return Ok(Outcome::failed(Step::WriteConfig));
        }

        info!("Created configuration for {}", server_name);
        console.say(&format!("Configuration created: {}", config_path.display()));
        console.say("Please enable the domain and add HTTPS with Certbot separately.");

        if self.validate(console) {
            Ok(Outcome::Completed)
        } else {
            Ok(Outcome::failed(Step::Validate))
        }
    }

    /// Pick an available domain and link it into the enabled directory
    pub fn enable_domain<C: Console>(&self, console: &mut C) -> io::Result<Outcome> {
        console.clear();
        console.say("\n--- Enabling an existing domain ---");

        let domain = match self.select_domain(
            console,
            "No domains available to enable.",
            "Select domain to enable:",
            "Enter the number of the domain to enable: ",
        )? {
            Ok(domain) => domain,
            Err(cancel) => return Ok(Outcome::Cancelled(cancel)),
        };

        Ok(self.enable(console, &domain))
    }

    /// Link `domain`, validate, reload. A failed validation removes the new link again.
    pub fn enable<C: Console>(&self, console: &mut C, domain: &str) -> Outcome {
        let source = self.config.available_path(domain);
        let dest = self.config.enabled_path(domain);

        if self.inventory().enabled_entry(domain) != EnabledEntry::Missing {
            console.say(&format!(
                "Warning: Domain '{}' appears to be already enabled or exists as a link/file in sites-enabled.",
                domain
            ));
            return Outcome::Cancelled(Cancel::AlreadyEnabled);
        }

        console.say(&format!("Enabling domain '{}' by creating symlink...", domain));
        let link = Invocation::new("ln", ["-s".to_string(), path_arg(&source), path_arg(&dest)]);
        if !self.run_step(console, &link) {
            console.say(&format!("Failed to create symlink for {}.", domain));
            return Outcome::failed(Step::CreateLink);
        }

        if !self.validate(console) {
            console.say("Nginx configuration test failed after enabling site. Reverting symlink setup.");
            let rollback = self.remove_new_link(console, &dest);
            return Outcome::Failed {
                step: Step::Validate,
                rollback: Some(rollback),
            };
        }

        if !self.reload(console) {
            return Outcome::failed(Step::Reload);
        }

        info!("Enabled {}", domain);
        Outcome::Completed
    }

    /// Remove a domain's link and config file, then validate and reload
    pub fn delete_domain<C: Console>(&self, console: &mut C) -> io::Result<Outcome> {
        console.clear();
        console.say("\n--- Deleting a domain ---");

        let domain = match self.select_domain(
            console,
            "No domains available to delete.",
            "Select domain to delete:",
            "Enter the number of the domain to delete: ",
        )? {
            Ok(domain) => domain,
            Err(cancel) => return Ok(Outcome::Cancelled(cancel)),
        };

        let question = format!(
            "Are you sure you want to delete '{}'? This will remove the config file and disable it. (y/n): ",
            domain
        );
        if !console.confirm(&question)? {
            console.say("Deletion aborted.");
            return Ok(Outcome::Cancelled(Cancel::NotConfirmed));
        }

        let source = self.config.available_path(&domain);
        let dest = self.config.enabled_path(&domain);
        let inventory = self.inventory();

        match inventory.enabled_entry(&domain) {
            EnabledEntry::Symlink => {
                console.say(&format!("Disabling domain '{}' by removing symlink...", domain));
                if !self.run_step(console, &Invocation::new("rm", [path_arg(&dest)])) {
                    warn!("Symlink {} was not removed", dest.display());
                    console.say(&format!(
                        "Warning: Failed to remove symlink for {}. You may need to remove it manually.",
                        domain
                    ));
                }
            }
            EnabledEntry::Other => {
                console.say(&format!(
                    "Warning: A file (not symlink) exists at {}. Not removing automatically.",
                    dest.display()
                ));
            }
            EnabledEntry::Missing => {}
        }

        if inventory.config_exists(&domain) {
            console.say(&format!("Deleting configuration file: {}...", source.display()));
            if !self.run_step(console, &Invocation::new("rm", [path_arg(&source)])) {
                console.say(&format!(
                    "Error: Failed to delete configuration file {}. Aborting cleanup.",
                    source.display()
                ));
                return Ok(Outcome::failed(Step::RemoveConfig));
            }
        } else {
            console.say(&format!(
                "Configuration file {} not found. Already deleted or never existed.",
                source.display()
            ));
        }

        if !self.validate(console) {
            console.say("Nginx configuration test failed after deletion. Check manually!");
            return Ok(Outcome::failed(Step::Validate));
        }

        if !self.reload(console) {
            return Ok(Outcome::failed(Step::Reload));
        }

        info!("Deleted {}", domain);
        Ok(Outcome::Completed)
    }

    /// Make sure a domain is enabled, then hand the certificate request to the operator.
    /// Certbot itself is never run from here.
    pub fn add_https<C: Console>(&self, console: &mut C) -> io::Result<Outcome> {
        console.clear();
        console.say("\n--- Adding HTTPS (Certbot for Nginx) ---");
        console.say("IMPORTANT: Ensure your domain's DNS points to this server.");
        console.say("Also ensure ports 80 and 443 are open in your server's firewall/security rules.");

        let domain = match self.select_domain(
            console,
            "No domain configurations found in sites-available to secure with HTTPS.",
            "\nAvailable domains to secure:",
            "Enter the number of the domain to secure with HTTPS: ",
        )? {
            Ok(domain) => domain,
            Err(cancel) => return Ok(Outcome::Cancelled(cancel)),
        };

        if self.inventory().enabled_entry(&domain) != EnabledEntry::Symlink {
            console.say(&format!(
                "Warning: Domain '{}' is not currently enabled (no symlink in sites-enabled).",
                domain
            ));
            console.say("Certbot requires the domain to be enabled on port 80 to issue certificates.");
            if !console.confirm("Do you want to enable it now before running Certbot? (y/n): ")? {
                console.say("Aborting HTTPS setup as domain is not enabled.");
                return Ok(Outcome::Cancelled(Cancel::NotEnabled));
            }

            let outcome = self.enable(console, &domain);
            if outcome != Outcome::Completed {
                console.say("Failed to enable domain for Certbot. Aborting HTTPS setup.");
                return Ok(outcome);
            }
            console.say(&format!("Domain '{}' enabled for Certbot.", domain));
        }

        let rule = "=".repeat(70);
        console.say(&format!("\n{}", rule));
        console.say("THIS TOOL HAS PAUSED. PLEASE EXECUTE THE FOLLOWING COMMAND MANUALLY.");
        console.say(&rule);
        console.say(&format!("  {}", self.config.certbot_command(&domain)));
        console.say("\nAnswer any questions Certbot may ask (e.g., email, TOS, redirect).");
        console.say("Certbot will automatically reload Nginx for you if successful.");
        console.say(&format!("{}\n", rule));

        console.pause(
            "Press Enter AFTER you have run the Certbot command manually and it has completed successfully...",
        )?;

        console.say("\nCertbot usually handles Nginx reload automatically.");
        console.say(&format!(
            "You can verify automatic renewal: {}",
            self.config.renewal_check_command()
        ));
        info!("Handed certificate request for {} to the operator", domain);

        Ok(Outcome::Completed)
    }

    /// `nginx -t`
    pub fn validate<C: Console>(&self, console: &mut C) -> bool {
        console.say("\nTesting Nginx configuration...");
        let test = Invocation::new(self.config.nginx_bin.as_str(), ["-t"]);
        if self.run_step(console, &test) {
            console.say("Nginx configuration syntax is OK.");
            true
        } else {
            console.say("Nginx configuration test failed. Please fix errors before proceeding.");
            false
        }
    }

    /// `systemctl reload nginx`
    pub fn reload<C: Console>(&self, console: &mut C) -> bool {
        console.say("\nReloading Nginx...");
        let reload = Invocation::new(
            self.config.systemctl_bin.as_str(),
            ["reload", self.config.service.as_str()],
        );
        if self.run_step(console, &reload) {
            console.say("Nginx reloaded successfully.");
            true
        } else {
            console.say("Failed to reload Nginx. Check logs for details.");
            false
        }
    }

    /// Remove a link created moments ago and check that it is really gone
    fn remove_new_link<C: Console>(&self, console: &mut C, dest: &Path) -> Rollback {
        let removed = self.run_step(console, &Invocation::new("rm", [path_arg(dest)]));
        let gone = matches!(
            fs::symlink_metadata(dest),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound
        );

        if removed && gone {
            info!("Rolled back symlink {}", dest.display());
            console.say(&format!("Rollback complete: removed {}.", dest.display()));
            Rollback::Reverted
        } else {
            error!("Rollback of {} incomplete", dest.display());
            console.say(&format!(
                "Warning: Rollback incomplete, {} may still exist. Remove it manually.",
                dest.display()
            ));
            Rollback::Incomplete
        }
    }

    /// Numbered pick from the available directory
    fn select_domain<C: Console>(
        &self,
        console: &mut C,
        empty_message: &str,
        heading: &str,
        question: &str,
    ) -> io::Result<Result<String, Cancel>> {
        let domains = match self.inventory().available_domains() {
            Ok(domains) => domains,
            Err(e) => {
                console.say(&format!("Error: {}", e));
                Vec::new()
            }
        };

        if domains.is_empty() {
            console.say(empty_message);
            return Ok(Err(Cancel::NoDomains));
        }

        console.say(heading);
        for (i, domain) in domains.iter().enumerate() {
            console.say(&format!("  {}. {}", i + 1, domain));
        }

        let answer = console.prompt(question)?;
        match parse_selection(&answer, domains.len()) {
            Selection::Index(index) => Ok(Ok(domains[index].clone())),
            Selection::OutOfRange => {
                console.say("Invalid choice.");
                Ok(Err(Cancel::InvalidSelection))
            }
            Selection::NotANumber => {
                console.say("Invalid input. Please enter a number.");
                Ok(Err(Cancel::InvalidSelection))
            }
        }
    }

    /// Run one command in report mode, echoing it and any captured output
    fn run_step<C: Console>(&self, console: &mut C, invocation: &Invocation) -> bool {
        console.say(&format!("\nRunning: {}", self.runner.elevated(invocation)));
        self.runner.run(invocation, |e| report_failure(console, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    /// Zero-based index into the listed domains
    Index(usize),
    OutOfRange,
    NotANumber,
}

/// Interpret a 1-based menu answer against `len` entries
fn parse_selection(answer: &str, len: usize) -> Selection {
    match answer.trim().parse::<i64>() {
        Ok(n) if n >= 1 && (n as u64) <= len as u64 => Selection::Index(n as usize - 1),
        Ok(_) => Selection::OutOfRange,
        Err(_) => Selection::NotANumber,
    }
}

/// A domain name must name a single file inside the available directory
fn is_valid_file_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn report_failure<C: Console>(console: &mut C, err: &RunError) {
    match err {
        RunError::Failed {
            command,
            stdout,
            stderr,
            ..
        } => {
            console.say(&format!("Error executing: {}", command));
            if !stdout.trim().is_empty() {
                console.say(&format!("STDOUT:\n{}", stdout.trim_end()));
            }
            if !stderr.trim().is_empty() {
                console.say(&format!("STDERR:\n{}", stderr.trim_end()));
            }
        }
        other => console.say(&format!("Error: {}", other)),
    }
}
