//! Browser and file launching through the OS opener

use std::path::PathBuf;
use std::process::{Command, Stdio};

use url::Url;

use crate::{Error, Result};

/// Opens URLs and files with the desktop's default application
pub trait Opener: Send + Sync {
    /// Open a URL or filesystem path
    ///
    /// # Errors
    ///
    /// Returns error if the opener cannot be launched
    fn open(&self, target: &str) -> Result<()>;
}

/// Opener backed by `xdg-open`, `open` or `cmd /C start`
#[derive(Debug, Clone)]
pub struct SystemOpener {
    program: PathBuf,
    prefix: Vec<String>,
}

impl SystemOpener {
    /// Locate the platform opener on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if no opener binary is installed
    pub fn detect() -> Result<Self> {
        let (bin, prefix): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };

        let program = which::which(bin)
            .map_err(|e| Error::Launch(format!("{bin} not available: {e}")))?;

        Ok(Self {
            program,
            prefix: prefix.iter().map(ToString::to_string).collect(),
        })
    }
}

impl Opener for SystemOpener {
    fn open(&self, target: &str) -> Result<()> {
        tracing::debug!(program = %self.program.display(), arg = target, "launching opener");

        Command::new(&self.program)
            .args(&self.prefix)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Launch(format!("{}: {e}", self.program.display())))?;
        Ok(())
    }
}

/// Prints targets for the user to open by hand (no desktop session)
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintOpener;

impl Opener for PrintOpener {
    fn open(&self, target: &str) -> Result<()> {
        println!("Open: {target}");
        Ok(())
    }
}

/// Fill the `{query}` placeholder of a search URL template
#[must_use]
pub fn search_url(template: &str, query: &str) -> String {
    template.replace("{query}", &urlencoding::encode(query))
}

/// Resolve a spoken site name to a URL
///
/// Returns `None` when the text does not look like a host name, in which
/// case the caller searches for it instead.
#[must_use]
pub fn website_url(site: &str) -> Option<Url> {
    let site = site.trim();
    if site.is_empty() || site.contains(char::is_whitespace) {
        return None;
    }

    if site.starts_with("http://") || site.starts_with("https://") {
        return Url::parse(site).ok();
    }

    if !site.contains('.') || site.starts_with('.') || site.ends_with('.') {
        return None;
    }

    Url::parse(&format!("https://{site}"))
        .ok()
        .filter(|url| url.host_str().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            search_url("https://www.google.com/search?q={query}", "rust & tokio"),
            "https://www.google.com/search?q=rust%20%26%20tokio"
        );
    }

    #[test]
    fn test_website_url() {
        assert_eq!(
            website_url("example.com").map(String::from),
            Some("https://example.com/".to_string())
        );
        assert_eq!(
            website_url("https://docs.rs/tokio").map(String::from),
            Some("https://docs.rs/tokio".to_string())
        );
        assert!(website_url("youtube").is_none());
        assert!(website_url("my favourite site.com").is_none());
        assert!(website_url("").is_none());
    }
}
