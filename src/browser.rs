//! User-agent launching for the consent page.

/// Capability to send the local user agent to a URL.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the platform's default browser.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// Launcher for headless deployments (`OPEN_BROWSER=false`).
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, _url: &str) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "browser launch disabled",
        ))
    }
}

/// Pick the launcher matching the `open_browser` setting.
pub fn launcher(open_browser: bool) -> Box<dyn BrowserLauncher> {
    if open_browser {
        Box::new(SystemBrowser)
    } else {
        Box::new(NoBrowser)
    }
}
