//! Hands finished URLs to whatever displays them.
use std::io;
use std::process::{Command, Stdio};
use tracing::debug;

pub trait Launcher: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs in the desktop's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(url);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

impl Launcher for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        debug!("Opening {} in the system browser", url);
        Self::command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Prints URLs instead of opening them.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintLauncher;

impl Launcher for PrintLauncher {
    fn open(&self, url: &str) -> io::Result<()> {
        println!("{}", url);
        Ok(())
    }
}
