//! Standalone launcher scripts that run one function out-of-process.

use std::path::{Path, PathBuf};

use biosis_core::{RegisteredFunction, Surface};
use biosis_store::COMPILERS_DIR;

use crate::error::Result;
use crate::files::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    /// `.bat` command plus a `.vbs` that runs it without a window.
    Windows,
    /// A single `.sh` script.
    Posix,
}

impl ScriptFlavor {
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptFlavor::Windows
        } else {
            ScriptFlavor::Posix
        }
    }
}

/// Everything a compiler needs to know about where it is running.
#[derive(Debug, Clone)]
pub struct CompileContext {
    /// The user root; launchers `cd` here before running.
    pub root: PathBuf,
    /// Program that dispatches an address, normally the current executable.
    pub launcher: PathBuf,
    pub flavor: ScriptFlavor,
}

impl CompileContext {
    pub fn new(root: impl Into<PathBuf>, launcher: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            launcher: launcher.into(),
            flavor: ScriptFlavor::native(),
        }
    }

    pub fn with_flavor(mut self, flavor: ScriptFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// `<root>/.compilers/<surface>`
    pub fn surface_dir(&self, surface: Surface) -> PathBuf {
        self.root.join(COMPILERS_DIR).join(surface.as_str())
    }

    /// Shell command that runs `entry` from the user root.
    pub fn invocation(&self, entry: &RegisteredFunction) -> String {
        let address = entry.address();
        match self.flavor {
            ScriptFlavor::Windows => format!(
                "cd /d \"{}\" && \"{}\" run {address}",
                self.root.display(),
                self.launcher.display()
            ),
            ScriptFlavor::Posix => format!(
                "cd {} && {} run {address}",
                sh_quote(&self.root),
                sh_quote(&self.launcher)
            ),
        }
    }

    /// Write the launcher for `entry` under the surface directory and return
    /// the command that starts it, honoring `show` and `pause`.
    pub fn write_launcher(&self, surface: Surface, entry: &RegisteredFunction) -> Result<String> {
        let dir = self.surface_dir(surface);
        let command = self.invocation(entry);
        let header = &entry.header;

        let launch = match self.flavor {
            ScriptFlavor::Windows => {
                let batch = dir.join(format!("{}.bat", entry.name));
                let hidden = dir.join(format!("{}.vbs", entry.name));
                write_atomic(&batch, command.as_bytes())?;
                let vbs = format!(
                    "Set WshShell = CreateObject(\"WScript.Shell\")\n\
                     WshShell.Run chr(34) & \"{}\" & Chr(34), 0\n\
                     Set WshShell = Nothing\n",
                    batch.display()
                );
                write_atomic(&hidden, vbs.as_bytes())?;
                if header.show {
                    let flag = if header.pause { "/k" } else { "/c" };
                    format!("cmd.exe {flag} {}", batch.display())
                } else {
                    hidden.display().to_string()
                }
            }
            ScriptFlavor::Posix => {
                let script = dir.join(format!("{}.sh", entry.name));
                let mut body = format!("#!/bin/sh\n{command}\n");
                if header.pause {
                    body.push_str("printf 'Press enter to continue...'; read _\n");
                }
                write_atomic(&script, body.as_bytes())?;
                format!("sh {}", sh_quote(&script))
            }
        };
        tracing::debug!("wrote {surface} launcher for {}", entry.address());
        Ok(launch)
    }
}

fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}
