//! Handing the current file to an external editor.
//!
//! The launcher blocks until the editor exits. Suspending and resuming the
//! terminal around the call is the caller's job.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Something that can open a file for editing and wait for it.
pub trait EditorLauncher {
    /// Edit `path` and return the editor's exit status.
    ///
    /// # Errors
    /// Returns an error if the editor process cannot be started.
    fn edit(&self, path: &Path) -> io::Result<ExitStatus>;
}

/// A program plus leading arguments; the file path is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EditorCommand {
    /// Split a shell-style setting such as `"code --wait"` on whitespace.
    fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace().map(ToOwned::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// The opener used when neither `$VISUAL` nor `$EDITOR` is set.
    pub fn platform_default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", "\"\"", "/wait"])
        } else if cfg!(target_os = "macos") {
            ("open", &["-W"])
        } else {
            ("xdg-open", &[])
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
        }
    }

    /// `$VISUAL`, then `$EDITOR`, then the platform opener. Blank values
    /// are skipped.
    pub fn resolve(visual: Option<&str>, editor: Option<&str>) -> Self {
        visual
            .and_then(Self::parse)
            .or_else(|| editor.and_then(Self::parse))
            .unwrap_or_else(Self::platform_default)
    }
}

/// Launches the editor configured in the environment with inherited stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEditor {
    command: EditorCommand,
}

impl SystemEditor {
    pub fn from_env() -> Self {
        let visual = std::env::var("VISUAL").ok();
        let editor = std::env::var("EDITOR").ok();
        Self::with_command(EditorCommand::resolve(visual.as_deref(), editor.as_deref()))
    }

    pub const fn with_command(command: EditorCommand) -> Self {
        Self { command }
    }

    pub const fn command(&self) -> &EditorCommand {
        &self.command
    }
}

impl Default for SystemEditor {
    fn default() -> Self {
        Self::from_env()
    }
}

impl EditorLauncher for SystemEditor {
    fn edit(&self, path: &Path) -> io::Result<ExitStatus> {
        let absolute = std::path::absolute(path)?;
        tracing::info!(
            program = %self.command.program,
            path = %absolute.display(),
            "launching editor"
        );
        let status = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(&absolute)
            .status()?;
        if status.success() {
            tracing::debug!(%status, "editor exited");
        } else {
            tracing::warn!(%status, "editor exited with failure");
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_wins_over_editor() {
        let cmd = EditorCommand::resolve(Some("code --wait"), Some("vim"));
        assert_eq!(cmd.program, "code");
        assert_eq!(cmd.args, vec!["--wait"]);
    }

    #[test]
    fn test_editor_used_when_visual_blank() {
        let cmd = EditorCommand::resolve(Some("  "), Some("nano"));
        assert_eq!(cmd.program, "nano");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_platform_default_when_unset() {
        assert_eq!(
            EditorCommand::resolve(None, None),
            EditorCommand::platform_default()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_system_editor_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.md");
        std::fs::write(&path, "hi").unwrap();

        let ok = SystemEditor::with_command(EditorCommand {
            program: "true".to_string(),
            args: Vec::new(),
        });
        assert!(ok.edit(&path).unwrap().success());

        let failing = SystemEditor::with_command(EditorCommand {
            program: "false".to_string(),
            args: Vec::new(),
        });
        assert!(!failing.edit(&path).unwrap().success());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let editor = SystemEditor::with_command(EditorCommand {
            program: "canvas-no-such-editor-binary".to_string(),
            args: Vec::new(),
        });
        assert!(editor.edit(Path::new("draft.md")).is_err());
    }
}
