//! Batch script generation for Windows builds.
//!
//! Each command in the script is chained with `|| exit /b 1` so the first
//! failing step ends the script with a non-zero status, which `cmd /C`
//! passes back to the caller.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// File name of the generated script inside the source tree.
pub const BUILD_SCRIPT_NAME: &str = "openssl-acquire-build.bat";

/// Inputs for the generated script.
#[derive(Debug, Clone, Copy)]
pub struct BuildScript<'a> {
    /// The `vcvars` script establishing the MSVC environment.
    pub vcvars: &'a Path,
    /// Arguments following `perl Configure`.
    pub configure_args: &'a [String],
}

impl BuildScript<'_> {
    /// Render the script with CRLF line endings.
    ///
    /// # Examples
    ///
    /// ```
    /// use openssl_acquire::wrapper::BuildScript;
    /// use std::path::Path;
    ///
    /// let args = vec!["VC-WIN64A".to_owned()];
    /// let script = BuildScript { vcvars: Path::new("vcvars64.bat"), configure_args: &args };
    /// assert!(script.render().contains("perl Configure VC-WIN64A || exit /b 1"));
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        let configure = self
            .configure_args
            .iter()
            .map(|arg| quote(arg))
            .collect::<Vec<_>>()
            .join(" ");
        let vcvars = self.vcvars.display().to_string();
        let commands = [
            format!("call {}", quote(&vcvars)),
            format!("perl Configure {configure}"),
            "nmake".to_owned(),
            "nmake test".to_owned(),
            "nmake install_sw".to_owned(),
        ];

        let mut script = String::from("@echo off\r\n");
        for command in commands {
            script.push_str(&command);
            script.push_str(" || exit /b 1\r\n");
        }
        script
    }
}

/// Write the rendered script into `dir`, returning its path.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_build_script(dir: &Path, script: &BuildScript<'_>) -> Result<PathBuf> {
    let path = dir.join(BUILD_SCRIPT_NAME);
    std::fs::write(&path, script.render())?;
    Ok(path)
}

/// Quote an argument for `cmd.exe` if it contains spaces.
fn quote(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{arg}\"")
    } else {
        arg.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> Vec<String> {
        ["VC-WIN32", "no-shared", r"--prefix=C:\Program Files\vendor"]
            .map(str::to_owned)
            .to_vec()
    }

    #[test]
    fn steps_appear_in_order_and_abort_on_failure() {
        let args = args();
        let script = BuildScript {
            vcvars: Path::new(r"C:\BuildTools\vcvars32.bat"),
            configure_args: &args,
        }
        .render();

        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[0], "@echo off");
        assert!(lines[1].starts_with("call "));
        assert!(lines[2].starts_with("perl Configure VC-WIN32"));
        assert_eq!(
            &lines[3..],
            [
                "nmake || exit /b 1",
                "nmake test || exit /b 1",
                "nmake install_sw || exit /b 1"
            ]
        );
        assert!(lines[1..].iter().all(|l| l.ends_with("|| exit /b 1")));
        assert!(script.contains("\r\n"));
    }

    #[test]
    fn arguments_with_spaces_are_quoted() {
        let args = args();
        let script = BuildScript {
            vcvars: Path::new(r"C:\Program Files (x86)\vcvars32.bat"),
            configure_args: &args,
        }
        .render();

        assert!(script.contains(r#"call "C:\Program Files (x86)\vcvars32.bat""#));
        assert!(script.contains(r#""--prefix=C:\Program Files\vendor""#));
    }

    #[test]
    fn write_build_script_places_file_in_dir() {
        let temp = TempDir::new().expect("temp dir");
        let args = args();
        let script = BuildScript {
            vcvars: Path::new("vcvars32.bat"),
            configure_args: &args,
        };
        let path = write_build_script(temp.path(), &script).expect("write");
        assert_eq!(path, temp.path().join(BUILD_SCRIPT_NAME));
        assert_eq!(std::fs::read_to_string(path).expect("read"), script.render());
    }
}
