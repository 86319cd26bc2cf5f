use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

use tracing::warn;

use crate::error::{Error, Result};

use super::ThemeHandler;

/// A theme handler implemented by an external program.
///
/// The program is invoked as
///
/// - `<program> stylesheet`, printing the stylesheet on stdout, and
/// - `<program> modify-html <href>`, reading page HTML on stdin and printing
///   the modified HTML on stdout.
///
/// A non-zero exit status is a failure; stderr is included in the error.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    program: PathBuf,
    name: String,
}

impl CommandHandler {
    pub fn new(program: impl AsRef<Path>) -> Self {
        let program = program.as_ref().to_path_buf();
        let name = program.display().to_string();
        Self { program, name }
    }

    fn failure(&self, output: &Output) -> Error {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Error::ThemeHandler(format!(
            "{} exited with {}: {}",
            self.name,
            output.status,
            stderr.trim()
        ))
    }

    fn spawn_error(&self, e: io::Error) -> Error {
        Error::ThemeHandler(format!("{}: {e}", self.name))
    }
}

impl ThemeHandler for CommandHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn stylesheet(&self) -> String {
        match Command::new(&self.program).arg("stylesheet").output() {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).into_owned()
            }
            Ok(output) => {
                warn!("Ignoring theme stylesheet: {}", self.failure(&output));
                String::new()
            }
            Err(e) => {
                warn!("Ignoring theme stylesheet: {}", self.spawn_error(e));
                String::new()
            }
        }
    }

    fn modify_html(&self, html: &str, href: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("modify-html")
            .arg(href)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::ThemeHandler(format!("{}: stdin unavailable", self.name)))?;

        // stdin is written while stdout is drained.
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(html.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| self.spawn_error(e))?;
        match written {
            Ok(Ok(())) => {}
            // A program may exit without reading its input.
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(self.spawn_error(e)),
            Err(_) => {
                return Err(Error::ThemeHandler(format!(
                    "{}: stdin writer panicked",
                    self.name
                )));
            }
        }

        if !output.status.success() {
            return Err(self.failure(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
