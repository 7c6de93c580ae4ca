use crate::jobs::Jobs;
use std::env as stdenv;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of truth for the interpreter's working directory.
///
/// `cd` is the only writer; `pwd`, the prompt and every spawned program read it.
/// The process-wide directory is the production implementation, while
/// [`VirtualWorkingDirectory`] keeps the state local so tests can run in parallel.
pub trait WorkingDirectory {
    /// Resolve the current directory.
    fn current(&self) -> io::Result<PathBuf>;

    /// Switch to `target`, absolute or relative to [`WorkingDirectory::current`].
    ///
    /// On error the current directory is left unchanged.
    fn change(&mut self, target: &Path) -> io::Result<()>;
}

/// The real working directory of the interpreter process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessWorkingDirectory;

impl WorkingDirectory for ProcessWorkingDirectory {
    fn current(&self) -> io::Result<PathBuf> {
        stdenv::current_dir()
    }

    fn change(&mut self, target: &Path) -> io::Result<()> {
        stdenv::set_current_dir(target)
    }
}

/// A working directory that only exists inside the interpreter.
///
/// Spawned programs still start in it, because every spawn sets its directory
/// explicitly from [`WorkingDirectory::current`].
#[derive(Debug, Clone)]
pub struct VirtualWorkingDirectory {
    current: PathBuf,
}

impl VirtualWorkingDirectory {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            current: start.into(),
        }
    }
}

impl WorkingDirectory for VirtualWorkingDirectory {
    fn current(&self) -> io::Result<PathBuf> {
        if self.current.is_dir() {
            Ok(self.current.clone())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} no longer exists", self.current.display()),
            ))
        }
    }

    fn change(&mut self, target: &Path) -> io::Result<()> {
        let joined = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current.join(target)
        };
        let canonical = fs::canonicalize(&joined)?;
        if !canonical.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", joined.display()),
            ));
        }
        self.current = canonical;
        Ok(())
    }
}

/// Mutable state shared by every command the interpreter runs.
///
/// The environment contains:
/// - `working_dir`: where `cd` moves and where programs are started.
/// - `search_path`: the inherited `PATH` used to resolve program names.
/// - `jobs`: background processes that have not been reaped yet.
pub struct Environment {
    pub working_dir: Box<dyn WorkingDirectory>,
    pub search_path: Option<OsString>,
    pub jobs: Jobs,
}

impl Environment {
    /// Capture the current process state: the real working directory and `PATH`.
    pub fn new() -> Self {
        Self::with_working_dir(Box::new(ProcessWorkingDirectory))
    }

    /// Same as [`Environment::new`] but with a custom working directory provider.
    pub fn with_working_dir(working_dir: Box<dyn WorkingDirectory>) -> Self {
        Self {
            working_dir,
            search_path: stdenv::var_os("PATH"),
            jobs: Jobs::default(),
        }
    }

    /// Directory spawned programs should start in, if it can still be resolved.
    pub fn spawn_dir(&self) -> Option<PathBuf> {
        self.working_dir.current().ok()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_cd_absolute_and_relative() {
        let root = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(root.path()).unwrap();
        fs::create_dir(base.join("inner")).unwrap();

        let mut wd = VirtualWorkingDirectory::new("/");
        wd.change(&base).unwrap();
        assert_eq!(wd.current().unwrap(), base);

        wd.change(Path::new("inner")).unwrap();
        assert_eq!(wd.current().unwrap(), base.join("inner"));

        wd.change(Path::new("..")).unwrap();
        assert_eq!(wd.current().unwrap(), base);
    }

    #[test]
    fn test_virtual_cd_failure_keeps_directory() {
        let root = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(root.path()).unwrap();
        fs::write(base.join("file"), b"x").unwrap();

        let mut wd = VirtualWorkingDirectory::new(&base);
        assert!(wd.change(Path::new("missing")).is_err());
        assert!(wd.change(Path::new("file")).is_err());
        assert_eq!(wd.current().unwrap(), base);
    }

    #[test]
    fn test_virtual_current_fails_after_removal() {
        let root = tempfile::tempdir().unwrap();
        let doomed = root.path().join("doomed");
        fs::create_dir(&doomed).unwrap();

        let wd = VirtualWorkingDirectory::new(&doomed);
        fs::remove_dir(&doomed).unwrap();
        assert!(wd.current().is_err());
    }

    #[test]
    fn test_env_reads_path_from_process_env() {
        let env = Environment::new();
        assert!(env.search_path.is_some());
    }
}
