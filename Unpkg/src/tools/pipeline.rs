//! Blocking process invocations with an explicit working directory
//!
//! Nothing here changes the process-wide current directory; every child is
//! started with `current_dir` set to the directory it should write into.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Short name used in logs and errors (`gzip` rather than `/usr/bin/gzip`).
    fn name(&self) -> String {
        self.program.file_name().map_or_else(
            || self.program.to_string_lossy().to_string(),
            |n| n.to_string_lossy().to_string(),
        )
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Run to completion inside `working_dir` with no standard input.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the program cannot start and
    /// [`Error::CommandFailed`] if it exits unsuccessfully.
    pub fn run_in(&self, working_dir: &Path) -> Result<()> {
        debug!(program = %self.program.display(), cwd = %working_dir.display(), "running");
        let output = self
            .command()
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| self.spawn_error(source))?;
        check_status(&self.name(), output.status, &output.stderr)
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.name(),
            source,
        }
    }
}

/// An input file fed through an optional decompressor into an unpacker.
///
/// Equivalent to `decompress < input | unpack` (or `unpack < input`) with the
/// unpacker's working directory set to the extraction target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    input: PathBuf,
    decompress: Option<Invocation>,
    unpack: Invocation,
}

impl Pipeline {
    pub fn new(input: impl Into<PathBuf>, unpack: Invocation) -> Self {
        Self {
            input: input.into(),
            decompress: None,
            unpack,
        }
    }

    #[must_use]
    pub fn with_decompression(mut self, decompress: Invocation) -> Self {
        self.decompress = Some(decompress);
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn decompress(&self) -> Option<&Invocation> {
        self.decompress.as_ref()
    }

    pub fn unpack(&self) -> &Invocation {
        &self.unpack
    }

    pub fn is_compressed(&self) -> bool {
        self.decompress.is_some()
    }

    /// Run the pipeline, unpacking into `working_dir`. Blocks until every stage exits.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the input cannot be opened, [`Error::Spawn`] if a
    /// stage cannot start and [`Error::CommandFailed`] for the first stage that
    /// exits unsuccessfully.
    pub fn run(&self, working_dir: &Path) -> Result<()> {
        let input = File::open(&self.input)?;
        debug!(
            input = %self.input.display(),
            unpack = %self.unpack.program.display(),
            compressed = self.is_compressed(),
            cwd = %working_dir.display(),
            "running pipeline"
        );

        let Some(decompress) = &self.decompress else {
            let output = self
                .unpack_command(working_dir)
                .stdin(input)
                .output()
                .map_err(|source| self.unpack.spawn_error(source))?;
            return check_status(&self.unpack.name(), output.status, &output.stderr);
        };

        let mut producer = decompress
            .command()
            .stdin(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| decompress.spawn_error(source))?;

        let Some(stream) = producer.stdout.take() else {
            reap(&mut producer);
            return Err(Error::Spawn {
                program: decompress.name(),
                source: std::io::Error::other("standard output was not captured"),
            });
        };

        let consumer = match self.unpack_command(working_dir).stdin(stream).output() {
            Ok(output) => output,
            Err(source) => {
                reap(&mut producer);
                return Err(self.unpack.spawn_error(source));
            }
        };
        let producer = producer
            .wait_with_output()
            .map_err(|source| decompress.spawn_error(source))?;

        check_status(&decompress.name(), producer.status, &producer.stderr)?;
        check_status(&self.unpack.name(), consumer.status, &consumer.stderr)
    }

    fn unpack_command(&self, working_dir: &Path) -> Command {
        let mut command = self.unpack.command();
        command
            .current_dir(working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

/// Kill and wait for a child whose consumer never started.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn check_status(program: &str, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(Error::CommandFailed {
        program: program.to_string(),
        status,
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_collects_args() {
        let inv = Invocation::new("/usr/bin/cpio").args(["-i", "--quiet"]).arg("-d");
        assert_eq!(inv.program(), Path::new("/usr/bin/cpio"));
        assert_eq!(inv.arguments(), &["-i", "--quiet", "-d"]);
        assert_eq!(inv.name(), "cpio");
    }

    #[test]
    fn test_pipeline_without_decompression() {
        let pipeline = Pipeline::new("Archive.pax", Invocation::new("pax").arg("-r"));
        assert!(!pipeline.is_compressed());
        assert!(pipeline.decompress().is_none());
        assert_eq!(pipeline.input(), Path::new("Archive.pax"));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipeline_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(dir.path().join("absent"), Invocation::new("/bin/cat"));
        assert!(matches!(pipeline.run(dir.path()), Err(Error::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let err = Invocation::new("/bin/sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run_in(dir.path())
            .unwrap_err();
        match err {
            Error::CommandFailed { program, status, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_pipeline_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "payload").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        Pipeline::new(&input, Invocation::new("/bin/sh").args(["-c", "cat > copied"]))
            .with_decompression(Invocation::new("/bin/cat"))
            .run(&out)
            .unwrap();

        assert_eq!(std::fs::read_to_string(out.join("copied")).unwrap(), "payload");
    }
}
