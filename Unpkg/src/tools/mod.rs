//! External unarchiving programs
//!
//! `unpkg` never decodes xar, gzip, cpio or pax data itself. Each format is
//! handed to a system program, located through `PATH` (or an explicit path
//! from the config file) when it is first needed.

mod pipeline;

use std::path::PathBuf;

pub use pipeline::{Invocation, Pipeline};

use crate::config::ToolsConfig;
use crate::error::{Error, Result};

/// The external programs `unpkg` drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Expands a flat (xar) package into a directory.
    Xar,
    /// Unpacks a cpio stream read from standard input.
    Cpio,
    /// Decompresses a gzip stream from standard input to standard output.
    Gzip,
    /// Unpacks a pax archive read from standard input.
    Pax,
}

impl Tool {
    /// Program name looked up on `PATH` when nothing is configured.
    pub const fn default_program(self) -> &'static str {
        match self {
            Tool::Xar => "xar",
            Tool::Cpio => "cpio",
            Tool::Gzip => "gzip",
            Tool::Pax => "pax",
        }
    }

    /// Fixed leading arguments for this tool.
    pub const fn args(self) -> &'static [&'static str] {
        match self {
            Tool::Xar => &["-xf"],
            Tool::Cpio => &["-i", "-d", "-m", "--quiet"],
            Tool::Gzip => &["-dc"],
            Tool::Pax => &["-r"],
        }
    }
}

/// Program names (or paths) for every [`Tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    xar: String,
    cpio: String,
    gzip: String,
    pax: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            xar: Tool::Xar.default_program().to_string(),
            cpio: Tool::Cpio.default_program().to_string(),
            gzip: Tool::Gzip.default_program().to_string(),
            pax: Tool::Pax.default_program().to_string(),
        }
    }
}

impl Toolchain {
    /// Build a toolchain from the `[tools]` config section.
    pub fn from_config(config: &ToolsConfig) -> Self {
        let mut toolchain = Self::default();
        for (tool, program) in [
            (Tool::Xar, &config.xar),
            (Tool::Cpio, &config.cpio),
            (Tool::Gzip, &config.gzip),
            (Tool::Pax, &config.pax),
        ] {
            if let Some(program) = program {
                toolchain = toolchain.with_program(tool, shellexpand::tilde(program));
            }
        }
        toolchain
    }

    /// Replace the program used for `tool`.
    #[must_use]
    pub fn with_program(mut self, tool: Tool, program: impl Into<String>) -> Self {
        *self.slot(tool) = program.into();
        self
    }

    /// The configured program name or path for `tool`.
    pub fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Xar => &self.xar,
            Tool::Cpio => &self.cpio,
            Tool::Gzip => &self.gzip,
            Tool::Pax => &self.pax,
        }
    }

    fn slot(&mut self, tool: Tool) -> &mut String {
        match tool {
            Tool::Xar => &mut self.xar,
            Tool::Cpio => &mut self.cpio,
            Tool::Gzip => &mut self.gzip,
            Tool::Pax => &mut self.pax,
        }
    }

    /// Resolve `tool` to an executable path.
    ///
    /// # Errors
    /// Returns [`Error::ToolNotFound`] if the program is not on `PATH` or is not executable.
    pub fn locate(&self, tool: Tool) -> Result<PathBuf> {
        let program = self.program(tool);
        which::which(program).map_err(|source| Error::ToolNotFound {
            tool: program.to_string(),
            source,
        })
    }

    /// A ready-to-run invocation of `tool` with its fixed arguments.
    pub fn invocation(&self, tool: Tool) -> Result<Invocation> {
        Ok(Invocation::new(self.locate(tool)?).args(tool.args()))
    }
}
