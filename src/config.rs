//! Command-line configuration for the `stl-thumbnail` tool.
//!
//! Options follow getopt conventions: `-i <input>`, `-o <output>` and
//! `-s <size>`, with the value either in the next argument or attached to the
//! flag (`-s256`). Parsing stops at the first argument that is not an option
//! (or at `--`); anything after it is ignored.
//!
//! # Examples
//! ```
//! use stl_thumbnail::config::Config;
//!
//! let config = Config::from_args(["-i", "part.stl", "-o", "part.png"]).unwrap();
//! assert_eq!(config.size, Config::DEFAULT_SIZE);
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

/// Errors in the command-line arguments.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing input file (-i)")]
    MissingInput,
    #[error("missing output file (-o)")]
    MissingOutput,
    #[error("option requires an argument -- '{0}'")]
    MissingValue(char),
    #[error("unrecognized option '{0}'")]
    UnknownOption(String),
    #[error("invalid size '{0}': expected a positive number of pixels")]
    InvalidSize(String),
    #[error("value attached to -{0} is not valid Unicode; pass it as a separate argument")]
    NonUnicodeValue(char),
}

impl UsageError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            UsageError::MissingInput | UsageError::MissingOutput => 1,
            _ => 2,
        }
    }
}

/// Returns the one-line usage text.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {} -i <input STL file> -o <output PNG file> [-s SIZE]",
        program
    )
}

/// Everything one invocation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Side length of the square thumbnail in pixels.
    pub size: u32,
}

impl Config {
    pub const DEFAULT_SIZE: u32 = 800;

    /// Parses arguments, not including the program name.
    ///
    /// Values given as separate arguments are taken as-is, so `-i`/`-o` paths
    /// need not be valid Unicode.
    ///
    /// # Errors
    /// Returns a [`UsageError`] for unknown options, missing values, a bad
    /// size, or when `-i`/`-o` were not given.
    pub fn from_args<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut input = None;
        let mut output = None;
        let mut size = Config::DEFAULT_SIZE;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            let text = arg.to_string_lossy();
            let mut chars = text.chars();
            let flag = match (chars.next(), chars.next()) {
                (Some('-'), Some(flag)) if text != "--" => flag,
                _ => break,
            };
            if !matches!(flag, 'i' | 'o' | 's') {
                return Err(UsageError::UnknownOption(text.into_owned()));
            }

            let value = if chars.as_str().is_empty() {
                args.next().ok_or(UsageError::MissingValue(flag))?
            } else {
                let attached = arg.to_str().ok_or(UsageError::NonUnicodeValue(flag))?;
                OsString::from(&attached[2..])
            };

            match flag {
                'i' => input = Some(PathBuf::from(value)),
                'o' => output = Some(PathBuf::from(value)),
                _ => {
                    let value = value.to_string_lossy();
                    size = match value.parse::<u32>() {
                        Ok(s) if s > 0 => s,
                        _ => return Err(UsageError::InvalidSize(value.into_owned())),
                    }
                }
            }
        }

        Ok(Config {
            input: input.ok_or(UsageError::MissingInput)?,
            output: output.ok_or(UsageError::MissingOutput)?,
            size,
        })
    }
}
