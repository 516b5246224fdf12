//! Command-line Error Types
//!
//! Each variant names the step of a run that failed; the library error that
//! caused it hangs below it in the `exn` error tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not resolve settings")]
    Settings,
    #[display("could not load configuration from {}", _0.display())]
    Config(#[error(not(source))] PathBuf),
    #[display("could not open build output at {}", _0.display())]
    Storage(#[error(not(source))] PathBuf),
    #[display("could not generate manifest")]
    Generate,
    #[display("could not write manifest to {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}
