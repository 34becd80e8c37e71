// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

//! Errors raised while decoding archives and reading their members.
//!
//! Every error is either a *format* error (the bytes do not follow the `ar`
//! encoding) or an *access* error (a member could not be positioned or read).
//! Use [`Error::is_format`] and [`Error::is_access`] to tell them apart.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The archive encoding is violated: bad magic, short header, non-numeric
    /// field, dangling long name reference.
    #[error("archive format error: {0}")]
    Format(String),

    /// Member data could not be positioned or read.
    #[error("archive access error: {0}")]
    Access(String),

    /// No member with this name was registered.
    #[error("no member named {:?} in the archive", String::from_utf8_lossy(.0))]
    MemberNotFound(Vec<u8>),

    /// The header was not produced by this archive.
    #[error("header does not belong to this archive")]
    HeaderMismatch,

    #[error("archive is closed")]
    Closed,

    /// The underlying byte source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn access(msg: impl Into<String>) -> Self {
        Error::Access(msg.into())
    }

    /// Returns true for structural violations of the archive encoding.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// Returns true for failures to locate or read member data.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            Error::Access(_) | Error::MemberNotFound(_) | Error::HeaderMismatch | Error::Closed
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            Error::Format(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            Error::Closed | Error::MemberNotFound(_) | Error::HeaderMismatch => {
                io::Error::new(io::ErrorKind::Other, err)
            }
            Error::Access(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
