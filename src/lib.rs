//! A reader for Unix `ar` archives.
//!
//! Supports GNU and BSD long file names, thin archives whose members live in
//! external files, and the AIX big archive format. Archives can be read from
//! seekable sources or from forward-only streams.
//!
//! ```no_run
//! use ar_archive_reader::Archive;
//!
//! let mut archive = Archive::open("libfoo.a")?;
//! archive.read_all_headers()?;
//! for name in archive.names() {
//!     println!("{}", String::from_utf8_lossy(name));
//! }
//! let contents = archive.open_member("foo.o")?.read_all()?;
//! # let _ = contents;
//! # Ok::<(), ar_archive_reader::Error>(())
//! ```

mod aix;
mod alignment;
mod archive;
mod cursor;
mod error;
mod header;
mod member;
mod name_table;
mod options;
mod sequential;

pub use aix::AixGlobalHeader;
pub use archive::{Archive, ArchiveKind, Members};
pub use error::{Error, Result};
pub use header::{ArchiveHeader, HeaderKind};
pub use member::ArchiveMember;
pub use options::OpenOptions;
