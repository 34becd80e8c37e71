// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::archive::Archive;
use crate::cursor::{Source, DEFAULT_SKIP_CHUNK_SIZE};
use crate::error::{Error, Result};

enum Input<'a> {
    Path(PathBuf),
    Source(Source<'a>),
}

/// Options for opening an [`Archive`].
///
/// ```no_run
/// use ar_archive_reader::OpenOptions;
///
/// let mut archive = OpenOptions::new()
///     .path("libfoo.a")
///     .skip_chunk_size(64 * 1024)
///     .open()?;
/// archive.read_all_headers()?;
/// # Ok::<(), ar_archive_reader::Error>(())
/// ```
pub struct OpenOptions<'a> {
    input: Option<Input<'a>>,
    thin_base_dir: Option<PathBuf>,
    skip_chunk_size: usize,
}

impl<'a> OpenOptions<'a> {
    pub fn new() -> Self {
        OpenOptions {
            input: None,
            thin_base_dir: None,
            skip_chunk_size: DEFAULT_SKIP_CHUNK_SIZE,
        }
    }

    /// Reads the archive file at `path`. Thin archive members are looked up
    /// relative to its directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.input = Some(Input::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Reads the archive from a seekable source.
    pub fn reader<R: Read + Seek + 'a>(mut self, reader: R) -> Self {
        self.input = Some(Input::Source(Source::Seekable(Box::new(reader))));
        self
    }

    /// Reads the archive from a forward-only source.
    pub fn stream<R: Read + 'a>(mut self, reader: R) -> Self {
        self.input = Some(Input::Source(Source::Stream(Box::new(reader))));
        self
    }

    /// Directory that thin archive member names are relative to. Defaults to
    /// the directory of the archive file when opened by path.
    pub fn thin_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.thin_base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Largest number of bytes discarded at once when a forward-only source
    /// has to skip ahead.
    pub fn skip_chunk_size(mut self, size: usize) -> Self {
        self.skip_chunk_size = size;
        self
    }

    pub fn open(self) -> Result<Archive<'a>> {
        let (source, thin_base_dir) = match self.input {
            None => return Err(Error::format("neither a path nor a stream was given")),
            Some(Input::Path(path)) => {
                let file = File::open(&path)?;
                let thin_base_dir = self
                    .thin_base_dir
                    .or_else(|| path.parent().map(Path::to_path_buf));
                (Source::Seekable(Box::new(file)), thin_base_dir)
            }
            Some(Input::Source(source)) => (source, self.thin_base_dir),
        };
        Archive::from_source(source, thin_base_dir, self.skip_chunk_size)
    }
}

impl Default for OpenOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}
