// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

//! Positioned access to the byte source behind an archive.

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_SKIP_CHUNK_SIZE: usize = 8 * 1024;

pub(crate) trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

pub(crate) enum Source<'a> {
    Seekable(Box<dyn ReadSeek + 'a>),
    /// Forward-only; seeks are emulated by discarding bytes.
    Stream(Box<dyn Read + 'a>),
}

pub(crate) struct ByteCursor<'a> {
    source: Option<Source<'a>>,
    seekable: bool,
    position: u64,
    eof: bool,
    skip_chunk_size: u64,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(source: Source<'a>, skip_chunk_size: usize) -> Self {
        ByteCursor {
            seekable: matches!(source, Source::Seekable(_)),
            source: Some(source),
            position: 0,
            eof: false,
            skip_chunk_size: u64::try_from(skip_chunk_size.max(1)).unwrap_or(u64::MAX),
        }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn is_seekable(&self) -> bool {
        self.seekable
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.eof
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    pub(crate) fn close(&mut self) {
        self.source = None;
    }

    fn reader(&mut self) -> Result<&mut dyn Read> {
        match self.source.as_mut() {
            Some(Source::Seekable(reader)) => Ok(reader),
            Some(Source::Stream(reader)) => Ok(reader),
            None => Err(Error::Closed),
        }
    }

    /// Reads `len` bytes, or fewer if the input ends first.
    pub(crate) fn read(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = self.reader()?.take(len).read_to_end(&mut buf)?;
        let read = u64::try_from(read).unwrap_or(u64::MAX);
        self.position += read;
        if read < len {
            self.eof = true;
        }
        Ok(buf)
    }

    /// Moves to the absolute `offset`. Stream sources can only move forward.
    pub(crate) fn seek(&mut self, offset: u64) -> Result<()> {
        match self.source.as_mut().ok_or(Error::Closed)? {
            Source::Seekable(reader) => {
                reader.seek(SeekFrom::Start(offset))?;
                self.position = offset;
                self.eof = false;
            }
            Source::Stream(reader) => {
                if offset < self.position {
                    return Err(Error::access(format!(
                        "cannot rewind a stream source from {} to {offset}",
                        self.position
                    )));
                }
                while self.position < offset {
                    let chunk = self.skip_chunk_size.min(offset - self.position);
                    let skipped = io::copy(&mut reader.by_ref().take(chunk), &mut io::sink())?;
                    trace!(from = self.position, skipped, "skipped stream bytes");
                    self.position += skipped;
                    if skipped < chunk {
                        self.eof = true;
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Handle to the one cursor of an archive, shared by the archive and every
/// member view it hands out. All holders move the same read position, so
/// reads through different handles must not be interleaved.
#[derive(Clone)]
pub(crate) struct SharedCursor<'a>(Rc<RefCell<ByteCursor<'a>>>);

impl<'a> SharedCursor<'a> {
    pub(crate) fn new(cursor: ByteCursor<'a>) -> Self {
        SharedCursor(Rc::new(RefCell::new(cursor)))
    }

    /// Positions the cursor at `offset` and reads up to `len` bytes.
    pub(crate) fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut cursor = self.0.borrow_mut();
        cursor.seek(offset)?;
        cursor.read(len)
    }

    /// Continues reading from the current position.
    pub(crate) fn read(&self, len: u64) -> Result<Vec<u8>> {
        self.0.borrow_mut().read(len)
    }

    pub(crate) fn position(&self) -> u64 {
        self.0.borrow().position()
    }

    pub(crate) fn is_seekable(&self) -> bool {
        self.0.borrow().is_seekable()
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.0.borrow().is_eof()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.0.borrow().is_closed()
    }

    pub(crate) fn close(&self) {
        self.0.borrow_mut().close();
    }
}
