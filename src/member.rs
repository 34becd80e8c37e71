// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::cursor::SharedCursor;
use crate::error::{Error, Result};
use crate::header::ArchiveHeader;

enum Backing {
    /// Content stored inside the archive, read through the shared cursor.
    Archive,
    /// Thin archive member stored next to the archive.
    External(Option<PathBuf>),
}

/// A view over the content of one archive member.
///
/// Views of the same archive share its cursor: each read repositions it, so
/// reads through different views must not be interleaved with each other or
/// with header reads. Views of thin archive members open their file on every
/// read and are not subject to this.
pub struct ArchiveMember<'a> {
    header: ArchiveHeader,
    cursor: SharedCursor<'a>,
    backing: Backing,
    read_offset: u64,
}

impl<'a> ArchiveMember<'a> {
    pub(crate) fn new(header: ArchiveHeader, cursor: SharedCursor<'a>) -> Self {
        ArchiveMember {
            header,
            cursor,
            backing: Backing::Archive,
            read_offset: 0,
        }
    }

    pub(crate) fn external(
        header: ArchiveHeader,
        cursor: SharedCursor<'a>,
        path: Option<PathBuf>,
    ) -> Self {
        ArchiveMember {
            header,
            cursor,
            backing: Backing::External(path),
            read_offset: 0,
        }
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn name(&self) -> &[u8] {
        self.header.name()
    }

    pub fn size(&self) -> u64 {
        self.header.size
    }

    /// Path of the external file backing a thin archive member.
    pub fn external_path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::External(path) => path.as_deref(),
            Backing::Archive => None,
        }
    }

    /// Current position within the member.
    pub fn tell(&self) -> u64 {
        self.read_offset
    }

    /// Whether the member can be re-read or positioned backwards.
    pub fn seekable(&self) -> bool {
        match self.backing {
            Backing::Archive => self.cursor.is_seekable(),
            Backing::External(_) => true,
        }
    }

    /// Reads up to `limit` bytes from the current position, or everything
    /// left when `limit` is `None`.
    pub fn read_bytes(&mut self, limit: Option<u64>) -> Result<Vec<u8>> {
        if self.cursor.is_closed() {
            return Err(Error::Closed);
        }
        let remaining = self.header.size - self.read_offset;
        let len = limit.map_or(remaining, |limit| limit.min(remaining));
        if len == 0 {
            return Ok(Vec::new());
        }
        let data = match &self.backing {
            Backing::Archive => self
                .cursor
                .read_at(self.header.data_offset + self.read_offset, len)?,
            Backing::External(path) => read_external(path.as_deref(), self.read_offset, len)?,
        };
        if u64::try_from(data.len()).unwrap_or(0) < len {
            return Err(Error::access(format!(
                "incorrect archive file: {} holds {} of {len} requested bytes",
                String::from_utf8_lossy(self.name()),
                data.len()
            )));
        }
        self.read_offset += len;
        Ok(data)
    }

    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        self.read_bytes(None)
    }

    /// Moves the read position. `whence` is `0` for an absolute offset, `1`
    /// relative to the current position and `2` relative to the end. Returns
    /// the new position.
    pub fn seek_whence(&mut self, offset: i64, whence: u32) -> Result<u64> {
        let base = match whence {
            0 => 0,
            1 => self.read_offset,
            2 => self.header.size,
            _ => return Err(Error::access(format!("invalid seek whence {whence}"))),
        };
        let target = i128::from(base) + i128::from(offset);
        if target < 0 || target > i128::from(self.header.size) {
            return Err(Error::access(format!(
                "incorrect file position {target} (member size {})",
                self.header.size
            )));
        }
        self.read_offset = u64::try_from(target)
            .map_err(|_| Error::access(format!("incorrect file position {target}")))?;
        Ok(self.read_offset)
    }
}

fn read_external(path: Option<&Path>, offset: u64, len: u64) -> Result<Vec<u8>> {
    let path = path.ok_or_else(|| {
        Error::access("thin archive member cannot be located without a base directory")
    })?;
    let annotate = |err: io::Error| Error::access(format!("{}: {err}", path.display()));
    let mut file = File::open(path).map_err(annotate)?;
    file.seek(SeekFrom::Start(offset)).map_err(annotate)?;
    let mut data = Vec::new();
    file.take(len).read_to_end(&mut data).map_err(annotate)?;
    Ok(data)
}

impl Read for ArchiveMember<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.read_bytes(Some(u64::try_from(buf.len()).unwrap_or(u64::MAX)))?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl Seek for ArchiveMember<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset out of range")
                })?,
                0,
            ),
            SeekFrom::Current(offset) => (offset, 1),
            SeekFrom::End(offset) => (offset, 2),
        };
        Ok(self.seek_whence(offset, whence)?)
    }
}

impl fmt::Debug for ArchiveMember<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveMember")
            .field("header", &self.header)
            .field("external_path", &self.external_path())
            .field("read_offset", &self.read_offset)
            .finish()
    }
}
