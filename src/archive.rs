// Derived from code in LLVM, which is:
// Part of the LLVM Project, under the Apache License v2.0 with LLVM Exceptions.
// See https://llvm.org/LICENSE.txt for license information.
// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use object::archive;
use tracing::debug;

use crate::aix::{AixGlobalHeader, LinkedReader};
use crate::cursor::{ByteCursor, SharedCursor, Source};
use crate::error::{Error, Result};
use crate::header::{ArchiveHeader, GLOBAL_HEADER_LEN};
use crate::member::ArchiveMember;
use crate::options::OpenOptions;
use crate::sequential::SequentialReader;

/// The archive layout, as announced by the global magic.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `!<arch>\n`: GNU, BSD or System V members stored back to back.
    Standard,
    /// `!<thin>\n`: headers only, member content lives in external files.
    Thin,
    /// `<bigaf>\n`: AIX big archive with a linked member list.
    AixBig,
}

/// Source of the ids that tie headers to the archive that decoded them.
static NEXT_ARCHIVE_ID: AtomicU64 = AtomicU64::new(1);

/// Decodes the member headers of one archive layout.
pub(crate) trait HeaderReader {
    /// Offset of the first member header, `None` if there is none.
    fn first_header_offset(&self) -> Option<u64>;

    /// Decodes the header stored at `offset`. Returns `None` when no bytes are
    /// left at `offset`.
    fn read_header(
        &mut self,
        cursor: &SharedCursor<'_>,
        offset: u64,
    ) -> Result<Option<ArchiveHeader>>;

    /// Offset of the header that follows `header`, `None` at the end of the
    /// member list. Called once per header, in archive order.
    fn next_header_offset(&mut self, header: &ArchiveHeader) -> Result<Option<u64>>;
}

/// A read-only `ar` archive.
///
/// Headers are decoded lazily, either one at a time with
/// [`read_next_header`](Archive::read_next_header) or all at once with
/// [`read_all_headers`](Archive::read_all_headers).
pub struct Archive<'a> {
    id: u64,
    cursor: SharedCursor<'a>,
    reader: Box<dyn HeaderReader>,
    kind: ArchiveKind,
    aix_global_header: Option<AixGlobalHeader>,
    /// `None` once the member list is exhausted.
    next_header_offset: Option<u64>,
    headers: Vec<ArchiveHeader>,
    /// Name to position in `headers`. Later duplicates replace earlier ones.
    index: HashMap<Vec<u8>, usize>,
    thin_base_dir: Option<PathBuf>,
}

impl<'a> Archive<'a> {
    /// Opens the archive file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        OpenOptions::new().path(path).open()
    }

    /// Reads an archive from a seekable source.
    pub fn new<R: Read + Seek + 'a>(reader: R) -> Result<Self> {
        OpenOptions::new().reader(reader).open()
    }

    /// Reads an archive from a forward-only source. Members must be read in
    /// archive order.
    pub fn from_stream<R: Read + 'a>(reader: R) -> Result<Self> {
        OpenOptions::new().stream(reader).open()
    }

    pub(crate) fn from_source(
        source: Source<'a>,
        thin_base_dir: Option<PathBuf>,
        skip_chunk_size: usize,
    ) -> Result<Self> {
        let cursor = SharedCursor::new(ByteCursor::new(source, skip_chunk_size));
        let mut magic = cursor.read(GLOBAL_HEADER_LEN)?;

        let mut aix_global_header = None;
        let (kind, reader): (ArchiveKind, Box<dyn HeaderReader>) = if magic == archive::MAGIC {
            (ArchiveKind::Standard, Box::new(SequentialReader::new(false)))
        } else if magic == archive::THIN_MAGIC {
            (ArchiveKind::Thin, Box::new(SequentialReader::new(true)))
        } else if magic == archive::AIX_BIG_MAGIC {
            magic.extend(cursor.read(AixGlobalHeader::LEN - GLOBAL_HEADER_LEN)?);
            let global = AixGlobalHeader::parse(&magic)?;
            aix_global_header = Some(global);
            (ArchiveKind::AixBig, Box::new(LinkedReader::new(global)))
        } else {
            return Err(Error::format("file is missing the global header"));
        };

        debug!(?kind, seekable = cursor.is_seekable(), "opened archive");
        Ok(Archive {
            id: NEXT_ARCHIVE_ID.fetch_add(1, Ordering::Relaxed),
            next_header_offset: reader.first_header_offset(),
            cursor,
            reader,
            kind,
            aix_global_header,
            headers: Vec::new(),
            index: HashMap::new(),
            thin_base_dir,
        })
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// The global header of an AIX big archive.
    pub fn aix_global_header(&self) -> Option<&AixGlobalHeader> {
        self.aix_global_header.as_ref()
    }

    /// Absolute position of the underlying cursor.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Offset where the next header will be read, `None` once all headers
    /// have been read.
    pub fn next_header_offset(&self) -> Option<u64> {
        self.next_header_offset
    }

    /// Whether the underlying source ran out of bytes.
    pub fn is_eof(&self) -> bool {
        self.cursor.is_eof()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.cursor.is_closed() {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    /// Decodes the header at an arbitrary `offset` without registering it or
    /// moving the position of the next header.
    pub fn read_header_at(&mut self, offset: u64) -> Result<Option<ArchiveHeader>> {
        self.ensure_open()?;
        let header = self.reader.read_header(&self.cursor, offset)?;
        Ok(header.map(|header| self.stamp(header)))
    }

    fn stamp(&self, mut header: ArchiveHeader) -> ArchiveHeader {
        header.archive_id = self.id;
        header
    }

    /// Reads the next header in archive order. Returns `None` once every
    /// header has been read.
    pub fn read_next_header(&mut self) -> Result<Option<&ArchiveHeader>> {
        self.ensure_open()?;
        let Some(offset) = self.next_header_offset else {
            return Ok(None);
        };
        let Some(header) = self.reader.read_header(&self.cursor, offset)? else {
            self.next_header_offset = None;
            return Ok(None);
        };
        let header = self.stamp(header);

        self.next_header_offset = self.reader.next_header_offset(&header)?;
        if header.kind.has_data() {
            if let Some(name) = &header.name {
                self.index.insert(name.clone(), self.headers.len());
            }
        }
        self.headers.push(header);
        Ok(self.headers.last())
    }

    pub fn read_all_headers(&mut self) -> Result<()> {
        while self.read_next_header()?.is_some() {}
        Ok(())
    }

    /// Every header read so far, in archive order, including the GNU special
    /// members and duplicate names.
    pub fn headers(&self) -> &[ArchiveHeader] {
        &self.headers
    }

    /// Names of the members read so far, in archive order. Duplicates are kept.
    pub fn names(&self) -> Vec<&[u8]> {
        self.headers
            .iter()
            .filter(|header| header.kind.has_data())
            .map(ArchiveHeader::name)
            .collect()
    }

    /// Opens the member registered under `name`. With duplicate names, the
    /// last one read wins.
    pub fn open_member(&self, name: impl AsRef<[u8]>) -> Result<ArchiveMember<'a>> {
        self.ensure_open()?;
        let name = name.as_ref();
        let &position = self
            .index
            .get(name)
            .ok_or_else(|| Error::MemberNotFound(name.to_vec()))?;
        Ok(self.member_for(&self.headers[position]))
    }

    /// Opens the member described by a header previously read from this
    /// archive.
    pub fn open_header(&self, header: &ArchiveHeader) -> Result<ArchiveMember<'a>> {
        self.ensure_open()?;
        if header.archive_id != self.id || !self.headers.contains(header) {
            return Err(Error::HeaderMismatch);
        }
        if !header.kind.has_data() {
            return Err(Error::access(format!(
                "{} member has no readable content",
                header.kind
            )));
        }
        Ok(self.member_for(header))
    }

    fn member_for(&self, header: &ArchiveHeader) -> ArchiveMember<'a> {
        if self.kind == ArchiveKind::Thin {
            let name = String::from_utf8_lossy(header.name()).into_owned();
            let path = self.thin_base_dir.as_ref().map(|dir| dir.join(name));
            ArchiveMember::external(header.clone(), self.cursor.clone(), path)
        } else {
            ArchiveMember::new(header.clone(), self.cursor.clone())
        }
    }

    /// Iterates over the members with content, starting with the ones already
    /// read and then decoding further headers as needed.
    pub fn members(&mut self) -> Members<'_, 'a> {
        Members {
            archive: self,
            position: 0,
            failed: false,
        }
    }

    /// Releases the underlying source. Members opened from this archive fail
    /// to read afterwards.
    pub fn close(&mut self) {
        if !self.cursor.is_closed() {
            debug!(headers = self.headers.len(), "closing archive");
            self.cursor.close();
        }
    }
}

impl Drop for Archive<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Archive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("kind", &self.kind)
            .field("next_header_offset", &self.next_header_offset)
            .field("headers", &self.headers.len())
            .field("closed", &self.cursor.is_closed())
            .finish()
    }
}

/// Iterator over the members of an [`Archive`], see [`Archive::members`].
pub struct Members<'r, 'a> {
    archive: &'r mut Archive<'a>,
    position: usize,
    failed: bool,
}

impl<'a> Iterator for Members<'_, 'a> {
    type Item = Result<ArchiveMember<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(header) = self.archive.headers.get(self.position) {
                self.position += 1;
                if header.kind.has_data() {
                    return Some(Ok(self.archive.member_for(header)));
                }
                continue;
            }
            match self.archive.read_next_header() {
                Ok(Some(_)) => {}
                Ok(None) => return None,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
