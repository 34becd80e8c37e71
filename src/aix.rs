// Derived from code in LLVM, which is:
// Part of the LLVM Project, under the Apache License v2.0 with LLVM Exceptions.
// See https://llvm.org/LICENSE.txt for license information.
// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

//! The AIX big archive format.
//!
//! Members are chained through explicit `next_member` offsets stored in each
//! header, starting from the `first_member` offset of the global header. The
//! members need not be stored contiguously, so traversal never assumes that a
//! header follows the previous member's data.

use std::collections::HashSet;

use object::archive;
use tracing::debug;

use crate::alignment::pad2;
use crate::archive::HeaderReader;
use crate::cursor::SharedCursor;
use crate::error::{Error, Result};
use crate::header::{parse_decimal, parse_octal, parse_optional_decimal, ArchiveHeader, HeaderKind};

/// Length of the fixed portion of a member header.
pub(crate) const AIX_HEADER_LEN: u64 = 112;

/// The fixed-length header following the `<bigaf>\n` magic.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AixGlobalHeader {
    /// Offset to the member table.
    pub members: u64,
    /// Offset to the global symbol table.
    pub global_symbols: u64,
    /// Offset to the global symbol table for 64-bit objects.
    pub global_symbols_64: u64,
    /// Offset to the first member, `0` for an empty archive.
    pub first_member: u64,
    /// Offset to the last member.
    pub last_member: u64,
    /// Offset to the first member on the free list.
    pub first_free_member: u64,
}

impl AixGlobalHeader {
    /// Magic plus six 20-byte decimal fields.
    pub const LEN: u64 = 128;

    pub fn parse(data: &[u8]) -> Result<Self> {
        let (raw, _) = object::pod::from_bytes::<archive::AixFileHeader>(data)
            .map_err(|()| Error::format("file too short to be an AIX big archive"))?;
        if raw.magic != archive::AIX_BIG_MAGIC {
            return Err(Error::format("not an AIX big archive"));
        }
        Ok(AixGlobalHeader {
            members: parse_decimal("member table offset", &raw.memoff)?,
            global_symbols: parse_decimal("global symbol table offset", &raw.gstoff)?,
            global_symbols_64: parse_decimal("64-bit global symbol table offset", &raw.gst64off)?,
            first_member: parse_decimal("first member offset", &raw.fstmoff)?,
            last_member: parse_decimal("last member offset", &raw.lstmoff)?,
            first_free_member: parse_decimal("first free member offset", &raw.freeoff)?,
        })
    }
}

/// A member header whose variable-length name has not been read yet.
#[derive(Debug)]
pub(crate) struct PartialAixHeader {
    header: ArchiveHeader,
    filename_length: u64,
}

impl PartialAixHeader {
    pub(crate) fn parse(buf: &[u8], offset: u64) -> Result<Self> {
        let (raw, _) = object::pod::from_bytes::<archive::AixHeader>(buf)
            .map_err(|()| Error::format("file header too short"))?;
        let filename_length = parse_decimal("filename length", &raw.namlen)?;
        let mut partial = PartialAixHeader {
            header: ArchiveHeader {
                kind: HeaderKind::AixNormal,
                name: None,
                size: parse_decimal("size", &raw.size)?,
                timestamp: parse_decimal("timestamp", &raw.date)?,
                uid: parse_optional_decimal("uid", &raw.uid)?,
                gid: parse_optional_decimal("gid", &raw.gid)?,
                mode: parse_octal("mode", &raw.mode)?,
                header_offset: offset,
                data_offset: 0,
                raw_name: Vec::new(),
                next_member: Some(parse_decimal("next member offset", &raw.nxtmem)?),
                previous_member: Some(parse_decimal("previous member offset", &raw.prvmem)?),
                archive_id: 0,
            },
            filename_length,
        };
        partial.header.data_offset = offset + AIX_HEADER_LEN + partial.remaining_header_length();
        Ok(partial)
    }

    /// Name, alignment padding and the trailing "`\n".
    pub(crate) fn remaining_header_length(&self) -> u64 {
        pad2(self.filename_length + 2)
    }

    pub(crate) fn finish(mut self, rest: &[u8]) -> Result<ArchiveHeader> {
        let len = usize::try_from(self.remaining_header_length())
            .map_err(|_| Error::format("file header end too short"))?;
        let rest = rest
            .get(..len)
            .ok_or_else(|| Error::format("file header end too short"))?;
        if !rest.ends_with(&archive::TERMINATOR) {
            return Err(Error::format("bad ending for file header"));
        }
        // `len` is at least the name length plus the terminator.
        let name_len = usize::try_from(self.filename_length).unwrap_or(len);
        let name = rest[..name_len].to_vec();
        self.header.raw_name = name.clone();
        self.header.name = Some(name);
        Ok(self.header)
    }
}

pub(crate) struct LinkedReader {
    global: AixGlobalHeader,
    /// Header offsets reached so far by the traversal.
    visited: HashSet<u64>,
}

impl LinkedReader {
    pub(crate) fn new(global: AixGlobalHeader) -> Self {
        LinkedReader {
            global,
            visited: HashSet::new(),
        }
    }
}

impl HeaderReader for LinkedReader {
    fn first_header_offset(&self) -> Option<u64> {
        Some(self.global.first_member).filter(|&offset| offset != 0)
    }

    fn read_header(
        &mut self,
        cursor: &SharedCursor<'_>,
        offset: u64,
    ) -> Result<Option<ArchiveHeader>> {
        let buf = cursor.read_at(offset, AIX_HEADER_LEN)?;
        if buf.is_empty() {
            return Ok(None);
        }
        let partial = PartialAixHeader::parse(&buf, offset)?;
        let rest = cursor.read(partial.remaining_header_length())?;
        let header = partial.finish(&rest)?;

        debug!(
            offset,
            size = header.size,
            next_member = header.next_member,
            name = %String::from_utf8_lossy(header.name()),
            "decoded AIX member header"
        );
        Ok(Some(header))
    }

    fn next_header_offset(&mut self, header: &ArchiveHeader) -> Result<Option<u64>> {
        self.visited.insert(header.header_offset);
        if header.header_offset == self.global.last_member {
            return Ok(None);
        }
        match header.next_member.filter(|&offset| offset != 0) {
            Some(next) if self.visited.contains(&next) => Err(Error::format(format!(
                "AIX member list loops: member at {} links back to {next}",
                header.header_offset
            ))),
            next => Ok(next),
        }
    }
}
