// Derived from code in LLVM, which is:
// Part of the LLVM Project, under the Apache License v2.0 with LLVM Exceptions.
// See https://llvm.org/LICENSE.txt for license information.
// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

//! Standard, GNU, BSD and thin archives, whose headers follow each other.

use tracing::debug;

use crate::alignment::pad2;
use crate::archive::HeaderReader;
use crate::cursor::SharedCursor;
use crate::error::{Error, Result};
use crate::header::{self, ArchiveHeader, HeaderKind, GLOBAL_HEADER_LEN, HEADER_LEN};
use crate::name_table::LongNameTable;

pub(crate) struct SequentialReader {
    /// Thin archives keep member content in external files.
    thin: bool,
    names: Option<LongNameTable>,
}

impl SequentialReader {
    pub(crate) fn new(thin: bool) -> Self {
        SequentialReader { thin, names: None }
    }

    fn read_name_table(&mut self, cursor: &SharedCursor<'_>, size: u64) -> Result<()> {
        let content = cursor.read(size)?;
        if u64::try_from(content.len()).unwrap_or(u64::MAX) != size {
            return Err(Error::format("file too short to fit the names table"));
        }
        self.names = Some(LongNameTable::parse(&content));
        Ok(())
    }

    /// Fills in the final name of BSD and GNU extended headers. The cursor
    /// must sit right after the fixed header.
    fn resolve_name(&self, cursor: &SharedCursor<'_>, header: &mut ArchiveHeader) -> Result<()> {
        match header.kind {
            HeaderKind::BsdExtendedName { name_len } => {
                let mut name = cursor.read(name_len)?;
                if u64::try_from(name.len()).unwrap_or(u64::MAX) != name_len {
                    return Err(Error::format("file too short to fit the BSD file name"));
                }
                // Darwin pads the inline name with NULs.
                while name.last() == Some(&0) {
                    name.pop();
                }
                header.name = Some(name);
            }
            HeaderKind::GnuExtendedName { table_offset } => {
                let names = self.names.as_ref().ok_or_else(|| {
                    Error::format(format!(
                        "name references an offset absent from the index: {table_offset}"
                    ))
                })?;
                header.name = Some(names.resolve(table_offset)?.to_vec());
            }
            HeaderKind::Normal
            | HeaderKind::GnuNameTable
            | HeaderKind::GnuSymbolTable
            | HeaderKind::AixNormal => {}
        }
        Ok(())
    }
}

impl HeaderReader for SequentialReader {
    fn first_header_offset(&self) -> Option<u64> {
        Some(GLOBAL_HEADER_LEN)
    }

    fn read_header(
        &mut self,
        cursor: &SharedCursor<'_>,
        offset: u64,
    ) -> Result<Option<ArchiveHeader>> {
        let buf = cursor.read_at(offset, HEADER_LEN)?;
        if buf.is_empty() {
            return Ok(None);
        }
        if u64::try_from(buf.len()).unwrap_or(0) < HEADER_LEN {
            return Err(Error::format("file header too short"));
        }

        let mut header = header::parse_header(&buf, offset)?;
        if header.kind == HeaderKind::GnuNameTable && self.names.is_none() {
            self.read_name_table(cursor, header.size)?;
        }
        self.resolve_name(cursor, &mut header)?;

        debug!(
            offset,
            kind = %header.kind,
            size = header.size,
            name = %String::from_utf8_lossy(header.name()),
            "decoded member header"
        );
        Ok(Some(header))
    }

    fn next_header_offset(&mut self, header: &ArchiveHeader) -> Result<Option<u64>> {
        let stored = if self.thin && header.kind.has_data() {
            0
        } else {
            header.size
        };
        Ok(Some(pad2(header.data_offset + stored)))
    }
}
