// Derived from code in LLVM, which is:
// Part of the LLVM Project, under the Apache License v2.0 with LLVM Exceptions.
// See https://llvm.org/LICENSE.txt for license information.
// SPDX-License-Identifier: Apache-2.0 WITH LLVM-exception

use std::fmt;

use object::archive;

use crate::error::{Error, Result};

/// Length of the global magic at the start of every archive.
pub(crate) const GLOBAL_HEADER_LEN: u64 = 8;

/// Length of a standard (GNU/BSD/thin) member header.
pub(crate) const HEADER_LEN: u64 = 60;

/// Classification of a member header, carrying whatever each kind needs to
/// resolve its final name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderKind {
    /// Name stored directly in the 16-byte name field.
    Normal,
    /// `#1/<len>`: the name follows the header and is counted in its size.
    BsdExtendedName { name_len: u64 },
    /// `/<offset>`: the name lives in the GNU long name table.
    GnuExtendedName { table_offset: u64 },
    /// `//`: the GNU long name table itself.
    GnuNameTable,
    /// `/` (or `/SYM64/`): the GNU symbol lookup table.
    GnuSymbolTable,
    /// A member of an AIX big archive.
    AixNormal,
}

impl HeaderKind {
    /// Returns true for kinds that describe a readable member.
    pub fn has_data(&self) -> bool {
        match self {
            HeaderKind::Normal
            | HeaderKind::BsdExtendedName { .. }
            | HeaderKind::GnuExtendedName { .. }
            | HeaderKind::AixNormal => true,
            HeaderKind::GnuNameTable | HeaderKind::GnuSymbolTable => false,
        }
    }

    fn classify(raw_name: &[u8]) -> Result<Self> {
        if let Some(len) = raw_name.strip_prefix(b"#1/") {
            Ok(HeaderKind::BsdExtendedName {
                name_len: parse_decimal("BSD name length", len)?,
            })
        } else if raw_name.starts_with(b"//") {
            Ok(HeaderKind::GnuNameTable)
        } else if matches!(trim_field(raw_name), b"/" | b"/SYM64/") {
            Ok(HeaderKind::GnuSymbolTable)
        } else if let Some(offset) = raw_name.strip_prefix(b"/") {
            Ok(HeaderKind::GnuExtendedName {
                table_offset: parse_decimal("GNU name offset", offset)?,
            })
        } else {
            Ok(HeaderKind::Normal)
        }
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderKind::Normal => "NORMAL",
            HeaderKind::BsdExtendedName { .. } => "BSD",
            HeaderKind::GnuExtendedName { .. } => "GNU",
            HeaderKind::GnuNameTable => "GNU_TABLE",
            HeaderKind::GnuSymbolTable => "GNU_SYMBOLS",
            HeaderKind::AixNormal => "AIX",
        };
        f.write_str(name)
    }
}

/// A decoded member header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub kind: HeaderKind,
    /// Resolved member name. `None` for the GNU special members.
    pub name: Option<Vec<u8>>,
    /// Size of the member content in bytes, excluding any inline BSD name.
    pub size: u64,
    pub timestamp: u64,
    /// `None` when the field is blank, as written by some Windows tools.
    pub uid: Option<u64>,
    pub gid: Option<u64>,
    pub mode: u32,
    /// Offset of the header itself.
    pub header_offset: u64,
    /// Offset of the first content byte.
    pub data_offset: u64,
    /// The name field as stored, before any resolution.
    pub raw_name: Vec<u8>,
    /// AIX only: the explicit links of the member list.
    pub next_member: Option<u64>,
    pub previous_member: Option<u64>,
    /// The archive handle that decoded this header.
    pub(crate) archive_id: u64,
}

impl ArchiveHeader {
    /// The resolved name, or an empty slice when the header has none.
    pub fn name(&self) -> &[u8] {
        self.name.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for ArchiveHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "<ArchiveHeader: {:?} type:{} size:{}>",
                String::from_utf8_lossy(name),
                self.kind,
                self.size
            ),
            None => write!(f, "<ArchiveHeader: type:{} size:{}>", self.kind, self.size),
        }
    }
}

/// Decodes the fixed 60-byte header found at `offset`.
///
/// BSD and GNU long names are left unresolved; only the data offset accounts
/// for the inline BSD name.
pub(crate) fn parse_header(buf: &[u8], offset: u64) -> Result<ArchiveHeader> {
    let (raw, _) = object::pod::from_bytes::<archive::Header>(buf)
        .map_err(|()| Error::format("file header too short"))?;
    if raw.terminator != archive::TERMINATOR {
        return Err(Error::format("file header magic doesn't match"));
    }

    let kind = HeaderKind::classify(&raw.name)?;
    let mut size = parse_decimal("size", &raw.size)?;

    let (mut timestamp, mut uid, mut gid, mut mode) = (0, None, None, 0);
    if kind.has_data() {
        timestamp = parse_decimal("timestamp", &raw.date)?;
        uid = parse_optional_decimal("uid", &raw.uid)?;
        gid = parse_optional_decimal("gid", &raw.gid)?;
        mode = parse_octal("mode", &raw.mode)?;
    }

    let mut name = None;
    let mut inline_name_len = 0;
    match kind {
        HeaderKind::Normal => {
            let trimmed = trim_trailing(&raw.name, b' ');
            name = Some(trimmed.strip_suffix(b"/").unwrap_or(trimmed).to_vec());
        }
        HeaderKind::BsdExtendedName { name_len } => {
            size = size.checked_sub(name_len).ok_or_else(|| {
                Error::format(format!(
                    "BSD name length {name_len} exceeds member size {size}"
                ))
            })?;
            inline_name_len = name_len;
        }
        HeaderKind::GnuExtendedName { .. }
        | HeaderKind::GnuNameTable
        | HeaderKind::GnuSymbolTable
        | HeaderKind::AixNormal => {}
    }

    Ok(ArchiveHeader {
        kind,
        name,
        size,
        timestamp,
        uid,
        gid,
        mode,
        header_offset: offset,
        data_offset: offset + HEADER_LEN + inline_name_len,
        raw_name: raw.name.to_vec(),
        next_member: None,
        previous_member: None,
        archive_id: 0,
    })
}

fn trim_trailing(bytes: &[u8], pad: u8) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != pad).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Strips the space (and, for AIX, NUL) padding around a numeric field.
fn trim_field(bytes: &[u8]) -> &[u8] {
    let is_pad = |b: &u8| *b == b' ' || *b == 0;
    let start = bytes.iter().position(|b| !is_pad(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_pad(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn parse_number(field: &str, bytes: &[u8], radix: u32) -> Result<u64> {
    let trimmed = trim_field(bytes);
    std::str::from_utf8(trimmed)
        .ok()
        .filter(|text| text.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|text| u64::from_str_radix(text, radix).ok())
        .ok_or_else(|| {
            Error::format(format!(
                "cannot convert file header field {field} ({:?}) to an integer",
                String::from_utf8_lossy(bytes)
            ))
        })
}

pub(crate) fn parse_decimal(field: &str, bytes: &[u8]) -> Result<u64> {
    parse_number(field, bytes, 10)
}

pub(crate) fn parse_optional_decimal(field: &str, bytes: &[u8]) -> Result<Option<u64>> {
    if trim_field(bytes).is_empty() {
        return Ok(None);
    }
    parse_decimal(field, bytes).map(Some)
}

pub(crate) fn parse_octal(field: &str, bytes: &[u8]) -> Result<u32> {
    let mode = parse_number(field, bytes, 8)?;
    u32::try_from(mode).map_err(|_| Error::format(format!("{field} {mode:o} is out of range")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw_header(name: &str, size: &str) -> Vec<u8> {
        format!("{name:<16}{:<12}{:<6}{:<6}{:<8}{size:<10}`\n", 1364071329, 1000, 100, 100644)
            .into_bytes()
    }

    #[test]
    fn normal_header_strips_gnu_slash() {
        let header = parse_header(&raw_header("file1/", "15"), 8).unwrap();
        assert_eq!(header.kind, HeaderKind::Normal);
        assert_eq!(header.name(), b"file1");
        assert_eq!(header.size, 15);
        assert_eq!(header.timestamp, 1364071329);
        assert_eq!(header.uid, Some(1000));
        assert_eq!(header.gid, Some(100));
        assert_eq!(header.mode, 0o100644);
        assert_eq!(header.data_offset, 68);
    }

    #[test]
    fn classifies_special_names() {
        let kind = |name| parse_header(&raw_header(name, "4"), 8).unwrap().kind;
        assert_eq!(kind("/"), HeaderKind::GnuSymbolTable);
        assert_eq!(kind("/SYM64/"), HeaderKind::GnuSymbolTable);
        assert_eq!(kind("//"), HeaderKind::GnuNameTable);
        assert_eq!(kind("/12"), HeaderKind::GnuExtendedName { table_offset: 12 });
        assert_eq!(kind("#1/3"), HeaderKind::BsdExtendedName { name_len: 3 });
    }

    #[test]
    fn bsd_name_is_subtracted_from_size() {
        let header = parse_header(&raw_header("#1/20", "35"), 8).unwrap();
        assert_eq!(header.size, 15);
        assert_eq!(header.name, None);
        assert_eq!(header.data_offset, 8 + 60 + 20);
    }

    #[test]
    fn bsd_name_longer_than_member_is_rejected() {
        let err = parse_header(&raw_header("#1/20", "10"), 8).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn blank_ids_are_absent() {
        let raw = format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "a.o/", 0, "", "", 644, 2);
        let header = parse_header(raw.as_bytes(), 8).unwrap();
        assert_eq!(header.uid, None);
        assert_eq!(header.gid, None);
    }

    #[test]
    fn name_table_fields_are_not_parsed() {
        let raw = format!("{:<48}{:<10}`\n", "//", 10);
        let header = parse_header(raw.as_bytes(), 8).unwrap();
        assert_eq!(header.kind, HeaderKind::GnuNameTable);
        assert_eq!(header.size, 10);
        assert_eq!(header.name, None);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut raw = raw_header("file1/", "15");
        raw[58..].copy_from_slice(b"qq");
        assert!(parse_header(&raw, 8).unwrap_err().is_format());
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let raw = format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "file1/", "aaaa071329", 1000, 100, 100644, 15);
        assert!(parse_header(raw.as_bytes(), 8).unwrap_err().is_format());
    }

    #[test]
    fn rejects_short_input() {
        assert!(parse_header(b"file1/          1364071329  1000", 8)
            .unwrap_err()
            .is_format());
    }

    #[test]
    fn header_description_names_the_kind() {
        let header = parse_header(&raw_header("short/", "3"), 8).unwrap();
        assert_eq!(
            header.to_string(),
            "<ArchiveHeader: \"short\" type:NORMAL size:3>"
        );
    }
}
