#![allow(dead_code)]

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

/// Creates the temporary directory for a test.
pub fn create_tmp_dir(test_name: &str) -> PathBuf {
    let tmpdir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(test_name);
    match fs::remove_dir_all(&tmpdir) {
        Ok(_) => {}
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                panic!("Failed to delete directory: {:?}", tmpdir);
            }
        }
    }
    fs::create_dir_all(&tmpdir).unwrap();
    tmpdir
}

/// Formats a 60-byte member header with a raw name field.
pub fn member_header(raw_name: &str, size: usize) -> Vec<u8> {
    let header = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        raw_name, 1364071329, 1000, 100, 100644, size
    );
    assert_eq!(header.len(), 60);
    header.into_bytes()
}

/// Appends a member with its padding to the archive bytes.
pub fn push_member(archive: &mut Vec<u8>, raw_name: &str, data: &[u8]) {
    archive.extend(member_header(raw_name, data.len()));
    archive.extend_from_slice(data);
    if data.len() % 2 != 0 {
        archive.push(b'\n');
    }
}

/// Builds a GNU archive where every name fits in the header.
pub fn gnu_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut archive = b"!<arch>\n".to_vec();
    for (name, data) in members {
        push_member(&mut archive, &format!("{name}/"), data);
    }
    archive
}

/// Builds a BSD archive with every name stored inline after its header.
pub fn bsd_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut archive = b"!<arch>\n".to_vec();
    for (name, data) in members {
        let mut content = name.as_bytes().to_vec();
        content.extend_from_slice(data);
        push_member(&mut archive, &format!("#1/{}", name.len()), &content);
    }
    archive
}

/// Builds a GNU archive with a `//` long name table holding every name.
pub fn gnu_long_name_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut table = Vec::new();
    let mut offsets = Vec::new();
    for (name, _) in members {
        offsets.push(table.len());
        table.extend_from_slice(format!("{name}/\n").as_bytes());
    }

    let mut archive = b"!<arch>\n".to_vec();
    push_member(&mut archive, "//", &table);
    for ((_, data), offset) in members.iter().zip(offsets) {
        push_member(&mut archive, &format!("/{offset}"), data);
    }
    archive
}

/// Formats the 128-byte AIX big archive global header.
pub fn aix_global_header(first_member: u64, last_member: u64) -> Vec<u8> {
    format!(
        "<bigaf>\n{:<20}{:<20}{:<20}{:<20}{:<20}{:<20}",
        0, 0, 0, first_member, last_member, 0
    )
    .into_bytes()
}

/// Formats an AIX big archive member: fixed header, name, padding, trailer
/// and content.
pub fn aix_member(name: &str, data: &[u8], next_member: u64, previous_member: u64) -> Vec<u8> {
    let mut member = format!(
        "{:<20}{:<20}{:<20}{:<12}{:<12}{:<12}{:<12o}{:<4}",
        data.len(),
        next_member,
        previous_member,
        1087823288,
        300,
        301,
        0o640,
        name.len()
    )
    .into_bytes();
    member.extend_from_slice(name.as_bytes());
    if name.len() % 2 != 0 {
        member.push(0);
    }
    member.extend_from_slice(b"`\n");
    member.extend_from_slice(data);
    member
}

/// A source that can only be read forward.
pub struct NonSeekable(Cursor<Vec<u8>>);

impl NonSeekable {
    pub fn new(data: Vec<u8>) -> Self {
        NonSeekable(Cursor::new(data))
    }
}

impl Read for NonSeekable {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}
