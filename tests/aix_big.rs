use std::io::Cursor;

use ar_archive_reader::{Archive, ArchiveKind, HeaderKind};
use pretty_assertions::assert_eq;

mod common;

#[test]
fn rejects_non_aix_content() {
    let err = Archive::new(Cursor::new(b"<bigaf>\nshort".to_vec())).unwrap_err();
    assert!(err.is_format());
}

#[test]
fn global_header_sets_first_offset() {
    let mut archive = Archive::new(Cursor::new(common::aix_global_header(1000, 456))).unwrap();
    assert_eq!(archive.kind(), ArchiveKind::AixBig);

    let global = *archive.aix_global_header().unwrap();
    assert_eq!(global.first_member, 1000);
    assert_eq!(global.last_member, 456);
    assert_eq!(archive.next_header_offset(), Some(1000));
    assert_eq!(archive.position(), 128);
    assert!(archive.headers().is_empty());

    // The first member offset is past the end of the file.
    assert!(archive.read_next_header().unwrap().is_none());
    assert!(archive.headers().is_empty());
}

#[test]
fn empty_member_list() {
    let mut archive = Archive::new(Cursor::new(common::aix_global_header(0, 0))).unwrap();
    assert_eq!(archive.next_header_offset(), None);
    archive.read_all_headers().unwrap();
    assert!(archive.headers().is_empty());
}

#[test]
fn first_member_after_a_gap() {
    let gap = b"Xdssd";
    let first_member = 128 + gap.len() as u64;
    let mut data = common::aix_global_header(first_member, 9999);
    data.extend_from_slice(gap);
    data.extend(common::aix_member("member.o", b"ABCDE-MARKER", 1024, 0));

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    let header = archive.read_next_header().unwrap().unwrap().clone();
    assert_eq!(header.kind, HeaderKind::AixNormal);
    assert_eq!(header.name(), b"member.o");
    assert_eq!(header.mode, 0o640);
    assert_eq!(header.data_offset, first_member + 112 + 8 + 2);
    assert_eq!(archive.next_header_offset(), Some(1024));

    let mut member = archive.open_member("member.o").unwrap();
    assert_eq!(member.read_all().unwrap(), b"ABCDE-MARKER");
}

#[test]
fn traversal_follows_links_and_stops_at_last_member() {
    // Stored out of order: the first member links to the second, which is
    // placed in front of it in the file.
    let second_offset = 128;
    let second = common::aix_member("last.o", b"second", 0, 0);
    let first_offset = second_offset + second.len() as u64 + 6;
    let mut data = common::aix_global_header(first_offset, second_offset);
    data.extend(&second);
    data.extend(b"gap!!!");
    data.extend(common::aix_member("first.o", b"first", second_offset, 0));

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    let first = archive.read_next_header().unwrap().unwrap();
    assert_eq!(first.name(), b"first.o");
    assert_eq!(archive.next_header_offset(), Some(second_offset));

    let last = archive.read_next_header().unwrap().unwrap();
    assert_eq!(last.name(), b"last.o");
    assert_eq!(last.header_offset, second_offset);
    assert_eq!(archive.next_header_offset(), None);

    assert!(archive.read_next_header().unwrap().is_none());
    assert_eq!(archive.names(), vec![&b"first.o"[..], &b"last.o"[..]]);
    assert_eq!(archive.open_member("first.o").unwrap().read_all().unwrap(), b"first");
    assert_eq!(archive.open_member("last.o").unwrap().read_all().unwrap(), b"second");
}

#[test]
fn last_member_ends_traversal_even_with_a_next_link() {
    let first_name = "even.o";
    let first = common::aix_member(first_name, b"content", 9999, 0);
    let second_offset = 128 + first.len() as u64;
    let first_link = common::aix_member(first_name, b"content", second_offset, 0);
    let mut data = common::aix_global_header(128, second_offset);
    data.extend(first_link);
    data.extend(common::aix_member("odd.o", b"tail", 4242, 128));

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    archive.read_all_headers().unwrap();
    assert_eq!(archive.headers().len(), 2);
    assert_eq!(archive.headers()[1].previous_member, Some(128));
    assert_eq!(archive.headers()[1].next_member, Some(4242));
}

#[test]
fn bad_member_trailer() {
    let mut member = common::aix_member("abcde", b"x", 0, 0);
    // Overwrite the trailer that follows the padded name.
    member[112 + 6..112 + 8].copy_from_slice(b"AB");
    let mut data = common::aix_global_header(128, 128);
    data.extend(member);

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    let err = archive.read_next_header().unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("bad ending for file header"));
}

#[test]
fn self_linked_member_is_rejected() {
    let mut data = common::aix_global_header(128, 9999);
    data.extend(common::aix_member("loop.o", b"data", 128, 0));

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    let err = archive.read_all_headers().unwrap_err();
    assert!(err.is_format());
    assert!(err.to_string().contains("AIX member list loops"));
    assert!(archive.headers().is_empty());
}

#[test]
fn link_back_to_an_earlier_member_is_rejected() {
    let first = common::aix_member("a.o", b"one", 0, 0);
    let second_offset = 128 + first.len() as u64;
    let mut data = common::aix_global_header(128, 9999);
    data.extend(common::aix_member("a.o", b"one", second_offset, 0));
    data.extend(common::aix_member("b.o", b"two", 128, 128));

    let mut archive = Archive::new(Cursor::new(data)).unwrap();
    assert!(archive.read_all_headers().unwrap_err().is_format());
    assert_eq!(archive.names(), vec![&b"a.o"[..]]);
    assert!(archive.members().last().unwrap().is_err());
}
