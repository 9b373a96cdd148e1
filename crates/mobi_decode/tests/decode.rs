mod common;

use common::*;
use mobi_decode::palmdoc_header::{Compression, Encryption};
use mobi_decode::{MOBI, MobiError, PDBError, PDBKind, decode};
use std::io::{Cursor, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

#[test]
fn stored_palmdoc_text_is_returned_unchanged() {
    let book = Book::palmdoc(vec![b"Hello".to_vec()], 5);
    let mut source = Cursor::new(book.to_bytes());

    let mut mobi = MOBI::open(&mut source).unwrap();
    assert_eq!(mobi.pdb.kind(), PDBKind::PalmDoc);
    assert_eq!(mobi.palmdoc_header.compression, Compression::None);
    assert!(mobi.header.is_none());
    assert_eq!(mobi.text(&mut source).unwrap(), b"Hello");
}

#[test]
fn stored_mobi_text_spans_records() {
    let book = Book::mobi(
        COMPRESSION_NONE,
        vec![b"It was ".to_vec(), b"a dark ".to_vec(), b"night.".to_vec()],
        20,
    );

    assert_eq!(decode(&mut Cursor::new(book.to_bytes())).unwrap(), b"It was a dark night.");
}

#[test]
fn unknown_container_is_rejected() {
    let mut data = Book::palmdoc(vec![b"Hello".to_vec()], 5).to_bytes();
    data[60..68].copy_from_slice(b"DataPlkr");

    match decode(&mut Cursor::new(data)) {
        Err(MobiError::Database(PDBError::UnrecognizedFormat(tag))) => assert_eq!(&tag, b"DataPlkr"),
        other => panic!("expected UnrecognizedFormat, got {other:?}"),
    }
}

#[test]
fn encrypted_books_are_refused() {
    let book = Book {
        encryption: 1,
        ..Book::mobi(COMPRESSION_NONE, vec![b"secret".to_vec()], 6)
    };
    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::EncryptionUnsupported(Encryption::Old))
    ));

    let book = Book {
        encryption: 2,
        ..Book::mobi(COMPRESSION_PALMDOC, vec![b"secret".to_vec()], 6)
    };
    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::EncryptionUnsupported(Encryption::New))
    ));
}

#[test]
fn unsupported_compression_is_rejected() {
    let book = Book {
        compression: 3,
        ..Book::palmdoc(vec![b"Hello".to_vec()], 5)
    };
    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::UnsupportedCompression(3))
    ));
}

#[test]
fn mobi_container_without_mobi_header_is_rejected() {
    let book = Book {
        mobi_header_len: 0,
        ..Book::mobi(COMPRESSION_NONE, vec![b"Hello".to_vec()], 5)
    };
    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::InvalidExtendedHeader(_))
    ));
}

#[test]
fn declared_length_must_match_output() {
    let records = || vec![b"Hello".to_vec()];

    let short = Book::palmdoc(records(), 4);
    assert!(matches!(
        decode(&mut Cursor::new(short.to_bytes())),
        Err(MobiError::OutputBufferTooSmall { limit: 4 })
    ));

    let long = Book::palmdoc(records(), 6);
    assert!(matches!(
        decode(&mut Cursor::new(long.to_bytes())),
        Err(MobiError::SizeMismatch { expected: 6, found: 5 })
    ));
}

#[test]
fn compressed_records_with_trailing_data() {
    let text = b"The quick brown fox jumps over the lazy dog. The quick brown fox jumps again.";
    let (first, second) = text.split_at(40);

    let with_trailers = |chunk: &[u8]| {
        let mut record = palmdoc_compression::compress(chunk);
        // Multibyte overlap: one carried byte plus its count.
        record.extend_from_slice(&[0xE2, 0x01]);
        // A three byte trailer entry whose size is stored last.
        record.extend_from_slice(&[b'x', b'y', 0x83]);
        record
    };
    let book = Book {
        extra_flags: 0b11,
        title: Some("Quick Fox"),
        ..Book::mobi(
            COMPRESSION_PALMDOC,
            vec![with_trailers(first), with_trailers(second)],
            text.len() as u32,
        )
    };
    let mut source = Cursor::new(book.to_bytes());

    let mut mobi = MOBI::open(&mut source).unwrap();
    assert_eq!(mobi.trailing.trailers, 1);
    assert!(mobi.trailing.multibyte);
    assert_eq!(mobi.full_name.as_deref(), Some(&b"Quick Fox"[..]));
    assert_eq!(mobi.text(&mut source).unwrap(), text);
}

#[test]
fn trailer_larger_than_record_is_corrupt() {
    let book = Book {
        extra_flags: 0b10,
        ..Book::mobi(COMPRESSION_NONE, vec![b"ab\x8A".to_vec()], 0)
    };

    match decode(&mut Cursor::new(book.to_bytes())) {
        Err(MobiError::CorruptTrailingData { record, .. }) => assert_eq!(record, 1),
        other => panic!("expected CorruptTrailingData, got {other:?}"),
    }
}

#[test]
fn palmdoc_output_is_bounded_by_declared_length() {
    let text = b"abcabcabcabcabcabc";
    let book = Book::mobi(
        COMPRESSION_PALMDOC,
        vec![palmdoc_compression::compress(text)],
        10,
    );

    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::OutputBufferTooSmall { limit: 10 })
    ));
}

fn huffman_book() -> (Book, Vec<u8>) {
    let mut phrases: Vec<(bool, Vec<u8>)> = (0..=255u8).map(|i| (true, vec![i])).collect();
    phrases[0] = (true, b"the ".to_vec());
    phrases[1] = (true, b"cat ".to_vec());
    phrases[2] = (true, b"sat. ".to_vec());
    phrases[3] = (false, vec![code(0), code(1)]);

    let records = vec![vec![code(3), code(2)], vec![code(3), code(b'!')]];
    let expected = b"the cat sat. the cat !".to_vec();
    let book = Book {
        huffman: (3, 2),
        extra_records: vec![uniform_huff(), cdic(256, 8, &phrases)],
        ..Book::mobi(COMPRESSION_HUFFCDIC, records, expected.len() as u32)
    };
    (book, expected)
}

#[test]
fn huffman_books_decode_through_the_dictionary() {
    let (book, expected) = huffman_book();
    let mut source = Cursor::new(book.to_bytes());

    let mut mobi = MOBI::open(&mut source).unwrap();
    assert_eq!(mobi.palmdoc_header.compression, Compression::HuffCdic);
    assert_eq!(mobi.text(&mut source).unwrap(), expected);
}

#[test]
fn huffman_output_is_bounded_by_declared_length() {
    // Phrase i expands to phrase i - 1 twice, so phrase 22 alone is 8 MiB.
    let mut phrases: Vec<(bool, Vec<u8>)> = (0..=255u8).map(|i| (true, vec![i])).collect();
    phrases[0] = (true, b"ab".to_vec());
    for i in 1..=22u8 {
        phrases[i as usize] = (false, vec![code(i - 1), code(i - 1)]);
    }
    let book = Book {
        huffman: (2, 2),
        extra_records: vec![uniform_huff(), cdic(256, 8, &phrases)],
        ..Book::mobi(COMPRESSION_HUFFCDIC, vec![vec![code(22)]], 4)
    };

    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::OutputBufferTooSmall { limit: 4 })
    ));
}

#[test]
fn overrun_is_reported_the_same_for_every_compression() {
    let (huffman, expected) = huffman_book();
    let huffman = Book {
        text_length: expected.len() as u32 - 1,
        ..huffman
    };
    let stored = Book::mobi(COMPRESSION_NONE, vec![b"abc".to_vec(), b"def".to_vec()], 4);
    let palmdoc = Book::mobi(
        COMPRESSION_PALMDOC,
        vec![palmdoc_compression::compress(b"abc"), palmdoc_compression::compress(b"def")],
        4,
    );

    let limit = expected.len() - 1;
    assert!(matches!(
        decode(&mut Cursor::new(huffman.to_bytes())),
        Err(MobiError::OutputBufferTooSmall { limit: l }) if l == limit
    ));
    for book in [stored, palmdoc] {
        assert!(matches!(
            decode(&mut Cursor::new(book.to_bytes())),
            Err(MobiError::OutputBufferTooSmall { limit: 4 })
        ));
    }
}

#[test]
fn text_records_past_the_container_are_rejected() {
    let book = Book {
        record_count: Some(3),
        ..Book::palmdoc(vec![b"Hello".to_vec()], 5)
    };

    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::Database(PDBError::IndexOutOfRange { index: 2, count: 2 }))
    ));
}

#[test]
fn huffman_dictionary_past_the_container_is_rejected() {
    let (book, _) = huffman_book();
    let book = Book {
        huffman: (3, 3),
        ..book
    };

    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::Database(PDBError::IndexOutOfRange { index: 5, count: 5 }))
    ));
}

#[test]
fn huffman_without_dictionary_location_is_rejected() {
    let (book, _) = huffman_book();
    let book = Book {
        mobi_header_len: 0x60,
        ..book
    };

    assert!(matches!(
        decode(&mut Cursor::new(book.to_bytes())),
        Err(MobiError::InvalidExtendedHeader(_))
    ));
}

#[test]
fn decodes_from_a_file() {
    let (book, expected) = huffman_book();
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(&book.to_bytes()).unwrap();
    temp_file.flush().unwrap();

    let mut file = temp_file.reopen().unwrap();
    assert_eq!(decode(&mut file).unwrap(), expected);
    // The source is left usable for further reads.
    file.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(decode(&mut file).unwrap(), expected);
}

#[test]
fn truncated_files_are_reported() {
    let data = Book::palmdoc(vec![b"Hello".to_vec()], 5).to_bytes();

    // Cut inside the record table.
    assert!(matches!(
        decode(&mut Cursor::new(data[..85].to_vec())),
        Err(MobiError::Database(_))
    ));

    // Cut inside the last record: the table still describes a smaller book.
    assert!(matches!(
        decode(&mut Cursor::new(data[..data.len() - 2].to_vec())),
        Err(MobiError::SizeMismatch { expected: 5, found: 3 })
    ));
}
