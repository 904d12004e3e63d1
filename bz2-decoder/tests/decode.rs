//! End-to-end tests against the session API, using literal byte fixtures
//! rather than round-tripping through a compressor (this crate has none).

use bz2_decoder::{DecodeError, DecodeStatus, Session};

/// The canonical empty-input .bz2 stream at level 1: no blocks, straight to
/// the trailer, combined CRC of zero. Magic + trailer + CRC happen to land
/// on a byte boundary, so there is no padding.
const EMPTY_STREAM: [u8; 14] = [
    0x42, 0x5A, 0x68, 0x31, 0x17, 0x72, 0x45, 0x38, 0x50, 0x90, 0x00, 0x00, 0x00, 0x00,
];

#[test]
fn test_empty_stream_yields_no_bytes() {
    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let outcome = session.decompress(&EMPTY_STREAM, &mut out).unwrap();
    assert_eq!(outcome.status, DecodeStatus::StreamEnd);
    assert_eq!(outcome.bytes_produced, 0);
    assert_eq!(outcome.bytes_consumed, EMPTY_STREAM.len());
}

#[test]
fn test_empty_stream_small_mode_matches_fast_mode() {
    let mut out = [0u8; 16];
    let mut fast = Session::new(false);
    let mut small = Session::new(true);
    let fast_outcome = fast.decompress(&EMPTY_STREAM, &mut out).unwrap();
    let small_outcome = small.decompress(&EMPTY_STREAM, &mut out).unwrap();
    assert_eq!(fast_outcome, small_outcome);
}

#[test]
fn test_split_everywhere_matches_whole() {
    for split in 0..=EMPTY_STREAM.len() {
        let mut session = Session::new(false);
        let mut out = [0u8; 16];
        let mut produced = 0usize;
        let mut saw_stream_end = false;

        let (a, b) = EMPTY_STREAM.split_at(split);
        for chunk in [a, b] {
            let outcome = session.decompress(chunk, &mut out[produced..]).unwrap();
            produced += outcome.bytes_produced;
            if outcome.status == DecodeStatus::StreamEnd {
                saw_stream_end = true;
            }
        }

        assert!(saw_stream_end, "split at {split} never reached STREAM_END");
        assert_eq!(produced, 0, "split at {split} produced unexpected bytes");
    }
}

#[test]
fn test_two_concatenated_streams_each_signal_stream_end() {
    let mut doubled = EMPTY_STREAM.to_vec();
    doubled.extend_from_slice(&EMPTY_STREAM);

    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let mut pos = 0;
    let mut stream_ends = 0;

    while pos < doubled.len() {
        let outcome = session.decompress(&doubled[pos..], &mut out).unwrap();
        pos += outcome.bytes_consumed;
        if outcome.status == DecodeStatus::StreamEnd {
            stream_ends += 1;
        }
    }

    assert_eq!(stream_ends, 2);
    assert_eq!(pos, doubled.len());
}

#[test]
fn test_trailing_garbage_is_not_consumed() {
    let mut with_garbage = EMPTY_STREAM.to_vec();
    with_garbage.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let outcome = session.decompress(&with_garbage, &mut out).unwrap();

    assert_eq!(outcome.status, DecodeStatus::StreamEnd);
    assert_eq!(outcome.bytes_consumed, EMPTY_STREAM.len());
}

#[test]
fn test_bad_first_byte_is_magic_error() {
    let bogus = [0x00u8; 4];
    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let err = session.decompress(&bogus, &mut out).unwrap_err();
    assert!(matches!(err, DecodeError::Magic { .. }));
}

#[test]
fn test_truncated_magic_suspends_without_error() {
    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let outcome = session.decompress(&EMPTY_STREAM[..2], &mut out).unwrap();
    assert_eq!(outcome.status, DecodeStatus::Ok);
    assert_eq!(outcome.bytes_consumed, 2);
    assert_eq!(outcome.bytes_produced, 0);
}

#[test]
fn test_bad_block_marker_is_data_error() {
    // Valid file magic, then six marker bytes that are neither the
    // block-open nor the stream-end magic.
    let mut input = vec![0x42, 0x5A, 0x68, 0x31];
    input.extend_from_slice(&[0x00; 6]);

    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let err = session.decompress(&input, &mut out).unwrap_err();
    assert!(matches!(err, DecodeError::Data { .. }));
}

#[test]
fn test_level_digit_out_of_range_is_magic_error() {
    let mut input = vec![0x42, 0x5A, 0x68];
    input.push(b'0'); // '0' is not in '1'..='9'
    let mut session = Session::new(false);
    let mut out = [0u8; 16];
    let err = session.decompress(&input, &mut out).unwrap_err();
    assert!(matches!(err, DecodeError::Magic { .. }));
}
