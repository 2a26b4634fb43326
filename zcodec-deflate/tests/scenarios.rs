//! Framing scenarios and byte-exact stream checks.

use zcodec_core::{Compressor, Decompressor, Flush, ReturnCode, Status, StreamContext};
use zcodec_deflate::{
    DeflateOptions, Deflater, GzipHeader, InflateOptions, Inflater, deflate, deflate_raw_sync,
    gunzip_sync, gzip_sync, inflate, inflate_raw_sync,
};

fn corpus() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..2000u32 {
        data.extend_from_slice(format!("line {} value {}\n", i, i.wrapping_mul(2654435761) % 977).as_bytes());
    }
    data
}

#[test]
fn test_abab_compresses_and_inflates_exactly() {
    let input = b"abababababababab";
    let compressed = deflate(input, 6).unwrap();
    assert!(compressed.len() < input.len());

    let mut inflater = Inflater::raw();
    let mut out = vec![0u8; 64];
    let mut strm = StreamContext::new(&compressed, &mut out);
    let status = inflater.inflate(&mut strm, Flush::Finish).unwrap();
    assert_eq!(status, Status::StreamEnd);
    assert_eq!(strm.avail_in(), 0);
    assert_eq!(strm.written(), input);
}

#[test]
fn test_gzip_of_empty_input() {
    let compressed = gzip_sync(b"", &DeflateOptions::default()).unwrap();
    assert_eq!(&compressed[..3], &[0x1F, 0x8B, 0x08]);
    // Header, empty final block, CRC and length.
    assert_eq!(compressed.len(), 10 + 2 + 8);
    assert_eq!(&compressed[compressed.len() - 8..], &[0; 8]);
    assert!(gunzip_sync(&compressed, &InflateOptions::default()).unwrap().is_empty());
}

#[test]
fn test_zlib_of_empty_input() {
    let compressed = Deflater::new(6).unwrap().compress_all(b"").unwrap();
    assert_eq!(compressed, [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);
    let out = Inflater::new().decompress_all(&compressed).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_known_zlib_vector() {
    // zlib.compress(b"hello world", 9)
    let compressed = Deflater::new(9).unwrap().compress_all(b"hello world").unwrap();
    assert_eq!(
        compressed,
        [
            0x78, 0xDA, 0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x28, 0xCF, 0x2F, 0xCA, 0x49, 0x01,
            0x00, 0x1A, 0x0B, 0x04, 0x5D
        ]
    );
}

#[test]
fn test_roundtrip_every_level_and_framing() {
    let data = corpus();
    for level in 0..=9 {
        for (mut deflater, mut inflater) in [
            (Deflater::raw(level).unwrap(), Inflater::raw()),
            (Deflater::new(level).unwrap(), Inflater::new()),
            (Deflater::gzip(level).unwrap(), Inflater::gzip()),
        ] {
            let compressed = deflater.compress_all(&data).unwrap();
            let out = inflater.decompress_all(&compressed).unwrap();
            assert_eq!(out, data, "level {} wrap {:?}", level, deflater.wrap());
        }
    }
}

#[test]
fn test_end_and_reinit_reproduce_output() {
    let data = corpus();
    let mut first = Deflater::init2(7, 8, 12, 5, 1).unwrap();
    let a = first.compress_all(&data).unwrap();
    first.end().unwrap();
    let mut second = Deflater::init2(7, 8, 12, 5, 1).unwrap();
    let b = second.compress_all(&data).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_window_bits_out_of_range() {
    for window_bits in [7, 16 + 16, -7, -16, 48] {
        let err = Deflater::init2(6, 8, window_bits, 8, 0).unwrap_err();
        assert_eq!(ReturnCode::from(&err), ReturnCode::StreamError);
    }
    for window_bits in [7, -16, 64] {
        let err = Inflater::init2(window_bits).unwrap_err();
        assert_eq!(err.code(), -2);
    }
}

#[test]
fn test_small_windows_roundtrip() {
    let data = corpus();
    for window_bits in 9..=15 {
        let opts = DeflateOptions::default().window_bits(window_bits);
        let compressed = deflate_raw_sync(&data, &opts).unwrap();
        let out =
            inflate_raw_sync(&compressed, &InflateOptions::default().window_bits(window_bits))
                .unwrap();
        assert_eq!(out, data, "window bits {}", window_bits);
    }
}

#[test]
fn test_gzip_header_roundtrip_through_engines() {
    let data = corpus();
    let mut deflater = Deflater::gzip(6).unwrap();
    deflater
        .set_header(
            GzipHeader::with_filename("corpus.txt")
                .with_comment("generated")
                .with_extra(b"AB\x02\x00hi")
                .with_mtime(86400)
                .with_hcrc(),
        )
        .unwrap();
    let compressed = deflater.compress_all(&data).unwrap();

    let mut inflater = Inflater::auto();
    inflater.get_header().unwrap();
    let out = inflater.decompress_all(&compressed).unwrap();
    assert_eq!(out, data);

    let header = inflater.header().unwrap();
    assert!(header.done);
    assert_eq!(header.filename.as_deref(), Some(&b"corpus.txt"[..]));
    assert_eq!(header.comment.as_deref(), Some(&b"generated"[..]));
    assert_eq!(header.extra.as_deref(), Some(&b"AB\x02\x00hi"[..]));
    assert_eq!(header.mtime, 86400);
    assert_eq!(header.xfl, 0);
}

#[test]
fn test_gzip_xfl_reflects_level() {
    let fast = gzip_sync(b"x", &DeflateOptions::with_level(1)).unwrap();
    let best = gzip_sync(b"x", &DeflateOptions::with_level(9)).unwrap();
    let default = gzip_sync(b"x", &DeflateOptions::default()).unwrap();
    assert_eq!(fast[8], 4);
    assert_eq!(best[8], 2);
    assert_eq!(default[8], 0);
}

#[test]
fn test_full_flush_allows_restart() {
    let mut deflater = Deflater::raw(6).unwrap();
    let mut buf = vec![0u8; 1024];
    let mut strm = StreamContext::new(b"first part, ", &mut buf);
    deflater.deflate(&mut strm, Flush::Full).unwrap();
    let split = strm.next_out;
    let mut strm = StreamContext::new(b"second part", &mut buf[split..]);
    assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
    let total = split + strm.next_out;

    assert_eq!(&buf[split - 4..split], &[0x00, 0x00, 0xFF, 0xFF]);
    assert_eq!(inflate(&buf[..total]).unwrap(), b"first part, second part");
    // Nothing after a full flush refers back past it.
    assert_eq!(inflate(&buf[split..total]).unwrap(), b"second part");
}

#[test]
fn test_trailing_bytes_left_unconsumed() {
    let mut compressed = Deflater::new(6).unwrap().compress_all(b"body").unwrap();
    let stream_len = compressed.len();
    compressed.extend_from_slice(b"trailer");

    let mut inflater = Inflater::new();
    let mut out = [0u8; 16];
    let mut strm = StreamContext::new(&compressed, &mut out);
    assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap(), Status::StreamEnd);
    assert_eq!(strm.next_in, stream_len);
    assert_eq!(strm.remaining_input(), b"trailer");
}
