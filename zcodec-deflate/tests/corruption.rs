//! Damaged and truncated streams.

use zcodec_core::error::{CodecError, ErrorKind};
use zcodec_deflate::{
    DeflateOptions, InflateOptions, deflate_raw_sync, deflate_sync, gunzip_sync, gzip_sync,
    inflate_raw_sync, inflate_sync,
};

fn sample() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..300u32 {
        data.extend_from_slice(format!("record {:04} state={}\n", i, i % 7).as_bytes());
    }
    data
}

#[test]
fn test_zlib_trailer_flip_is_data_error() {
    let data = sample();
    let compressed = deflate_sync(&data, &DeflateOptions::default()).unwrap();
    let len = compressed.len();
    for pos in len - 4..len {
        let mut damaged = compressed.clone();
        damaged[pos] ^= 0x01;
        let err = inflate_sync(&damaged, &InflateOptions::default()).unwrap_err();
        assert_eq!(err, CodecError::protocol("incorrect data check"), "byte {}", pos);
        assert_eq!(err.code(), -3);
    }
}

#[test]
fn test_gzip_trailer_flips() {
    let data = sample();
    let compressed = gzip_sync(&data, &DeflateOptions::default()).unwrap();
    let len = compressed.len();

    let mut damaged = compressed.clone();
    damaged[len - 6] ^= 0x80;
    let err = gunzip_sync(&damaged, &InflateOptions::default()).unwrap_err();
    assert_eq!(err.message(), "incorrect data check");

    let mut damaged = compressed.clone();
    damaged[len - 1] ^= 0x01;
    let err = gunzip_sync(&damaged, &InflateOptions::default()).unwrap_err();
    assert_eq!(err.message(), "incorrect length check");
}

#[test]
fn test_zlib_header_flip_is_rejected() {
    let compressed = deflate_sync(&sample(), &DeflateOptions::default()).unwrap();
    for bit in 0..8 {
        let mut damaged = compressed.clone();
        damaged[1] ^= 1 << bit;
        let err = inflate_sync(&damaged, &InflateOptions::default()).unwrap_err();
        assert_eq!(err, CodecError::protocol("incorrect header check"), "bit {}", bit);
    }
}

#[test]
fn test_body_flips_never_pass_silently() {
    let data = sample();
    let compressed = deflate_sync(&data, &DeflateOptions::default()).unwrap();
    for pos in 2..compressed.len() - 4 {
        for mask in [0x01u8, 0x10, 0x80] {
            let mut damaged = compressed.clone();
            damaged[pos] ^= mask;
            // Flips in the padding after the last code decode to the same data.
            if let Ok(out) = inflate_sync(&damaged, &InflateOptions::default()) {
                assert_eq!(out, data, "byte {} mask {:#04x}", pos, mask);
            }
        }
    }
}

#[test]
fn test_raw_body_flips_decode_or_fail() {
    let data = sample();
    let compressed = deflate_raw_sync(&data, &DeflateOptions::default()).unwrap();
    for pos in 0..compressed.len() {
        let mut damaged = compressed.clone();
        damaged[pos] ^= 0x04;
        match inflate_raw_sync(&damaged, &InflateOptions::default()) {
            Ok(_) => {}
            Err(err) => assert!(
                matches!(
                    err.kind(),
                    ErrorKind::Encoding | ErrorKind::ResourceExhaustion
                ),
                "byte {}: {:?}",
                pos,
                err
            ),
        }
    }
}

#[test]
fn test_every_truncation_fails() {
    let data = sample();
    let compressed = deflate_sync(&data, &DeflateOptions::default()).unwrap();
    for cut in 0..compressed.len() {
        let err = inflate_sync(&compressed[..cut], &InflateOptions::default()).unwrap_err();
        assert_eq!(err, CodecError::buf("unexpected end of file"), "cut {}", cut);
    }
}

#[test]
fn test_gzip_truncation_fails() {
    let compressed = gzip_sync(&sample(), &DeflateOptions::default()).unwrap();
    for cut in [0, 1, 5, 10, compressed.len() / 2, compressed.len() - 1] {
        assert!(gunzip_sync(&compressed[..cut], &InflateOptions::default()).is_err());
    }
}

#[test]
fn test_wrong_framing_is_rejected() {
    let data = sample();
    let gz = gzip_sync(&data, &DeflateOptions::default()).unwrap();
    assert_eq!(
        inflate_sync(&gz, &InflateOptions::default()).unwrap_err().message(),
        "incorrect header check"
    );
    let zl = deflate_sync(&data, &DeflateOptions::default()).unwrap();
    assert_eq!(
        gunzip_sync(&zl, &InflateOptions::default()).unwrap_err().message(),
        "incorrect header check"
    );
}
