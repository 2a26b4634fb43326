//! Edge case tests for raw DEFLATE round trips.

use zcodec_deflate::{deflate, inflate};

#[test]
fn test_empty_input() {
    let input = b"";
    let compressed = deflate(input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_single_byte() {
    let input = b"A";
    let compressed = deflate(input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 1000];
    let compressed = deflate(&input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
    // All zeros should compress very well
    assert!(compressed.len() < input.len() / 10);
}

#[test]
fn test_all_same_byte() {
    let input = vec![255u8; 5000];
    let compressed = deflate(&input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
    // Repeated byte should compress extremely well
    assert!(compressed.len() < input.len() / 20);
}

#[test]
fn test_max_match_length() {
    // Create data with maximum match length (258 bytes)
    let pattern = vec![42u8; 258];
    let mut input = Vec::new();
    for _ in 0..10 {
        input.extend_from_slice(&pattern);
    }

    let compressed = deflate(&input, 9).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_all_literals() {
    // No repeats long enough to match: every byte is a literal.
    let mut seed = 0x2545_F491u32;
    let input: Vec<u8> = (0..4096)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed as u8
        })
        .collect();

    for level in [1, 6, 9] {
        let compressed = deflate(&input, level).unwrap();
        assert_eq!(inflate(&compressed).unwrap(), input);
        // Falls back to stored blocks: at most a few bytes of overhead.
        assert!(compressed.len() <= input.len() + 16);
    }
}

#[test]
fn test_alternating_pattern() {
    let mut input = Vec::with_capacity(2000);
    for i in 0..1000 {
        input.push(if i % 2 == 0 { b'A' } else { b'B' });
    }

    let compressed = deflate(&input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_large_input() {
    // Test with 1MB of data
    let mut input = Vec::with_capacity(1024 * 1024);
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    while input.len() < 1024 * 1024 {
        input.extend_from_slice(pattern);
    }
    input.truncate(1024 * 1024);

    let compressed = deflate(&input, 5).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
    assert_eq!(decompressed.len(), 1024 * 1024);
}

#[test]
fn test_incremental_pattern() {
    // Short runs of every byte value.
    let mut input = Vec::new();
    for i in 0..256 {
        for _ in 0..10 {
            input.push(i as u8);
        }
    }

    let compressed = deflate(&input, 1).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_compression_levels() {
    let input = b"Hello, world! This is a test of DEFLATE compression with various levels.";

    for level in 0..=9 {
        let compressed = deflate(input, level).unwrap();
        let decompressed = inflate(&compressed).unwrap();
        assert_eq!(decompressed, input, "Level {} failed", level);

        // Level 0 should be larger (stored blocks)
        // Higher levels should generally be smaller or equal
        if level == 0 {
            assert!(compressed.len() > input.len());
        }
    }
}

#[test]
fn test_binary_data() {
    // Binary data with all byte values
    let input: Vec<u8> = (0..=255).cycle().take(5000).collect();

    let compressed = deflate(&input, 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_long_distance_match() {
    // The second copy of the pattern sits just inside the 32 KiB window.
    let mut input = vec![0u8; 32768];
    let pattern = b"PATTERN_TO_MATCH";
    input[0..pattern.len()].copy_from_slice(pattern);
    input[32768 - pattern.len() - 300..32768 - 300].copy_from_slice(pattern);

    for level in [1, 9] {
        let compressed = deflate(&input, level).unwrap();
        let decompressed = inflate(&compressed).unwrap();
        assert_eq!(decompressed, input);
    }
}

#[test]
fn test_utf8_text() {
    let input = "Grüße, 世界! Ça va? Привет мир. ".repeat(200);
    let compressed = deflate(input.as_bytes(), 6).unwrap();
    let decompressed = inflate(&compressed).unwrap();
    assert_eq!(decompressed, input.as_bytes());
}

#[test]
fn test_exact_window_boundary() {
    // Inputs straddling the 64 KiB stored block and 32 KiB window sizes.
    for len in [32767, 32768, 32769, 65535, 65536, 65537] {
        let input: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        for level in [0, 1, 6] {
            let compressed = deflate(&input, level).unwrap();
            assert_eq!(inflate(&compressed).unwrap(), input, "len {} level {}", len, level);
        }
    }
}
