//! Blake2b implementation (RFC 7693) with variable output length.
//!
//! Argon2 uses Blake2b twice over: directly for the 64-byte initial hash of
//! the derivation context, and through the variable-length construction H'
//! that expands digests to arbitrary sizes (1 KiB bootstrap blocks, the
//! final tag).

#![forbid(unsafe_code)]

/// Blake2b block size in bytes.
pub const BLOCK_SIZE: usize = 128;

/// Maximum digest size in bytes.
pub const MAX_OUT_SIZE: usize = 64;

/// Blake2b initialization vector.
const IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

/// Sigma permutation table for message schedule.
const SIGMA: [[usize; 16]; 12] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
];

/// G mixing function.
#[inline]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// Compress a single block. `last_node` belongs to the tree-hashing mode
/// and is never set by this crate.
fn compress(h: &mut [u64; 8], block: &[u8; BLOCK_SIZE], t: u128, last_block: bool, last_node: bool) {
    // Parse message block into 16 words
    let mut m = [0u64; 16];
    for (i, chunk) in block.chunks_exact(8).enumerate() {
        m[i] = u64::from_le_bytes(chunk.try_into().unwrap());
    }

    // Initialize working vector
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..16].copy_from_slice(&IV);

    // XOR with counter
    v[12] ^= t as u64;
    v[13] ^= (t >> 64) as u64;

    if last_block {
        v[14] = !v[14];
    }
    if last_node {
        v[15] = !v[15];
    }

    // 12 rounds of mixing
    for round in 0..12 {
        let s = &SIGMA[round];
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    // Finalize state
    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

/// Streaming Blake2b state.
///
/// Byte-equivalent input produces the same digest regardless of how it is
/// split across `update` calls.
#[derive(Clone)]
pub struct Blake2b {
    h: [u64; 8],
    t: u128,
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
    out_len: usize,
}

impl Blake2b {
    /// Create a state producing an `out_len`-byte digest (1..=64, unkeyed).
    pub fn new(out_len: usize) -> Self {
        assert!(out_len >= 1 && out_len <= MAX_OUT_SIZE);

        // Parameter block folded into h[0]: digest length, no key,
        // fanout 1, depth 1
        let mut h = IV;
        h[0] ^= 0x0101_0000 ^ (out_len as u64);

        Self {
            h,
            t: 0,
            buf: [0u8; BLOCK_SIZE],
            buf_len: 0,
            out_len,
        }
    }

    /// Absorb input, in any chunking.
    pub fn update(&mut self, mut input: &[u8]) {
        if input.is_empty() {
            return;
        }

        // The final block must stay buffered so the last-block flag can be
        // applied at finalize time; a buffered block is only compressed
        // once more input is known to follow it.
        let fill = BLOCK_SIZE - self.buf_len;
        if input.len() > fill {
            self.buf[self.buf_len..].copy_from_slice(&input[..fill]);
            self.t += BLOCK_SIZE as u128;
            let buf = self.buf;
            compress(&mut self.h, &buf, self.t, false, false);
            self.buf_len = 0;
            input = &input[fill..];

            while input.len() > BLOCK_SIZE {
                let (block, rest) = input.split_at(BLOCK_SIZE);
                self.t += BLOCK_SIZE as u128;
                compress(&mut self.h, block.try_into().unwrap(), self.t, false, false);
                input = rest;
            }
        }

        self.buf[self.buf_len..self.buf_len + input.len()].copy_from_slice(input);
        self.buf_len += input.len();
    }

    /// Consume the state and write the digest into `out`, whose length must
    /// equal the `out_len` the state was created with.
    pub fn finalize(mut self, out: &mut [u8]) {
        assert_eq!(out.len(), self.out_len);

        self.t += self.buf_len as u128;
        self.buf[self.buf_len..].fill(0);
        let buf = self.buf;
        compress(&mut self.h, &buf, self.t, true, false);

        let mut full = [0u8; MAX_OUT_SIZE];
        for (i, word) in self.h.iter().enumerate() {
            full[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        out.copy_from_slice(&full[..self.out_len]);
    }
}

/// Compute a Blake2b digest of `data` in one shot; the digest length is
/// `out.len()`.
pub fn digest(out: &mut [u8], data: &[u8]) {
    let mut state = Blake2b::new(out.len());
    state.update(data);
    state.finalize(out);
}

/// H', the Argon2 variable-length hash (RFC 9106 §3.3).
///
/// The requested length is hashed in as a little-endian 32-bit prefix. Up
/// to 64 bytes a single digest suffices; beyond that a chain V1, V2, ...
/// contributes 32 bytes per link and the final link, always 33..=64 bytes,
/// is emitted whole.
pub fn blake2b_long(out: &mut [u8], input: &[u8]) {
    let prefix = (out.len() as u32).to_le_bytes();

    if out.len() <= MAX_OUT_SIZE {
        let mut state = Blake2b::new(out.len());
        state.update(&prefix);
        state.update(input);
        state.finalize(out);
        return;
    }

    let mut v = [0u8; MAX_OUT_SIZE];
    let mut state = Blake2b::new(MAX_OUT_SIZE);
    state.update(&prefix);
    state.update(input);
    state.finalize(&mut v);

    out[..32].copy_from_slice(&v[..32]);
    let mut pos = 32;
    while out.len() - pos > MAX_OUT_SIZE {
        let prev = v;
        digest(&mut v, &prev);
        out[pos..pos + 32].copy_from_slice(&v[..32]);
        pos += 32;
    }
    digest(&mut out[pos..], &v);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_empty_512() {
        // RFC 7693 Appendix A: Blake2b-512("")
        let mut out = [0u8; 64];
        digest(&mut out, b"");
        assert_eq!(
            to_hex(&out),
            "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419\
             d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce"
        );
    }

    #[test]
    fn test_abc_512() {
        // RFC 7693 Appendix A: Blake2b-512("abc")
        let mut out = [0u8; 64];
        digest(&mut out, b"abc");
        assert_eq!(
            to_hex(&out),
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
             7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
        );
    }

    #[test]
    fn test_empty_256() {
        // Blake2b-256("") from the reference implementation
        let mut out = [0u8; 32];
        digest(&mut out, b"");
        assert_eq!(
            to_hex(&out),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_chunking_is_irrelevant() {
        let data = [0xabu8; 300];

        let mut one_shot = [0u8; 64];
        digest(&mut one_shot, &data);

        for split in [1, 63, 64, 127, 128, 129, 255, 256, 299] {
            let mut state = Blake2b::new(64);
            state.update(&data[..split]);
            state.update(&data[split..]);
            let mut chunked = [0u8; 64];
            state.finalize(&mut chunked);
            assert_eq!(one_shot, chunked, "mismatch for split at {}", split);
        }
    }

    #[test]
    fn test_long_short_output_is_prefixed_digest() {
        // For lengths up to 64 bytes H' is a plain digest of LE32(len) || input.
        let input = b"initial block seed";
        let mut long = [0u8; 48];
        blake2b_long(&mut long, input);

        let mut state = Blake2b::new(48);
        state.update(&48u32.to_le_bytes());
        state.update(input);
        let mut direct = [0u8; 48];
        state.finalize(&mut direct);

        assert_eq!(long, direct);
    }

    #[test]
    fn test_long_chain_overlap() {
        // Links of the chain overlap by 32 bytes: the second 32 bytes of
        // the first link digest are discarded, not emitted.
        let input = [0x5cu8; 40];
        let mut out = [0u8; 100];
        blake2b_long(&mut out, &input);

        let mut v1 = [0u8; 64];
        let mut state = Blake2b::new(64);
        state.update(&100u32.to_le_bytes());
        state.update(&input);
        state.finalize(&mut v1);
        assert_eq!(&out[..32], &v1[..32]);

        let mut v2 = [0u8; 64];
        digest(&mut v2, &v1);
        assert_eq!(&out[32..64], &v2[..32]);

        // Final link: remaining 36 bytes, emitted in full
        let mut tail = [0u8; 36];
        digest(&mut tail, &v2);
        assert_eq!(&out[64..], &tail);
    }

    #[test]
    fn test_against_blake2_crate() {
        use blake2::digest::{Update, VariableOutput};
        use blake2::Blake2bVar;

        let test_cases: &[&[u8]] = &[
            b"",
            b"a",
            b"abc",
            b"message digest",
            &[0u8; 128],  // exactly one block
            &[0u8; 129],  // one block + 1 byte
            &[0xffu8; 256],
            &[0x42u8; 1024],
        ];

        for out_len in [1usize, 16, 32, 48, 64] {
            for data in test_cases {
                let mut ours = vec![0u8; out_len];
                digest(&mut ours, data);

                let mut hasher = Blake2bVar::new(out_len).unwrap();
                hasher.update(data);
                let mut reference = vec![0u8; out_len];
                hasher.finalize_variable(&mut reference).unwrap();

                assert_eq!(
                    ours, reference,
                    "mismatch for outlen {}, data len {}",
                    out_len,
                    data.len()
                );
            }
        }
    }
}
