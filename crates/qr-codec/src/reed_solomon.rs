//! Reed-Solomon codec over GF(256), systematic form.
//!
//! Codewords are treated as polynomials with the first byte as the
//! highest-degree coefficient, matching the transmission order of the
//! symbol. The decoder runs the extended Euclidean algorithm on
//! `(x^k, S(x))` and recovers magnitudes with Forney's formula.

use crate::error::QrError;
use crate::gf;

/// Computes the `ecc_len` parity bytes for `data`.
pub fn rs_encode(data: &[u8], ecc_len: usize) -> Vec<u8> {
    assert!((1..=255).contains(&ecc_len), "Degree out of range");
    let divisor = gf::generator(ecc_len);
    let shifted = gf::poly_mul_monomial(data, ecc_len);
    let rem = gf::poly_rem(&shifted, &divisor);
    // Left-pad the remainder to the full parity width
    let mut out = vec![0u8; ecc_len - rem.len().min(ecc_len)];
    if !gf::poly_is_zero(&rem) {
        out.extend_from_slice(&rem);
    } else {
        out.resize(ecc_len, 0);
    }
    out
}

/// Corrects up to `ecc_len / 2` byte errors in `codeword` (data followed by
/// parity) in place. Fails with `RsUndecodable` when the error pattern is
/// beyond correction.
pub fn rs_decode(codeword: &mut [u8], ecc_len: usize) -> Result<(), QrError> {
    let n = codeword.len();
    assert!(ecc_len < n, "Parity exceeds codeword");

    // Syndromes S_i = C(alpha^i); all zero means the codeword is clean.
    let syndromes: Vec<u8> = (0..ecc_len)
        .map(|i| gf::poly_eval(codeword, gf::EXP[i]))
        .collect();
    if syndromes.iter().all(|&s| s == 0) {
        return Ok(());
    }

    // S(x) with S_0 as the constant term, highest degree first.
    let s_poly: Vec<u8> = {
        let mut p: Vec<u8> = syndromes.iter().rev().copied().collect();
        while p.len() > 1 && p[0] == 0 {
            p.remove(0);
        }
        p
    };

    // Extended Euclid on (x^k, S(x)) until 2 deg(r) < k.
    let mut r_prev = gf::poly_mul_monomial(&[1], ecc_len);
    let mut r = s_poly;
    let mut t_prev: Vec<u8> = vec![0];
    let mut t: Vec<u8> = vec![1];
    while 2 * gf::poly_deg(&r) >= ecc_len {
        if gf::poly_is_zero(&r) {
            return Err(QrError::RsUndecodable);
        }
        let (q, rem) = gf::poly_divmod(&r_prev, &r);
        r_prev = std::mem::replace(&mut r, rem);
        let t_next = gf::poly_add(&t_prev, &gf::poly_mul(&q, &t));
        t_prev = std::mem::replace(&mut t, t_next);
    }

    // Normalize so the locator has Lambda(0) = 1.
    let constant = *t.last().ok_or(QrError::RsUndecodable)?;
    if constant == 0 {
        return Err(QrError::RsUndecodable);
    }
    let scale = gf::inv(constant);
    let locator = gf::poly_mul_scalar(&t, scale);
    let evaluator = gf::poly_mul_scalar(&r, scale);

    // Chien search: X = alpha^p is an error locator iff 1/X is a root.
    let mut positions: Vec<usize> = Vec::new();
    for i in 1..=255usize {
        if gf::poly_eval(&locator, gf::EXP[i]) == 0 {
            let x = gf::inv(gf::EXP[i]);
            positions.push(gf::LOG[x as usize] as usize);
        }
    }
    if positions.len() != gf::poly_deg(&locator) {
        return Err(QrError::RsUndecodable);
    }
    if positions.iter().any(|&p| p >= n) {
        return Err(QrError::RsUndecodable);
    }

    // Forney: e_i = Omega(1/X_i) / prod_{j != i} (1 + X_j / X_i).
    for (i, &p) in positions.iter().enumerate() {
        let x_i = gf::EXP[p];
        let x_inv = gf::inv(x_i);
        let mut denom = 1u8;
        for (j, &q) in positions.iter().enumerate() {
            if j != i {
                denom = gf::mul(denom, 1 ^ gf::mul(gf::EXP[q], x_inv));
            }
        }
        if denom == 0 {
            return Err(QrError::RsUndecodable);
        }
        let magnitude = gf::mul(gf::poly_eval(&evaluator, x_inv), gf::inv(denom));
        codeword[n - 1 - p] ^= magnitude;
    }

    // The corrected word must be a true codeword.
    for i in 0..ecc_len {
        if gf::poly_eval(codeword, gf::EXP[i]) != 0 {
            return Err(QrError::RsUndecodable);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Splittable linear congruential generator, enough for test vectors.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn byte(&mut self) -> u8 {
            self.next() as u8
        }
    }

    fn encode_word(data: &[u8], ecc_len: usize) -> Vec<u8> {
        let mut word = data.to_vec();
        word.extend(rs_encode(data, ecc_len));
        word
    }

    #[test]
    fn parity_for_known_vector() {
        // Degree-10 generator applied to a version-1-M data block.
        let data = [
            0x40, 0xD2, 0x75, 0x47, 0x76, 0x17, 0x32, 0x06, 0x27, 0x26, 0x96, 0xC6, 0xC6, 0x96,
            0x70, 0xEC,
        ];
        let ecc = rs_encode(&data, 10);
        assert_eq!(
            ecc,
            vec![0xBC, 0x2A, 0x90, 0x13, 0x6B, 0xAF, 0xEF, 0xFD, 0x4B, 0xE0]
        );
    }

    #[test]
    fn clean_words_pass_through() {
        let mut rng = Lcg(42);
        let data: Vec<u8> = (0..20).map(|_| rng.byte()).collect();
        let word = encode_word(&data, 10);
        let mut copy = word.clone();
        rs_decode(&mut copy, 10).unwrap();
        assert_eq!(copy, word);
    }

    #[test]
    fn corrects_up_to_half_the_parity() {
        let mut rng = Lcg(7);
        for ecc_len in [10usize, 16, 22, 30] {
            let data: Vec<u8> = (0..30).map(|_| rng.byte()).collect();
            let word = encode_word(&data, ecc_len);
            for errors in 1..=ecc_len / 2 {
                let mut corrupted = word.clone();
                let mut hit = vec![false; corrupted.len()];
                let mut placed = 0;
                while placed < errors {
                    let pos = rng.next() as usize % corrupted.len();
                    if hit[pos] {
                        continue;
                    }
                    hit[pos] = true;
                    corrupted[pos] ^= rng.byte() | 1; // Guaranteed nonzero flip
                    placed += 1;
                }
                rs_decode(&mut corrupted, ecc_len).unwrap();
                assert_eq!(corrupted, word, "ecc_len={ecc_len} errors={errors}");
            }
        }
    }

    #[test]
    fn rejects_too_many_errors() {
        let mut rng = Lcg(1234);
        let data: Vec<u8> = (0..26).map(|_| rng.byte()).collect();
        let mut word = encode_word(&data, 10);
        // Six errors against five correctable: decoding must not succeed
        // and silently return a different word than the original.
        let original = word.clone();
        for pos in [0usize, 3, 7, 11, 19, 23] {
            word[pos] ^= 0x5A;
        }
        match rs_decode(&mut word, 10) {
            Err(QrError::RsUndecodable) => {}
            Ok(()) => assert_ne!(word, original, "decoder may land on another codeword"),
            Err(e) => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn corrects_errors_in_parity_bytes() {
        let data = [17u8, 0, 255, 8, 99, 3];
        let mut word = encode_word(&data, 8);
        let clean = word.clone();
        word[5] ^= 0xFF; // Last data byte
        word[9] ^= 0x10; // Parity byte
        rs_decode(&mut word, 8).unwrap();
        assert_eq!(word, clean);
    }
}
