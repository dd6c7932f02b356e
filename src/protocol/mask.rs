/// XORs `payload` in place with the 4-byte `mask_key`, cycling the key.
///
/// Masking is its own inverse, so the same call unmasks.
pub fn mask(payload: &mut [u8], mask_key: [u8; 4]) {
    let mut words = payload.chunks_exact_mut(4);
    for word in &mut words {
        word[0] ^= mask_key[0];
        word[1] ^= mask_key[1];
        word[2] ^= mask_key[2];
        word[3] ^= mask_key[3];
    }
    // tail is always aligned to the start of the key
    for (b, k) in words.into_remainder().iter_mut().zip(mask_key) {
        *b ^= k;
    }
}
