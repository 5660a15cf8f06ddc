/// Derives a 32 byte seed from an arbitrary string.
pub fn seed_from_str(s: &str) -> [u8; 32] {
    blake3::hash(s.as_bytes()).into()
}
