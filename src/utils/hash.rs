use crc32fast::Hasher;

/// Polynomial (base 31) hash over the key bytes, seeded with 1.
///
/// Both sides of a join bucket with this function; it must stay stable across
/// processes, unlike `std`'s randomized hashers.
pub fn partition_hash(key: &[u8]) -> u32 {
    key.iter()
        .fold(1u32, |h, b| h.wrapping_mul(31).wrapping_add(*b as u32))
}

pub fn bucket_for(key: &[u8], partition_count: usize) -> usize {
    partition_hash(key) as usize % partition_count
}

pub fn calculate_catalog_checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

pub fn verify_catalog_checksum(payload: &[u8], expected_checksum: u32) -> bool {
    calculate_catalog_checksum(payload) == expected_checksum
}
