use std::hash::Hasher;

/// Hashes an intermediate key with 64-bit FNV-1a, keeping the low 31 bits.
///
/// This is not the 32-bit FNV-1a some MapReduce implementations use, so the
/// same key can land in a different bucket than it would there. Bucket
/// placement only has to agree within one build.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(key);
    (hasher.finish() & 0x7fff_ffff) as u32
}

/// Compute the reduce bucket for a given key by calculating
/// `ihash(key) % n_reduce`.
///
/// # Panics
/// Panics if `n_reduce` is zero. [`crate::Job`] rejects such jobs up front.
pub fn partition(key: &str, n_reduce: u32) -> u32 {
    ihash(key.as_bytes()) % n_reduce
}
