//! Incremental hash states
//!
//! [`Hasher`] wraps one algorithm's running state behind a single type;
//! [`MultiHasher`] feeds the same bytes to several of them in lockstep.

use crate::config::HashAlgorithm;
use sha2::digest::DynDigest;
use std::collections::BTreeMap;

/// Lowercase hex digests keyed by algorithm
pub type Digests = BTreeMap<HashAlgorithm, String>;

/// Unified hasher that supports all algorithms
pub enum Hasher {
    /// Any RustCrypto fixed-output digest
    Digest(HashAlgorithm, Box<dyn DynDigest + Send>),
    /// BLAKE3
    Blake3(Box<blake3::Hasher>),
    /// XXHash3 128-bit
    XXHash3(Box<xxhash_rust::xxh3::Xxh3>),
    /// XXHash64
    XXHash64(xxhash_rust::xxh64::Xxh64),
}

impl Hasher {
    /// Create a new hasher for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let digest: Box<dyn DynDigest + Send> = match algorithm {
            HashAlgorithm::Blake3 => return Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::XXHash3 => {
                return Self::XXHash3(Box::new(xxhash_rust::xxh3::Xxh3::new()))
            }
            HashAlgorithm::XXHash64 => {
                return Self::XXHash64(xxhash_rust::xxh64::Xxh64::new(0))
            }
            HashAlgorithm::Md5 => Box::<md5::Md5>::default(),
            HashAlgorithm::Sha1 => Box::<sha1::Sha1>::default(),
            HashAlgorithm::Sha224 => Box::<sha2::Sha224>::default(),
            HashAlgorithm::Sha256 => Box::<sha2::Sha256>::default(),
            HashAlgorithm::Sha384 => Box::<sha2::Sha384>::default(),
            HashAlgorithm::Sha512 => Box::<sha2::Sha512>::default(),
            HashAlgorithm::Sha3_224 => Box::<sha3::Sha3_224>::default(),
            HashAlgorithm::Sha3_256 => Box::<sha3::Sha3_256>::default(),
            HashAlgorithm::Sha3_384 => Box::<sha3::Sha3_384>::default(),
            HashAlgorithm::Sha3_512 => Box::<sha3::Sha3_512>::default(),
            HashAlgorithm::Blake2b => Box::<blake2::Blake2b512>::default(),
            HashAlgorithm::Blake2s => Box::<blake2::Blake2s256>::default(),
        };
        Self::Digest(algorithm, digest)
    }

    /// Get the algorithm this hasher uses
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Digest(algorithm, _) => *algorithm,
            Self::Blake3(_) => HashAlgorithm::Blake3,
            Self::XXHash3(_) => HashAlgorithm::XXHash3,
            Self::XXHash64(_) => HashAlgorithm::XXHash64,
        }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Digest(_, h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::XXHash3(h) => h.update(data),
            Self::XXHash64(h) => h.update(data),
        }
    }

    /// Finalize and get the hash as hex string
    pub fn finalize(self) -> String {
        match self {
            Self::Digest(_, h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
            Self::XXHash3(h) => format!("{:032x}", h.digest128()),
            Self::XXHash64(h) => format!("{:016x}", h.digest()),
        }
    }
}

/// Feeds every chunk to one hasher per algorithm
///
/// All digests produced by one `MultiHasher` describe exactly the same
/// byte sequence.
pub struct MultiHasher {
    hashers: Vec<Hasher>,
    bytes: u64,
}

impl MultiHasher {
    /// One state per distinct algorithm, in first-seen order
    pub fn new(algorithms: &[HashAlgorithm]) -> Self {
        let mut seen = Vec::with_capacity(algorithms.len());
        for &algorithm in algorithms {
            if !seen.contains(&algorithm) {
                seen.push(algorithm);
            }
        }
        Self {
            hashers: seen.into_iter().map(Hasher::new).collect(),
            bytes: 0,
        }
    }

    /// Feed a chunk to every state
    pub fn update(&mut self, data: &[u8]) {
        for hasher in &mut self.hashers {
            hasher.update(data);
        }
        self.bytes += data.len() as u64;
    }

    /// Bytes fed so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes
    }

    /// Whether no algorithm was requested
    pub fn is_empty(&self) -> bool {
        self.hashers.is_empty()
    }

    /// Finalize every state
    pub fn finalize(self) -> Digests {
        self.hashers
            .into_iter()
            .map(|h| (h.algorithm(), h.finalize()))
            .collect()
    }
}
