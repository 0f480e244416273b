//! Reed-Solomon codec: parameter derivation, systematic encoding and
//! erasure-tolerant reconstruction.
//!
//! This is the only module most callers need; [`crate::field`] and
//! [`crate::transform`] exist to support it.

use std::fmt;

use crate::{
    field::{self, from_be_bytes, to_be_bytes, Additive, Exp, Log, FIELD_SIZE, ONE_MASK},
    math::{is_power_of_2, next_high_power_of_2, next_low_power_of_2},
    transform::{self, afft, formal_derivative, inverse_afft, walsh, Skew},
};

/// One shard of an encoded payload, or the corresponding slot in
/// `reconstruct`'s input. An empty `Vec` means "not received".
pub type Shard = Vec<u8>;

// ======================================================================
// Error - PUBLIC

/// Represents all possible errors that can occur in this library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Derived `n` and `k` could not both be reduced to powers of two.
    ///
    /// This can only happen if [`create`] is fed inconsistent low-level
    /// parameters; the [`recovery_threshold`]-driven path can't trigger it.
    ArgsMustBePowOf2,

    /// A shard received by [`ReedSolomon::reconstruct`] was present
    /// (non-empty) but had zero length.
    EmptyShard,

    /// Present shards given to [`ReedSolomon::reconstruct`] were not all
    /// the same length.
    InconsistentShardLengths,

    /// [`ReedSolomon::reconstruct`] was given fewer than `k` present shards.
    NeedMoreShards {
        /// Number of shards required to reconstruct.
        k: usize,
        /// Number of present (non-empty) shards given.
        received: usize,
    },

    /// [`ReedSolomon::encode`] was given an empty payload.
    PayloadSizeIsZero,

    /// `n_validators` was `<= 1`; there is nothing to fan out to.
    NotEnoughValidators {
        /// The given validator count.
        n_validators: usize,
    },

    /// `n_validators` exceeded the field size (65,536).
    TooManyValidators {
        /// The given validator count.
        n_validators: usize,
    },

    /// Wanted shard count (`n`) was less than 2.
    WantedShardCountTooLow {
        /// The given `n`.
        n: usize,
    },

    /// `next_high_power_of_2(n)` exceeded the field size (65,536).
    WantedShardCountTooHigh {
        /// The given `n`.
        n: usize,
    },

    /// Wanted payload shard count (`k`) was less than 1.
    WantedPayloadShardCountTooLow {
        /// The given `k`.
        k: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ArgsMustBePowOf2 => {
                write!(f, "derived shard counts could not be reduced to powers of two")
            }

            Error::EmptyShard => write!(f, "a present shard had zero length"),

            Error::InconsistentShardLengths => {
                write!(f, "present shards had inconsistent lengths")
            }

            Error::NeedMoreShards { k, received } => {
                write!(f, "not enough shards: got {}, need at least {}", received, k)
            }

            Error::PayloadSizeIsZero => write!(f, "payload must be non-empty"),

            Error::NotEnoughValidators { n_validators } => {
                write!(f, "not enough validators: {} (need at least 2)", n_validators)
            }

            Error::TooManyValidators { n_validators } => {
                write!(
                    f,
                    "too many validators: {} (field supports at most {})",
                    n_validators, FIELD_SIZE
                )
            }

            Error::WantedShardCountTooLow { n } => {
                write!(f, "wanted shard count too low: {} (need at least 2)", n)
            }

            Error::WantedShardCountTooHigh { n } => {
                write!(
                    f,
                    "wanted shard count too high: {} exceeds field size {}",
                    n, FIELD_SIZE
                )
            }

            Error::WantedPayloadShardCountTooLow { k } => {
                write!(f, "wanted payload shard count too low: {} (need at least 1)", k)
            }
        }
    }
}

impl std::error::Error for Error {}

// ======================================================================
// FUNCTIONS - PUBLIC

/// Minimum number of shards required to reconstruct a payload dispersed
/// to `n_validators` peers: `floor((n_validators - 1) / 3) + 1`.
pub fn recovery_threshold(n_validators: usize) -> Result<usize, Error> {
    if n_validators > FIELD_SIZE {
        return Err(Error::TooManyValidators { n_validators });
    }
    if n_validators <= 1 {
        return Err(Error::NotEnoughValidators { n_validators });
    }

    Ok((n_validators - 1) / 3 + 1)
}

/// Creates a [`ReedSolomon`] instance sized for `n_validators` peers,
/// deriving the recovery threshold internally.
pub fn create(n_validators: usize) -> Result<ReedSolomon, Error> {
    let k = recovery_threshold(n_validators)?;
    let n_po2 = next_high_power_of_2(n_validators);
    let k_po2 = next_low_power_of_2(k);

    ReedSolomon::with_exact_params(n_po2, k_po2, n_validators)
}

// ======================================================================
// ReedSolomon - PUBLIC

/// A Reed-Solomon codec instance over GF(2^16), fixed to a given
/// `(n, k)` pair.
///
/// Immutable and `Send + Sync`: encode/reconstruct calls borrow `&self`
/// and may run concurrently.
pub struct ReedSolomon {
    n: usize,
    k: usize,
    wanted_n: usize,
    exp: &'static Exp,
    log: &'static Log,
    skew: &'static Skew,
}

impl ReedSolomon {
    /// Low-level constructor taking already-derived `(n, k)`, validating
    /// the invariants [`create`] can't violate but which are still part
    /// of the documented error contract.
    fn with_exact_params(n: usize, k: usize, wanted_n: usize) -> Result<Self, Error> {
        if n < 2 {
            return Err(Error::WantedShardCountTooLow { n });
        }
        if k < 1 {
            return Err(Error::WantedPayloadShardCountTooLow { k });
        }
        if n > FIELD_SIZE {
            return Err(Error::WantedShardCountTooHigh { n });
        }
        if !is_power_of_2(n) || !is_power_of_2(k) {
            return Err(Error::ArgsMustBePowOf2);
        }

        let (exp, log) = field::initialize_exp_log();
        let skew = transform::initialize_skew();

        Ok(ReedSolomon {
            n,
            k,
            wanted_n,
            exp,
            log,
            skew,
        })
    }

    /// Total codeword length (a power of two `>= wanted_n`).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Recovery threshold in symbols (a power of two `<= n/2`).
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of shards [`encode`] actually emits.
    ///
    /// [`encode`]: ReedSolomon::encode
    pub fn wanted_n(&self) -> usize {
        self.wanted_n
    }

    /// Byte length of each shard for a payload of `payload_bytes` bytes.
    fn shard_len(&self, payload_bytes: usize) -> usize {
        let payload_symbols = (payload_bytes + 1) / 2;
        let shard_symbols = (payload_symbols + self.k - 1) / self.k;
        shard_symbols * 2
    }

    /// Systematically encodes `bytes` into [`wanted_n`](ReedSolomon::wanted_n)
    /// shards, the first `k` of which equal the payload itself (interleaved
    /// as symbols).
    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<Shard>, Error> {
        if bytes.is_empty() {
            return Err(Error::PayloadSizeIsZero);
        }

        let shard_len = self.shard_len(bytes.len());
        let k2 = self.k * 2;

        let mut shards: Vec<Shard> = vec![vec![0u8; shard_len]; self.wanted_n];

        let mut scratch = vec![Additive::ZERO; self.n];

        for (chunk_idx, chunk) in bytes.chunks(k2).enumerate() {
            for symbol in scratch.iter_mut() {
                *symbol = Additive::ZERO;
            }

            for (i, pair) in chunk.chunks(2).enumerate() {
                let packed = if pair.len() == 2 {
                    [pair[0], pair[1]]
                } else {
                    [pair[0], 0]
                };
                scratch[i] = from_be_bytes(packed);
            }

            let mut codeword = scratch.clone();

            inverse_afft(&mut codeword[0..self.k], self.k, 0, self.skew, self.exp, self.log);

            let mut shift = self.k;
            while shift < self.n {
                codeword.copy_within(0..self.k, shift);
                afft(
                    &mut codeword[shift..shift + self.k],
                    self.k,
                    shift,
                    self.skew,
                    self.exp,
                    self.log,
                );
                shift += self.k;
            }

            codeword[0..self.k].copy_from_slice(&scratch[0..self.k]);

            let offset = chunk_idx * 2;
            for (v, shard) in shards.iter_mut().enumerate() {
                shard[offset..offset + 2].copy_from_slice(&to_be_bytes(codeword[v]));
            }
        }

        Ok(shards)
    }

    /// Reconstructs the original payload from a vector of shards indexed
    /// by codeword position; an empty shard means "not received".
    ///
    /// The returned buffer may be up to `2k - 1` bytes longer than the
    /// original payload (zero-padding from the final partial symbol);
    /// callers that know their exact payload length should truncate.
    pub fn reconstruct(&self, received: &[Shard]) -> Result<Vec<u8>, Error> {
        let present_len = self.validate_received(received)?;

        let shard_len_in_syms = present_len / 2;
        let log_walsh2 = self.eval_error_polynomial(received);

        let mut out = Vec::with_capacity(shard_len_in_syms * 2 * self.k);
        let mut codeword = vec![Additive::ZERO; self.n];

        for sym in 0..shard_len_in_syms {
            for (pos, value) in codeword.iter_mut().enumerate() {
                *value = match received.get(pos) {
                    Some(shard) if !shard.is_empty() => {
                        from_be_bytes([shard[sym * 2], shard[sym * 2 + 1]])
                    }
                    _ => Additive::ZERO,
                };
            }

            self.decode_main(&mut codeword, received, &log_walsh2);

            for pos in 0..self.k {
                let value = match received.get(pos) {
                    Some(shard) if !shard.is_empty() => {
                        from_be_bytes([shard[sym * 2], shard[sym * 2 + 1]])
                    }
                    _ => codeword[pos],
                };
                out.extend_from_slice(&to_be_bytes(value));
            }
        }

        Ok(out)
    }

    /// Fast path: reconstructs the payload from the first `k` shards
    /// without running the decoder, valid only when all of them are
    /// present.
    pub fn reconstruct_from_systematic(&self, chunks: &[Shard]) -> Result<Vec<u8>, Error> {
        if chunks.len() < self.k || chunks[0..self.k].iter().any(|s| s.is_empty()) {
            let received = chunks.iter().filter(|s| !s.is_empty()).count();
            return Err(Error::NeedMoreShards { k: self.k, received });
        }

        let shard_len = chunks[0].len();
        if chunks[0..self.k].iter().any(|s| s.len() != shard_len) {
            return Err(Error::InconsistentShardLengths);
        }
        if shard_len == 0 {
            return Err(Error::EmptyShard);
        }

        let shard_len_in_syms = shard_len / 2;
        let mut out = Vec::with_capacity(shard_len * self.k);

        for sym in 0..shard_len_in_syms {
            for shard in &chunks[0..self.k] {
                out.extend_from_slice(&shard[sym * 2..sym * 2 + 2]);
            }
        }

        Ok(out)
    }

    // ============================================================
    // PRIVATE

    fn validate_received(&self, received: &[Shard]) -> Result<usize, Error> {
        let mut present_len = None;
        let mut present_count = 0;
        let mut inconsistent = false;

        for shard in received {
            if shard.is_empty() {
                continue;
            }
            present_count += 1;
            match present_len {
                None => present_len = Some(shard.len()),
                Some(len) if len != shard.len() => inconsistent = true,
                Some(_) => {}
            }
        }

        if present_count < self.k {
            return Err(Error::NeedMoreShards {
                k: self.k,
                received: present_count,
            });
        }

        if inconsistent {
            return Err(Error::InconsistentShardLengths);
        }

        match present_len {
            Some(0) => Err(Error::EmptyShard),
            Some(len) => Ok(len),
            None => Err(Error::NeedMoreShards { k: self.k, received: 0 }),
        }
    }

    /// Builds the log-domain error-evaluator polynomial `L` from the
    /// erasure pattern implied by `received`.
    fn eval_error_polynomial(&self, received: &[Shard]) -> Vec<u16> {
        let log_walsh = field::initialize_log_walsh();

        let mut l = vec![0u16; FIELD_SIZE];
        for i in 0..self.n {
            let erased = !matches!(received.get(i), Some(shard) if !shard.is_empty());
            l[i] = erased as u16;
        }

        walsh(&mut l, FIELD_SIZE);
        for i in 0..self.n {
            let product = l[i] as u32 * log_walsh[i] as u32;
            l[i] = (product % ONE_MASK as u32) as u16;
        }
        walsh(&mut l, FIELD_SIZE);

        for i in 0..self.n {
            let erased = !matches!(received.get(i), Some(shard) if !shard.is_empty());
            if erased {
                l[i] = ONE_MASK - l[i];
            }
        }

        l.truncate(self.n);
        l
    }

    /// The decoder's main transform-domain pass: recovers the erased
    /// symbols of `codeword` in place.
    fn decode_main(&self, codeword: &mut [Additive], received: &[Shard], log_walsh2: &[u16]) {
        for i in 0..self.n {
            let erased = !matches!(received.get(i), Some(shard) if !shard.is_empty());
            codeword[i] = if erased {
                Additive::ZERO
            } else {
                codeword[i].mul(log_walsh2[i], self.exp, self.log)
            };
        }

        inverse_afft(codeword, self.n, 0, self.skew, self.exp, self.log);
        formal_derivative(codeword, self.n);
        afft(codeword, self.n, 0, self.skew, self.exp, self.log);

        for i in 0..self.n {
            let erased = !matches!(received.get(i), Some(shard) if !shard.is_empty());
            codeword[i] = if erased {
                codeword[i].mul(log_walsh2[i], self.exp, self.log)
            } else {
                Additive::ZERO
            };
        }
    }
}

// ======================================================================
// TESTS
