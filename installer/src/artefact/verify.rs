//! Streaming SHA-256 verification stage.
//!
//! [`StreamVerifier`] wraps either end of a byte pipeline. As a [`Read`]
//! adapter it sits between the network body and the decompressor; as a
//! [`Write`] adapter it sits between the compressor and the output file.
//! Every chunk is hashed and forwarded unchanged before the next one is
//! pulled, so the whole payload is never buffered.
//!
//! Because chunks are released downstream before the final digest exists,
//! a consumer that writes to disk (the extractor) may already have produced
//! files when [`StreamVerifier::finalize`] reports a mismatch. Nothing is
//! rolled back.

use super::sha256_digest::Sha256Digest;
use crate::error::{AcquireError, Result};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};

/// How the final digest is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyMode {
    /// Compare against the expected digest; a mismatch fails the pipeline.
    Validating(Sha256Digest),
    /// Compute only; the digest is handed back to the caller.
    Producing,
}

/// The result of a completed verification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    computed: Sha256Digest,
    expected: Option<Sha256Digest>,
    bytes: u64,
}

impl VerificationOutcome {
    /// Digest computed over every byte that passed through the stage.
    #[must_use]
    pub fn computed(&self) -> &Sha256Digest {
        &self.computed
    }

    /// Digest the stream was validated against, if any.
    #[must_use]
    pub fn expected(&self) -> Option<&Sha256Digest> {
        self.expected.as_ref()
    }

    /// Number of bytes hashed.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Whether the computed digest satisfies the expectation.
    ///
    /// Producing-mode outcomes always pass.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.expected
            .as_ref()
            .is_none_or(|expected| expected == &self.computed)
    }
}

/// A pass-through stage that hashes the bytes flowing through it.
///
/// # Examples
///
/// ```
/// use openssl_acquire::artefact::sha256_digest::Sha256Digest;
/// use openssl_acquire::artefact::verify::StreamVerifier;
/// use std::io::Read;
///
/// let payload = b"openssl".as_slice();
/// let expected = Sha256Digest::of_bytes(payload);
/// let mut verifier = StreamVerifier::validating(payload, expected);
/// let mut sink = Vec::new();
/// verifier.read_to_end(&mut sink)?;
/// let (_, outcome) = verifier.finalize()?;
/// assert!(outcome.passed());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct StreamVerifier<S> {
    inner: S,
    hasher: Sha256,
    mode: VerifyMode,
    bytes: u64,
}

impl<S> StreamVerifier<S> {
    /// Wrap `inner` with the given mode.
    pub fn new(inner: S, mode: VerifyMode) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            mode,
            bytes: 0,
        }
    }

    /// Wrap `inner` and validate against `expected` at the end.
    pub fn validating(inner: S, expected: Sha256Digest) -> Self {
        Self::new(inner, VerifyMode::Validating(expected))
    }

    /// Wrap `inner` and only compute the digest.
    pub fn producing(inner: S) -> Self {
        Self::new(inner, VerifyMode::Producing)
    }

    /// Bytes hashed so far.
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes
    }

    /// Borrow the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Compute the final digest and apply the mode.
    ///
    /// Returns the wrapped stream so a writer can be flushed or synced by
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::ChecksumMismatch`] in validating mode when the
    /// computed digest differs from the expected one.
    pub fn finalize(self) -> Result<(S, VerificationOutcome)> {
        let computed = Sha256Digest::from_hasher(self.hasher);
        let expected = match self.mode {
            VerifyMode::Validating(expected) => Some(expected),
            VerifyMode::Producing => None,
        };
        let outcome = VerificationOutcome {
            computed,
            expected,
            bytes: self.bytes,
        };
        if !outcome.passed() {
            return Err(AcquireError::ChecksumMismatch {
                expected: outcome
                    .expected()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                actual: outcome.computed().to_string(),
            });
        }
        Ok((self.inner, outcome))
    }

    fn absorb(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }
}

impl<R: Read> StreamVerifier<R> {
    /// Read and hash whatever the upstream still holds.
    ///
    /// Decoders stop at their own end-of-data marker and may leave trailing
    /// bytes unread; draining makes the digest cover the full stream.
    ///
    /// # Errors
    ///
    /// Propagates read errors from the wrapped stream.
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for StreamVerifier<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if let Some(chunk) = buf.get(..read) {
            self.absorb(chunk);
        }
        Ok(read)
    }
}

impl<W: Write> Write for StreamVerifier<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(chunk) = buf.get(..written) {
            self.absorb(chunk);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// A reader that hands out its payload in fixed-size chunks.
    struct Chunked<'a> {
        chunks: std::slice::Chunks<'a, u8>,
    }

    impl<'a> Chunked<'a> {
        fn new(payload: &'a [u8], size: usize) -> Self {
            Self {
                chunks: payload.chunks(size),
            }
        }
    }

    impl Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Some(chunk) = self.chunks.next() else {
                return Ok(0);
            };
            let len = chunk.len().min(buf.len());
            buf[..len].copy_from_slice(&chunk[..len]);
            Ok(len)
        }
    }

    fn payload() -> Vec<u8> {
        (0..10_000u32).flat_map(u32::to_le_bytes).collect()
    }

    #[rstest]
    #[case::single_byte_chunks(1)]
    #[case::odd_chunks(997)]
    #[case::one_chunk(1 << 20)]
    fn read_side_digest_matches_whole_payload(#[case] chunk_size: usize) {
        let payload = payload();
        let mut verifier = StreamVerifier::producing(Chunked::new(&payload, chunk_size));
        let mut forwarded = Vec::new();
        verifier.read_to_end(&mut forwarded).expect("read");

        let (_, outcome) = verifier.finalize().expect("producing never fails");
        assert_eq!(forwarded, payload, "bytes must be forwarded unmodified");
        assert_eq!(outcome.computed(), &Sha256Digest::of_bytes(&payload));
        assert_eq!(outcome.bytes(), payload.len() as u64);
    }

    #[test]
    fn write_side_digest_matches_whole_payload() {
        let payload = payload();
        let mut verifier = StreamVerifier::producing(Vec::new());
        for chunk in payload.chunks(333) {
            verifier.write_all(chunk).expect("write");
        }
        let (written, outcome) = verifier.finalize().expect("finalize");
        assert_eq!(written, payload);
        assert_eq!(outcome.computed(), &Sha256Digest::of_bytes(&payload));
        assert!(outcome.expected().is_none());
    }

    #[test]
    fn validating_mode_accepts_matching_digest() {
        let payload = payload();
        let expected = Sha256Digest::of_bytes(&payload);
        let mut verifier = StreamVerifier::validating(payload.as_slice(), expected.clone());
        verifier.drain().expect("drain");
        let (_, outcome) = verifier.finalize().expect("digest matches");
        assert!(outcome.passed());
        assert_eq!(outcome.expected(), Some(&expected));
    }

    #[test]
    fn validating_mode_rejects_after_full_stream() {
        let payload = payload();
        let wrong = Sha256Digest::of_bytes(b"something else");
        let mut verifier = StreamVerifier::validating(payload.as_slice(), wrong.clone());
        let drained = verifier.drain().expect("drain");
        assert_eq!(drained, payload.len() as u64);

        let err = verifier.finalize().expect_err("mismatch");
        match err {
            AcquireError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, wrong.as_str());
                assert_eq!(actual, Sha256Digest::of_bytes(&payload).as_str());
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn drain_covers_bytes_left_by_consumer() {
        let payload = payload();
        let mut verifier = StreamVerifier::producing(payload.as_slice());
        let mut head = [0u8; 16];
        verifier.read_exact(&mut head).expect("head");
        verifier.drain().expect("drain");
        let (_, outcome) = verifier.finalize().expect("finalize");
        assert_eq!(outcome.computed(), &Sha256Digest::of_bytes(&payload));
    }
}
