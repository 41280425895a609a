//! Reassembly options.

/// Default cap on `original_size`.
pub const DEFAULT_SIZE_LIMIT: u64 = 256 * 1024 * 1024;

/// Options controlling a reassembly run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembleOptions {
    /// Ignore JSON sidecars and rebuild every section from its `.bin` file.
    pub binary_only: bool,
    /// Recompute section CRCs on the finished image.
    pub verify_crc: bool,
    /// Fail on CRC mismatches instead of reporting them.
    pub strict_crc: bool,
    /// Compare the finished image with the recorded SHA-256.
    pub verify_sha256: bool,
    /// Largest image accepted, in bytes.
    pub size_limit: u64,
}

impl Default for ReassembleOptions {
    fn default() -> Self {
        Self {
            binary_only: false,
            verify_crc: false,
            strict_crc: false,
            verify_sha256: true,
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

impl ReassembleOptions {
    #[must_use]
    pub const fn with_binary_only(mut self) -> Self {
        self.binary_only = true;
        self
    }

    #[must_use]
    pub const fn with_verify_crc(mut self) -> Self {
        self.verify_crc = true;
        self
    }

    /// Verify CRCs and treat any mismatch as an error.
    #[must_use]
    pub const fn with_strict_crc(mut self) -> Self {
        self.verify_crc = true;
        self.strict_crc = true;
        self
    }

    #[must_use]
    pub const fn with_verify_sha256(mut self, enabled: bool) -> Self {
        self.verify_sha256 = enabled;
        self
    }

    #[must_use]
    pub const fn with_size_limit(mut self, limit: u64) -> Self {
        self.size_limit = limit;
        self
    }
}
