use lattice_core::AppResult;

/// Signs and verifies the canonical form of persisted records.
pub trait RecordSigner: Send + Sync {
    /// Produces a signature over the canonical bytes.
    ///
    /// Signing the same bytes twice yields two different signatures; both verify.
    fn sign(&self, canonical: &[u8]) -> AppResult<String>;

    /// Checks a signature against the canonical bytes.
    ///
    /// `Ok(false)` means the record does not match what was signed. `Err`
    /// is reserved for failures of the signing subsystem itself.
    fn verify(&self, canonical: &[u8], signature: &str) -> AppResult<bool>;
}

/// Seals and opens individual sensitive field values.
pub trait FieldCipher: Send + Sync {
    /// Encrypts one plaintext value into its storage form.
    fn seal(&self, plaintext: &str) -> AppResult<String>;

    /// Decrypts one sealed value.
    fn open(&self, sealed: &str) -> AppResult<String>;
}
