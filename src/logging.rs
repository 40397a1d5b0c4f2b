//! Helpers for keeping secrets out of logs and console output.

use std::fmt;

/// Number of leading characters left visible when a secret is masked
const VISIBLE_PREFIX: usize = 4;

/// Secrets this short are hidden entirely
const MIN_MASKABLE_LEN: usize = 9;

/// Display wrapper that prints only the start of a secret.
///
/// ```
/// use azure_openai_proxy::logging::Sensitive;
///
/// let key = "0123456789abcdef";
/// assert_eq!(Sensitive::new(key).to_string(), "0123***");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Sensitive<'a> {
    inner: &'a str,
}

impl<'a> Sensitive<'a> {
    pub fn new(value: &'a str) -> Self {
        Self { inner: value }
    }
}

impl fmt::Display for Sensitive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            return Ok(());
        }

        if self.inner.chars().count() < MIN_MASKABLE_LEN {
            return write!(f, "***");
        }

        let prefix: String = self.inner.chars().take(VISIBLE_PREFIX).collect();
        write!(f, "{}***", prefix)
    }
}

/// Mask a secret for display; an empty secret stays empty so it remains visible as unset
pub fn mask_secret(value: &str) -> String {
    Sensitive::new(value).to_string()
}
