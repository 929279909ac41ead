//! Free-text input normalization

use unicode_normalization::UnicodeNormalization;

/// Fold accented characters to their base letters and drop everything outside ASCII.
///
/// Compatibility decomposition (NFKD) splits `é` into `e` plus a combining
/// acute accent; the combining mark is non-ASCII and is dropped with the rest.
pub fn normalize(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}
