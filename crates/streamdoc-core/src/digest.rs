use sha2::{Digest, Sha256};

/// Normalize section content to the exact text stored between markers.
///
/// Lines are split the way the checker splits the body, carriage returns at
/// line ends are dropped, and trailing line breaks are trimmed, so the text
/// read back between markers hashes to the same value the writer saw.
pub fn normalize(content: &str) -> String {
    let joined = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n");
    joined.trim_end_matches(['\n', '\r']).to_string()
}

/// True for a non-empty lowercase hex string, the shape `digest` produces.
pub fn is_hex_digest(hash: &str) -> bool {
    !hash.is_empty() && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lowercase hex SHA-256 of `content`.
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Shortened digest for human-readable output.
pub fn short(hash: &str) -> &str {
    match hash.char_indices().nth(12) {
        Some((i, _)) => &hash[..i],
        None => hash,
    }
}
