use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};

/// First whitespace-delimited token of a title, lowercased.
///
/// Example: "Budget Report Q3" → "budget"
pub fn first_token(title: &str) -> Option<String> {
    title.split_whitespace().next().map(|t| t.to_lowercase())
}

/// Title-overlap heuristic used for connection inference.
///
/// True when the first token of either title occurs (case-insensitively)
/// anywhere inside the other. Known weak: common leading words such as
/// "The" or "Re:" connect unrelated items.
pub fn titles_overlap(a: &str, b: &str) -> bool {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();

    let a_in_b = first_token(a).is_some_and(|t| b_lower.contains(&t));
    let b_in_a = first_token(b).is_some_and(|t| a_lower.contains(&t));
    a_in_b || b_in_a
}

/// Deterministic sha256 fingerprint over ordered parts.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

/// Write `content` to `path` via a sibling temp file and rename, so a crash
/// never leaves a half-written file behind.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
