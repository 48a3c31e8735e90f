//! Content-addressed deduplication of the rendered versions of one shader.
//!
//! Rendered texts are normalized (comments and insignificant whitespace removed) before they
//! are hashed, so versions whose texts differ only in comments or layout share one blob.

use core::fmt;
use std::io::{self, BufRead};

use indexmap::IndexMap;
use indexmap::map::Entry;
use shadeport_back::DialectVersion;
use tracing::debug;

/// BLAKE3 digest of a normalized source text.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    /// Hashes normalized lines. Each line is terminated by `\n` before hashing, so line
    /// boundaries are significant.
    fn of_lines(lines: &[String]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Self(hasher.finalize())
    }

    /// The raw 32-byte digest.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// The unique normalized texts of a shader, and which of them each version uses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactedSources {
    /// Normalized lines of each unique text, in order of first occurrence.
    pub blobs: IndexMap<ContentHash, Vec<String>>,
    /// The text of every compacted version, in input order.
    pub versions: IndexMap<DialectVersion, ContentHash>,
}

impl CompactedSources {
    /// The normalized lines of `version`, or [`None`] if it was not compacted.
    #[must_use]
    pub fn lines(&self, version: DialectVersion) -> Option<&[String]> {
        let hash = self.versions.get(&version)?;
        self.blobs.get(hash).map(Vec::as_slice)
    }

    /// The normalized text of `version`, one line per line.
    #[must_use]
    pub fn text(&self, version: DialectVersion) -> Option<String> {
        self.lines(version).map(|lines| {
            let mut text = String::new();
            for line in lines {
                text.push_str(line);
                text.push('\n');
            }
            text
        })
    }

    /// Number of unique texts.
    #[must_use]
    pub fn unique(&self) -> usize {
        self.blobs.len()
    }
}

/// Deduplicates per-version sources by the hash of their normalized text.
#[derive(Clone, Copy, Debug, Default)]
pub struct Compactor;

impl Compactor {
    /// A compactor with the standard normalization.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads every version's source, normalizes it, and stores each distinct text once.
    ///
    /// Each version must appear at most once in `sources`.
    ///
    /// # Errors
    ///
    /// Returns the first error from reading a source. Nothing is compacted in that case.
    pub fn compact<R, I>(&self, sources: I) -> io::Result<CompactedSources>
    where
        R: BufRead,
        I: IntoIterator<Item = (DialectVersion, R)>,
    {
        let mut compacted = CompactedSources::default();
        let mut count = 0;
        for (version, source) in sources {
            let lines = normalize(source)?;
            let hash = ContentHash::of_lines(&lines);
            if let Entry::Vacant(entry) = compacted.blobs.entry(hash) {
                entry.insert(lines);
            }
            compacted.versions.insert(version, hash);
            count += 1;
        }

        if compacted.versions.len() != count {
            unreachable!(
                "compacted {count} sources but mapped only {} versions",
                compacted.versions.len()
            );
        }
        debug!(
            versions = compacted.versions.len(),
            unique = compacted.unique(),
            "compacted shader"
        );
        Ok(compacted)
    }
}

/// Strips comments, trims lines, collapses runs of whitespace, and drops empty lines.
///
/// A comment is replaced by a space, so it still separates the tokens around it.
///
/// # Errors
///
/// Returns any error from reading `source`, including invalid UTF-8.
pub fn normalize(source: impl BufRead) -> io::Result<Vec<String>> {
    let mut in_block = false;
    let mut lines = Vec::new();
    for line in source.lines() {
        let stripped = strip_comments(&line?, &mut in_block);
        let normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        if !normalized.is_empty() {
            lines.push(normalized);
        }
    }
    Ok(lines)
}

/// Removes the comments from one line. `in_block` carries an open `/*` between lines.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_block {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    *in_block = false;
                    out.push(' ');
                }
                None => return out,
            }
        } else {
            let line_comment = rest.find("//");
            let block_comment = rest.find("/*");
            match (line_comment, block_comment) {
                (Some(line), Some(block)) if line < block => {
                    out.push_str(&rest[..line]);
                    return out;
                }
                (_, Some(block)) => {
                    out.push_str(&rest[..block]);
                    rest = &rest[block + 2..];
                    *in_block = true;
                }
                (Some(line), None) => {
                    out.push_str(&rest[..line]);
                    return out;
                }
                (None, None) => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}
