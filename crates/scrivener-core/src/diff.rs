//! Character-level diff between an original text and its edited version.
//!
//! The alignment is built from longest matching blocks: take the longest
//! common run of characters (earliest in the original on ties, then earliest
//! in the modified text), then repeat on the unmatched text to its left and to
//! its right. The matched blocks are folded into maximal runs:
//!
//! - every matched block becomes (or extends) an `Equal` segment,
//! - all removed and added text between two `Equal` runs becomes exactly one
//!   `Delete` segment followed by one `Insert` segment.
//!
//! So concatenating `Equal` + `Delete` text gives back the original, and
//! concatenating `Equal` + `Insert` text gives back the modified string.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{DiffKind, DiffSegment};

/// Modified texts at least this long stop seeding matches from very common
/// characters (more than 1% of the text plus one).
const POPULAR_MIN_LEN: usize = 200;

/// Compute the ordered change segments turning `original` into `modified`.
pub fn diff(original: &str, modified: &str) -> Vec<DiffSegment> {
    let segments = align(original, modified);

    // Should be unreachable; a broken alignment must not reach a caller.
    if original_side(&segments) != original || modified_side(&segments) != modified {
        warn!(
            original_len = original.len(),
            modified_len = modified.len(),
            "diff alignment inconsistent, falling back to full replacement"
        );
        return replace_all(original, modified);
    }

    segments
}

fn align(original: &str, modified: &str) -> Vec<DiffSegment> {
    let matcher = Matcher::new(original, modified);

    let mut out = SegmentBuilder::default();
    let (mut i, mut j) = (0, 0);
    for block in matcher.matching_blocks() {
        out.delete(&matcher.a[i..block.i]);
        out.insert(&matcher.b[j..block.j]);
        out.equal(&matcher.a[block.i..block.i + block.len]);
        i = block.i + block.len;
        j = block.j + block.len;
    }
    out.delete(&matcher.a[i..]);
    out.insert(&matcher.b[j..]);
    out.finish()
}

/// `a[i..i + len] == b[j..j + len]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    i: usize,
    j: usize,
    len: usize,
}

struct Matcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Ascending positions of each character of `b`, popular ones left out.
    b2j: HashMap<char, Vec<usize>>,
}

impl Matcher {
    fn new(original: &str, modified: &str) -> Self {
        let a: Vec<char> = original.chars().collect();
        let b: Vec<char> = modified.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest common run inside `a[alo..ahi]` and `b[blo..bhi]`. Ties go to
    /// the earliest start in `a`, then in `b`. The run found through `b2j` is
    /// then widened over equal neighbours, popular characters included.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);

        // Length of the common run ending at (i - 1, j), keyed by j.
        let mut run_at: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_run_at = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = j
                        .checked_sub(1)
                        .and_then(|p| run_at.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let len = prev + 1;
                    next_run_at.insert(j, len);
                    if len > best_len {
                        (best_i, best_j, best_len) = (i + 1 - len, j + 1 - len, len);
                    }
                }
            }
            run_at = next_run_at;
        }

        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        Block {
            i: best_i,
            j: best_j,
            len: best_len,
        }
    }

    /// Non-empty matched blocks in ascending order.
    fn matching_blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            if alo < block.i && blo < block.j {
                pending.push((alo, block.i, blo, block.j));
            }
            if block.i + block.len < ahi && block.j + block.len < bhi {
                pending.push((block.i + block.len, ahi, block.j + block.len, bhi));
            }
            blocks.push(block);
        }

        blocks.sort_unstable_by_key(|b| (b.i, b.j));
        blocks
    }
}

/// Single delete + insert pair, omitting empty sides.
fn replace_all(original: &str, modified: &str) -> Vec<DiffSegment> {
    let mut segments = Vec::with_capacity(2);
    if !original.is_empty() {
        segments.push(DiffSegment::delete(original));
    }
    if !modified.is_empty() {
        segments.push(DiffSegment::insert(modified));
    }
    segments
}

/// Accumulates aligned spans, holding back deletions and insertions until the
/// next equal run so each change hunk is emitted as delete-then-insert.
#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<DiffSegment>,
    deleted: String,
    inserted: String,
}

impl SegmentBuilder {
    fn equal(&mut self, chars: &[char]) {
        if chars.is_empty() {
            return;
        }
        self.flush_hunk();
        match self.segments.last_mut() {
            Some(last) if last.kind == DiffKind::Equal => last.text.extend(chars),
            _ => self
                .segments
                .push(DiffSegment::equal(chars.iter().collect::<String>())),
        }
    }

    fn delete(&mut self, chars: &[char]) {
        self.deleted.extend(chars);
    }

    fn insert(&mut self, chars: &[char]) {
        self.inserted.extend(chars);
    }

    fn flush_hunk(&mut self) {
        if !self.deleted.is_empty() {
            self.segments.push(DiffSegment::delete(std::mem::take(&mut self.deleted)));
        }
        if !self.inserted.is_empty() {
            self.segments.push(DiffSegment::insert(std::mem::take(&mut self.inserted)));
        }
    }

    fn finish(mut self) -> Vec<DiffSegment> {
        self.flush_hunk();
        self.segments
    }
}

/// Reassemble the original text from `Equal` and `Delete` segments.
pub fn original_side(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Insert)
        .map(|s| s.text.as_str())
        .collect()
}

/// Reassemble the modified text from `Equal` and `Insert` segments.
pub fn modified_side(segments: &[DiffSegment]) -> String {
    segments
        .iter()
        .filter(|s| s.kind != DiffKind::Delete)
        .map(|s| s.text.as_str())
        .collect()
}
