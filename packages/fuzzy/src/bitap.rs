//! Bitap (shift-or) approximate substring search.
//!
//! Each error level `k` keeps one bit row over the text; bit `i` of a
//! cell is set when the last `i + 1` pattern characters match starting at
//! that position with at most `k` edits. Location is ignored, so a match
//! with `k` errors scores `k / pattern_len` wherever it occurs.

use std::collections::HashMap;

/// Longest pattern a single bit row can hold. Longer patterns are split
/// into chunks of this many characters.
pub const MAX_PATTERN_CHARS: usize = 32;

/// Smallest score reported for a non-identical match.
const MIN_SCORE: f64 = 0.001;

/// Outcome of a successful bitap search.
#[derive(Debug, Clone, PartialEq)]
pub struct BitapMatch {
    /// Error ratio in `[0, 1]`.
    pub score: f64,
    /// Inclusive character ranges of the text that matched.
    pub indices: Vec<(usize, usize)>,
}

/// Result of searching one chunk. `score` is meaningful even when
/// `is_match` is false.
#[derive(Debug, Clone, PartialEq)]
struct ChunkOutcome {
    is_match: bool,
    score: f64,
    indices: Vec<(usize, usize)>,
}

/// One slice of the pattern together with its character bitmasks.
#[derive(Debug, Clone)]
struct Chunk {
    chars: Vec<char>,
    alphabet: HashMap<char, u64>,
}

impl Chunk {
    fn new(chars: &[char]) -> Self {
        let len = chars.len();
        let mut alphabet: HashMap<char, u64> = HashMap::new();
        for (i, c) in chars.iter().enumerate() {
            *alphabet.entry(*c).or_insert(0) |= 1u64 << (len - i - 1);
        }
        Self {
            chars: chars.to_vec(),
            alphabet,
        }
    }
}

/// Precompiled searcher for one (already lowercased) pattern.
#[derive(Debug, Clone)]
pub struct BitapSearcher {
    pattern: Vec<char>,
    chunks: Vec<Chunk>,
    threshold: f64,
    min_match_char_length: usize,
}

impl BitapSearcher {
    /// Compiles `pattern`. The pattern must be non-empty.
    #[must_use]
    pub fn new(pattern: &[char], threshold: f64, min_match_char_length: usize) -> Self {
        let len = pattern.len();
        let mut chunks = Vec::new();

        if len <= MAX_PATTERN_CHARS {
            chunks.push(Chunk::new(pattern));
        } else {
            let remainder = len % MAX_PATTERN_CHARS;
            let end = len - remainder;
            let mut start = 0;
            while start < end {
                chunks.push(Chunk::new(&pattern[start..start + MAX_PATTERN_CHARS]));
                start += MAX_PATTERN_CHARS;
            }
            // Tail chunk is aligned to the pattern end so it is full width.
            if remainder > 0 {
                chunks.push(Chunk::new(&pattern[len - MAX_PATTERN_CHARS..]));
            }
        }

        Self {
            pattern: pattern.to_vec(),
            chunks,
            threshold,
            min_match_char_length,
        }
    }

    /// Searches one (already lowercased) text.
    ///
    /// Returns `None` when no chunk matches within the threshold or when the
    /// matched characters never form a run of `min_match_char_length`.
    /// A chunk rejected only for its run length still contributes its raw
    /// score to the average.
    #[must_use]
    pub fn search_in(&self, text: &[char]) -> Option<BitapMatch> {
        if text == self.pattern.as_slice() {
            return Some(BitapMatch {
                score: 0.0,
                indices: vec![(0, text.len().saturating_sub(1))],
            });
        }

        let mut total = 0.0;
        let mut matched = false;
        let mut indices = Vec::new();

        for chunk in &self.chunks {
            let outcome = self.search_chunk(text, chunk);
            total += outcome.score;
            if outcome.is_match {
                matched = true;
                indices.extend(outcome.indices);
            }
        }

        if !matched {
            return None;
        }

        indices.sort_unstable();
        indices.dedup();

        #[allow(clippy::cast_precision_loss)]
        let score = total / self.chunks.len() as f64;

        Some(BitapMatch { score, indices })
    }

    #[allow(clippy::cast_precision_loss)]
    fn search_chunk(&self, text: &[char], chunk: &Chunk) -> ChunkOutcome {
        let pattern_len = chunk.chars.len();
        let text_len = text.len();
        let mut threshold = self.threshold;
        let mut match_mask = vec![false; text_len];

        // Exact occurrences pin the threshold to zero so the error loop
        // stops after the first row.
        for start in find_exact(text, &chunk.chars) {
            threshold = 0.0;
            for flag in &mut match_mask[start..start + pattern_len] {
                *flag = true;
            }
        }

        let high_bit = 1u64 << (pattern_len - 1);
        let finish = text_len + pattern_len;
        let mut best: Option<f64> = None;
        let mut last_row: Vec<u64> = Vec::new();

        for errors in 0..pattern_len {
            let mut row = vec![0u64; finish + 2];
            row[finish + 1] = (1u64 << errors) - 1;

            for j in (1..=finish).rev() {
                let location = j - 1;
                let char_match = text
                    .get(location)
                    .and_then(|c| chunk.alphabet.get(c))
                    .copied()
                    .unwrap_or(0);

                if let Some(flag) = match_mask.get_mut(location) {
                    *flag = char_match != 0;
                }

                row[j] = ((row[j + 1] << 1) | 1) & char_match;
                if errors > 0 {
                    row[j] |= ((last_row[j + 1] | last_row[j]) << 1) | 1 | last_row[j + 1];
                }

                if row[j] & high_bit != 0 {
                    let score = errors as f64 / pattern_len as f64;
                    if score <= threshold {
                        threshold = score;
                        best = Some(score);
                        if location == 0 {
                            break;
                        }
                    }
                }
            }

            if (errors + 1) as f64 / pattern_len as f64 > threshold {
                break;
            }
            last_row = row;
        }

        let Some(score) = best else {
            return ChunkOutcome {
                is_match: false,
                score: 1.0,
                indices: Vec::new(),
            };
        };

        let indices = mask_to_indices(&match_mask, self.min_match_char_length);
        ChunkOutcome {
            is_match: !indices.is_empty(),
            score: score.max(MIN_SCORE),
            indices,
        }
    }
}

/// Start offsets of non-overlapping exact occurrences of `needle`.
fn find_exact(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return found;
    }

    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        if &haystack[start..start + needle.len()] == needle {
            found.push(start);
            start += needle.len();
        } else {
            start += 1;
        }
    }
    found
}

/// Collapses a per-character match mask into runs of at least `min_len`.
fn mask_to_indices(mask: &[bool], min_len: usize) -> Vec<(usize, usize)> {
    let mut indices = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &matched) in mask.iter().enumerate() {
        match (matched, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= min_len {
                    indices.push((start, i - 1));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if mask.len() - start >= min_len {
            indices.push((start, mask.len() - 1));
        }
    }

    indices
}
