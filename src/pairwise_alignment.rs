
/*!
This module provides pairwise alignment of two base sequences.

The alignment is represented by a [`PairwiseAlignment`], which stores the gapped target and
query together with a transcript over `M/R/I/D` (match, replacement, insertion, deletion).
[`align`] runs a global Needleman-Wunsch alignment with configurable scores.

# Example usage
```rust
use arrow_con::align_config::AlignConfig;
use arrow_con::pairwise_alignment::align;

let (alignment, score) = align(b"GAT", b"GAAT", &AlignConfig::default()).unwrap();
assert_eq!(alignment.target(), b"G-AT");
assert_eq!(alignment.query(), b"GAAT");
assert_eq!(alignment.transcript(), b"MIMM");
assert_eq!(score, 5);
```
*/

use simple_error::bail;

use crate::align_config::{AlignConfig, AlignMode};
use crate::sequence::{is_valid_base, validate_bases};

/// The gap symbol used inside aligned sequences
pub const GAP: u8 = b'-';

/// A pairwise alignment of a target and query sequence.
/// The aligned sequences have equal length and may contain gaps; the transcript is derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairwiseAlignment {
    /// The aligned target, with gaps for insertions
    target: Vec<u8>,
    /// The aligned query, with gaps for deletions
    query: Vec<u8>,
    /// The alignment transcript over `M/R/I/D`
    transcript: Vec<u8>
}

impl PairwiseAlignment {
    /// Builds an alignment from a gapped target and query pair, deriving the transcript.
    /// # Arguments
    /// * `target` - the aligned target sequence, `{ACGT-}`
    /// * `query` - the aligned query sequence, `{ACGT-}`, same length as `target`
    /// # Errors
    /// * if the two sequences have different lengths
    /// * if any column is gap-on-gap
    /// * if any symbol is outside `{ACGT-}`
    pub fn from_aligned(target: &[u8], query: &[u8]) -> Result<PairwiseAlignment, Box<dyn std::error::Error>> {
        if target.len() != query.len() {
            bail!("Invalid input: aligned target and query have different lengths: {} != {}", target.len(), query.len());
        }

        let mut transcript = Vec::with_capacity(target.len());
        for (&t, &q) in target.iter().zip(query.iter()) {
            if (t != GAP && !is_valid_base(t)) || (q != GAP && !is_valid_base(q)) {
                bail!("Invalid input: aligned sequences contain a symbol outside ACGT-");
            }

            let tr = if t == GAP && q == GAP {
                bail!("Invalid input: aligned column is gap-on-gap");
            } else if t == q {
                b'M'
            } else if t == GAP {
                b'I'
            } else if q == GAP {
                b'D'
            } else {
                b'R'
            };
            transcript.push(tr);
        }

        Ok(PairwiseAlignment {
            target: target.to_vec(),
            query: query.to_vec(),
            transcript
        })
    }

    /// Builds an alignment from a transcript and the two unaligned sequences.
    /// Returns `None` when the transcript does not thread the sequences: a length overrun,
    /// an `M` over unequal bases, an `R` over equal bases, an unknown transcript symbol, or
    /// leftover unconsumed bases.
    /// # Arguments
    /// * `transcript` - the alignment transcript over `M/R/I/D`
    /// * `target` - the unaligned target sequence
    /// * `query` - the unaligned query sequence
    pub fn from_transcript(transcript: &[u8], target: &[u8], query: &[u8]) -> Option<PairwiseAlignment> {
        let mut aln_target = Vec::with_capacity(transcript.len());
        let mut aln_query = Vec::with_capacity(transcript.len());
        let mut t_pos = 0;
        let mut q_pos = 0;

        for &x in transcript.iter() {
            match x {
                b'M' | b'R' => {
                    if t_pos >= target.len() || q_pos >= query.len() {
                        return None;
                    }
                    let t = target[t_pos];
                    let q = query[q_pos];
                    if (x == b'M') != (t == q) {
                        return None;
                    }
                    aln_target.push(t);
                    aln_query.push(q);
                    t_pos += 1;
                    q_pos += 1;
                },
                b'I' => {
                    if q_pos >= query.len() {
                        return None;
                    }
                    aln_target.push(GAP);
                    aln_query.push(query[q_pos]);
                    q_pos += 1;
                },
                b'D' => {
                    if t_pos >= target.len() {
                        return None;
                    }
                    aln_target.push(target[t_pos]);
                    aln_query.push(GAP);
                    t_pos += 1;
                },
                _ => {
                    return None;
                }
            }
        }

        // did not consume all of one of the strings
        if t_pos != target.len() || q_pos != query.len() {
            return None;
        }

        let mut transcript_copy = Vec::with_capacity(transcript.len());
        transcript_copy.extend_from_slice(transcript);
        Some(PairwiseAlignment {
            target: aln_target,
            query: aln_query,
            transcript: transcript_copy
        })
    }

    // getters
    pub fn target(&self) -> &[u8] {
        &self.target
    }

    pub fn query(&self) -> &[u8] {
        &self.query
    }

    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// The number of alignment columns
    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    fn count(&self, symbol: u8) -> usize {
        self.transcript.iter().filter(|&&x| x == symbol).count()
    }

    pub fn matches(&self) -> usize {
        self.count(b'M')
    }

    pub fn mismatches(&self) -> usize {
        self.count(b'R')
    }

    pub fn insertions(&self) -> usize {
        self.count(b'I')
    }

    pub fn deletions(&self) -> usize {
        self.count(b'D')
    }

    pub fn errors(&self) -> usize {
        self.len() - self.matches()
    }

    /// The fraction of alignment columns that are matches
    pub fn accuracy(&self) -> f64 {
        self.matches() as f64 / self.len() as f64
    }
}

/// Aligns a query against a target with Needleman-Wunsch dynamic programming, returning the
/// alignment and its score. Traceback ties are broken deterministically: diagonal first, then
/// insertion, then deletion.
/// # Arguments
/// * `target` - the target sequence, `{ACGT}`
/// * `query` - the query sequence, `{ACGT}`
/// * `config` - alignment mode and scoring parameters; only `Global` mode is implemented
/// # Errors
/// * if either sequence is empty or contains a non-base symbol
/// * if the mode is not `Global`
pub fn align(target: &[u8], query: &[u8], config: &AlignConfig) -> Result<(PairwiseAlignment, i32), Box<dyn std::error::Error>> {
    if config.mode != AlignMode::Global {
        bail!("Unsupported: only Global mode is implemented for pairwise alignment");
    }
    validate_bases("target", target)?;
    validate_bases("query", query)?;

    let params = config.params;
    let num_rows = query.len() + 1;
    let num_cols = target.len() + 1;

    // row-major (query+1) x (target+1) score matrix
    let mut score = vec![0; num_rows * num_cols];
    for i in 1..num_rows {
        score[i * num_cols] = i as i32 * params.insert;
    }
    for j in 1..num_cols {
        score[j] = j as i32 * params.delete;
    }
    for i in 1..num_rows {
        for j in 1..num_cols {
            let sub = if query[i - 1] == target[j - 1] { params.match_score } else { params.mismatch };
            score[i * num_cols + j] = (score[(i - 1) * num_cols + (j - 1)] + sub)
                .max(score[(i - 1) * num_cols + j] + params.insert)
                .max(score[i * num_cols + (j - 1)] + params.delete);
        }
    }
    let final_score = score[num_rows * num_cols - 1];

    // traceback, building the aligned pair in reverse
    let mut rev_target = vec![];
    let mut rev_query = vec![];
    let mut i = query.len();
    let mut j = target.len();
    while i > 0 || j > 0 {
        let move_index = if i == 0 {
            2 // only a deletion is possible
        } else if j == 0 {
            1 // only an insertion is possible
        } else {
            let sub = if query[i - 1] == target[j - 1] { params.match_score } else { params.mismatch };
            let candidates = [
                score[(i - 1) * num_cols + (j - 1)] + sub,
                score[(i - 1) * num_cols + j] + params.insert,
                score[i * num_cols + (j - 1)] + params.delete
            ];
            // first maximum wins: diagonal, then insert, then delete
            let best = *candidates.iter().max().unwrap();
            candidates.iter().position(|&c| c == best).unwrap()
        };

        match move_index {
            0 => {
                i -= 1;
                j -= 1;
                rev_query.push(query[i]);
                rev_target.push(target[j]);
            },
            1 => {
                i -= 1;
                rev_query.push(query[i]);
                rev_target.push(GAP);
            },
            _ => {
                j -= 1;
                rev_query.push(GAP);
                rev_target.push(target[j]);
            }
        };
    }

    rev_target.reverse();
    rev_query.reverse();
    let alignment = PairwiseAlignment::from_aligned(&rev_target, &rev_query)?;
    Ok((alignment, final_score))
}

/// Lifts target coordinates into query coordinates for a transcript.
/// Returns a vector of length `target_len + 1` where entry `s` is the query offset of the start
/// of target position `s`; for any target slice `[s, e)` the aligned query subslice is
/// `[result[s], result[e])`. Entries are monotone non-decreasing and the final entry is the
/// query length.
/// # Arguments
/// * `transcript` - the alignment transcript over `M/R/I/D`
pub fn target_to_query_positions(transcript: &[u8]) -> Vec<usize> {
    let mut positions = vec![];
    let mut query_pos = 0;

    for &x in transcript.iter() {
        match x {
            b'M' | b'R' => {
                positions.push(query_pos);
                query_pos += 1;
            },
            b'D' => {
                positions.push(query_pos);
            },
            b'I' => {
                query_pos += 1;
            },
            _ => unreachable!("transcript contains unknown symbol: {}", x as char)
        }
    }
    positions.push(query_pos);

    positions
}
