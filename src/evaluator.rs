
/*!
This module provides the per-read evaluator: the forward/backward log-probability matrices of
one mapped read against the current template span.

The underlying model is a three-move pair HMM. At each template position the read either
incorporates the base (Match, consuming template and read), emits an extra base (Extra,
consuming read only), or skips the base (Delete, consuming template only); move and emission
log-probabilities come from the trained [`ModelTable`] and the read's per-channel SNR. The
forward matrix α and backward matrix β have shape `(span_len + 1) x (read_len + 1)`; cells are
combined with log-sum-exp so the scalar log-likelihood is the natural log of the full partition
function over alignment paths.

Scoring a hypothetical mutation never touches stored state: the forward matrix is recomputed on
the mutated span, reusing the rows above the mutation for forward-strand reads. This makes the
score of a mutation equal, by construction, to the log-likelihood a fresh evaluator on the
mutated template would report.
*/

use log::warn;

use crate::model::{ModelTable, Snr, TransitionLogProbs};
use crate::mutation::{Mutation, MutationType};
use crate::read::{MappedRead, Strand};
use crate::sequence::{reverse_complement, validate_bases};

/// Tolerance for the α/β corner self-check
const ALPHA_BETA_TOLERANCE: f64 = 1e-3;

/// Adds two probabilities in log space
fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Forward/backward matrices of one mapped read against the current template span
#[derive(Clone, Debug)]
pub struct Evaluator {
    /// The read, its strand, and its original mapping
    mapped_read: MappedRead,
    /// The read's per-channel signal-to-noise ratios
    snr: Snr,
    /// The trained model table
    model: &'static ModelTable,
    /// Current start of the mapped span on the template
    span_start: usize,
    /// Current exclusive end of the mapped span on the template
    span_end: usize,
    /// The template span in the orientation the read is evaluated against
    oriented: Vec<u8>,
    /// Move log-probabilities per oriented position
    transitions: Vec<TransitionLogProbs>,
    /// Forward log-probability matrix
    alpha: Vec<Vec<f64>>,
    /// Backward log-probability matrix
    beta: Vec<Vec<f64>>
}

impl Evaluator {
    /// Builds the evaluator and fills both matrices.
    /// # Arguments
    /// * `mapped_read` - the read and its template span
    /// * `template` - the full template the span refers to
    /// * `snr` - per-channel signal-to-noise ratios for the read
    /// * `model` - the trained model table
    /// # Errors
    /// * if the read is empty or contains a non-base symbol
    /// * if the mapped span is empty or runs past the template
    pub fn new(mapped_read: MappedRead, template: &[u8], snr: Snr, model: &'static ModelTable) -> Result<Evaluator, Box<dyn std::error::Error>> {
        validate_bases("read", mapped_read.read().seq())?;
        let span_start = mapped_read.template_start();
        let span_end = mapped_read.template_end();
        if span_start >= span_end || span_end > template.len() {
            simple_error::bail!(
                "Invalid input: mapped span [{span_start}, {span_end}) does not fit a template of length {}",
                template.len()
            );
        }

        let mut evaluator = Evaluator {
            mapped_read,
            snr,
            model,
            span_start,
            span_end,
            oriented: vec![],
            transitions: vec![],
            alpha: vec![],
            beta: vec![],
        };
        evaluator.rebuild(&template[span_start..span_end]);
        Ok(evaluator)
    }

    // getters
    pub fn mapped_read(&self) -> &MappedRead {
        &self.mapped_read
    }

    pub fn span_start(&self) -> usize {
        self.span_start
    }

    pub fn span_end(&self) -> usize {
        self.span_end
    }

    /// The scalar log-likelihood of the read given the current span
    pub fn ll(&self) -> f64 {
        self.alpha[self.oriented.len()][self.read_len()]
    }

    fn read_len(&self) -> usize {
        self.mapped_read.read().len()
    }

    fn read_base(&self, index: usize) -> u8 {
        self.mapped_read.read().seq()[index]
    }

    /// The context consumed when entering oriented row `row + 1`; extras inside the final row
    /// keep the last base's context.
    fn context(oriented: &[u8], row: usize) -> u8 {
        oriented[row.min(oriented.len() - 1)]
    }

    fn orient(&self, span: &[u8]) -> Vec<u8> {
        match self.mapped_read.strand() {
            Strand::Forward => span.to_vec(),
            Strand::Reverse => reverse_complement(span)
        }
    }

    fn transitions_for(&self, oriented: &[u8]) -> Vec<TransitionLogProbs> {
        oriented.iter().map(|&base| self.model.transition_logprobs(base, &self.snr)).collect()
    }

    /// Recomputes everything against a new span; used at construction and after mutations.
    fn rebuild(&mut self, span: &[u8]) {
        self.oriented = self.orient(span);
        self.transitions = self.transitions_for(&self.oriented);

        let rows = self.oriented.len() + 1;
        let cols = self.read_len() + 1;
        let mut alpha = vec![vec![f64::NEG_INFINITY; cols]; rows];
        self.fill_alpha_rows(&self.oriented, &self.transitions, &mut alpha, 0);
        self.alpha = alpha;
        self.beta = self.fill_beta();

        let drift = (self.ll() - self.beta[0][0]).abs();
        if drift > ALPHA_BETA_TOLERANCE {
            warn!(
                "alpha/beta corner drift {drift:.6} beyond tolerance for read {}",
                self.mapped_read.read().name()
            );
        }
    }

    /// Fills forward rows `from_row..` against the given oriented span. Rows above `from_row`
    /// must already hold valid values for that span.
    fn fill_alpha_rows(&self, oriented: &[u8], transitions: &[TransitionLogProbs], alpha: &mut [Vec<f64>], from_row: usize) {
        let read_len = self.read_len();
        for row in from_row..=oriented.len() {
            let enter_ctx_index = if row > 0 { row - 1 } else { 0 };
            let within_ctx = Self::context(oriented, row);
            let within_trans = &transitions[row.min(oriented.len() - 1)];

            for col in 0..=read_len {
                if row == 0 && col == 0 {
                    alpha[0][0] = 0.0;
                    continue;
                }

                let mut total = f64::NEG_INFINITY;
                if row > 0 && col > 0 {
                    let ctx = oriented[enter_ctx_index];
                    let trans = &transitions[enter_ctx_index];
                    total = alpha[row - 1][col - 1]
                        + trans.log_match
                        + self.model.match_emission_logprob(ctx, self.read_base(col - 1));
                }
                if col > 0 {
                    let extra = alpha[row][col - 1]
                        + within_trans.log_extra
                        + self.model.extra_emission_logprob(within_ctx, self.read_base(col - 1));
                    total = log_add(total, extra);
                }
                if row > 0 {
                    let delete = alpha[row - 1][col] + transitions[enter_ctx_index].log_delete;
                    total = log_add(total, delete);
                }
                alpha[row][col] = total;
            }
        }
    }

    fn fill_beta(&self) -> Vec<Vec<f64>> {
        let span_len = self.oriented.len();
        let read_len = self.read_len();
        let mut beta = vec![vec![f64::NEG_INFINITY; read_len + 1]; span_len + 1];

        beta[span_len][read_len] = 0.0;
        for row in (0..=span_len).rev() {
            let ctx = Self::context(&self.oriented, row);
            let trans = &self.transitions[row.min(span_len - 1)];
            for col in (0..=read_len).rev() {
                if row == span_len && col == read_len {
                    continue;
                }

                let mut total = f64::NEG_INFINITY;
                if row < span_len && col < read_len {
                    total = trans.log_match
                        + self.model.match_emission_logprob(ctx, self.read_base(col))
                        + beta[row + 1][col + 1];
                }
                if col < read_len {
                    let extra = trans.log_extra
                        + self.model.extra_emission_logprob(ctx, self.read_base(col))
                        + beta[row][col + 1];
                    total = log_add(total, extra);
                }
                if row < span_len {
                    let delete = trans.log_delete + beta[row + 1][col];
                    total = log_add(total, delete);
                }
                beta[row][col] = total;
            }
        }
        beta
    }

    /// The log-likelihood recovered by linking α row `junction` to β row `junction + 1` across
    /// the moves that consume that template base. Equal to [`Self::ll`] at every junction,
    /// within numerical tolerance.
    /// # Arguments
    /// * `junction` - the oriented template row crossed, `0..span_len`
    pub fn ll_at_junction(&self, junction: usize) -> f64 {
        assert!(junction < self.oriented.len());
        let ctx = self.oriented[junction];
        let trans = &self.transitions[junction];
        let read_len = self.read_len();

        let mut total = f64::NEG_INFINITY;
        for col in 0..=read_len {
            if col < read_len {
                let across_match = self.alpha[junction][col]
                    + trans.log_match
                    + self.model.match_emission_logprob(ctx, self.read_base(col))
                    + self.beta[junction + 1][col + 1];
                total = log_add(total, across_match);
            }
            let across_delete = self.alpha[junction][col] + trans.log_delete + self.beta[junction + 1][col];
            total = log_add(total, across_delete);
        }
        total
    }

    /// Maps a template mutation onto the current span: the span deltas and whether the span
    /// content changes. Insertions at either span boundary are absorbed into the span, matching
    /// what a fresh evaluator over the mutated template would cover.
    fn span_effect(&self, mutation: &Mutation) -> (isize, isize, bool) {
        let position = mutation.position();
        match mutation.kind() {
            MutationType::Insertion => {
                if position < self.span_start {
                    (1, 1, false)
                } else if position <= self.span_end {
                    (0, 1, true)
                } else {
                    (0, 0, false)
                }
            },
            MutationType::Deletion => {
                if position < self.span_start {
                    (-1, -1, false)
                } else if position < self.span_end {
                    (0, -1, true)
                } else {
                    (0, 0, false)
                }
            },
            MutationType::Substitution => {
                if position >= self.span_start && position < self.span_end {
                    (0, 0, true)
                } else {
                    (0, 0, false)
                }
            }
        }
    }

    /// Applies a mutation to a copy of the current span, in span coordinates.
    fn mutated_span(&self, mutation: &Mutation) -> Vec<u8> {
        let mut span = self.current_span();
        let offset = mutation.position() - self.span_start;
        match mutation.kind() {
            MutationType::Insertion => span.insert(offset, mutation.base().unwrap()),
            MutationType::Deletion => {
                span.remove(offset);
            },
            MutationType::Substitution => span[offset] = mutation.base().unwrap()
        };
        span
    }

    /// The span bases in template orientation
    fn current_span(&self) -> Vec<u8> {
        match self.mapped_read.strand() {
            Strand::Forward => self.oriented.clone(),
            Strand::Reverse => reverse_complement(&self.oriented)
        }
    }

    /// The log-likelihood the read would have if the mutation were applied to the template.
    /// Stored state is not modified.
    /// # Arguments
    /// * `mutation` - the probed mutation, in template coordinates
    pub fn ll_with_mutation(&self, mutation: &Mutation) -> f64 {
        let (_, _, affects_span) = self.span_effect(mutation);
        if !affects_span {
            return self.ll();
        }

        let span = self.mutated_span(mutation);
        let oriented = self.orient(&span);
        let transitions = self.transitions_for(&oriented);

        // rows above the mutation are unchanged on the forward strand; reverse-strand spans
        // reorder under the complement, so they recompute from scratch
        let from_row = match self.mapped_read.strand() {
            Strand::Forward => mutation.position() - self.span_start,
            Strand::Reverse => 0
        };

        let cols = self.read_len() + 1;
        let mut alpha = vec![vec![f64::NEG_INFINITY; cols]; oriented.len() + 1];
        for row in 0..from_row.min(alpha.len()) {
            alpha[row].clone_from(&self.alpha[row]);
        }
        self.fill_alpha_rows(&oriented, &transitions, &mut alpha, from_row);
        alpha[oriented.len()][self.read_len()]
    }

    /// Moves the evaluator onto a mutated template: shifts the mapped span per mutation and
    /// rebuilds both matrices against the new span.
    /// # Arguments
    /// * `mutations` - the mutations, in original-template coordinates
    /// * `new_template` - the template with the mutations already applied
    /// # Errors
    /// * if the mutations collapse the mapped span to nothing
    pub fn apply_mutations(&mut self, mutations: &[Mutation], new_template: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let mut start = self.span_start as isize;
        let mut end = self.span_end as isize;
        for mutation in mutations.iter() {
            let (start_delta, end_delta, _) = self.span_effect(mutation);
            start += start_delta;
            end += end_delta;
        }

        if start >= end {
            simple_error::bail!("Invalid input: mutations collapse the mapped span of read {}", self.mapped_read.read().name());
        }
        self.span_start = start as usize;
        self.span_end = end as usize;
        debug_assert!(self.span_end <= new_template.len());

        let span = new_template[self.span_start..self.span_end].to_vec();
        self.rebuild(&span);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::all_point_mutations;
    use crate::read::Read;

    fn snr() -> Snr {
        Snr::new(10.0, 7.0, 5.0, 11.0)
    }

    fn model() -> &'static ModelTable {
        ModelTable::lookup("P6/C4").unwrap()
    }

    fn full_span_evaluator(template: &[u8], read: &[u8], strand: Strand) -> Evaluator {
        let mapped = MappedRead::new(Read::new("N/A", read, "P6/C4"), strand, 0, template.len());
        Evaluator::new(mapped, template, snr(), model()).unwrap()
    }

    #[test]
    fn test_log_add() {
        let sum = log_add(0.5_f64.ln(), 0.25_f64.ln());
        assert!((sum - 0.75_f64.ln()).abs() < 1e-12);
        assert_eq!(log_add(f64::NEG_INFINITY, -1.0), -1.0);
        assert_eq!(log_add(-1.0, f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_perfect_read_outscores_errors() {
        let template = b"ACGTACGTACGTACGT";
        let perfect = full_span_evaluator(template, template, Strand::Forward);
        let mismatched = full_span_evaluator(template, b"ACGTACTTACGTACGT", Strand::Forward);
        let extra = full_span_evaluator(template, b"ACGTACGGTACGTACGT", Strand::Forward);

        assert!(perfect.ll() < 0.0);
        assert!(perfect.ll() > mismatched.ll());
        assert!(perfect.ll() > extra.ll());
    }

    #[test]
    fn test_alpha_beta_corners_agree() {
        let template = b"ACGTTGCAGTACCA";
        let evaluator = full_span_evaluator(template, b"ACGTGCAGGTACCA", Strand::Forward);
        assert!((evaluator.ll() - evaluator.beta[0][0]).abs() < ALPHA_BETA_TOLERANCE);
    }

    #[test]
    fn test_junction_invariance() {
        let template = b"ACGGTTGCAGTACCATG";
        let read = b"ACGTTGAGTACCCATG";
        for strand in [Strand::Forward, Strand::Reverse] {
            let evaluator = full_span_evaluator(template, read, strand);
            let baseline = evaluator.ll();
            for junction in 0..template.len() {
                assert!(
                    (evaluator.ll_at_junction(junction) - baseline).abs() < 1e-3,
                    "junction {junction} disagrees with the corner"
                );
            }
        }
    }

    #[test]
    fn test_reverse_strand_matches_complemented_template() {
        // a reverse-strand read evaluates against the reverse complement of its span, so it
        // must agree exactly with a forward evaluation on the complemented template
        let template = b"AACGTTGCA";
        let complemented = reverse_complement(template);
        let read = b"AACGTGCA";
        let reverse = full_span_evaluator(template, read, Strand::Reverse);
        let forward = full_span_evaluator(&complemented, read, Strand::Forward);
        assert_eq!(reverse.ll(), forward.ll());
    }

    #[test]
    fn test_mutation_scores_match_fresh_build() {
        let template = b"ACGTTGCAGTACCA";
        let read = b"ACGTGCAGGTACCA";
        for strand in [Strand::Forward, Strand::Reverse] {
            let evaluator = full_span_evaluator(template, read, strand);
            for mutation in all_point_mutations(template) {
                let mutated = crate::mutation::apply_mutations(template, &[mutation]).unwrap();
                let fresh = full_span_evaluator(&mutated, read, strand);
                let probed = evaluator.ll_with_mutation(&mutation);
                assert!(
                    (probed - fresh.ll()).abs() < 1e-3,
                    "{mutation} probed {probed} but fresh build got {}",
                    fresh.ll()
                );
            }
        }
    }

    #[test]
    fn test_mutation_outside_span_is_neutral() {
        let template = b"ACGTTGCAGTACCA";
        // the read covers only the middle of the template
        let mapped = MappedRead::new(Read::new("N/A", b"TGCAG", "P6/C4"), Strand::Forward, 4, 9);
        let evaluator = Evaluator::new(mapped, template, snr(), model()).unwrap();

        let baseline = evaluator.ll();
        assert_eq!(evaluator.ll_with_mutation(&Mutation::substitution(0, b'G')), baseline);
        assert_eq!(evaluator.ll_with_mutation(&Mutation::deletion(12)), baseline);
        assert_eq!(evaluator.ll_with_mutation(&Mutation::insertion(14, b'T')), baseline);
        // inside the span the likelihood moves
        assert!(evaluator.ll_with_mutation(&Mutation::deletion(5)) != baseline);
    }

    #[test]
    fn test_apply_mutations_shifts_span() {
        let template = b"ACGTTGCAGTACCA";
        let mapped = MappedRead::new(Read::new("N/A", b"TGCAG", "P6/C4"), Strand::Forward, 4, 9);
        let mut evaluator = Evaluator::new(mapped, template, snr(), model()).unwrap();

        // an insertion before the span shifts it without changing its content or likelihood
        let baseline = evaluator.ll();
        let mutation = Mutation::insertion(1, b'T');
        let new_template = crate::mutation::apply_mutations(template, &[mutation]).unwrap();
        evaluator.apply_mutations(&[mutation], &new_template).unwrap();
        assert_eq!(evaluator.span_start(), 5);
        assert_eq!(evaluator.span_end(), 10);
        assert!((evaluator.ll() - baseline).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let template = b"ACGT";
        let empty = MappedRead::new(Read::new("N/A", b"", "P6/C4"), Strand::Forward, 0, 4);
        assert!(Evaluator::new(empty, template, snr(), model()).is_err());

        let overrun = MappedRead::new(Read::new("N/A", b"ACGT", "P6/C4"), Strand::Forward, 0, 5);
        assert!(Evaluator::new(overrun, template, snr(), model()).is_err());

        let inverted = MappedRead::new(Read::new("N/A", b"ACGT", "P6/C4"), Strand::Forward, 3, 3);
        assert!(Evaluator::new(inverted, template, snr(), model()).is_err());
    }
}
