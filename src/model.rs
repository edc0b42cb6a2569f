
/*!
This module provides the trained error-model tables consumed by the read evaluators.

A [`ModelTable`] is an opaque bundle of per-channel parameters: clamped cubic polynomials in
the channel signal-to-noise ratio for the log-odds of the Extra and Delete moves against Match,
plus the match miscall rate and the branch fraction of extra-base emissions. The evaluator only
consumes the capability surface (`transition_logprobs`, `match_emission_logprob`,
`extra_emission_logprob`); no model logic lives outside this module.

Tables are resolved by identifier through [`ModelTable::lookup`]; unknown identifiers are
reported as unsupported.
*/

use simple_error::bail;

use crate::sequence::base_index;

/// Per-channel signal-to-noise ratios, in A/C/G/T order
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snr {
    pub a: f64,
    pub c: f64,
    pub g: f64,
    pub t: f64
}

impl Snr {
    /// Constructor
    pub fn new(a: f64, c: f64, g: f64, t: f64) -> Snr {
        Snr { a, c, g, t }
    }

    /// Returns the signal-to-noise ratio of the channel a base was called on
    pub fn channel(&self, base: u8) -> f64 {
        match base_index(base) {
            0 => self.a,
            1 => self.c,
            2 => self.g,
            _ => self.t
        }
    }
}

/// Log-probabilities of the three moves leaving a template context
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionLogProbs {
    /// Consume the template base and a read base
    pub log_match: f64,
    /// Emit an extra read base without consuming the template base
    pub log_extra: f64,
    /// Skip the template base without emitting
    pub log_delete: f64
}

/// A trained parameter table for one chemistry/model identifier.
/// All polynomial coefficients are per channel (A/C/G/T) in ascending power order.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelTable {
    /// The model identifier, e.g. "P6/C4"
    pub name: &'static str,
    /// Probability that a match emission miscalls the template base
    pub miscall_rate: f64,
    /// Probability that an extra emission copies the upcoming template base
    pub branch_fraction: f64,
    /// Fitted per-channel SNR range; inputs are clamped into it
    pub snr_ranges: [[f64; 2]; 4],
    /// Cubic coefficients for the Extra log-odds against Match
    pub extra_logit: [[f64; 4]; 4],
    /// Cubic coefficients for the Delete log-odds against Match
    pub delete_logit: [[f64; 4]; 4]
}

/// The P6-C4 chemistry table
static P6_C4: ModelTable = ModelTable {
    name: "P6/C4",
    miscall_rate: 0.00505052456472967,
    branch_fraction: 0.440055,
    snr_ranges: [
        [3.91, 10.65],
        [3.77, 7.05],
        [3.72, 5.00],
        [4.24, 11.76]
    ],
    extra_logit: [
        [-0.735411, -0.179893, 0.0027173, -0.00008117],
        [-0.809863, -0.185813, 0.0031716, -0.00009774],
        [-0.823265, -0.201862, 0.0033887, -0.00011043],
        [-0.706358, -0.178060, 0.0026527, -0.00007998]
    ],
    delete_logit: [
        [-1.024989, -0.202477, 0.0029167, -0.00008727],
        [-1.102474, -0.209124, 0.0033162, -0.00010021],
        [-1.131883, -0.220527, 0.0035499, -0.00011561],
        [-0.997127, -0.199519, 0.0028493, -0.00008318]
    ]
};

impl ModelTable {
    /// Resolves a model identifier to its parameter table.
    /// # Arguments
    /// * `name` - the model identifier, e.g. "P6/C4"
    /// # Errors
    /// * if no table is registered under the identifier
    pub fn lookup(name: &str) -> Result<&'static ModelTable, Box<dyn std::error::Error>> {
        match name {
            "P6/C4" => Ok(&P6_C4),
            _ => bail!("Unsupported: unknown model identifier: {:?}", name)
        }
    }

    /// Returns the move log-probabilities for a template context.
    /// # Arguments
    /// * `ctx` - the template base about to be consumed
    /// * `snr` - per-channel signal-to-noise ratios of the read
    pub fn transition_logprobs(&self, ctx: u8, snr: &Snr) -> TransitionLogProbs {
        let channel = base_index(ctx);
        let range = &self.snr_ranges[channel];
        let s = snr.channel(ctx).clamp(range[0], range[1]);

        let extra_odds = polynomial(&self.extra_logit[channel], s);
        let delete_odds = polynomial(&self.delete_logit[channel], s);

        // softmax against the implicit zero logit of Match
        let log_norm = (1.0 + extra_odds.exp() + delete_odds.exp()).ln();
        TransitionLogProbs {
            log_match: -log_norm,
            log_extra: extra_odds - log_norm,
            log_delete: delete_odds - log_norm
        }
    }

    /// Log-probability that a match against `ctx` emits `base`
    pub fn match_emission_logprob(&self, ctx: u8, base: u8) -> f64 {
        if base == ctx {
            (1.0 - self.miscall_rate).ln()
        } else {
            (self.miscall_rate / 3.0).ln()
        }
    }

    /// Log-probability that an extra emission ahead of `ctx` emits `base`
    pub fn extra_emission_logprob(&self, ctx: u8, base: u8) -> f64 {
        if base == ctx {
            self.branch_fraction.ln()
        } else {
            ((1.0 - self.branch_fraction) / 3.0).ln()
        }
    }
}

/// Evaluates a polynomial with ascending-power coefficients at `x`
fn polynomial(coefficients: &[f64; 4], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::BASES;

    fn test_snr() -> Snr {
        Snr::new(10.0, 7.0, 5.0, 11.0)
    }

    #[test]
    fn test_lookup() {
        let model = ModelTable::lookup("P6/C4").unwrap();
        assert_eq!(model.name, "P6/C4");

        let unknown = ModelTable::lookup("P5/C3");
        assert!(unknown.is_err());
        assert!(unknown.err().unwrap().to_string().contains("Unsupported"));
    }

    #[test]
    fn test_transitions_normalize() {
        let model = ModelTable::lookup("P6/C4").unwrap();
        let snr = test_snr();
        for &ctx in BASES.iter() {
            let trans = model.transition_logprobs(ctx, &snr);
            let total = trans.log_match.exp() + trans.log_extra.exp() + trans.log_delete.exp();
            assert!((total - 1.0).abs() < 1e-12);
            // match carries the bulk of the mass at any in-range snr
            assert!(trans.log_match > trans.log_extra);
            assert!(trans.log_match > trans.log_delete);
        }
    }

    #[test]
    fn test_snr_clamping() {
        let model = ModelTable::lookup("P6/C4").unwrap();
        let huge = Snr::new(100.0, 100.0, 100.0, 100.0);
        let at_max = Snr::new(10.65, 7.05, 5.00, 11.76);
        for &ctx in BASES.iter() {
            assert_eq!(model.transition_logprobs(ctx, &huge), model.transition_logprobs(ctx, &at_max));
        }
    }

    #[test]
    fn test_lower_snr_means_more_errors() {
        let model = ModelTable::lookup("P6/C4").unwrap();
        let noisy = Snr::new(5.0, 5.0, 4.0, 5.0);
        let clean = test_snr();
        for &ctx in BASES.iter() {
            let noisy_trans = model.transition_logprobs(ctx, &noisy);
            let clean_trans = model.transition_logprobs(ctx, &clean);
            assert!(noisy_trans.log_extra > clean_trans.log_extra);
            assert!(noisy_trans.log_delete > clean_trans.log_delete);
        }
    }

    #[test]
    fn test_emissions_normalize() {
        let model = ModelTable::lookup("P6/C4").unwrap();
        for &ctx in BASES.iter() {
            let match_total: f64 = BASES.iter().map(|&b| model.match_emission_logprob(ctx, b).exp()).sum();
            let extra_total: f64 = BASES.iter().map(|&b| model.extra_emission_logprob(ctx, b).exp()).sum();
            assert!((match_total - 1.0).abs() < 1e-12);
            assert!((extra_total - 1.0).abs() < 1e-12);
        }
    }
}
