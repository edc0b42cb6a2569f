
/*!
This module provides the outer polishing loop that refines a template against its reads.

Each round scores every single-base mutation of the current template through the integrator's
what-if path and applies the one with the largest gain, as long as that gain clears the
configured improvement threshold. Applying a single mutation per round sidesteps position
conflicts between same-round candidates; the loop ends when no candidate improves the
likelihood or the round cap is hit.
*/

use log::{debug, trace};

use crate::integrator::Integrator;
use crate::mutation::{all_point_mutations, ScoredMutation};

/// Outcome of a polishing run
#[derive(Clone, Debug)]
pub struct PolishReport {
    /// The template after polishing
    pub polished_template: Vec<u8>,
    /// The mutations applied, in order, each scored with its likelihood gain
    pub applied: Vec<ScoredMutation>,
    /// Rounds executed, including the final round that found nothing
    pub rounds: usize,
    /// True when the loop stopped because no candidate improved the likelihood
    pub converged: bool,
    /// The aggregate log-likelihood of the polished template
    pub final_ll: f64
}

/// Iteratively improves the integrator's template until no single-base mutation clears the
/// improvement threshold.
/// # Arguments
/// * `integrator` - the integrator holding the template and its reads
/// # Errors
/// * if mutation scoring or application fails
pub fn polish<I: Integrator>(integrator: &mut I) -> Result<PolishReport, Box<dyn std::error::Error>> {
    let threshold = integrator.config().improvement_threshold;
    let max_rounds = integrator.config().max_polish_rounds;

    let mut applied = vec![];
    let mut converged = false;
    let mut rounds = 0;

    while rounds < max_rounds {
        rounds += 1;
        let baseline = integrator.ll();

        let mut best: Option<ScoredMutation> = None;
        for mutation in all_point_mutations(integrator.template()) {
            let gain = integrator.ll_with_mutation(&mutation)? - baseline;
            trace!("round {rounds}: {mutation} scores {gain:.4}");
            if gain > threshold && best.map_or(true, |b| gain > b.score) {
                best = Some(mutation.with_score(gain));
            }
        }

        match best {
            Some(scored) => {
                debug!("round {rounds}: applying {scored}");
                integrator.apply_mutations(&[scored.mutation])?;
                applied.push(scored);
            },
            None => {
                converged = true;
                break;
            }
        };
    }

    let final_ll = integrator.ll();
    debug!("polish finished after {rounds} rounds, {} mutations, LL {final_ll:.4}", applied.len());
    Ok(PolishReport {
        polished_template: integrator.template().to_vec(),
        applied,
        rounds,
        converged,
        final_ll
    })
}
