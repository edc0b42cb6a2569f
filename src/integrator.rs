
/*!
This module provides the likelihood integrators: a current template plus one evaluator per
mapped read, with cheap what-if scoring of single-base template mutations.

Two flavours exist. [`MonoMolecularIntegrator`] models reads from one molecule, sharing a
single SNR and model table across all of them; [`MultiMolecularIntegrator`] resolves the model
per read and takes an SNR with each one. Both implement [`Integrator`], the seam the polishing
driver runs against.

# Example usage
```rust
use arrow_con::integrator::{Integrator, IntegratorConfig, MonoMolecularIntegrator};
use arrow_con::model::Snr;
use arrow_con::read::{MappedRead, Read, Strand};

let config = IntegratorConfig::default();
let snr = Snr::new(10.0, 7.0, 5.0, 11.0);
let mut ai = MonoMolecularIntegrator::new(b"ACGTACGT", &config, snr, "P6/C4").unwrap();
let read = Read::new("N/A", b"ACGTACGT", "P6/C4");
ai.add_read(MappedRead::new(read, Strand::Forward, 0, 8)).unwrap();
assert!(ai.ll() < 0.0);
```
*/

use log::debug;
use simple_error::bail;

use crate::evaluator::Evaluator;
use crate::model::{ModelTable, Snr};
use crate::mutation::{apply_mutations, Mutation};
use crate::read::MappedRead;
use crate::sequence::validate_bases;

/// Contains configuration information shared by the integrators and the polishing driver.
/// Typical usage is to use the builder, e.g.
/// ```
/// use arrow_con::integrator::{IntegratorConfig, IntegratorConfigBuilder};
/// let config: IntegratorConfig = IntegratorConfigBuilder::default()
///     .improvement_threshold(0.1)
///     .build()
///     .unwrap();
/// ```
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct IntegratorConfig {
    /// A mutation must improve the aggregate log-likelihood by more than this to be applied
    pub improvement_threshold: f64,
    /// Cap on polishing rounds, each of which applies at most one mutation
    pub max_polish_rounds: usize
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            // small positive slack so numerically-neutral mutations never loop
            improvement_threshold: 0.01,
            // polishing usually converges in a handful of rounds
            max_polish_rounds: 100
        }
    }
}

/// The capability surface the polishing driver needs from an integrator
pub trait Integrator {
    /// The current template
    fn template(&self) -> &[u8];

    /// The shared configuration
    fn config(&self) -> &IntegratorConfig;

    /// The aggregate log-likelihood of all reads given the current template
    fn ll(&self) -> f64;

    /// The aggregate log-likelihood the reads would have if the mutation were applied.
    /// Stored state is not modified.
    /// # Errors
    /// * if the mutation is outside the template domain
    fn ll_with_mutation(&self, mutation: &Mutation) -> Result<f64, Box<dyn std::error::Error>>;

    /// Applies the mutations to the template and refreshes every evaluator.
    /// # Errors
    /// * if a mutation is outside the template domain
    /// * if a read's mapped span collapses under the mutations
    fn apply_mutations(&mut self, mutations: &[Mutation]) -> Result<(), Box<dyn std::error::Error>>;
}

fn pool_ll(evaluators: &[Evaluator]) -> f64 {
    evaluators.iter().map(|e| e.ll()).sum()
}

fn pool_ll_with_mutation(template: &[u8], evaluators: &[Evaluator], mutation: &Mutation) -> Result<f64, Box<dyn std::error::Error>> {
    mutation.check_domain(template.len())?;
    Ok(evaluators.iter().map(|e| e.ll_with_mutation(mutation)).sum())
}

fn pool_apply_mutations(template: &mut Vec<u8>, evaluators: &mut [Evaluator], mutations: &[Mutation]) -> Result<(), Box<dyn std::error::Error>> {
    let new_template = apply_mutations(template, mutations)?;
    for evaluator in evaluators.iter_mut() {
        evaluator.apply_mutations(mutations, &new_template)?;
    }
    debug!("template moved from {} to {} bases under {} mutations", template.len(), new_template.len(), mutations.len());
    *template = new_template;
    Ok(())
}

/// Integrator for reads of a single molecule: one SNR and one model for every read
#[derive(Clone, Debug)]
pub struct MonoMolecularIntegrator {
    template: Vec<u8>,
    config: IntegratorConfig,
    snr: Snr,
    model: &'static ModelTable,
    evaluators: Vec<Evaluator>
}

impl MonoMolecularIntegrator {
    /// Constructor
    /// # Arguments
    /// * `template` - the starting template, `{ACGT}`
    /// * `config` - shared configuration
    /// * `snr` - the molecule's per-channel signal-to-noise ratios
    /// * `model` - the model identifier, e.g. "P6/C4"
    /// # Errors
    /// * if the template is empty or contains a non-base symbol
    /// * if the model identifier is unknown
    pub fn new(template: &[u8], config: &IntegratorConfig, snr: Snr, model: &str) -> Result<MonoMolecularIntegrator, Box<dyn std::error::Error>> {
        validate_bases("template", template)?;
        Ok(MonoMolecularIntegrator {
            template: template.to_vec(),
            config: config.clone(),
            snr,
            model: ModelTable::lookup(model)?,
            evaluators: vec![]
        })
    }

    /// Adds a mapped read, building its evaluator.
    /// # Arguments
    /// * `mapped_read` - the read and the template span it covers
    /// # Errors
    /// * if the read's model identifier differs from the integrator's
    /// * if the read is empty, contains a non-base symbol, or its span does not fit
    pub fn add_read(&mut self, mapped_read: MappedRead) -> Result<(), Box<dyn std::error::Error>> {
        if mapped_read.read().model() != self.model.name {
            bail!(
                "Unsupported: read model {:?} differs from integrator model {:?}",
                mapped_read.read().model(),
                self.model.name
            );
        }
        let evaluator = Evaluator::new(mapped_read, &self.template, self.snr, self.model)?;
        self.evaluators.push(evaluator);
        Ok(())
    }

    pub fn num_reads(&self) -> usize {
        self.evaluators.len()
    }
}

impl Integrator for MonoMolecularIntegrator {
    fn template(&self) -> &[u8] {
        &self.template
    }

    fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    fn ll(&self) -> f64 {
        pool_ll(&self.evaluators)
    }

    fn ll_with_mutation(&self, mutation: &Mutation) -> Result<f64, Box<dyn std::error::Error>> {
        pool_ll_with_mutation(&self.template, &self.evaluators, mutation)
    }

    fn apply_mutations(&mut self, mutations: &[Mutation]) -> Result<(), Box<dyn std::error::Error>> {
        pool_apply_mutations(&mut self.template, &mut self.evaluators, mutations)
    }
}

impl From<&MonoMolecularIntegrator> for String {
    fn from(integrator: &MonoMolecularIntegrator) -> String {
        String::from_utf8(integrator.template.clone()).unwrap()
    }
}

/// Integrator for reads of mixed provenance: each read brings its own SNR, and its model is
/// resolved from its model identifier
#[derive(Clone, Debug)]
pub struct MultiMolecularIntegrator {
    template: Vec<u8>,
    config: IntegratorConfig,
    evaluators: Vec<Evaluator>
}

impl MultiMolecularIntegrator {
    /// Constructor
    /// # Arguments
    /// * `template` - the starting template, `{ACGT}`
    /// * `config` - shared configuration
    /// # Errors
    /// * if the template is empty or contains a non-base symbol
    pub fn new(template: &[u8], config: &IntegratorConfig) -> Result<MultiMolecularIntegrator, Box<dyn std::error::Error>> {
        validate_bases("template", template)?;
        Ok(MultiMolecularIntegrator {
            template: template.to_vec(),
            config: config.clone(),
            evaluators: vec![]
        })
    }

    /// Adds a mapped read, building its evaluator under its own model and SNR.
    /// # Arguments
    /// * `mapped_read` - the read and the template span it covers
    /// * `snr` - the read's per-channel signal-to-noise ratios
    /// # Errors
    /// * if the read's model identifier is unknown
    /// * if the read is empty, contains a non-base symbol, or its span does not fit
    pub fn add_read(&mut self, mapped_read: MappedRead, snr: Snr) -> Result<(), Box<dyn std::error::Error>> {
        let model = ModelTable::lookup(mapped_read.read().model())?;
        let evaluator = Evaluator::new(mapped_read, &self.template, snr, model)?;
        self.evaluators.push(evaluator);
        Ok(())
    }

    pub fn num_reads(&self) -> usize {
        self.evaluators.len()
    }
}

impl Integrator for MultiMolecularIntegrator {
    fn template(&self) -> &[u8] {
        &self.template
    }

    fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    fn ll(&self) -> f64 {
        pool_ll(&self.evaluators)
    }

    fn ll_with_mutation(&self, mutation: &Mutation) -> Result<f64, Box<dyn std::error::Error>> {
        pool_ll_with_mutation(&self.template, &self.evaluators, mutation)
    }

    fn apply_mutations(&mut self, mutations: &[Mutation]) -> Result<(), Box<dyn std::error::Error>> {
        pool_apply_mutations(&mut self.template, &mut self.evaluators, mutations)
    }
}

impl From<&MultiMolecularIntegrator> for String {
    fn from(integrator: &MultiMolecularIntegrator) -> String {
        String::from_utf8(integrator.template.clone()).unwrap()
    }
}
