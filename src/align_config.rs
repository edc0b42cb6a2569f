
/*!
Contains configuration information for the pairwise and POA aligners.
Typical usage is to the use the builder to construct the config, e.g.
```
use arrow_con::align_config::{AlignConfig, AlignConfigBuilder, AlignMode};
let config: AlignConfig = AlignConfigBuilder::default()
    .mode(AlignMode::SemiGlobal)
    .build()
    .unwrap();
```
*/

/// Enumeration of the alignment scopes.
/// The pairwise aligner only implements `Global`; the POA read threading supports all three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlignMode {
    /// End-to-end alignment of both sequences
    #[default]
    Global,
    /// The read may be a substring of the graph, with free start and end
    SemiGlobal,
    /// Only a contiguous interior section of the read needs to thread the graph
    Local
}

/// Scoring parameters shared by the pairwise aligner and the POA threading DP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignParams {
    /// Bonus for aligning two equal bases
    pub match_score: i32,
    /// Penalty for aligning two unequal bases
    pub mismatch: i32,
    /// Penalty for an extra base in the read (gap in the target/graph)
    pub insert: i32,
    /// Penalty for a skipped target/graph base (gap in the read)
    pub delete: i32
}

impl AlignParams {
    /// Constructor
    pub fn new(match_score: i32, mismatch: i32, insert: i32, delete: i32) -> AlignParams {
        AlignParams {
            match_score,
            mismatch,
            insert,
            delete
        }
    }
}

impl Default for AlignParams {
    fn default() -> Self {
        // the scoring the consensus graph was tuned with
        Self::new(3, -5, -4, -4)
    }
}

/// Contains configuration information for an alignment run.
#[derive(derive_builder::Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct AlignConfig {
    /// The alignment scope
    pub mode: AlignMode,
    /// The scoring parameters
    pub params: AlignParams
}

impl AlignConfig {
    /// Convenience constructor for the common case of default parameters with a chosen mode.
    /// # Arguments
    /// * `mode` - the alignment scope
    pub fn with_mode(mode: AlignMode) -> AlignConfig {
        AlignConfig {
            mode,
            params: Default::default()
        }
    }
}
