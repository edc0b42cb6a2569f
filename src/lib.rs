/*!
# arrow_con
This library provides the consensus core for noisy long reads: a partial-order alignment (POA)
graph drafts a consensus from a read pile, and a likelihood integrator polishes that draft by
scoring candidate single-base mutations under a trained error model until none improves it.

Key pieces:
* A global pairwise aligner with a compact `M/R/I/D` transcript encoding and coordinate lifting
* An incremental POA graph with per-read threading, spanning-read accounting, and candidate-variant enumeration around the consensus path
* Per-read forward/backward evaluators with cheap what-if scoring of template mutations, aggregated by mono- and multi-molecular integrators
* A polishing driver that applies the best improving mutation per round until convergence

# Example usage
```rust
use arrow_con::align_config::AlignMode;
use arrow_con::poa_consensus::PoaConsensus;

let reads: Vec<&[u8]> = vec![
    b"TTTACAGGATAGTCCAGT",
    b"TTTACAGGATTAGTCCAGT",
    b"TTTACAGGATAGTCCAGT",
];

// thread all reads into the graph and read off the best-supported path
let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
assert_eq!(consensus.sequence(), b"TTTACAGGATAGTCCAGT");
```
*/

/// Configuration for the pairwise and POA aligners
pub mod align_config;
/// Per-read forward/backward likelihood matrices
pub mod evaluator;
/// Utility for generating examples
pub mod example_gen;
/// Template-plus-reads likelihood integrators
pub mod integrator;
/// Trained error-model tables and SNR handling
pub mod model;
/// Single-base template mutations and their application
pub mod mutation;
/// Global pairwise alignment and transcript handling
pub mod pairwise_alignment;
/// The POA consensus entry point
pub mod poa_consensus;
/// The partial-order alignment graph and its traversals
pub mod poa_graph;
/// The outer polishing loop
pub mod polish;
/// Read and mapped-read records
pub mod read;
/// Base-alphabet helpers
pub mod sequence;
