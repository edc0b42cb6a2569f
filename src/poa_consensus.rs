
/*!
This module provides the POA consensus entry point, which drafts a consensus for a read pile.

# Example usage
```rust
use arrow_con::align_config::AlignMode;
use arrow_con::poa_consensus::PoaConsensus;

let reads: Vec<&[u8]> = vec![b"GGG", b"GTG", b"GTG"];
let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
assert_eq!(consensus.sequence(), b"GTG");
```
*/

use log::debug;
use simple_error::bail;

use crate::align_config::{AlignConfig, AlignMode};
use crate::mutation::ScoredMutation;
use crate::poa_graph::{GraphvizOptions, PoaGraph, VariantScoring};

/// A drafted consensus: the sequence, the graph it was read off, the chosen path, and the
/// candidate single-base deviations around that path.
#[derive(Clone, Debug)]
pub struct PoaConsensus {
    /// The draft consensus sequence
    sequence: Vec<u8>,
    /// The graph all reads were threaded into
    graph: PoaGraph,
    /// The consensus path, as graph vertex ids
    path: Vec<usize>,
    /// Candidate variants around the consensus path
    mutations: Vec<ScoredMutation>
}

impl PoaConsensus {
    /// Drafts a consensus with default parameters and no coverage floor.
    /// # Arguments
    /// * `reads` - the read pile, threaded in order
    /// * `mode` - the alignment scope for threading and scoring
    /// # Errors
    /// * if no reads are provided, or a read is empty or contains a non-base symbol
    pub fn find_consensus(reads: &[&[u8]], mode: AlignMode) -> Result<PoaConsensus, Box<dyn std::error::Error>> {
        Self::find_consensus_with_config(reads, &AlignConfig::with_mode(mode), i32::MIN)
    }

    /// Drafts a consensus with a basal coverage floor, applicable outside global mode.
    /// # Arguments
    /// * `reads` - the read pile, threaded in order
    /// * `mode` - the alignment scope for threading and scoring
    /// * `min_coverage` - application knowledge of the basal read coverage of the template
    /// # Errors
    /// * if no reads are provided, or a read is empty or contains a non-base symbol
    pub fn find_consensus_with_coverage(reads: &[&[u8]], mode: AlignMode, min_coverage: i32) -> Result<PoaConsensus, Box<dyn std::error::Error>> {
        Self::find_consensus_with_config(reads, &AlignConfig::with_mode(mode), min_coverage)
    }

    /// Drafts a consensus with full control of the threading scores.
    /// # Arguments
    /// * `reads` - the read pile, threaded in order
    /// * `config` - alignment mode and scoring parameters
    /// * `min_coverage` - basal coverage floor for non-global modes; `i32::MIN` disables it
    /// # Errors
    /// * if no reads are provided, or a read is empty or contains a non-base symbol
    pub fn find_consensus_with_config(reads: &[&[u8]], config: &AlignConfig, min_coverage: i32) -> Result<PoaConsensus, Box<dyn std::error::Error>> {
        if reads.is_empty() {
            bail!("Invalid input: no reads provided");
        }

        let mut graph = PoaGraph::new();
        for &read in reads.iter() {
            graph.add_read(read, config)?;
        }
        debug!("threaded {} reads into {} vertices", graph.num_reads(), graph.num_vertices());

        let path = graph.consensus_path(config.mode, min_coverage)?;
        let sequence = graph.sequence_along_path(&path);
        let mutations = graph.find_possible_variants(&path, VariantScoring::default());
        debug!("consensus path covers {} of {} vertices, {} candidate variants", path.len(), graph.num_vertices() - 2, mutations.len());

        Ok(PoaConsensus {
            sequence,
            graph,
            path,
            mutations
        })
    }

    /// Renders the underlying graph, coloring the consensus path when requested.
    pub fn to_graphviz(&self, options: &GraphvizOptions) -> String {
        self.graph.to_graphviz(options, Some(&self.path))
    }

    // getters
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn graph(&self) -> &PoaGraph {
        &self.graph
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn mutations(&self) -> &[ScoredMutation] {
        &self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{Mutation, MutationType};

    fn plain_dot(consensus: &PoaConsensus) -> String {
        consensus.to_graphviz(&GraphvizOptions::default()).replace('\n', "")
    }

    #[test]
    fn test_small_basic() {
        let reads: Vec<&[u8]> = vec![b"GGG"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        let expected_dot = concat!(
            "digraph G {",
            "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
            "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
            "2[shape=Mrecord, label=\"{ G | 1 }\"];",
            "3[shape=Mrecord, label=\"{ G | 1 }\"];",
            "4[shape=Mrecord, label=\"{ G | 1 }\"];",
            "0->2 ;",
            "2->3 ;",
            "3->4 ;",
            "4->1 ;",
            "}"
        );
        assert_eq!(plain_dot(&consensus), expected_dot);
        assert_eq!(consensus.sequence(), b"GGG");
    }

    #[test]
    fn test_small_extra() {
        // extra at beginning
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"TGGG"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ G | 2 }\"];",
                "4[shape=Mrecord, label=\"{ G | 2 }\"];",
                "5[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->2 ;",
                "0->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GGG");
        }

        // extra in middle
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"GTGG"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ G | 2 }\"];",
                "4[shape=Mrecord, label=\"{ G | 2 }\"];",
                "5[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->3 ;",
                "2->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GGG");
        }

        // extra at end
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"GGGT"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ G | 2 }\"];",
                "4[shape=Mrecord, label=\"{ G | 2 }\"];",
                "5[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->1 ;",
                "4->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GGG");
        }
    }

    #[test]
    fn test_small_mismatch() {
        // mismatch at beginning
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"TGG"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 1 }\"];",
                "3[shape=Mrecord, label=\"{ G | 2 }\"];",
                "4[shape=Mrecord, label=\"{ G | 2 }\"];",
                "5[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->3 ;",
                "0->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GG");
        }

        // mismatch in middle
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"GTG", b"GTG"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 3 }\"];",
                "3[shape=Mrecord, label=\"{ G | 1 }\"];",
                "4[shape=Mrecord, label=\"{ G | 3 }\"];",
                "5[shape=Mrecord, label=\"{ T | 2 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->4 ;",
                "2->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GTG");
        }

        // mismatch at end
        {
            let reads: Vec<&[u8]> = vec![b"GGG", b"GGT"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ G | 2 }\"];",
                "4[shape=Mrecord, label=\"{ G | 1 }\"];",
                "5[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "5->1 ;",
                "3->5 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GG");
        }
    }

    #[test]
    fn test_small_deletion() {
        // deletion at beginning
        {
            let reads: Vec<&[u8]> = vec![b"GAT", b"AT"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 1 }\"];",
                "3[shape=Mrecord, label=\"{ A | 2 }\"];",
                "4[shape=Mrecord, label=\"{ T | 2 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "0->3 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"AT");
        }

        // deletion in middle
        {
            let reads: Vec<&[u8]> = vec![b"GAT", b"GT"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ A | 1 }\"];",
                "4[shape=Mrecord, label=\"{ T | 2 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "2->4 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GT");
        }

        // deletion at end
        {
            let reads: Vec<&[u8]> = vec![b"GAT", b"GA"];
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            let expected_dot = concat!(
                "digraph G {",
                "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
                "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
                "2[shape=Mrecord, label=\"{ G | 2 }\"];",
                "3[shape=Mrecord, label=\"{ A | 2 }\"];",
                "4[shape=Mrecord, label=\"{ T | 1 }\"];",
                "0->2 ;",
                "2->3 ;",
                "3->4 ;",
                "4->1 ;",
                "3->1 ;",
                "}"
            );
            assert_eq!(plain_dot(&consensus), expected_dot);
            assert_eq!(consensus.sequence(), b"GA");
        }
    }

    #[test]
    fn test_verbose_graphviz_output() {
        let reads: Vec<&[u8]> = vec![b"GGG", b"TGGG"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        let options = GraphvizOptions {
            color_nodes: true,
            verbose_nodes: true
        };
        let dot = consensus.to_graphviz(&options).replace('\n', "");

        let expected_dot = concat!(
            "digraph G {",
            "0[shape=Mrecord, label=\"{ { 0 | ^ } |{ 0 | 1 } |{ 0.00 | 0.00 } }\"];",
            "1[shape=Mrecord, label=\"{ { 1 | $ } |{ 0 | 0 } |{ 0.00 | 0.00 } }\"];",
            "2[shape=Mrecord, style=\"filled\", fillcolor=\"lightblue\" ,",
            " label=\"{ { 2 | G } |{ 2 | 2 } |{ 2.00 | 2.00 } }\"];",
            "3[shape=Mrecord, style=\"filled\", fillcolor=\"lightblue\" ,",
            " label=\"{ { 3 | G } |{ 2 | 2 } |{ 2.00 | 4.00 } }\"];",
            "4[shape=Mrecord, style=\"filled\", fillcolor=\"lightblue\" ,",
            " label=\"{ { 4 | G } |{ 2 | 0 } |{ 2.00 | 6.00 } }\"];",
            "5[shape=Mrecord, label=\"{ { 5 | T } |{ 1 | 0 } |{ -0.00 | -0.00 } }\"];",
            "0->2 ;",
            "2->3 ;",
            "3->4 ;",
            "4->1 ;",
            "5->2 ;",
            "0->5 ;}"
        );
        assert_eq!(dot, expected_dot);
    }

    #[test]
    fn test_simple() {
        let reads: Vec<&[u8]> = vec![
            b"TTTACAGGATAGTCCAGT",
            b"ACAGGATACCCCGTCCAGT",
            b"ACAGGATAGTCCAGT",
            b"TTTACAGGATAGTCCAGTCCCC",
            b"TTTACAGGATTAGTCCAGT",
            b"TTTACAGGATTAGGTCCCAGT",
            b"TTTACAGGATAGTCCAGT",
        ];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"TTTACAGGATAGTCCAGT");
    }

    #[test]
    fn test_overhang_second() {
        let reads: Vec<&[u8]> = vec![
            b"TTTACAGGATAGTCCAGT",
            b"TTTACAGGATAGTCCAGTAAA",
            b"TTTACAGGATAGTCCAGTAAA",
        ];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"TTTACAGGATAGTCCAGTAAA");
    }

    #[test]
    fn test_small_semiglobal() {
        let reads: Vec<&[u8]> = vec![b"GGTGG", b"GGTGG", b"T"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::SemiGlobal).unwrap();
        let expected_dot = concat!(
            "digraph G {",
            "0[shape=Mrecord, label=\"{ ^ | 0 }\"];",
            "1[shape=Mrecord, label=\"{ $ | 0 }\"];",
            "2[shape=Mrecord, label=\"{ G | 2 }\"];",
            "3[shape=Mrecord, label=\"{ G | 2 }\"];",
            "4[shape=Mrecord, label=\"{ T | 3 }\"];",
            "5[shape=Mrecord, label=\"{ G | 2 }\"];",
            "6[shape=Mrecord, label=\"{ G | 2 }\"];",
            "0->2 ;",
            "2->3 ;",
            "3->4 ;",
            "4->5 ;",
            "5->6 ;",
            "6->1 ;",
            "4->1 ;",
            "0->4 ;",
            "}"
        );
        assert_eq!(plain_dot(&consensus), expected_dot);
        assert_eq!(consensus.sequence(), b"GGTGG");
    }

    #[test]
    fn test_small_tiling() {
        let reads: Vec<&[u8]> = vec![b"GGGGAAAA", b"AAAATTTT", b"TTTTCCCC", b"CCCCAGGA"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::SemiGlobal).unwrap();
        assert_eq!(consensus.sequence(), b"GGGGAAAATTTTCCCCAGGA");
    }

    #[test]
    fn test_long_insert() {
        let reads: Vec<&[u8]> = vec![
            b"TTTACAGGATAGTGCCGCCAATCTTCCAGTGATACCCCGTGCCGCCAATCTTCCAGTATATACAGCACGAGGTAGC",
            b"TTTACAGGATAGTGCCGGCCAATCTTCCAGTGATACCCCGTGCCGCCAATCTTCCAGTATATACAGCACGAGTAGC",
            b"TTGTACAGGATAGTGCCGCCAATCTTCCAGTGATGGGGGGGGGGGGGGGGGGGGGGGGGGGACCCCGTGCCGCCAATCTTCCAGTATATACAGCACGAGTAGC",
        ];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(
            consensus.sequence(),
            b"TTTACAGGATAGTGCCGCCAATCTTCCAGTGATACCCCGTGCCGCCAATCTTCCAGTATATACAGCACGAGTAGC"
        );
    }

    #[test]
    fn test_local_staggered() {
        let reads: Vec<&[u8]> = vec![
            b"TTTACAGGATAGTGCCGCCAATCTTCCAGT",
            b"GATACCCCGTGCCGCCAATCTTCCAGTATATACAGCACGAGTAGC",
            b"ATAGTGCCGCCAATCTTCCAGTATATACAGCACGGAGTAGCATCACGTACGTACGTCTACACGTAATT",
            b"ACGTCTACACGTAATTTTGGAGAGCCCTCTCTCACG",
            b"ACACGTAATTTTGGAGAGCCCTCTCTTCACG",
            b"AGGATAGTGCCGCCAATCTTCCAGTAATATACAGCACGGAGTAGCATCACGTACG",
            b"ATAGTGCCGCCAATCTTCCAGTATATACAGCACGGAGTAGCATCACGTACGTACGTCTACACGT",
        ];
        // the basal coverage of these staggered subreads is application knowledge
        let consensus = PoaConsensus::find_consensus_with_coverage(&reads, AlignMode::Local, 4).unwrap();
        assert_eq!(
            consensus.sequence(),
            b"ATAGTGCCGCCAATCTTCCAGTATATACAGCACGGAGTAGCATCACGTACGTACGTCTACACGTAATT"
        );
    }

    #[test]
    fn test_nondeterminism_regression() {
        // a real-world nondeterminism case from a polishing job; one hundred runs over the
        // same two reads must produce exactly one distinct consensus
        let reads: Vec<&[u8]> = vec![
            b"TATCAATCAACGAAATTCGCCAATTCCGTCATGAATGTCAATATCTAACTACACTTTAGAATACATTCTT\
              TGACATGCCTGGCCTATTGATATTTCAATAAAATCAGACTATAAAGACAACTTACAAATGATCCTATAAA\
              TTAAAGATCGAGAATCTAAAGAGTGAAATTAAAGCTAATTACTGCTTTAAAAATTTTACGTGCACACAAA\
              AATGAATTTATCCTCATTATATCGAAAATACCATGAAGTATAGTAAGCTAACTTGAATATGATCATTAAT\
              CGGCTATATGATTATTTTGATAATGCAATGAGCATCAATCTGAATTTATGACCTATCATTCGCGTTGCAT\
              TTATTGAAGTGAAAATTCATGTACGCTTTTTTATTTTATTAATATAATCCTTGATATTGGTTATATACCA\
              CGCTGTCACATAATTTTCAATAAATTTTTCTACTAAATGAAGTGTCTGTTATCTATCAC",
            b"TATCAACAACGAAAATGCGCAGTTACGTCATGATTTATGTCAAATAATCTAAACGACACTTTCAGAAATA\
              AATACATTCGAGAAGATGAATGCCTGGCGCAAAGTGATTATTTCAATAAAATATTTGTACCTTGAAAGAC\
              AATTTACAAATGAATGCTATAAAATTTAAATGGATCCGGAGAATCTTTAAAGTACGTGAAATTAAAGGCT\
              AAGATTACTGCGAAAAATTTTCGTGCACAAGAAATGAATGTTCCAGATTAGTATCGGAAAATAAGCCATG\
              AAGAAGCTAGCATTAACTTGAATATGATCGATTTAATCGGCAGTATTGGTAATTATCTTGATAAGCAATT\
              GAGCATCAACTGAAATTGAATGACTCTACATGCCTCGCTGAGTATGCGATTTATTGAAAGTGAAATTCAG\
              TAAAGTTTATTGTTATGAATAAATGCGTACTTGGATGAATATCCCGACGGTAGTTCAAGTGTAAATGGAG\
              TGAGGGGGTTCTTTCTTATAGAATAGTTTTATACTACTGATAAGGTGTAACCTGAGTGAGTCGTGATTTT\
              AGAGTTACTTGCGAAC",
        ];

        let mut answers = std::collections::HashSet::new();
        for _run in 0..100 {
            let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
            answers.insert(consensus.sequence().to_vec());
        }
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn test_deletion_variant() {
        // two clean copies and one missing the G; the skip edge proposes deleting it
        let reads: Vec<&[u8]> = vec![b"AACGTT", b"AACGTT", b"AACTT"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"AACGTT");

        let variants = consensus.mutations();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].mutation, Mutation::deletion(3));
        // the skipped G is on 2 of 3 reads: -(2*2 - 3 - 0.0001)
        assert!((variants[0].score + 0.9999).abs() < 1e-6);
    }

    #[test]
    fn test_insertion_variant() {
        // one read carries an extra A between the C and the G
        let reads: Vec<&[u8]> = vec![b"AACGTT", b"AACGTT", b"AACAGTT"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"AACGTT");

        let variants = consensus.mutations();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].mutation, Mutation::insertion(3, b'A'));
        assert!((variants[0].score + 1.0001).abs() < 1e-6);
    }

    #[test]
    fn test_substitution_variant() {
        // one read replaces the G with an A; the bridge vertex proposes the substitution
        let reads: Vec<&[u8]> = vec![b"AACGTT", b"AACGTT", b"AACATT"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"AACGTT");

        let variants = consensus.mutations();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].mutation, Mutation::substitution(3, b'A'));
        // the compatible scoring reports the bridge vertex's absolute score
        assert!((variants[0].score + 1.0001).abs() < 1e-6);

        // the alternative scoring reports the difference against the replaced vertex
        let delta_variants = consensus.graph().find_possible_variants(consensus.path(), VariantScoring::ScoreDelta);
        assert_eq!(delta_variants.len(), 1);
        assert_eq!(delta_variants[0].mutation, Mutation::substitution(3, b'A'));
        assert!((delta_variants[0].score + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_variant_kinds() {
        let reads: Vec<&[u8]> = vec![b"AACGTT", b"AACGTT", b"AACTT", b"AACAGTT", b"AACATT"];
        let consensus = PoaConsensus::find_consensus(&reads, AlignMode::Global).unwrap();
        assert_eq!(consensus.sequence(), b"AACGTT");

        let kinds: Vec<MutationType> = consensus.mutations().iter().map(|v| v.mutation.kind()).collect();
        assert!(kinds.contains(&MutationType::Deletion));
        assert!(kinds.contains(&MutationType::Insertion));
        assert!(kinds.contains(&MutationType::Substitution));
        for variant in consensus.mutations().iter() {
            assert_eq!(variant.mutation.position(), 3);
        }
    }

    #[test]
    fn test_no_reads_is_an_error() {
        let reads: Vec<&[u8]> = vec![];
        assert!(PoaConsensus::find_consensus(&reads, AlignMode::Global).is_err());
    }
}
