
/*!
This module provides the partial-order alignment graph that drafts a consensus from a read pile.

Reads are threaded into a DAG of base vertices one at a time: the first read becomes a linear
chain between the `enter` and `exit` terminals, and every later read is aligned against the
whole graph with a per-vertex dynamic-programming column, then merged along its traceback.
Matched vertices accumulate `reads` counts, and every read tags the `spanning_reads` counter of
the vertices its alignment span covers. The best-supported path through the final graph is the
draft consensus; plausible single-base deviations from that path are reported as candidate
mutations for downstream polishing.
*/

use rustc_hash::FxHashSet as HashSet;
use simple_error::bail;

use crate::align_config::{AlignConfig, AlignMode};
use crate::mutation::{Mutation, ScoredMutation};
use crate::sequence::validate_bases;

/// Vertex id of the `^` terminal
pub const ENTER_VERTEX: usize = 0;
/// Vertex id of the `$` terminal
pub const EXIT_VERTEX: usize = 1;

/// Sentinel for "no vertex"
const NO_VERTEX: usize = usize::MAX;
/// Sentinel score for unreachable DP cells
const INVALID_SCORE: i32 = i32::MIN / 2;

/// How a DP cell was reached during read-to-graph alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveType {
    /// Cell is unreachable
    Invalid,
    /// Free alignment start (non-global modes)
    Start,
    /// Free alignment end (non-global modes)
    End,
    /// Read base equals the vertex base
    Match,
    /// Read base differs from the vertex base
    Mismatch,
    /// The vertex base is skipped
    Delete,
    /// An extra read base is emitted without consuming a vertex
    Extra
}

/// One vertex of the consensus graph
#[derive(Clone, Debug)]
pub struct PoaNode {
    /// The base this vertex carries; `^`/`$` on the terminals
    base: u8,
    /// Number of reads whose threading passes through this vertex
    reads: usize,
    /// Number of reads whose alignment span covers this vertex
    spanning_reads: usize,
    /// Per-vertex consensus score; transient, rewritten by each consensus computation
    score: f32,
    /// Best reaching score; transient, rewritten by each consensus computation
    reaching_score: f32,
    /// Source vertices of incoming edges, in insertion order
    in_edges: Vec<usize>,
    /// Target vertices of outgoing edges, in insertion order
    out_edges: Vec<usize>
}

impl PoaNode {
    fn new(base: u8, reads: usize) -> PoaNode {
        PoaNode {
            base,
            reads,
            spanning_reads: 0,
            score: 0.0,
            reaching_score: 0.0,
            in_edges: vec![],
            out_edges: vec![]
        }
    }

    // getters
    pub fn base(&self) -> u8 {
        self.base
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn spanning_reads(&self) -> usize {
        self.spanning_reads
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn reaching_score(&self) -> f32 {
        self.reaching_score
    }

    pub fn in_edges(&self) -> &[usize] {
        &self.in_edges
    }

    pub fn out_edges(&self) -> &[usize] {
        &self.out_edges
    }
}

/// Rendering options for [`PoaGraph::to_graphviz`]
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphvizOptions {
    /// Fill consensus-path vertices
    pub color_nodes: bool,
    /// Emit id/spanning/score fields in addition to base and reads
    pub verbose_nodes: bool
}

/// Which score a substitution candidate reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VariantScoring {
    /// The absolute score of the off-path vertex (the compatible behaviour)
    #[default]
    NodeScore,
    /// The score difference between the off-path vertex and the on-path vertex it replaces
    ScoreDelta
}

/// One transient DP column: the alignment of the full read prefix set against a single vertex
struct AlignmentColumn {
    score: Vec<i32>,
    reaching_move: Vec<MoveType>,
    prev_vertex: Vec<usize>
}

impl AlignmentColumn {
    fn new(len: usize) -> AlignmentColumn {
        AlignmentColumn {
            score: vec![INVALID_SCORE; len],
            reaching_move: vec![MoveType::Invalid; len],
            prev_vertex: vec![NO_VERTEX; len]
        }
    }

    fn set(&mut self, row: usize, score: i32, reaching_move: MoveType, prev_vertex: usize) {
        self.score[row] = score;
        self.reaching_move[row] = reaching_move;
        self.prev_vertex[row] = prev_vertex;
    }
}

/// The partial-order alignment graph
#[derive(Clone, Debug)]
pub struct PoaGraph {
    /// Vertex arena; ids are indices, 0 and 1 are the terminals
    nodes: Vec<PoaNode>,
    /// All edges in insertion order, used for stable rendering
    edges: Vec<(usize, usize)>,
    /// Number of reads threaded so far
    num_reads: usize
}

impl Default for PoaGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PoaGraph {
    /// Creates an empty graph holding only the two terminals.
    pub fn new() -> PoaGraph {
        PoaGraph {
            nodes: vec![PoaNode::new(b'^', 0), PoaNode::new(b'$', 0)],
            edges: vec![],
            num_reads: 0
        }
    }

    // getters
    pub fn num_reads(&self) -> usize {
        self.num_reads
    }

    pub fn num_vertices(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, vertex: usize) -> &PoaNode {
        &self.nodes[vertex]
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Spells the bases along a path of vertex ids
    pub fn sequence_along_path(&self, path: &[usize]) -> Vec<u8> {
        path.iter().map(|&v| self.nodes[v].base).collect()
    }

    fn add_vertex(&mut self, base: u8) -> usize {
        self.nodes.push(PoaNode::new(base, 1));
        self.nodes.len() - 1
    }

    /// Adds an edge unless it already exists; parallel edges are never created
    fn add_edge(&mut self, source: usize, target: usize) {
        if self.nodes[source].out_edges.contains(&target) {
            return;
        }
        self.nodes[source].out_edges.push(target);
        self.nodes[target].in_edges.push(source);
        self.edges.push((source, target));
    }

    /// Returns the vertices in topological order.
    /// The order is the reversed finish order of a depth-first search rooted at every vertex in
    /// id order, following out-edges in insertion order. The exact order is observable through
    /// the spanning-read accounting and is kept deterministic.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut finish = Vec::with_capacity(self.nodes.len());

        for root in 0..self.nodes.len() {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            while let Some(top) = stack.last_mut() {
                let vertex = top.0;
                if top.1 < self.nodes[vertex].out_edges.len() {
                    let child = self.nodes[vertex].out_edges[top.1];
                    top.1 += 1;
                    if !visited[child] {
                        visited[child] = true;
                        stack.push((child, 0));
                    }
                } else {
                    finish.push(vertex);
                    stack.pop();
                }
            }
        }

        finish.reverse();
        finish
    }

    /// Increments `spanning_reads` on the topological window `[start, end)` of vertices.
    fn tag_span(&mut self, start: usize, end: usize) {
        let order = self.topological_order();
        let mut spanning = false;
        for vertex in order {
            if vertex == start {
                spanning = true;
            }
            if vertex == end {
                break;
            }
            if spanning {
                self.nodes[vertex].spanning_reads += 1;
            }
        }
    }

    /// Threads a read into the graph, merging it along its best alignment.
    /// # Arguments
    /// * `seq` - the read bases, `{ACGT}`
    /// * `config` - alignment mode and scores used for the threading DP
    /// # Errors
    /// * if the read is empty or contains a non-base symbol
    pub fn add_read(&mut self, seq: &[u8], config: &AlignConfig) -> Result<(), Box<dyn std::error::Error>> {
        validate_bases("read", seq)?;

        if self.num_reads == 0 {
            self.thread_first_read(seq);
        } else {
            let columns = self.alignment_columns(seq, config);
            self.traceback_and_thread(seq, &columns, config.mode);
        }
        self.num_reads += 1;
        Ok(())
    }

    /// The first read becomes a linear chain between the terminals.
    fn thread_first_read(&mut self, seq: &[u8]) {
        let mut previous = NO_VERTEX;
        let mut start_span = NO_VERTEX;
        for (pos, &base) in seq.iter().enumerate() {
            let vertex = self.add_vertex(base);
            if pos == 0 {
                self.add_edge(ENTER_VERTEX, vertex);
                start_span = vertex;
            } else {
                self.add_edge(previous, vertex);
            }
            previous = vertex;
        }
        self.add_edge(previous, EXIT_VERTEX);
        self.tag_span(start_span, previous);
    }

    /// Computes the alignment column of every vertex in topological order.
    fn alignment_columns(&self, read: &[u8], config: &AlignConfig) -> Vec<AlignmentColumn> {
        let mut columns: Vec<AlignmentColumn> = (0..self.nodes.len())
            .map(|_| AlignmentColumn::new(read.len() + 1))
            .collect();

        for vertex in self.topological_order() {
            let column = if vertex == ENTER_VERTEX {
                self.make_enter_column(read, config)
            } else if vertex == EXIT_VERTEX {
                self.make_exit_column(&columns, read, config)
            } else {
                self.make_alignment_column(vertex, &columns, read, config)
            };
            columns[vertex] = column;
        }
        columns
    }

    fn make_enter_column(&self, read: &[u8], config: &AlignConfig) -> AlignmentColumn {
        let mut column = AlignmentColumn::new(read.len() + 1);
        column.set(0, 0, MoveType::Start, ENTER_VERTEX);
        for row in 1..=read.len() {
            match config.mode {
                AlignMode::Local => {
                    column.set(row, 0, MoveType::Start, ENTER_VERTEX);
                },
                AlignMode::Global |
                AlignMode::SemiGlobal => {
                    let score = column.score[row - 1] + config.params.insert;
                    column.set(row, score, MoveType::Extra, ENTER_VERTEX);
                }
            };
        }
        column
    }

    fn make_alignment_column(&self, vertex: usize, columns: &[AlignmentColumn], read: &[u8], config: &AlignConfig) -> AlignmentColumn {
        let mut column = AlignmentColumn::new(read.len() + 1);
        let base = self.nodes[vertex].base;
        let params = config.params;

        // row 0: global mode pays for every skipped vertex, the others start free
        match config.mode {
            AlignMode::Global => {
                for &source in self.nodes[vertex].in_edges.iter() {
                    if columns[source].score[0] <= INVALID_SCORE {
                        continue;
                    }
                    let candidate = columns[source].score[0] + params.delete;
                    if candidate > column.score[0] {
                        column.set(0, candidate, MoveType::Delete, source);
                    }
                }
            },
            AlignMode::SemiGlobal |
            AlignMode::Local => {
                column.set(0, 0, MoveType::Start, ENTER_VERTEX);
            }
        };

        // interior rows; candidate order fixes all tie-breaks: local start, then per
        // predecessor match/mismatch before delete, then extra
        for row in 1..=read.len() {
            let mut best_score = INVALID_SCORE;
            let mut best_move = MoveType::Invalid;
            let mut best_prev = NO_VERTEX;

            if config.mode == AlignMode::Local {
                best_score = 0;
                best_move = MoveType::Start;
                best_prev = ENTER_VERTEX;
            }

            for &source in self.nodes[vertex].in_edges.iter() {
                let source_column = &columns[source];
                if source_column.score[row - 1] > INVALID_SCORE {
                    let (candidate, move_type) = if read[row - 1] == base {
                        (source_column.score[row - 1] + params.match_score, MoveType::Match)
                    } else {
                        (source_column.score[row - 1] + params.mismatch, MoveType::Mismatch)
                    };
                    if candidate > best_score {
                        best_score = candidate;
                        best_move = move_type;
                        best_prev = source;
                    }
                }
                if source_column.score[row] > INVALID_SCORE {
                    let candidate = source_column.score[row] + params.delete;
                    if candidate > best_score {
                        best_score = candidate;
                        best_move = MoveType::Delete;
                        best_prev = source;
                    }
                }
            }

            if column.score[row - 1] > INVALID_SCORE {
                let candidate = column.score[row - 1] + params.insert;
                if candidate > best_score {
                    best_score = candidate;
                    best_move = MoveType::Extra;
                    best_prev = vertex;
                }
            }

            if best_move != MoveType::Invalid {
                column.set(row, best_score, best_move, best_prev);
            }
        }
        column
    }

    fn make_exit_column(&self, columns: &[AlignmentColumn], read: &[u8], config: &AlignConfig) -> AlignmentColumn {
        let mut column = AlignmentColumn::new(read.len() + 1);
        let last_row = read.len();

        match config.mode {
            // the read must be consumed and the path must run an edge into the terminal
            AlignMode::Global => {
                for &source in self.nodes[EXIT_VERTEX].in_edges.iter() {
                    let candidate = columns[source].score[last_row];
                    if candidate > column.score[last_row] {
                        column.set(last_row, candidate, MoveType::Delete, source);
                    }
                }
            },
            // the read must be consumed but may end on any vertex at no cost
            AlignMode::SemiGlobal => {
                for source in 0..self.nodes.len() {
                    if source == EXIT_VERTEX {
                        continue;
                    }
                    let candidate = columns[source].score[last_row];
                    if candidate > column.score[last_row] {
                        column.set(last_row, candidate, MoveType::End, source);
                    }
                }
            },
            // any suffix of the read may dangle off any vertex at no cost
            AlignMode::Local => {
                for source in 0..self.nodes.len() {
                    if source == EXIT_VERTEX {
                        continue;
                    }
                    let candidate = *columns[source].score.iter().max().unwrap();
                    if candidate > column.score[last_row] {
                        column.set(last_row, candidate, MoveType::End, source);
                    }
                }
            }
        };
        column
    }

    /// Walks the scored DP back from the exit terminal, mutating the graph as it goes: matches
    /// join existing vertices, everything else splices fresh vertices into a running fork chain.
    fn traceback_and_thread(&mut self, read: &[u8], columns: &[AlignmentColumn], mode: AlignMode) {
        let mut i = read.len();
        let mut current = EXIT_VERTEX;
        let mut last_visited = NO_VERTEX;
        let mut fork = NO_VERTEX;
        let end_span = columns[EXIT_VERTEX].prev_vertex[read.len()];

        while !(current == ENTER_VERTEX && i == 0) {
            let column = &columns[current];
            let previous = column.prev_vertex[i];
            match column.reaching_move[i] {
                MoveType::Start => {
                    assert!(last_visited != NO_VERTEX);
                    if fork == NO_VERTEX {
                        fork = last_visited;
                    }
                    // local starts thread the unconsumed read prefix as a fresh chain
                    while i > 0 {
                        debug_assert_eq!(mode, AlignMode::Local);
                        let new_fork = self.add_vertex(read[i - 1]);
                        self.add_edge(new_fork, fork);
                        fork = new_fork;
                        i -= 1;
                    }
                },
                MoveType::End => {
                    assert!(fork == NO_VERTEX && current == EXIT_VERTEX && last_visited == NO_VERTEX);
                    fork = EXIT_VERTEX;
                    if mode == AlignMode::Local {
                        // thread the unconsumed read suffix down to the row the end came from
                        let previous_scores = &columns[previous].score;
                        let best = previous_scores.iter().max().unwrap();
                        let previous_row = previous_scores.iter().position(|s| s == best).unwrap();
                        while i > previous_row {
                            let new_fork = self.add_vertex(read[i - 1]);
                            self.add_edge(new_fork, fork);
                            fork = new_fork;
                            i -= 1;
                        }
                    }
                },
                MoveType::Match => {
                    if fork != NO_VERTEX {
                        self.add_edge(current, fork);
                        fork = NO_VERTEX;
                    }
                    self.nodes[current].reads += 1;
                    i -= 1;
                },
                MoveType::Delete => {
                    if fork == NO_VERTEX {
                        fork = last_visited;
                    }
                },
                MoveType::Mismatch |
                MoveType::Extra => {
                    let new_fork = self.add_vertex(read[i - 1]);
                    if fork == NO_VERTEX {
                        fork = last_visited;
                    }
                    self.add_edge(new_fork, fork);
                    fork = new_fork;
                    i -= 1;
                },
                MoveType::Invalid => {
                    unreachable!("traceback reached an invalid DP cell");
                }
            };

            last_visited = current;
            current = previous;
        }

        let start_span = last_visited;
        if start_span != EXIT_VERTEX {
            self.tag_span(start_span, end_span);
        }

        // a fork that never found an anchor hangs off the enter terminal
        if fork != NO_VERTEX {
            self.add_edge(ENTER_VERTEX, fork);
        }
    }

    /// Computes the best-supported path through the graph.
    /// A vertex scores `2*reads - max(spanning_reads, min_coverage) - 0.0001` outside global
    /// mode and `2*reads - num_reads - 0.0001` in global mode; the small shift biases ties
    /// against half-filled vertices. The returned path maximizes the summed score and may stop
    /// short of the exit terminal.
    /// # Arguments
    /// * `mode` - the alignment mode the reads were threaded under
    /// * `min_coverage` - basal coverage floor for non-global modes; `i32::MIN` disables it
    /// # Errors
    /// * if the graph has no reads
    pub fn consensus_path(&mut self, mode: AlignMode, min_coverage: i32) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
        if self.num_reads == 0 {
            bail!("Invalid input: consensus of an empty graph");
        }

        let order = self.topological_order();
        assert_eq!(order.first(), Some(&ENTER_VERTEX));
        assert_eq!(order.last(), Some(&EXIT_VERTEX));

        let total_reads = self.num_reads;
        let mut best_prev = vec![NO_VERTEX; self.nodes.len()];
        let mut best_vertex = NO_VERTEX;
        let mut best_reaching = f32::MIN;

        self.nodes[ENTER_VERTEX].reaching_score = 0.0;
        for &vertex in order[1..order.len() - 1].iter() {
            let reads = self.nodes[vertex].reads as f32;
            let spanning = self.nodes[vertex].spanning_reads as i32;
            let score = if mode != AlignMode::Global {
                2.0 * reads - spanning.max(min_coverage) as f32 - 0.0001
            } else {
                2.0 * reads - total_reads as f32 - 0.0001
            };

            let mut reaching = score;
            for edge_index in 0..self.nodes[vertex].in_edges.len() {
                let source = self.nodes[vertex].in_edges[edge_index];
                let candidate = score + self.nodes[source].reaching_score;
                if candidate > reaching {
                    reaching = candidate;
                    best_prev[vertex] = source;
                }
                if candidate > best_reaching {
                    best_reaching = candidate;
                    best_vertex = vertex;
                }
            }
            self.nodes[vertex].score = score;
            self.nodes[vertex].reaching_score = reaching;
        }
        assert!(best_vertex != NO_VERTEX);

        let mut path = vec![];
        let mut vertex = best_vertex;
        while vertex != NO_VERTEX {
            path.push(vertex);
            vertex = best_prev[vertex];
        }
        path.reverse();
        Ok(path)
    }

    /// Enumerates plausible single-base deviations around a consensus path: skipped vertices
    /// (deletions), vertices spliced between two path neighbors (insertions), and parallel
    /// vertices bridging a path gap (substitutions). Positions refer to the path column after
    /// the probed vertex.
    /// # Arguments
    /// * `path` - the consensus path, as returned by [`Self::consensus_path`]
    /// * `scoring` - which score substitution candidates report
    pub fn find_possible_variants(&self, path: &[usize], scoring: VariantScoring) -> Vec<ScoredMutation> {
        let mut variants = vec![];

        for i in 2..path.len().saturating_sub(2) {
            let vertex = path[i];

            // a direct edge skipping the next path vertex suggests deleting it
            if self.nodes[vertex].out_edges.contains(&path[i + 2]) {
                let score = -self.nodes[path[i + 1]].score;
                variants.push(Mutation::deletion(i + 1).with_score(score as f64));
            }

            // a child that feeds straight back into the next path vertex suggests an insertion
            let parents_of_next: HashSet<usize> = self.nodes[path[i + 1]].in_edges.iter().cloned().collect();
            let mut best_insert: Option<usize> = None;
            for &child in self.nodes[vertex].out_edges.iter() {
                if parents_of_next.contains(&child)
                    && best_insert.map_or(true, |b| self.nodes[child].score > self.nodes[b].score) {
                    best_insert = Some(child);
                }
            }
            if let Some(insert_vertex) = best_insert {
                let score = self.nodes[insert_vertex].score;
                variants.push(Mutation::insertion(i + 1, self.nodes[insert_vertex].base).with_score(score as f64));
            }

            // an off-path child bridging to the vertex after next suggests a substitution
            let parents_after_next: HashSet<usize> = self.nodes[path[i + 2]].in_edges.iter().cloned().collect();
            let mut best_mismatch: Option<usize> = None;
            for &child in self.nodes[vertex].out_edges.iter() {
                if child != path[i + 1]
                    && parents_after_next.contains(&child)
                    && best_mismatch.map_or(true, |b| self.nodes[child].score > self.nodes[b].score) {
                    best_mismatch = Some(child);
                }
            }
            if let Some(mismatch_vertex) = best_mismatch {
                let score = match scoring {
                    VariantScoring::NodeScore => self.nodes[mismatch_vertex].score,
                    VariantScoring::ScoreDelta => self.nodes[mismatch_vertex].score - self.nodes[path[i + 1]].score
                };
                variants.push(Mutation::substitution(i + 1, self.nodes[mismatch_vertex].base).with_score(score as f64));
            }
        }
        variants
    }

    /// Renders the graph in dot format. Diagnostic only; the node/edge structure is stable, the
    /// cosmetics are not.
    /// # Arguments
    /// * `options` - rendering options
    /// * `consensus_path` - vertices to fill when `color_nodes` is set
    pub fn to_graphviz(&self, options: &GraphvizOptions, consensus_path: Option<&[usize]>) -> String {
        let on_path: HashSet<usize> = consensus_path.unwrap_or(&[]).iter().cloned().collect();

        let mut out = String::from("digraph G {\n");
        for (id, node) in self.nodes.iter().enumerate() {
            let label = if options.verbose_nodes {
                format!(
                    "{{ {{ {} | {} }} |{{ {} | {} }} |{{ {:.2} | {:.2} }} }}",
                    id, node.base as char, node.reads, node.spanning_reads, node.score, node.reaching_score
                )
            } else {
                format!("{{ {} | {} }}", node.base as char, node.reads)
            };
            if options.color_nodes && on_path.contains(&id) {
                out.push_str(&format!("{id}[shape=Mrecord, style=\"filled\", fillcolor=\"lightblue\" , label=\"{label}\"];\n"));
            } else {
                out.push_str(&format!("{id}[shape=Mrecord, label=\"{label}\"];\n"));
            }
        }
        for &(source, target) in self.edges.iter() {
            out.push_str(&format!("{source}->{target} ;\n"));
        }
        out.push_str("}\n");
        out
    }
}
