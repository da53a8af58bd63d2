/*!
Merges reference-anchored amplicons into a single consensus.
Each amplicon is an aligned string: upper-case bases sit on reference columns, `-` marks a deleted reference column, and lower-case bases are inserted after the previous reference column.
Columns collect votes from every amplicon that covers them and are collapsed with depth and support thresholds.

# Example usage
```rust
use alnstitch::aln_config::StitchConfigBuilder;
use alnstitch::stitch::AmpliconStitcher;

let config = StitchConfigBuilder::default()
    .min_depth(3)
    .build().unwrap();
let mut stitcher = AmpliconStitcher::with_config(config).unwrap();
stitcher.add_amplicon(b"ACGTAC", 0).unwrap();
stitcher.add_amplicon(b"ACcGT-C", 0).unwrap();
stitcher.add_amplicon(b"GT-C", 2).unwrap();

// column 4 is a 2-1 deletion, the insertion after column 1 only has 1 of 2 votes
assert_eq!(stitcher.consensus().unwrap(), b"ACGTC".to_vec());
```
*/

use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use simple_error::bail;

use crate::aln_config::StitchConfig;
use crate::alignment::Alignment;
use crate::sequence::Sequence;

/// Symbol used for a deleted reference column
const DELETION: u8 = b'-';

/// One candidate base for one column.
/// Column heads sit on the backbone through `next`, competing bases hang off the head through `alternative`.
#[derive(Clone, Debug)]
struct ConsensusNode {
    /// Upper-case base, `-` for a deletion, or the mask for a placeholder
    base: u8,
    /// Number of amplicons voting for this exact base
    support: u32,
    /// Number of amplicons covering the column, only tracked on the column head
    depth: u32,
    /// Reference column, None for insertion columns
    ref_pos: Option<usize>,
    next: Option<usize>,
    alternative: Option<usize>
}

impl ConsensusNode {
    fn new(base: u8, support: u32, depth: u32, ref_pos: Option<usize>) -> ConsensusNode {
        ConsensusNode {
            base,
            support,
            depth,
            ref_pos,
            next: None,
            alternative: None
        }
    }
}

/// Read-only view of one consensus column
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSummary {
    /// Reference column, None for insertion columns
    pub ref_pos: Option<usize>,
    /// Number of amplicons covering the column
    pub depth: u32,
    /// Candidate bases and their support, in the order they were first seen
    pub alternatives: Vec<(u8, u32)>
}

/// The kind of vote a base represents, used to tally support per column
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum BaseClass {
    Snp,
    Deletion,
    Insertion
}

/// One parsed amplicon column: the anchored base and any bases inserted after it
type AmpliconColumn = (u8, Vec<u8>);

/// Splits an aligned amplicon into columns
/// # Errors
/// * if a symbol is not a letter or `-`
fn parse_columns(aligned: &[u8]) -> Result<(Vec<AmpliconColumn>, usize), Box<dyn std::error::Error>> {
    let mut columns: Vec<AmpliconColumn> = vec![];
    let mut dropped = 0;
    for (i, &symbol) in aligned.iter().enumerate() {
        if symbol.is_ascii_uppercase() || symbol == DELETION {
            columns.push((symbol, vec![]));
        } else if symbol.is_ascii_lowercase() {
            match columns.last_mut() {
                Some((_base, insertion)) => insertion.push(symbol.to_ascii_uppercase()),
                None => dropped += 1
            }
        } else {
            bail!("Unexpected symbol {:?} at position {} of aligned amplicon", symbol as char, i);
        }
    }
    Ok((columns, dropped))
}

/// Builds a consensus from amplicons sorted by reference start
#[derive(Clone, Debug)]
pub struct AmpliconStitcher {
    /// Thresholds and the mask symbol
    config: StitchConfig,
    /// Node arena
    nodes: Vec<ConsensusNode>,
    /// First backbone node
    first: Option<usize>,
    /// Last backbone node
    last: Option<usize>,
    /// Column head for each reference column, starting at `origin`
    anchored: Vec<usize>,
    /// Reference position of the first column
    origin: Option<usize>,
    /// Start of the most recent amplicon, to enforce sorted input
    last_start: Option<usize>
}

impl Default for AmpliconStitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AmpliconStitcher {
    /// Creates a new instance with the default configuration
    pub fn new() -> AmpliconStitcher {
        AmpliconStitcher {
            config: StitchConfig::default(),
            nodes: vec![],
            first: None,
            last: None,
            anchored: vec![],
            origin: None,
            last_start: None
        }
    }

    /// Creates a new instance with the specified configuration
    /// # Arguments
    /// * `config` - the thresholds to use for collapsing
    /// # Errors
    /// * if any of the percentages are above 100
    pub fn with_config(config: StitchConfig) -> Result<AmpliconStitcher, Box<dyn std::error::Error>> {
        for (label, value) in [("min_snp_percent", config.min_snp_percent), ("min_ins_percent", config.min_ins_percent), ("min_del_percent", config.min_del_percent)] {
            if value > 100 {
                bail!("{label} must be at most 100, got {value}");
            }
        }
        Ok(AmpliconStitcher {
            config,
            ..Default::default()
        })
    }

    /// Drops every node and resets the stitcher to empty
    fn clear(&mut self) {
        self.nodes.clear();
        self.first = None;
        self.last = None;
        self.anchored.clear();
        self.origin = None;
        self.last_start = None;
    }

    /// Adds a node to the arena and links it on the backbone after `after`, or at the front if None
    fn link_after(&mut self, after: Option<usize>, node: ConsensusNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        let next = match after {
            Some(a) => {
                let next = self.nodes[a].next;
                self.nodes[a].next = Some(index);
                next
            },
            None => {
                let next = self.first;
                self.first = Some(index);
                next
            }
        };
        self.nodes[index].next = next;
        if next.is_none() {
            self.last = Some(index);
        }
        index
    }

    /// Records one vote for `base` in the column headed by `head`; depth is handled by the caller
    fn vote(&mut self, head: usize, base: u8) {
        let mut current = head;
        loop {
            if self.nodes[current].base == base {
                self.nodes[current].support += 1;
                return;
            }
            match self.nodes[current].alternative {
                Some(alt) => current = alt,
                None => break
            }
        }
        let ref_pos = self.nodes[head].ref_pos;
        let index = self.nodes.len();
        self.nodes.push(ConsensusNode::new(base, 1, 0, ref_pos));
        self.nodes[current].alternative = Some(index);
    }

    /// Returns the insertion column heads directly after an anchored column head
    fn insertion_columns(&self, head: usize) -> Vec<usize> {
        let mut columns = vec![];
        let mut current = self.nodes[head].next;
        while let Some(c) = current {
            if self.nodes[c].ref_pos.is_some() {
                break;
            }
            columns.push(c);
            current = self.nodes[c].next;
        }
        columns
    }

    /// Adds an amplicon to the consensus graph.
    /// Amplicons must be added in order of `ref_start`.
    /// Lower-case bases before the first reference column have nothing to attach to and are dropped.
    /// # Arguments
    /// * `aligned` - the aligned amplicon, upper-case for reference columns, `-` for deletions, lower-case for insertions
    /// * `ref_start` - the reference column of the first upper-case base or `-`
    /// # Errors
    /// * if `ref_start` is before the previous amplicon's start
    /// * if `aligned` contains anything other than letters and `-`
    /// * if memory for the new columns cannot be reserved, in which case the stitcher is cleared
    pub fn add_amplicon(&mut self, aligned: &[u8], ref_start: usize) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(last_start) = self.last_start {
            if ref_start < last_start {
                bail!("Amplicons must be sorted by start, got {ref_start} after {last_start}");
            }
        }
        let (columns, dropped) = parse_columns(aligned)?;
        if dropped > 0 {
            debug!("Dropped {dropped} leading inserted bases from amplicon at {ref_start}");
        }
        self.last_start = Some(ref_start);
        if columns.is_empty() {
            return Ok(());
        }

        let origin = *self.origin.get_or_insert(ref_start);
        let mut next_ref = origin + self.anchored.len();
        let placeholders = ref_start.saturating_sub(next_ref);
        let inserted: usize = columns.iter().map(|(_b, ins)| ins.len()).sum();

        // every column and inserted base adds at most one node
        let reserved = self.nodes.try_reserve(placeholders + columns.len() + inserted)
            .and_then(|_| self.anchored.try_reserve(placeholders + columns.len()));
        if let Err(e) = reserved {
            self.clear();
            return Err(Box::new(e));
        }

        // coverage gap
        while next_ref < ref_start {
            let index = self.link_after(self.last, ConsensusNode::new(self.config.mask, 0, 0, Some(next_ref)));
            self.anchored.push(index);
            next_ref += 1;
        }

        for (k, (base, insertion)) in columns.into_iter().enumerate() {
            let ref_pos = ref_start + k;
            let head = if ref_pos < next_ref {
                let head = self.anchored[ref_pos - origin];
                self.vote(head, base);
                self.nodes[head].depth += 1;
                head
            } else {
                let head = self.link_after(self.last, ConsensusNode::new(base, 1, 1, Some(ref_pos)));
                self.anchored.push(head);
                next_ref += 1;
                head
            };

            // insertion columns share the depth of the column on their left
            let existing = self.insertion_columns(head);
            for &column in existing.iter() {
                self.nodes[column].depth += 1;
            }
            let depth = self.nodes[head].depth;
            let mut after = existing.last().copied().unwrap_or(head);
            for (i, &ins_base) in insertion.iter().enumerate() {
                if i < existing.len() {
                    self.vote(existing[i], ins_base);
                } else {
                    after = self.link_after(Some(after), ConsensusNode::new(ins_base, 1, depth, None));
                }
            }
        }

        debug!("Merged amplicon at {}: {} aligned symbols, {} total columns", ref_start, aligned.len(), self.num_columns());
        Ok(())
    }

    /// Adds the aligned region of a pairwise alignment as an amplicon
    /// # Arguments
    /// * `alignment` - an alignment of `query` against the reference
    /// * `query` - the aligned query
    /// # Errors
    /// * same as `add_amplicon(...)`
    pub fn add_alignment(&mut self, alignment: &Alignment, query: &Sequence) -> Result<(), Box<dyn std::error::Error>> {
        if alignment.is_empty() {
            debug!("Skipping empty alignment for {}", query.id());
            return Ok(());
        }
        self.add_amplicon(&alignment.stitch_sequence(query.seq()), alignment.ref_start())
    }

    /// Number of backbone columns, anchored and inserted
    pub fn num_columns(&self) -> usize {
        let mut count = 0;
        let mut current = self.first;
        while let Some(c) = current {
            count += 1;
            current = self.nodes[c].next;
        }
        count
    }

    /// Returns the reference position of the first column, if anything has been added
    pub fn origin(&self) -> Option<usize> {
        self.origin
    }

    /// Summarizes every column in backbone order
    pub fn columns(&self) -> Vec<ColumnSummary> {
        let mut summaries = vec![];
        let mut current = self.first;
        while let Some(head) = current {
            let mut alternatives = vec![];
            let mut alt = Some(head);
            while let Some(a) = alt {
                alternatives.push((self.nodes[a].base, self.nodes[a].support));
                alt = self.nodes[a].alternative;
            }
            summaries.push(ColumnSummary {
                ref_pos: self.nodes[head].ref_pos,
                depth: self.nodes[head].depth,
                alternatives
            });
            current = self.nodes[head].next;
        }
        summaries
    }

    /// Finds the most supported base in a column; the first one seen wins ties
    fn best_alternative(&self, head: usize) -> &ConsensusNode {
        let mut best = &self.nodes[head];
        let mut alt = best.alternative;
        while let Some(a) = alt {
            let node = &self.nodes[a];
            if node.support > best.support {
                best = node;
            }
            alt = node.alternative;
        }
        best
    }

    /// Sums the support in a column by kind of vote
    fn tally(&self, head: usize) -> HashMap<BaseClass, u32> {
        let is_insertion = self.nodes[head].ref_pos.is_none();
        let mut tally: HashMap<BaseClass, u32> = Default::default();
        let mut alt = Some(head);
        while let Some(a) = alt {
            let node = &self.nodes[a];
            let class = if is_insertion {
                BaseClass::Insertion
            } else if node.base == DELETION {
                BaseClass::Deletion
            } else {
                BaseClass::Snp
            };
            *tally.entry(class).or_insert(0) += node.support;
            alt = node.alternative;
        }
        tally
    }

    /// Collapses the graph into a flat consensus.
    /// Columns without coverage or without enough support are masked, deletions that pass are dropped,
    /// and insertions that do not pass are dropped.
    /// # Errors
    /// * if the output cannot be allocated
    pub fn consensus(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut consensus: Vec<u8> = Vec::new();
        consensus.try_reserve(self.nodes.len())?;

        let min_depth = self.config.min_depth;
        let mask = self.config.mask;
        let mut current = self.first;
        while let Some(head) = current {
            current = self.nodes[head].next;
            let depth = self.nodes[head].depth;
            let best = self.best_alternative(head);
            let percent = if depth > 0 { best.support * 100 / depth } else { 0 };
            let tally = self.tally(head);
            let votes = |class: BaseClass| tally.get(&class).copied().unwrap_or(0);
            trace!("column {:?}: depth={} best={:?} {}% tally={:?}", self.nodes[head].ref_pos, depth, best.base as char, percent, tally);

            if self.nodes[head].ref_pos.is_none() {
                // insertion column, emitted or dropped but never masked
                let inserted = votes(BaseClass::Insertion);
                let passes = if depth < min_depth {
                    // nobody passed through without inserting, and everybody inserted the same base
                    inserted == depth && best.support == inserted
                } else {
                    percent >= self.config.min_ins_percent
                };
                if passes {
                    consensus.push(best.base);
                }
            } else if depth == 0 {
                // coverage gap
                consensus.push(mask);
            } else if depth < min_depth {
                if votes(BaseClass::Deletion) == depth {
                    continue;
                }
                if votes(BaseClass::Snp) == depth && best.support == depth {
                    consensus.push(best.base);
                } else {
                    consensus.push(mask);
                }
            } else if best.base == DELETION {
                if votes(BaseClass::Deletion) * 100 / depth < self.config.min_del_percent {
                    consensus.push(mask);
                }
            } else if percent >= self.config.min_snp_percent {
                consensus.push(best.base);
            } else {
                consensus.push(mask);
            }
        }

        debug!("Collapsed {} columns into {} bases", self.num_columns(), consensus.len());
        Ok(consensus)
    }

    // Getters
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use crate::aln_config::StitchConfigBuilder;
    use crate::example_gen::generate_amplicons;

    fn stitch(amplicons: &[(&[u8], usize)], min_depth: u32, min_percent: u32) -> Vec<u8> {
        let config = StitchConfigBuilder::default()
            .min_depth(min_depth)
            .min_snp_percent(min_percent)
            .min_ins_percent(min_percent)
            .min_del_percent(min_percent)
            .build().unwrap();
        let mut stitcher = AmpliconStitcher::with_config(config).unwrap();
        for &(aligned, start) in amplicons.iter() {
            stitcher.add_amplicon(aligned, start).unwrap();
        }
        stitcher.consensus().unwrap()
    }

    #[test]
    fn test_single_amplicon() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"ACGTACGTTGCA", 0).unwrap();
        assert_eq!(stitcher.consensus().unwrap(), b"ACGTACGTTGCA".to_vec());
        assert_eq!(stitcher.num_columns(), 12);
    }

    #[test]
    fn test_majority_and_split() {
        // 2 vs 1 passes 66%
        let consensus = stitch(&[(b"ACGT", 0), (b"ACGT", 0), (b"ACTT", 0)], 3, 66);
        assert_eq!(consensus, b"ACGT".to_vec());

        // three way split does not
        let consensus = stitch(&[(b"ACGT", 0), (b"ACTT", 0), (b"ACAT", 0)], 3, 66);
        assert_eq!(consensus, b"ACNT".to_vec());
    }

    #[test]
    fn test_low_depth() {
        // not unanimous and below the depth floor
        let consensus = stitch(&[(b"ACGT", 0), (b"ACTT", 0)], 10, 50);
        assert_eq!(consensus, b"ACNT".to_vec());

        // unanimous deletions are dropped
        let consensus = stitch(&[(b"AC-T", 0), (b"AC-T", 0)], 10, 50);
        assert_eq!(consensus, b"ACT".to_vec());

        // unanimous insertions are kept, split ones are dropped
        let consensus = stitch(&[(b"ACgGT", 0), (b"ACgGT", 0)], 10, 50);
        assert_eq!(consensus, b"ACGGT".to_vec());
        let consensus = stitch(&[(b"ACgGT", 0), (b"ACGT", 0)], 10, 50);
        assert_eq!(consensus, b"ACGT".to_vec());
    }

    #[test]
    fn test_column_tally() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"ACgT", 0).unwrap();
        stitcher.add_amplicon(b"A-aT", 0).unwrap();
        stitcher.add_amplicon(b"AGT", 0).unwrap();
        stitcher.add_amplicon(b"A-T", 0).unwrap();

        // column 1 is C, G, and two deletions
        let head = stitcher.anchored[1];
        let tally = stitcher.tally(head);
        assert_eq!(tally.get(&BaseClass::Snp), Some(&2));
        assert_eq!(tally.get(&BaseClass::Deletion), Some(&2));
        assert_eq!(tally.get(&BaseClass::Insertion), None);

        // the insertion column has two votes of four, split across two bases
        let insertion = stitcher.nodes[head].next.unwrap();
        let tally = stitcher.tally(insertion);
        assert_eq!(tally.get(&BaseClass::Insertion), Some(&2));
        assert_eq!(stitcher.nodes[insertion].depth, 4);

        // below the depth floor a mixed column is masked and the split insertion is dropped
        assert_eq!(stitcher.consensus().unwrap(), b"ANT".to_vec());

        // at depth the two deletion votes reach 50%
        let config = StitchConfigBuilder::default()
            .min_depth(4)
            .build().unwrap();
        let mut stitcher = AmpliconStitcher::with_config(config).unwrap();
        for aligned in [b"A-T", b"ACT", b"AGT", b"A-T"] {
            stitcher.add_amplicon(aligned, 0).unwrap();
        }
        assert_eq!(stitcher.consensus().unwrap(), b"AT".to_vec());
    }

    #[test]
    fn test_deletions() {
        let consensus = stitch(&[(b"AC-T", 0), (b"AC-T", 0), (b"ACGT", 0)], 3, 50);
        assert_eq!(consensus, b"ACT".to_vec());

        // a failed deletion is masked
        let consensus = stitch(&[(b"AC-T", 0), (b"AC-T", 0), (b"ACGT", 0)], 3, 70);
        assert_eq!(consensus, b"ACNT".to_vec());
    }

    #[test]
    fn test_insertions() {
        let consensus = stitch(&[(b"ACgGT", 0), (b"ACgGT", 0), (b"ACGT", 0)], 3, 50);
        assert_eq!(consensus, b"ACGGT".to_vec());

        // the column can be created by a later amplicon
        let consensus = stitch(&[(b"ACGT", 0), (b"ACgGT", 0), (b"ACgGT", 0)], 3, 50);
        assert_eq!(consensus, b"ACGGT".to_vec());

        // 1 of 3 is not enough
        let consensus = stitch(&[(b"ACgGT", 0), (b"ACGT", 0), (b"ACGT", 0)], 3, 50);
        assert_eq!(consensus, b"ACGT".to_vec());

        // multi-base insertions vote base by base
        let consensus = stitch(&[(b"ACgtGT", 0), (b"ACgaGT", 0), (b"ACgtGT", 0)], 3, 50);
        assert_eq!(consensus, b"ACGTGT".to_vec());
    }

    #[test]
    fn test_insertion_depth() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"ACGT", 0).unwrap();
        stitcher.add_amplicon(b"ACgGT", 0).unwrap();
        stitcher.add_amplicon(b"CGT", 1).unwrap();
        stitcher.add_amplicon(b"GT", 2).unwrap();
        let columns = stitcher.columns();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[1], ColumnSummary { ref_pos: Some(1), depth: 3, alternatives: vec![(b'C', 3)] });
        // every amplicon through column 1 counts toward the insertion depth
        assert_eq!(columns[2], ColumnSummary { ref_pos: None, depth: 3, alternatives: vec![(b'G', 1)] });
        assert_eq!(columns[3].depth, 4);
    }

    #[test]
    fn test_coverage_gap() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"ACGT", 0).unwrap();
        stitcher.add_amplicon(b"TTAA", 6).unwrap();
        assert_eq!(stitcher.consensus().unwrap(), b"ACGTNNTTAA".to_vec());

        // covered columns collect alternatives, the gap stays empty
        stitcher.add_amplicon(b"CC", 6).unwrap();
        let columns = stitcher.columns();
        assert_eq!(columns[4], ColumnSummary { ref_pos: Some(4), depth: 0, alternatives: vec![(b'N', 0)] });
        assert_eq!(columns[6], ColumnSummary { ref_pos: Some(6), depth: 2, alternatives: vec![(b'T', 1), (b'C', 1)] });
    }

    #[test]
    fn test_placeholder_fill() {
        let config = StitchConfigBuilder::default()
            .min_depth(1)
            .mask(b'X')
            .build().unwrap();
        let mut stitcher = AmpliconStitcher::with_config(config).unwrap();
        stitcher.add_amplicon(b"AA", 0).unwrap();
        stitcher.add_amplicon(b"CC", 4).unwrap();
        assert_eq!(stitcher.consensus().unwrap(), b"AAXXCC".to_vec());
    }

    #[test]
    fn test_offset_origin() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"aCGT", 5).unwrap();
        stitcher.add_amplicon(b"GTA", 6).unwrap();
        assert_eq!(stitcher.origin(), Some(5));
        // the leading insertion had nothing to attach to
        assert_eq!(stitcher.consensus().unwrap(), b"CGTA".to_vec());
    }

    #[test]
    fn test_bad_input() {
        let mut stitcher = AmpliconStitcher::new();
        stitcher.add_amplicon(b"ACGT", 5).unwrap();
        assert!(stitcher.add_amplicon(b"ACGT", 4).is_err());
        assert!(stitcher.add_amplicon(b"AC*T", 6).is_err());
        assert!(stitcher.add_amplicon(b"AC1T", 6).is_err());

        let config = StitchConfigBuilder::default()
            .min_snp_percent(101)
            .build().unwrap();
        assert!(AmpliconStitcher::with_config(config).is_err());
    }

    #[test]
    fn test_tiling() {
        // noise free tiles reproduce the reference at low depth
        let (reference, amplicons) = generate_amplicons(150, 40, 25, 2, 0.0);
        let mut stitcher = AmpliconStitcher::new();
        for (aligned, start) in amplicons.iter() {
            stitcher.add_amplicon(aligned, *start).unwrap();
        }
        assert_eq!(stitcher.consensus().unwrap(), reference);

        // noisy tiles at high depth vote the noise out
        let (reference, amplicons) = generate_amplicons(150, 40, 25, 15, 0.03);
        let mut stitcher = AmpliconStitcher::new();
        for (aligned, start) in amplicons.iter() {
            stitcher.add_amplicon(aligned, *start).unwrap();
        }
        assert_eq!(stitcher.consensus().unwrap(), reference);
    }

    #[derive(Debug, serde::Deserialize)]
    struct StitchRecord {
        kind: String,
        start: usize,
        sequence: String
    }

    /// Wrapper test function that loads a stitch test from a csv file.
    /// Expected columns are "kind" (amplicon or consensus), "start" (usize), and "sequence" (String).
    /// Returns a tuple of (amplicons, expected consensus).
    /// # Arguments
    /// * `filename` - the file path to load
    fn load_stitch_csv_test(filename: &std::path::Path) -> (Vec<(Vec<u8>, usize)>, Vec<u8>) {
        let mut amplicons = vec![];
        let mut expected = None;

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(filename)
            .unwrap();
        for row in csv_reader.deserialize() {
            let record: StitchRecord = row.unwrap();
            match record.kind.as_str() {
                "amplicon" => amplicons.push((record.sequence.as_bytes().to_vec(), record.start)),
                "consensus" => expected = Some(record.sequence.as_bytes().to_vec()),
                other => panic!("unknown record kind {other}")
            }
        }
        (amplicons, expected.unwrap())
    }

    /// Entry point for file-based tests.
    /// # Arguments
    /// * `filename` - the test file to load, will be a csv
    /// * `min_depth` - depth floor for the percentage rules
    fn run_test_file(filename: &str, min_depth: u32) {
        let (amplicons, expected) = load_stitch_csv_test(&PathBuf::from(filename));
        let config = StitchConfigBuilder::default()
            .min_depth(min_depth)
            .build().unwrap();
        let mut stitcher = AmpliconStitcher::with_config(config).unwrap();
        for (aligned, start) in amplicons.iter() {
            stitcher.add_amplicon(aligned, *start).unwrap();
        }
        let consensus = stitcher.consensus().unwrap();
        assert_eq!(String::from_utf8(consensus).unwrap(), String::from_utf8(expected).unwrap());
    }

    #[test_log::test]
    fn test_csv_tiling_001() {
        run_test_file("./tests/stitch_tiling_001.csv", 3);
    }

    #[test_log::test]
    fn test_csv_gap_001() {
        run_test_file("./tests/stitch_gap_001.csv", 2);
    }
}
