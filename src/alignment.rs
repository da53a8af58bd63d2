/*!
Alignment results and the decoders that produce them.
An [`Alignment`] classifies every base of both sequences, so the arrays are one longer than the sequences with a trailing [`AlnPosition::End`].

# Example usage
```rust
use alnstitch::aln_config::AlnConfigBuilder;
use alnstitch::alignment::AlnPosition;
use alnstitch::needleman::needleman_align;
use alnstitch::scoring::ScoreMatrix;
use alnstitch::sequence::Sequence;

let config = AlnConfigBuilder::default()
    .score_matrix(ScoreMatrix::dna(2, -1))
    .build().unwrap();
let reference = Sequence::new("ref", b"ACGTACGT").unwrap();
let query = Sequence::new("qry", b"ACGTCCGT").unwrap();
let alignment = needleman_align(&reference, &query, &config).unwrap();
assert_eq!(alignment.score(), 13);
assert_eq!(alignment.ref_aln()[4], AlnPosition::Mismatch);
assert_eq!(alignment.cigar(), "4=1X3=");
```
*/

use itertools::Itertools;

use crate::direction::Direction;
use crate::direction_matrix::{DirectionMatrix, DirectionStore};
use crate::scoring::bases_match;
use crate::sequence::Sequence;

/// Classification of one base in an alignment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlnPosition {
    /// The base is aligned against a gap in the other sequence
    Gap,
    /// The base is outside the aligned region
    SoftMask,
    /// The base is aligned to a different base
    Mismatch,
    /// The base is aligned to an equal base
    Match,
    /// Terminal sentinel after the last base
    End
}

impl AlnPosition {
    /// True for matches and mismatches
    pub fn is_anchored(self) -> bool {
        matches!(self, AlnPosition::Match | AlnPosition::Mismatch)
    }
}

/// The kind of an alignment column
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlnOp {
    Match,
    Mismatch,
    /// Query base with no reference partner
    Insertion,
    /// Reference base with no query partner
    Deletion
}

impl AlnOp {
    /// The extended CIGAR symbol
    pub fn cigar_symbol(self) -> char {
        match self {
            AlnOp::Match => '=',
            AlnOp::Mismatch => 'X',
            AlnOp::Insertion => 'I',
            AlnOp::Deletion => 'D'
        }
    }
}

/// One column of an alignment.
/// For insertions `ref_pos` is the next reference base, for deletions `qry_pos` is the next query base.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlnStep {
    pub op: AlnOp,
    pub ref_pos: usize,
    pub qry_pos: usize
}

/// A pairwise alignment in absolute sequence coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// One entry per reference base plus the End sentinel
    ref_aln: Vec<AlnPosition>,
    /// One entry per query base plus the End sentinel
    qry_aln: Vec<AlnPosition>,
    /// Alignment score
    score: i64,
    /// First aligned reference base, inclusive
    ref_start: usize,
    /// Last aligned reference base, inclusive
    ref_end: usize,
    /// First aligned query base, inclusive
    qry_start: usize,
    /// Last aligned query base, inclusive
    qry_end: usize,
    num_ins: usize,
    num_del: usize,
    num_snp: usize,
    num_match: usize
}

impl Alignment {
    /// Creates an empty alignment with everything soft-masked.
    /// # Arguments
    /// * `ref_len` - full reference length
    /// * `qry_len` - full query length
    /// * `score` - the score to report, usually 0
    pub fn unaligned(ref_len: usize, qry_len: usize, score: i64) -> Alignment {
        let mut ref_aln = vec![AlnPosition::SoftMask; ref_len + 1];
        ref_aln[ref_len] = AlnPosition::End;
        let mut qry_aln = vec![AlnPosition::SoftMask; qry_len + 1];
        qry_aln[qry_len] = AlnPosition::End;
        Alignment {
            ref_aln,
            qry_aln,
            score,
            ref_start: 0,
            ref_end: 0,
            qry_start: 0,
            qry_end: 0,
            num_ins: 0,
            num_del: 0,
            num_snp: 0,
            num_match: 0
        }
    }

    /// True when nothing was aligned
    pub fn is_empty(&self) -> bool {
        self.alignment_len() == 0
    }

    /// Number of alignment columns
    pub fn alignment_len(&self) -> usize {
        self.num_ins + self.num_del + self.num_snp + self.num_match
    }

    /// Walks the aligned region as a list of columns.
    /// Between two anchored columns, deletions are listed before insertions.
    pub fn steps(&self) -> Vec<AlnStep> {
        let mut steps = Vec::with_capacity(self.alignment_len());
        if self.is_empty() {
            return steps;
        }

        let mut r = self.ref_start;
        let mut q = self.qry_start;
        loop {
            while r <= self.ref_end && self.ref_aln[r] == AlnPosition::Gap {
                steps.push(AlnStep { op: AlnOp::Deletion, ref_pos: r, qry_pos: q });
                r += 1;
            }
            while q <= self.qry_end && self.qry_aln[q] == AlnPosition::Gap {
                steps.push(AlnStep { op: AlnOp::Insertion, ref_pos: r, qry_pos: q });
                q += 1;
            }
            if r > self.ref_end || q > self.qry_end {
                break;
            }

            let op = if self.ref_aln[r] == AlnPosition::Match { AlnOp::Match } else { AlnOp::Mismatch };
            steps.push(AlnStep { op, ref_pos: r, qry_pos: q });
            r += 1;
            q += 1;
        }
        steps
    }

    /// Extended CIGAR string (`=`, `X`, `I`, `D`) with `S` for unaligned query flanks
    pub fn cigar(&self) -> String {
        let qry_len = self.qry_aln.len() - 1;
        if self.is_empty() {
            return if qry_len > 0 { format!("{qry_len}S") } else { String::new() };
        }

        let mut cigar = String::new();
        if self.qry_start > 0 {
            cigar.push_str(&format!("{}S", self.qry_start));
        }
        for (count, symbol) in self.steps().iter().map(|s| s.op.cigar_symbol()).dedup_with_count() {
            cigar.push_str(&format!("{count}{symbol}"));
        }
        let trailing = qry_len - 1 - self.qry_end;
        if trailing > 0 {
            cigar.push_str(&format!("{trailing}S"));
        }
        cigar
    }

    /// Converts the aligned region into the stitcher convention: upper-case query bases at reference columns,
    /// `-` for deletions, and lower-case query bases for insertions.
    /// Pair the result with `ref_start()` when adding it to a stitcher.
    /// # Arguments
    /// * `qry` - the full query sequence this alignment was built from
    pub fn stitch_sequence(&self, qry: &[u8]) -> Vec<u8> {
        self.steps().iter()
            .map(|step| match step.op {
                AlnOp::Match | AlnOp::Mismatch => qry[step.qry_pos].to_ascii_uppercase(),
                AlnOp::Insertion => qry[step.qry_pos].to_ascii_lowercase(),
                AlnOp::Deletion => b'-'
            })
            .collect()
    }

    /// Returns the aligned region as two equal-length gapped strings, reference first
    /// # Arguments
    /// * `reference` - the full reference sequence
    /// * `qry` - the full query sequence
    pub fn aligned_pair(&self, reference: &[u8], qry: &[u8]) -> (Vec<u8>, Vec<u8>) {
        self.steps().iter()
            .map(|step| match step.op {
                AlnOp::Match | AlnOp::Mismatch => (reference[step.ref_pos], qry[step.qry_pos]),
                AlnOp::Insertion => (b'-', qry[step.qry_pos]),
                AlnOp::Deletion => (reference[step.ref_pos], b'-')
            })
            .unzip()
    }

    // Getters
    pub fn ref_aln(&self) -> &[AlnPosition] {
        &self.ref_aln
    }

    pub fn qry_aln(&self) -> &[AlnPosition] {
        &self.qry_aln
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn ref_start(&self) -> usize {
        self.ref_start
    }

    pub fn ref_end(&self) -> usize {
        self.ref_end
    }

    pub fn qry_start(&self) -> usize {
        self.qry_start
    }

    pub fn qry_end(&self) -> usize {
        self.qry_end
    }

    pub fn num_ins(&self) -> usize {
        self.num_ins
    }

    pub fn num_del(&self) -> usize {
        self.num_del
    }

    pub fn num_snp(&self) -> usize {
        self.num_snp
    }

    pub fn num_match(&self) -> usize {
        self.num_match
    }
}

/// A direction matrix after a fill, ready to be traced back
#[derive(Clone, Debug)]
pub struct FilledMatrix {
    /// The directions
    matrix: DirectionMatrix,
    /// Score of the end cell
    score: i64,
    /// End cell column, window relative with 0 as the indel column
    end_col: usize,
    /// End cell row, window relative with 0 as the indel row
    end_row: usize
}

impl FilledMatrix {
    pub fn new(matrix: DirectionMatrix, score: i64, end_col: usize, end_row: usize) -> FilledMatrix {
        FilledMatrix {
            matrix,
            score,
            end_col,
            end_row
        }
    }

    /// Traces back from the end cell, consuming the matrix
    /// # Arguments
    /// * `reference` - the reference the matrix was filled with
    /// * `query` - the query the matrix was filled with
    pub fn decode(mut self, reference: &Sequence, query: &Sequence) -> Alignment {
        decode_matrix(&mut self.matrix, self.end_col, self.end_row, self.score, reference, query)
    }

    // Getters
    pub fn matrix(&self) -> &DirectionMatrix {
        &self.matrix
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn end_col(&self) -> usize {
        self.end_col
    }

    pub fn end_row(&self) -> usize {
        self.end_row
    }
}

/// Walks a direction matrix back from an end cell until it reads Stop.
/// Everything outside the walked span is soft-masked.
/// If the end cell itself is Stop, the result is an empty alignment.
/// # Arguments
/// * `matrix` - the filled directions; only the cursor is modified
/// * `end_col` - window relative column of the last aligned reference base (+1 for the indel column)
/// * `end_row` - window relative row of the last aligned query base (+1 for the indel row)
/// * `score` - score to report
/// * `reference` - the reference sequence
/// * `query` - the query sequence
pub fn decode_matrix(
    matrix: &mut DirectionMatrix, end_col: usize, end_row: usize, score: i64,
    reference: &Sequence, query: &Sequence
) -> Alignment {
    let ref_seq = reference.seq();
    let qry_seq = query.seq();
    let ref_offset = reference.offset();
    let qry_offset = query.offset();
    let row_len = matrix.row_len();

    let mut aln = Alignment::unaligned(ref_seq.len(), qry_seq.len(), score);
    let mut col = end_col;
    let mut row = end_row;
    matrix.seek_cell(col, row);
    loop {
        match matrix.read() {
            Direction::Stop => break,
            Direction::Substitution => {
                let r = ref_offset + col - 1;
                let q = qry_offset + row - 1;
                if bases_match(ref_seq[r], qry_seq[q]) {
                    aln.ref_aln[r] = AlnPosition::Match;
                    aln.qry_aln[q] = AlnPosition::Match;
                    aln.num_match += 1;
                } else {
                    aln.ref_aln[r] = AlnPosition::Mismatch;
                    aln.qry_aln[q] = AlnPosition::Mismatch;
                    aln.num_snp += 1;
                }
                col -= 1;
                row -= 1;
                matrix.retreat_by(row_len + 1);
            },
            Direction::Insertion => {
                aln.qry_aln[qry_offset + row - 1] = AlnPosition::Gap;
                aln.num_ins += 1;
                row -= 1;
                matrix.retreat_by(row_len);
            },
            Direction::Deletion => {
                aln.ref_aln[ref_offset + col - 1] = AlnPosition::Gap;
                aln.num_del += 1;
                col -= 1;
                matrix.retreat();
            }
        }
    }

    if aln.is_empty() {
        return aln;
    }

    // a span that consumed nothing from one sequence collapses onto its start
    aln.ref_start = ref_offset + col;
    aln.ref_end = ref_offset + end_col.max(col + 1) - 1;
    aln.qry_start = qry_offset + row;
    aln.qry_end = qry_offset + end_row.max(row + 1) - 1;
    aln
}

/// Finds the first and last anchored index in a position array
fn anchored_span(positions: &[AlnPosition]) -> Option<(usize, usize)> {
    let first = positions.iter().position(|p| p.is_anchored())?;
    let last = positions.iter().rposition(|p| p.is_anchored())?;
    Some((first, last))
}

/// Finishes a pair of arrays filled with Match, Mismatch, and Gap by a linear-space aligner.
/// Gaps outside of the first and last anchored base of each sequence become soft-masked, then the columns are counted.
/// If nothing is anchored, the result is an empty alignment.
/// # Arguments
/// * `ref_aln` - reference classification, full length plus End
/// * `qry_aln` - query classification, full length plus End
/// * `score` - score to report
pub fn decode_hirschberg(mut ref_aln: Vec<AlnPosition>, mut qry_aln: Vec<AlnPosition>, score: i64) -> Alignment {
    let (ref_start, ref_end, qry_start, qry_end) = match (anchored_span(&ref_aln), anchored_span(&qry_aln)) {
        (Some((rs, re)), Some((qs, qe))) => (rs, re, qs, qe),
        _ => return Alignment::unaligned(ref_aln.len() - 1, qry_aln.len() - 1, score)
    };

    for (i, p) in ref_aln.iter_mut().enumerate() {
        if *p != AlnPosition::End && (i < ref_start || i > ref_end) {
            *p = AlnPosition::SoftMask;
        }
    }
    for (i, p) in qry_aln.iter_mut().enumerate() {
        if *p != AlnPosition::End && (i < qry_start || i > qry_end) {
            *p = AlnPosition::SoftMask;
        }
    }

    let count = |positions: &[AlnPosition], target: AlnPosition| positions.iter().filter(|&&p| p == target).count();
    let num_match = count(&ref_aln, AlnPosition::Match);
    let num_snp = count(&ref_aln, AlnPosition::Mismatch);
    let num_del = count(&ref_aln, AlnPosition::Gap);
    let num_ins = count(&qry_aln, AlnPosition::Gap);

    Alignment {
        ref_aln,
        qry_aln,
        score,
        ref_start,
        ref_end,
        qry_start,
        qry_end,
        num_ins,
        num_del,
        num_snp,
        num_match
    }
}

/// Rebuilds both sequences from an alignment and checks the counts against the arrays.
/// Soft-masked flanks come from the arrays and the aligned region comes from `aligned_pair(...)` with gaps removed.
#[cfg(test)]
pub(crate) fn assert_consistent(aln: &Alignment, reference: &[u8], query: &[u8]) {
    use AlnPosition::*;

    fn rebuild(seq: &[u8], positions: &[AlnPosition], start: usize, gapped: &[u8]) -> Vec<u8> {
        let masked = |range: std::ops::Range<usize>| range.filter(|&i| positions[i] == SoftMask).map(|i| seq[i]).collect::<Vec<u8>>();
        let mut rebuilt = masked(0..start);
        rebuilt.extend(gapped.iter().copied().filter(|&b| b != b'-'));
        let resume = rebuilt.len();
        rebuilt.extend(masked(resume..seq.len()));
        rebuilt
    }

    assert_eq!(aln.ref_aln().len(), reference.len() + 1);
    assert_eq!(aln.qry_aln().len(), query.len() + 1);
    assert_eq!(aln.ref_aln().iter().position(|&p| p == End), Some(reference.len()));
    assert_eq!(aln.qry_aln().iter().position(|&p| p == End), Some(query.len()));

    let count = |positions: &[AlnPosition], target: AlnPosition| positions.iter().filter(|&&p| p == target).count();
    assert_eq!(count(aln.ref_aln(), Match), aln.num_match());
    assert_eq!(count(aln.qry_aln(), Match), aln.num_match());
    assert_eq!(count(aln.ref_aln(), Mismatch), aln.num_snp());
    assert_eq!(count(aln.qry_aln(), Mismatch), aln.num_snp());
    assert_eq!(count(aln.ref_aln(), Gap), aln.num_del());
    assert_eq!(count(aln.qry_aln(), Gap), aln.num_ins());
    let ref_used = reference.len() - count(aln.ref_aln(), SoftMask);
    let qry_used = query.len() - count(aln.qry_aln(), SoftMask);
    assert_eq!(ref_used, aln.num_match() + aln.num_snp() + aln.num_del());
    assert_eq!(qry_used, aln.num_match() + aln.num_snp() + aln.num_ins());

    let (ref_gapped, qry_gapped) = aln.aligned_pair(reference, query);
    assert_eq!(ref_gapped.len(), aln.alignment_len());
    assert_eq!(qry_gapped.len(), aln.alignment_len());
    assert_eq!(rebuild(reference, aln.ref_aln(), aln.ref_start(), &ref_gapped), reference);
    assert_eq!(rebuild(query, aln.qry_aln(), aln.qry_start(), &qry_gapped), query);
}
