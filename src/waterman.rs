/*!
Smith-Waterman local alignment.
The full-matrix variants trace back through a direction matrix; the memory-efficient variants keep only rolling rows and report coordinates.
Start coordinates are tracked during the fill, so no variant needs a second pass to find where an alignment begins.

# Example usage
```rust
use alnstitch::aln_config::AlnConfig;
use alnstitch::alignment::AlnPosition;
use alnstitch::sequence::Sequence;
use alnstitch::waterman::{memory_waterman, waterman_align};

let config = AlnConfig::default();
let reference = Sequence::new("ref", b"AAAA").unwrap();
let query = Sequence::new("qry", b"AA").unwrap();

let alignment = waterman_align(&reference, &query, &config).unwrap();
assert_eq!(alignment.score(), 10);
assert_eq!(alignment.ref_aln()[2], AlnPosition::SoftMask);

let hit = memory_waterman(&reference, &query, &config).unwrap();
assert_eq!((hit.score, hit.ref_start, hit.ref_end), (10, 0, 1));
```
*/

use log::debug;

use crate::aln_config::AlnConfig;
use crate::alignment::{decode_matrix, Alignment, FilledMatrix};
use crate::direction::Direction;
use crate::direction_matrix::{DirectionMatrix, DirectionStore};
use crate::hirschberg::hirschberg_region;
use crate::needleman::try_row;
use crate::scoring::{indel_score, local_best_of};
use crate::sequence::Sequence;

/// Score and inclusive absolute coordinates of one local alignment.
/// A score of 0 means nothing aligned and all coordinates are 0.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ScoreHit {
    pub score: i64,
    pub ref_start: usize,
    pub ref_end: usize,
    pub qry_start: usize,
    pub qry_end: usize
}

impl ScoreHit {
    /// True if the two hits share a reference base or a query base
    pub fn overlaps(&self, other: &ScoreHit) -> bool {
        let ref_overlap = self.ref_start <= other.ref_end && other.ref_start <= self.ref_end;
        let qry_overlap = self.qry_start <= other.qry_end && other.qry_start <= self.qry_end;
        ref_overlap || qry_overlap
    }
}

/// Best hit ending at each reference column and at each query row
#[derive(Clone, Debug)]
struct AltHits {
    ref_best: Vec<Option<ScoreHit>>,
    qry_best: Vec<Option<ScoreHit>>,
    min_score: i64
}

impl AltHits {
    fn new(ref_len: usize, qry_len: usize, min_score: i64) -> Result<AltHits, Box<dyn std::error::Error>> {
        Ok(AltHits {
            ref_best: try_row(ref_len, None)?,
            qry_best: try_row(qry_len, None)?,
            min_score
        })
    }

    /// Keeps the hit if it clears the floor and beats the current best for its column or row; earlier hits win ties
    fn record(&mut self, ref_index: usize, qry_index: usize, hit: ScoreHit) {
        if hit.score < self.min_score {
            return;
        }
        for slot in [&mut self.ref_best[ref_index], &mut self.qry_best[qry_index]] {
            if slot.map_or(true, |current| hit.score > current.score) {
                *slot = Some(hit);
            }
        }
    }

    /// Greedily picks hits by descending score that overlap neither `best` nor each other
    fn alternatives(&self, best: &ScoreHit) -> Vec<ScoreHit> {
        let mut candidates: Vec<ScoreHit> = self.ref_best.iter()
            .chain(self.qry_best.iter())
            .flatten()
            .copied()
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score)
            .then(a.ref_start.cmp(&b.ref_start))
            .then(a.qry_start.cmp(&b.qry_start))
            .then(a.cmp(b))
        );
        candidates.dedup();

        let mut accepted: Vec<ScoreHit> = vec![];
        for hit in candidates.into_iter() {
            let collides = (best.score > 0 && hit.overlaps(best)) || accepted.iter().any(|a| hit.overlaps(a));
            if !collides {
                accepted.push(hit);
            }
        }
        accepted
    }
}

/// Shared local fill: rolling score, direction, and start rows with optional matrix and alternative tracking.
/// Returns the first strictly highest scoring cell in row-major order.
fn local_fill(
    reference: &Sequence, query: &Sequence, config: &AlnConfig,
    mut matrix: Option<&mut DirectionMatrix>, mut alts: Option<&mut AltHits>
) -> Result<ScoreHit, Box<dyn std::error::Error>> {
    let ref_win = reference.window();
    let qry_win = query.window();
    let ref_len = ref_win.len();
    let ref_offset = reference.offset();
    let qry_offset = query.offset();

    let mut scores: Vec<i64> = try_row(ref_len + 1, 0)?;
    let mut directions: Vec<Direction> = try_row(ref_len + 1, Direction::Stop)?;
    // window relative (reference, query) base where the path through each cell begins;
    // a Stop cell points at the bases right after it
    let mut ref_starts: Vec<usize> = try_row(ref_len + 1, 0)?;
    let mut qry_starts: Vec<usize> = try_row(ref_len + 1, 0)?;
    for (c, rs) in ref_starts.iter_mut().enumerate() {
        *rs = c;
    }

    // the indel row is already all Stop
    if let Some(m) = matrix.as_deref_mut() {
        m.seek_cell(0, 1);
    }

    let mut best = ScoreHit::default();
    for (q, &qry_base) in qry_win.iter().enumerate() {
        let row = q + 1;
        let mut diag_score = scores[0];
        let mut diag_ref_start = ref_starts[0];
        let mut diag_qry_start = qry_starts[0];
        qry_starts[0] = row;
        if let Some(m) = matrix.as_deref_mut() {
            m.write(Direction::Stop);
            m.advance();
        }

        for c in 1..=ref_len {
            let ins_score = indel_score(directions[c], scores[c], config);
            let del_score = indel_score(directions[c - 1], scores[c - 1], config);
            let sub_score = diag_score + config.score_matrix.base_score(ref_win[c - 1], qry_base);
            let (best_score, best_dir) = local_best_of(ins_score, sub_score, del_score, config.tie_order);
            let (ref_start, qry_start) = match best_dir {
                Direction::Stop => (c, row),
                Direction::Substitution => (diag_ref_start, diag_qry_start),
                Direction::Insertion => (ref_starts[c], qry_starts[c]),
                Direction::Deletion => (ref_starts[c - 1], qry_starts[c - 1])
            };

            diag_score = scores[c];
            diag_ref_start = ref_starts[c];
            diag_qry_start = qry_starts[c];
            scores[c] = best_score;
            directions[c] = best_dir;
            ref_starts[c] = ref_start;
            qry_starts[c] = qry_start;
            if let Some(m) = matrix.as_deref_mut() {
                m.write(best_dir);
                m.advance();
            }

            if best_score > 0 {
                let hit = ScoreHit {
                    score: best_score,
                    ref_start: ref_offset + ref_start,
                    ref_end: ref_offset + c - 1,
                    qry_start: qry_offset + qry_start,
                    qry_end: qry_offset + q
                };
                if best_score > best.score {
                    best = hit;
                }
                if let Some(a) = alts.as_deref_mut() {
                    a.record(c - 1, q, hit);
                }
            }
        }
    }

    debug!("waterman {}x{} best={:?}", ref_len, qry_win.len(), best);
    Ok(best)
}

/// Window relative (column, row) of the cell a hit ends in; (0, 0) for an empty hit
fn end_cell(hit: &ScoreHit, reference: &Sequence, query: &Sequence) -> (usize, usize) {
    if hit.score == 0 {
        (0, 0)
    } else {
        (hit.ref_end - reference.offset() + 1, hit.qry_end - query.offset() + 1)
    }
}

/// Fills the local direction matrix for the two alignment windows.
/// The end cell is the first highest-scoring cell in row-major order, or the Stop origin if nothing scores above 0.
/// # Arguments
/// * `reference` - the reference, only its window is aligned
/// * `query` - the query, only its window is aligned
/// * `config` - scoring and storage settings
/// # Errors
/// * if the matrix or score rows cannot be allocated
pub fn waterman_fill(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<FilledMatrix, Box<dyn std::error::Error>> {
    let mut matrix = DirectionMatrix::with_dimensions(config.direction_storage, reference.window_len(), query.window_len())?;
    let best = local_fill(reference, query, config, Some(&mut matrix), None)?;
    let (end_col, end_row) = end_cell(&best, reference, query);
    Ok(FilledMatrix::new(matrix, best.score, end_col, end_row))
}

/// Locally aligns the two windows and traces back the best alignment.
/// An alignment with score 0 is empty and fully soft-masked.
/// # Errors
/// * if the matrix or score rows cannot be allocated
pub fn waterman_align(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Alignment, Box<dyn std::error::Error>> {
    let filled = waterman_fill(reference, query, config)?;
    Ok(filled.decode(reference, query))
}

/// Locally aligns the two windows and also traces back alternative alignments.
/// The best alignment comes first, followed by the best alignments ending at each reference column or query row that
/// score at least `config.min_alt_score` and do not overlap anything already reported, in descending score order.
/// # Arguments
/// * `reference` - the reference, only its window is aligned
/// * `query` - the query, only its window is aligned
/// * `config` - scoring and storage settings, including the alternative score floor
/// # Errors
/// * if the matrix, score rows, or alternative tables cannot be allocated
pub fn waterman_alt_align(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Vec<Alignment>, Box<dyn std::error::Error>> {
    let mut matrix = DirectionMatrix::with_dimensions(config.direction_storage, reference.window_len(), query.window_len())?;
    let mut alts = AltHits::new(reference.window_len(), query.window_len(), config.min_alt_score)?;
    let best = local_fill(reference, query, config, Some(&mut matrix), Some(&mut alts))?;

    let mut hits = vec![best];
    hits.extend(alts.alternatives(&best));
    debug!("waterman_alt found {} alignments", hits.len());

    let alignments = hits.iter()
        .map(|hit| {
            let (end_col, end_row) = end_cell(hit, reference, query);
            decode_matrix(&mut matrix, end_col, end_row, hit.score, reference, query)
        })
        .collect();
    Ok(alignments)
}

/// Local alignment score and coordinates using only rolling rows.
/// # Errors
/// * if the score rows cannot be allocated
pub fn memory_waterman(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<ScoreHit, Box<dyn std::error::Error>> {
    local_fill(reference, query, config, None, None)
}

/// Best hit followed by the non-overlapping alternatives, see `waterman_alt_align(...)`, without any direction matrix.
/// # Errors
/// * if the score rows or alternative tables cannot be allocated
pub fn memory_waterman_alt(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Vec<ScoreHit>, Box<dyn std::error::Error>> {
    let mut alts = AltHits::new(reference.window_len(), query.window_len(), config.min_alt_score)?;
    let best = local_fill(reference, query, config, None, Some(&mut alts))?;
    let mut hits = vec![best];
    hits.extend(alts.alternatives(&best));
    Ok(hits)
}

/// Finds the best local hit with rolling rows, then recovers the base-level alignment with a linear-space global pass restricted to the hit.
/// The reported score is the local score.
/// # Errors
/// * if any of the rows or scratch buffers cannot be allocated
pub fn memory_waterman_align(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Alignment, Box<dyn std::error::Error>> {
    let hit = memory_waterman(reference, query, config)?;
    if hit.score == 0 {
        return Ok(Alignment::unaligned(reference.len(), query.len(), 0));
    }
    hirschberg_region(
        reference.seq(), hit.ref_start, hit.ref_end - hit.ref_start + 1,
        query.seq(), hit.qry_start, hit.qry_end - hit.qry_start + 1,
        config, Some(hit.score)
    )
}
