/*!
Needleman-Wunsch global alignment over a full direction matrix.

# Example usage
```rust
use alnstitch::aln_config::AlnConfigBuilder;
use alnstitch::needleman::needleman_align;
use alnstitch::scoring::ScoreMatrix;
use alnstitch::sequence::Sequence;

let config = AlnConfigBuilder::default()
    .score_matrix(ScoreMatrix::dna(2, -1))
    .gap_open(None)
    .gap_extend(-2)
    .build().unwrap();
let reference = Sequence::new("ref", b"ACGTAGCT").unwrap();
let query = Sequence::new("qry", b"ACGAGCT").unwrap();
let alignment = needleman_align(&reference, &query, &config).unwrap();
assert_eq!(alignment.score(), 12);
assert_eq!(alignment.num_del(), 1);
assert_eq!(alignment.cigar(), "3=1D4=");
```
*/

use log::debug;

use crate::aln_config::AlnConfig;
use crate::alignment::{Alignment, FilledMatrix};
use crate::direction::Direction;
use crate::direction_matrix::{DirectionMatrix, DirectionStore};
use crate::scoring::{best_of, indel_score};
use crate::sequence::Sequence;

/// Allocates a rolling row with fallible reservation
pub(crate) fn try_row<T: Clone>(len: usize, value: T) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let mut row: Vec<T> = Vec::new();
    row.try_reserve_exact(len)?;
    row.resize(len, value);
    Ok(row)
}

/// Fills the global direction matrix for the two alignment windows.
/// The indel row and column hold cumulative gap costs, every other cell takes the best of its three neighbors.
/// The end cell is always the bottom-right corner.
/// # Arguments
/// * `reference` - the reference, only its window is aligned
/// * `query` - the query, only its window is aligned
/// * `config` - scoring and storage settings
/// # Errors
/// * if the matrix or score rows cannot be allocated
pub fn needleman_fill(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<FilledMatrix, Box<dyn std::error::Error>> {
    let ref_win = reference.window();
    let qry_win = query.window();
    let ref_len = ref_win.len();
    let qry_len = qry_win.len();

    let mut matrix = DirectionMatrix::with_dimensions(config.direction_storage, ref_len, qry_len)?;
    // scores and directions for the row above, overwritten left to right
    let mut scores: Vec<i64> = try_row(ref_len + 1, 0)?;
    let mut directions: Vec<Direction> = try_row(ref_len + 1, Direction::Stop)?;

    // indel row
    matrix.seek_from_start(0);
    matrix.write(Direction::Stop);
    matrix.advance();
    for c in 1..=ref_len {
        scores[c] = indel_score(directions[c - 1], scores[c - 1], config);
        directions[c] = Direction::Deletion;
        matrix.write(Direction::Deletion);
        matrix.advance();
    }

    for &qry_base in qry_win.iter() {
        // the diagonal for column 1 is the old indel column value
        let mut diag_score = scores[0];
        scores[0] = indel_score(directions[0], scores[0], config);
        directions[0] = Direction::Insertion;
        matrix.write(Direction::Insertion);
        matrix.advance();

        for c in 1..=ref_len {
            let ins_score = indel_score(directions[c], scores[c], config);
            let del_score = indel_score(directions[c - 1], scores[c - 1], config);
            let sub_score = diag_score + config.score_matrix.base_score(ref_win[c - 1], qry_base);
            let (best_score, best_dir) = best_of(ins_score, sub_score, del_score, config.tie_order);

            diag_score = scores[c];
            scores[c] = best_score;
            directions[c] = best_dir;
            matrix.write(best_dir);
            matrix.advance();
        }
    }

    let score = scores[ref_len];
    debug!("needleman {}x{} score={}", ref_len, qry_len, score);
    Ok(FilledMatrix::new(matrix, score, ref_len, qry_len))
}

/// Globally aligns the two windows and traces back the result.
/// Terminal gaps stay as gaps, only bases outside the windows are soft-masked.
/// # Arguments
/// * `reference` - the reference, only its window is aligned
/// * `query` - the query, only its window is aligned
/// * `config` - scoring and storage settings
/// # Errors
/// * if the matrix or score rows cannot be allocated
pub fn needleman_align(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Alignment, Box<dyn std::error::Error>> {
    let filled = needleman_fill(reference, query, config)?;
    Ok(filled.decode(reference, query))
}
