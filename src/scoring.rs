/*!
Substitution scoring, base equality, and the gap/tie-break rules shared by every DP engine.

# Example usage
```rust
use alnstitch::scoring::{bases_match, ScoreMatrix};

let matrix = ScoreMatrix::dna(2, -1);
assert_eq!(matrix.base_score(b'A', b'a'), 2);
assert_eq!(matrix.base_score(b'A', b'C'), -1);

// W is A or T
assert!(bases_match(b'W', b'T'));
assert!(!bases_match(b'W', b'G'));
```
*/

use simple_error::bail;
use std::io::BufRead;
use std::path::Path;

use crate::aln_config::AlnConfig;
use crate::direction::{Direction, TieOrder};

/// 26 letters plus one bucket for everything else
const NUM_SYMBOLS: usize = 27;

/// Maps a symbol onto a row/column of the score table
fn symbol_index(symbol: u8) -> usize {
    let upper = symbol.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        (upper - b'A') as usize
    } else {
        NUM_SYMBOLS - 1
    }
}

/// Returns the IUPAC ambiguity set for a nucleotide as a 4-bit mask (A=1, C=2, G=4, T=8).
/// Symbols that are not nucleotide codes return 0.
fn iupac_mask(symbol: u8) -> u8 {
    match symbol.to_ascii_uppercase() {
        b'A' => 0b0001,
        b'C' => 0b0010,
        b'G' => 0b0100,
        b'T' | b'U' => 0b1000,
        b'R' => 0b0101,
        b'Y' => 0b1010,
        b'S' => 0b0110,
        b'W' => 0b1001,
        b'K' => 0b1100,
        b'M' => 0b0011,
        b'B' => 0b1110,
        b'D' => 0b1101,
        b'H' => 0b1011,
        b'V' => 0b0111,
        b'N' => 0b1111,
        _ => 0
    }
}

/// Returns true if two symbols are considered the same base.
/// Nucleotide codes match when their IUPAC sets intersect, e.g. `N` matches anything and `W` matches `A` and `T`.
/// Anything else only matches itself, ignoring case.
/// # Arguments
/// * `a` - the first symbol
/// * `b` - the second symbol
pub fn bases_match(a: u8, b: u8) -> bool {
    let mask_a = iupac_mask(a);
    let mask_b = iupac_mask(b);
    if mask_a == 0 || mask_b == 0 {
        a.eq_ignore_ascii_case(&b)
    } else {
        mask_a & mask_b != 0
    }
}

/// A symmetric substitution table indexed by symbol pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMatrix {
    scores: [[i64; NUM_SYMBOLS]; NUM_SYMBOLS]
}

impl Default for ScoreMatrix {
    fn default() -> Self {
        ScoreMatrix::dna(5, -4)
    }
}

impl ScoreMatrix {
    /// Builds a nucleotide table where any two symbols that pass `bases_match` score `match_score` and everything else scores `mismatch_score`.
    /// # Arguments
    /// * `match_score` - score for matching bases
    /// * `mismatch_score` - score for mismatching bases
    pub fn dna(match_score: i64, mismatch_score: i64) -> ScoreMatrix {
        let mut scores = [[mismatch_score; NUM_SYMBOLS]; NUM_SYMBOLS];
        for a in b'A'..=b'Z' {
            for b in b'A'..=b'Z' {
                if bases_match(a, b) {
                    scores[symbol_index(a)][symbol_index(b)] = match_score;
                }
            }
        }
        ScoreMatrix { scores }
    }

    /// Builds a table where every pair has the same score, mostly a starting point for loading overrides.
    pub fn uniform(score: i64) -> ScoreMatrix {
        ScoreMatrix {
            scores: [[score; NUM_SYMBOLS]; NUM_SYMBOLS]
        }
    }

    /// Loads `symbol1 symbol2 score` overrides on top of an existing table.
    /// Blank lines and lines starting with `//` or `#` are skipped.
    /// # Arguments
    /// * `reader` - the source of override lines
    /// * `base` - the table that gets overridden
    /// # Errors
    /// * if reading fails
    /// * if a line does not have exactly two single-character symbols and an integer score
    pub fn from_reader<R: BufRead>(reader: R, base: ScoreMatrix) -> Result<ScoreMatrix, Box<dyn std::error::Error>> {
        let mut matrix = base;
        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() != 3 || fields[0].len() != 1 || fields[1].len() != 1 {
                bail!("Malformed scoring matrix line {}: {:?}", line_index + 1, line);
            }
            let score: i64 = match fields[2].parse() {
                Ok(s) => s,
                Err(e) => bail!("Bad score on scoring matrix line {}: {}", line_index + 1, e)
            };
            matrix.set_score(fields[0].as_bytes()[0], fields[1].as_bytes()[0], score);
        }
        Ok(matrix)
    }

    /// Wrapper for `from_reader(...)` that opens a file
    /// # Errors
    /// * if the file cannot be opened or parsed
    pub fn from_path(path: &Path, base: ScoreMatrix) -> Result<ScoreMatrix, Box<dyn std::error::Error>> {
        let file = std::fs::File::open(path)?;
        ScoreMatrix::from_reader(std::io::BufReader::new(file), base)
    }

    /// Sets the score for a pair; both orders are updated to keep the table symmetric
    pub fn set_score(&mut self, a: u8, b: u8, score: i64) {
        let ia = symbol_index(a);
        let ib = symbol_index(b);
        self.scores[ia][ib] = score;
        self.scores[ib][ia] = score;
    }

    /// Returns the substitution score for two symbols, ignoring case
    #[inline]
    pub fn base_score(&self, a: u8, b: u8) -> i64 {
        self.scores[symbol_index(a)][symbol_index(b)]
    }
}

/// Returns the score of stepping into an indel from a neighboring cell.
/// Opening a gap (neighbor reached by a substitution or a stop) costs the gap-open penalty; continuing one costs gap-extend.
/// With gap opening disabled, every step costs gap-extend.
/// # Arguments
/// * `prev_direction` - the direction stored in the neighboring cell
/// * `prev_score` - the score of the neighboring cell
/// * `config` - provides the penalties
#[inline]
pub fn indel_score(prev_direction: Direction, prev_score: i64, config: &AlnConfig) -> i64 {
    match config.gap_open {
        Some(gap_open) if !prev_direction.is_gap() => prev_score + gap_open,
        _ => prev_score + config.gap_extend
    }
}

/// Returns the cost of one contiguous indel run of `length` bases, zero for an empty run
pub fn indel_run_score(length: usize, config: &AlnConfig) -> i64 {
    if length == 0 {
        return 0;
    }
    match config.gap_open {
        Some(gap_open) => gap_open + (length as i64 - 1) * config.gap_extend,
        None => length as i64 * config.gap_extend
    }
}

/// Picks the best of the three DP choices; ties go to whichever direction comes first in `tie_order`.
/// # Arguments
/// * `ins_score` - score when moving from the cell above
/// * `sub_score` - score when moving from the diagonal cell
/// * `del_score` - score when moving from the cell to the left
/// * `tie_order` - the preference order for equal scores
#[inline]
pub fn best_of(ins_score: i64, sub_score: i64, del_score: i64, tie_order: TieOrder) -> (i64, Direction) {
    let mut best: Option<(i64, Direction)> = None;
    for direction in tie_order.priority() {
        let score = match direction {
            Direction::Insertion => ins_score,
            Direction::Deletion => del_score,
            _ => sub_score
        };
        match best {
            Some((best_score, _)) if score <= best_score => {},
            _ => best = Some((score, direction))
        }
    }
    // the priority list is never empty
    best.unwrap_or((sub_score, Direction::Substitution))
}

/// Same as `best_of(...)` but with the local alignment reset: anything at or below zero becomes `(0, Stop)`
#[inline]
pub fn local_best_of(ins_score: i64, sub_score: i64, del_score: i64, tie_order: TieOrder) -> (i64, Direction) {
    let (score, direction) = best_of(ins_score, sub_score, del_score, tie_order);
    if score <= 0 {
        (0, Direction::Stop)
    } else {
        (score, direction)
    }
}
