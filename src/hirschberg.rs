/*!
Hirschberg divide-and-conquer global alignment in linear space.
The query window is split in half, a forward score row and a reverse score row locate the reference column where the optimal path crosses the split,
and both halves are solved recursively into shared classification arrays.

# Example usage
```rust
use alnstitch::aln_config::AlnConfigBuilder;
use alnstitch::hirschberg::hirschberg_align;
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
let linear = hirschberg_align(&reference, &query, &config).unwrap();
let full = needleman_align(&reference, &query, &config).unwrap();
assert_eq!(linear.score(), 12);
assert_eq!(linear.ref_aln(), full.ref_aln());
```
*/

use log::{debug, trace};

use crate::aln_config::AlnConfig;
use crate::alignment::{decode_hirschberg, Alignment, AlnPosition};
use crate::direction::Direction;
use crate::needleman::try_row;
use crate::scoring::{bases_match, best_of, indel_run_score, indel_score};
use crate::sequence::Sequence;

/// Global score-only fill that leaves the last row in `scores`.
/// `ref_base(c)` returns the c-th reference base in fill order so the same code runs forward and reverse.
fn global_score_row<F, I>(ref_base: F, ref_len: usize, qry_bases: I, scores: &mut [i64], directions: &mut [Direction], config: &AlnConfig)
where
    F: Fn(usize) -> u8,
    I: Iterator<Item = u8>
{
    scores[0] = 0;
    directions[0] = Direction::Stop;
    for c in 1..=ref_len {
        scores[c] = indel_score(directions[c - 1], scores[c - 1], config);
        directions[c] = Direction::Deletion;
    }

    for qry_base in qry_bases {
        let mut diag_score = scores[0];
        scores[0] = indel_score(directions[0], scores[0], config);
        directions[0] = Direction::Insertion;
        for c in 1..=ref_len {
            let ins_score = indel_score(directions[c], scores[c], config);
            let del_score = indel_score(directions[c - 1], scores[c - 1], config);
            let sub_score = diag_score + config.score_matrix.base_score(ref_base(c - 1), qry_base);
            let (best_score, best_dir) = best_of(ins_score, sub_score, del_score, config.tie_order);
            diag_score = scores[c];
            scores[c] = best_score;
            directions[c] = best_dir;
        }
    }
}

/// Working state for one call: the shared output arrays and the scratch rows reused by every recursion level
struct Hirschberg<'a> {
    ref_seq: &'a [u8],
    qry_seq: &'a [u8],
    config: &'a AlnConfig,
    ref_aln: Vec<AlnPosition>,
    qry_aln: Vec<AlnPosition>,
    forward: Vec<i64>,
    reverse: Vec<i64>,
    forward_dirs: Vec<Direction>,
    reverse_dirs: Vec<Direction>
}

impl<'a> Hirschberg<'a> {
    fn new(ref_seq: &'a [u8], qry_seq: &'a [u8], ref_len: usize, config: &'a AlnConfig) -> Result<Hirschberg<'a>, Box<dyn std::error::Error>> {
        let mut ref_aln = try_row(ref_seq.len() + 1, AlnPosition::SoftMask)?;
        ref_aln[ref_seq.len()] = AlnPosition::End;
        let mut qry_aln = try_row(qry_seq.len() + 1, AlnPosition::SoftMask)?;
        qry_aln[qry_seq.len()] = AlnPosition::End;
        Ok(Hirschberg {
            ref_seq,
            qry_seq,
            config,
            ref_aln,
            qry_aln,
            forward: try_row(ref_len + 1, 0)?,
            reverse: try_row(ref_len + 1, 0)?,
            forward_dirs: try_row(ref_len + 1, Direction::Stop)?,
            reverse_dirs: try_row(ref_len + 1, Direction::Stop)?
        })
    }

    /// Marks one aligned pair
    fn set_pair(&mut self, r: usize, q: usize) {
        let position = if bases_match(self.ref_seq[r], self.qry_seq[q]) {
            AlnPosition::Match
        } else {
            AlnPosition::Mismatch
        };
        self.ref_aln[r] = position;
        self.qry_aln[q] = position;
    }

    fn recurse(&mut self, ref_start: usize, ref_len: usize, qry_start: usize, qry_len: usize) {
        if ref_len == 0 {
            self.qry_aln[qry_start..(qry_start + qry_len)].fill(AlnPosition::Gap);
            return;
        }
        if qry_len == 0 {
            self.ref_aln[ref_start..(ref_start + ref_len)].fill(AlnPosition::Gap);
            return;
        }
        if ref_len == 1 {
            self.position_single_ref(ref_start, qry_start, qry_len);
            return;
        }
        if qry_len == 1 {
            self.position_single_qry(ref_start, ref_len, qry_start);
            return;
        }

        let ref_seq = self.ref_seq;
        let qry_seq = self.qry_seq;
        let qry_mid = qry_len / 2;
        let ref_win = &ref_seq[ref_start..(ref_start + ref_len)];
        let first_half = &qry_seq[qry_start..(qry_start + qry_mid)];
        let second_half = &qry_seq[(qry_start + qry_mid)..(qry_start + qry_len)];
        global_score_row(
            |c| ref_win[c], ref_len, first_half.iter().copied(),
            &mut self.forward, &mut self.forward_dirs, self.config
        );
        global_score_row(
            |c| ref_win[ref_len - 1 - c], ref_len, second_half.iter().rev().copied(),
            &mut self.reverse, &mut self.reverse_dirs, self.config
        );

        // reverse[j] covers the last j reference bases, so column i pairs with reverse[ref_len - i]
        let mut ref_mid = 1;
        let mut best_score = self.forward[1] + self.reverse[ref_len - 1];
        for i in 2..=ref_len {
            let score = self.forward[i] + self.reverse[ref_len - i];
            if score > best_score {
                best_score = score;
                ref_mid = i;
            }
        }
        // an empty left reference partition wins ties
        if self.forward[0] + self.reverse[ref_len] >= best_score {
            best_score = self.forward[0] + self.reverse[ref_len];
            ref_mid = 0;
        }
        trace!("split ref {}+{} qry {}+{} at ref {} (score {})", ref_start, ref_len, qry_start, qry_len, ref_start + ref_mid, best_score);

        self.recurse(ref_start, ref_mid, qry_start, qry_mid);
        self.recurse(ref_start + ref_mid, ref_len - ref_mid, qry_start + qry_mid, qry_len - qry_mid);
    }

    /// Places a single reference base against the query window, or deletes it.
    /// The last of several equal placements wins; deleting only wins when strictly better.
    fn position_single_ref(&mut self, ref_index: usize, qry_start: usize, qry_len: usize) {
        let ref_base = self.ref_seq[ref_index];
        // deleting the base makes one gap run with the whole query
        let mut best_score = indel_run_score(qry_len + 1, self.config);
        let mut best_index: Option<usize> = None;
        for j in 0..qry_len {
            let score = self.config.score_matrix.base_score(ref_base, self.qry_seq[qry_start + j])
                + indel_run_score(j, self.config)
                + indel_run_score(qry_len - 1 - j, self.config);
            if score >= best_score {
                best_score = score;
                best_index = Some(j);
            }
        }

        self.qry_aln[qry_start..(qry_start + qry_len)].fill(AlnPosition::Gap);
        match best_index {
            Some(j) => self.set_pair(ref_index, qry_start + j),
            None => self.ref_aln[ref_index] = AlnPosition::Gap
        }
    }

    /// Mirror of `position_single_ref(...)` for a single query base
    fn position_single_qry(&mut self, ref_start: usize, ref_len: usize, qry_index: usize) {
        let qry_base = self.qry_seq[qry_index];
        let mut best_score = indel_run_score(ref_len + 1, self.config);
        let mut best_index: Option<usize> = None;
        for i in 0..ref_len {
            let score = self.config.score_matrix.base_score(self.ref_seq[ref_start + i], qry_base)
                + indel_run_score(i, self.config)
                + indel_run_score(ref_len - 1 - i, self.config);
            if score >= best_score {
                best_score = score;
                best_index = Some(i);
            }
        }

        self.ref_aln[ref_start..(ref_start + ref_len)].fill(AlnPosition::Gap);
        match best_index {
            Some(i) => self.set_pair(ref_start + i, qry_index),
            None => self.qry_aln[qry_index] = AlnPosition::Gap
        }
    }

    /// Scores the full path, terminal gaps included; a run of mixed insertions and deletions is one gap
    fn path_score(&self, ref_start: usize, ref_len: usize, qry_start: usize, qry_len: usize) -> i64 {
        let ref_end = ref_start + ref_len;
        let qry_end = qry_start + qry_len;
        let mut r = ref_start;
        let mut q = qry_start;
        let mut score = 0;
        let mut gap_run = 0;
        loop {
            while r < ref_end && self.ref_aln[r] == AlnPosition::Gap {
                gap_run += 1;
                r += 1;
            }
            while q < qry_end && self.qry_aln[q] == AlnPosition::Gap {
                gap_run += 1;
                q += 1;
            }
            if r >= ref_end || q >= qry_end {
                break;
            }
            score += indel_run_score(gap_run, self.config);
            gap_run = 0;
            score += self.config.score_matrix.base_score(self.ref_seq[r], self.qry_seq[q]);
            r += 1;
            q += 1;
        }
        score + indel_run_score(gap_run, self.config)
    }
}

/// Globally aligns `[ref_start, ref_start + ref_len)` against `[qry_start, qry_start + qry_len)` in linear space.
/// The result is in absolute coordinates of the full sequences.
/// # Arguments
/// * `ref_seq` - the full reference
/// * `ref_start` - first reference base in the region
/// * `ref_len` - number of reference bases in the region
/// * `qry_seq` - the full query
/// * `qry_start` - first query base in the region
/// * `qry_len` - number of query bases in the region
/// * `config` - scoring settings
/// * `score` - score to report instead of the global path score
/// # Errors
/// * if the output arrays or scratch rows cannot be allocated
pub(crate) fn hirschberg_region(
    ref_seq: &[u8], ref_start: usize, ref_len: usize,
    qry_seq: &[u8], qry_start: usize, qry_len: usize,
    config: &AlnConfig, score: Option<i64>
) -> Result<Alignment, Box<dyn std::error::Error>> {
    let mut state = Hirschberg::new(ref_seq, qry_seq, ref_len, config)?;
    state.recurse(ref_start, ref_len, qry_start, qry_len);
    let score = match score {
        Some(s) => s,
        None => state.path_score(ref_start, ref_len, qry_start, qry_len)
    };
    debug!("hirschberg {}x{} score={}", ref_len, qry_len, score);
    Ok(decode_hirschberg(state.ref_aln, state.qry_aln, score))
}

/// Globally aligns the two windows in linear space.
/// The score covers the whole global path, but leading and trailing gaps are reported as soft-masked.
/// # Arguments
/// * `reference` - the reference, only its window is aligned
/// * `query` - the query, only its window is aligned
/// * `config` - scoring settings; the direction storage is unused
/// # Errors
/// * if the output arrays or scratch rows cannot be allocated
pub fn hirschberg_align(reference: &Sequence, query: &Sequence, config: &AlnConfig) -> Result<Alignment, Box<dyn std::error::Error>> {
    hirschberg_region(
        reference.seq(), reference.offset(), reference.window_len(),
        query.seq(), query.offset(), query.window_len(),
        config, None
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::aln_config::AlnConfigBuilder;
    use crate::alignment::assert_consistent;
    use crate::alignment::AlnPosition::*;
    use crate::example_gen::generate_pairs;
    use crate::needleman::needleman_align;
    use crate::scoring::ScoreMatrix;

    fn linear_config() -> AlnConfig {
        AlnConfigBuilder::default()
            .score_matrix(ScoreMatrix::dna(2, -1))
            .gap_open(None)
            .gap_extend(-2)
            .build().unwrap()
    }

    #[test]
    fn test_single_mismatch() {
        let config = AlnConfigBuilder::default()
            .score_matrix(ScoreMatrix::dna(2, -1))
            .gap_open(Some(-10))
            .gap_extend(-1)
            .build().unwrap();
        let reference = Sequence::new("ref", b"ACGTACGT").unwrap();
        let query = Sequence::new("qry", b"ACGTCCGT").unwrap();
        let aln = hirschberg_align(&reference, &query, &config).unwrap();
        assert_eq!(aln.score(), 13);
        assert_eq!(aln, needleman_align(&reference, &query, &config).unwrap());
    }

    #[test]
    fn test_single_deletion() {
        let config = linear_config();
        let reference = Sequence::new("ref", b"ACGTAGCT").unwrap();
        let query = Sequence::new("qry", b"ACGAGCT").unwrap();
        let aln = hirschberg_align(&reference, &query, &config).unwrap();
        assert_eq!(aln.score(), 12);
        assert_eq!(aln.ref_aln(), &[Match, Match, Match, Gap, Match, Match, Match, Match, End]);
        assert_eq!(aln, needleman_align(&reference, &query, &config).unwrap());
    }

    #[test]
    fn test_single_base_ties_go_last() {
        let config = linear_config();
        let reference = Sequence::new("ref", b"A").unwrap();
        let query = Sequence::new("qry", b"AA").unwrap();
        let aln = hirschberg_align(&reference, &query, &config).unwrap();
        // the leading insertion is outside the anchored span
        assert_eq!(aln.qry_aln(), &[SoftMask, Match, End]);
        assert_eq!(aln.ref_aln(), &[Match, End]);
        assert_eq!(aln.score(), 0);
        assert_eq!((aln.qry_start(), aln.qry_end()), (1, 1));

        // and the mirror image
        let aln = hirschberg_align(&query, &reference, &config).unwrap();
        assert_eq!(aln.ref_aln(), &[SoftMask, Match, End]);
        assert_eq!(aln.qry_aln(), &[Match, End]);
    }

    #[test]
    fn test_nothing_anchored() {
        // a lone mismatch is worse than deleting and inserting with these penalties
        let config = AlnConfigBuilder::default()
            .score_matrix(ScoreMatrix::dna(2, -10))
            .gap_open(None)
            .gap_extend(-1)
            .build().unwrap();
        let reference = Sequence::new("ref", b"A").unwrap();
        let query = Sequence::new("qry", b"C").unwrap();
        let aln = hirschberg_align(&reference, &query, &config).unwrap();
        assert!(aln.is_empty());
        assert_eq!(aln.score(), -2);
        assert_eq!(aln.ref_aln(), &[SoftMask, End]);
    }

    #[test]
    fn test_windowed() {
        let config = linear_config();
        let reference = Sequence::new("ref", b"TTTACGTAGCTTTT").unwrap().with_window(3, 10).unwrap();
        let query = Sequence::new("qry", b"GGACGAGCTGG").unwrap().with_window(2, 8).unwrap();
        let aln = hirschberg_align(&reference, &query, &config).unwrap();
        assert_eq!(aln.score(), 12);
        assert_eq!((aln.ref_start(), aln.ref_end(), aln.qry_start(), aln.qry_end()), (3, 10, 2, 8));
        assert_eq!(aln.ref_aln()[6], Gap);
        assert_eq!(&aln.ref_aln()[..3], &[SoftMask; 3]);
        assert_eq!(&aln.qry_aln()[9..], &[SoftMask, SoftMask, End]);
    }

    #[test_log::test]
    fn test_random_scores_match_needleman() {
        let config = linear_config();
        for (i, (r, q)) in generate_pairs(12, 50, 0.3, 11).into_iter().enumerate() {
            let reference = Sequence::new(&format!("ref_{i}"), &r).unwrap();
            let query = Sequence::new(&format!("qry_{i}"), &q).unwrap();
            let linear = hirschberg_align(&reference, &query, &config).unwrap();
            let full = needleman_align(&reference, &query, &config).unwrap();
            assert_eq!(linear.score(), full.score(), "{:?} {:?}", r, q);

            // counts agree with the arrays
            let ref_used = linear.ref_aln().iter().filter(|&&p| p != SoftMask && p != End).count();
            let qry_used = linear.qry_aln().iter().filter(|&&p| p != SoftMask && p != End).count();
            assert_eq!(ref_used, linear.num_match() + linear.num_snp() + linear.num_del());
            assert_eq!(qry_used, linear.num_match() + linear.num_snp() + linear.num_ins());
        }
    }

    #[test]
    fn test_path_score_mixed_gaps() {
        let config = AlnConfigBuilder::default()
            .score_matrix(ScoreMatrix::dna(2, -1))
            .gap_open(Some(-4))
            .gap_extend(-1)
            .build().unwrap();
        let mut state = Hirschberg::new(b"AGGA", b"ATA", 4, &config).unwrap();
        state.ref_aln[..4].copy_from_slice(&[Match, Gap, Gap, Match]);
        state.qry_aln[..3].copy_from_slice(&[Match, Gap, Match]);
        // two matches and one three base gap run
        assert_eq!(state.path_score(0, 4, 0, 3), 2 + 2 - 4 - 2);
    }

    /// Scores the gapped path of a full-window alignment, treating soft-masked terminal bases as gaps
    fn rescore(aln: &Alignment, ref_seq: &[u8], qry_seq: &[u8], config: &AlnConfig) -> i64 {
        let unmask = |p: &AlnPosition| if *p == SoftMask { Gap } else { *p };
        let mut state = Hirschberg::new(ref_seq, qry_seq, ref_seq.len(), config).unwrap();
        state.ref_aln = aln.ref_aln().iter().map(unmask).collect();
        state.qry_aln = aln.qry_aln().iter().map(unmask).collect();
        state.path_score(0, ref_seq.len(), 0, qry_seq.len())
    }

    #[test_log::test]
    fn test_affine_valid_global() {
        let config = AlnConfig::default();
        let mut coinciding = 0;
        for (i, (r, q)) in generate_pairs(12, 100, 0.3, 23).into_iter().enumerate() {
            let reference = Sequence::new(&format!("ref_{i}"), &r).unwrap();
            let query = Sequence::new(&format!("qry_{i}"), &q).unwrap();
            let linear = hirschberg_align(&reference, &query, &config).unwrap();
            let full = needleman_align(&reference, &query, &config).unwrap();

            // a complete global path over both sequences, whatever its score
            assert_consistent(&linear, &r, &q);
            assert_eq!(rescore(&linear, &r, &q, &config), linear.score());

            // the gapped path score agrees with the matrix fill on the matrix path
            assert_eq!(rescore(&full, &r, &q, &config), full.score());

            let unmasked = |aln: &Alignment| -> (Vec<AlnPosition>, Vec<AlnPosition>) {
                let unmask = |p: &AlnPosition| if *p == SoftMask { Gap } else { *p };
                (aln.ref_aln().iter().map(unmask).collect(), aln.qry_aln().iter().map(unmask).collect())
            };
            if unmasked(&linear) == unmasked(&full) {
                coinciding += 1;
                assert_eq!(linear.score(), full.score(), "{:?} {:?}", r, q);
            }
        }
        assert!(coinciding > 0);
    }
}
