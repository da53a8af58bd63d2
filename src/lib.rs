/*!
# alnstitch
This library provides pairwise nucleotide alignment and a consensus stitcher for reference-anchored amplicons.

Key benefits:
* Global (Needleman-Wunsch) and local (Smith-Waterman) alignment with gap open/extend penalties and six tie-break orders
* Local alignment can also report non-overlapping alternative alignments
* Linear-space variants: score-only local alignment and Hirschberg global alignment
* Direction matrices can be 2-bit packed or one byte per cell
* IUPAC-aware base matching, e.g. `N` matches anything

Performance notes:
* The full-matrix aligners need one direction cell per pair of bases, so very long pairs should use the linear-space variants
* Hirschberg alignment is only guaranteed optimal with linear gap penalties (`gap_open` set to None)

# Example usage
```rust
use alnstitch::aln_config::AlnConfig;
use alnstitch::sequence::Sequence;
use alnstitch::stitch::AmpliconStitcher;
use alnstitch::waterman::waterman_align;

let config = AlnConfig::default();
let reference = Sequence::new("ref", b"TTTTACGTACGTACGTTTTT").unwrap();
let amplicons = [
    Sequence::new("amp1", b"CCACGTACGTA").unwrap(),
    Sequence::new("amp2", b"GTACCGTACGTTGG").unwrap()
];

// align each amplicon and stitch the aligned regions together
let mut stitcher = AmpliconStitcher::new();
for amplicon in amplicons.iter() {
    let alignment = waterman_align(&reference, amplicon, &config).unwrap();
    stitcher.add_alignment(&alignment, amplicon).unwrap();
}
// the inserted C in amp2 has only half of the votes and is dropped
assert_eq!(stitcher.consensus().unwrap(), b"ACGTACGTACGTT".to_vec());
```
*/

/// Configuration for the aligners and the stitcher
pub mod aln_config;
/// Alignment results and the decoders that build them
pub mod alignment;
/// Converts CIGAR strings into stitcher input
pub mod cigar;
/// DP moves and tie-break orders
pub mod direction;
/// Packed and byte direction matrices
pub mod direction_matrix;
/// Utility for generating examples
pub mod example_gen;
/// Linear-space global alignment
pub mod hirschberg;
/// Full-matrix global alignment
pub mod needleman;
/// Substitution scores, base matching, and the gap rules
pub mod scoring;
/// Named sequences with an alignment window
pub mod sequence;
/// Main functionality for the amplicon consensus
pub mod stitch;
/// Local alignment, full-matrix and linear-space
pub mod waterman;
