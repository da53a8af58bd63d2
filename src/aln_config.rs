/*!
Contains configuration information for the pairwise aligners and the amplicon stitcher.
Typical usage is to the use the builders to construct the configs, e.g.
```
use alnstitch::aln_config::{AlnConfig, AlnConfigBuilder, StitchConfig, StitchConfigBuilder};
use alnstitch::direction::TieOrder;
use alnstitch::scoring::ScoreMatrix;

let config: AlnConfig = AlnConfigBuilder::default()
    .score_matrix(ScoreMatrix::dna(2, -1))
    .gap_open(Some(-10))
    .gap_extend(-1)
    .tie_order(TieOrder::InsDelSub)
    .build()
    .unwrap();

let stitch_config: StitchConfig = StitchConfigBuilder::default()
    .min_depth(3)
    .mask(b'X')
    .build()
    .unwrap();
```
*/

use crate::direction::TieOrder;
use crate::scoring::ScoreMatrix;

/// Selects how the direction matrix stores its cells.
/// Both layouts behave identically; packed uses a quarter of the memory and byte avoids the shifting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DirectionStorage {
    /// Four cells per byte
    #[default]
    Packed,
    /// One cell per byte
    Byte
}

/**
Contains configuration information for the pairwise aligners.
Typical usage is to the use the builder to construct the config, e.g.
```
use alnstitch::aln_config::{AlnConfig, AlnConfigBuilder, DirectionStorage};
let config: AlnConfig = AlnConfigBuilder::default()
    .gap_open(None)
    .gap_extend(-2)
    .direction_storage(DirectionStorage::Byte)
    .build()
    .unwrap();
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct AlnConfig {
    /// The substitution scores
    pub score_matrix: ScoreMatrix,
    /// Penalty for the first base of a gap; None disables gap opening so every gap base costs `gap_extend`
    pub gap_open: Option<i64>,
    /// Penalty for every gap base after the first
    pub gap_extend: i64,
    /// Which direction wins when DP choices tie
    pub tie_order: TieOrder,
    /// Memory layout of the direction matrix for the full-matrix aligners
    pub direction_storage: DirectionStorage,
    /// Minimum score for a local alignment to be kept as an alternative
    pub min_alt_score: i64
}

impl Default for AlnConfig {
    fn default() -> Self {
        Self {
            // typical nucleotide scoring
            score_matrix: ScoreMatrix::dna(5, -4),
            gap_open: Some(-10),
            gap_extend: -1,
            // diagonal moves first keeps gaps out of the traceback when it can
            tie_order: TieOrder::SubInsDel,
            direction_storage: DirectionStorage::Packed,
            // four matching bases with the default scoring
            min_alt_score: 20
        }
    }
}

/**
Contains configuration information for collapsing stitched amplicons into a consensus.
```
use alnstitch::aln_config::{StitchConfig, StitchConfigBuilder};
let config: StitchConfig = StitchConfigBuilder::default()
    .min_depth(5)
    .min_snp_percent(60)
    .build()
    .unwrap();
assert_eq!(config.mask, b'N');
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct StitchConfig {
    /// Columns with fewer amplicons than this need unanimous support to be emitted
    pub min_depth: u32,
    /// Minimum percent support for a base at a reference column
    pub min_snp_percent: u32,
    /// Minimum percent support for an inserted base
    pub min_ins_percent: u32,
    /// Minimum percent support for removing a reference column
    pub min_del_percent: u32,
    /// Symbol emitted for columns without enough support or without coverage
    pub mask: u8
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            min_depth: 10,
            // simple majority for everything
            min_snp_percent: 50,
            min_ins_percent: 50,
            min_del_percent: 50,
            mask: b'N'
        }
    }
}
