
/// A single move in the DP matrix.
/// Insertions consume a query base only, deletions consume a reference base only, and substitutions consume one of each.
/// The discriminants are the 2-bit codes used by the packed direction matrix.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Direction {
    /// No move; the origin of a global alignment or a reset cell in a local alignment
    #[default]
    Stop = 0,
    /// Query base aligned against a gap in the reference
    Insertion = 1,
    /// Reference base aligned against a gap in the query
    Deletion = 2,
    /// Query and reference bases aligned to each other, match or mismatch
    Substitution = 3
}

impl Direction {
    /// Decodes the lower two bits of a value into a Direction
    pub fn from_bits(bits: u8) -> Direction {
        match bits & 0b11 {
            0 => Direction::Stop,
            1 => Direction::Insertion,
            2 => Direction::Deletion,
            _ => Direction::Substitution
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Returns true for the two gap moves
    pub fn is_gap(self) -> bool {
        matches!(self, Direction::Insertion | Direction::Deletion)
    }
}

/// The preference order used when two or more DP choices tie on score.
/// The first direction named wins against the others, the second wins against the third.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TieOrder {
    InsDelSub,
    InsSubDel,
    DelInsSub,
    DelSubIns,
    #[default]
    SubInsDel,
    SubDelIns
}

impl TieOrder {
    /// All six orders, mostly useful for exhaustive tests
    pub const ALL: [TieOrder; 6] = [
        TieOrder::InsDelSub, TieOrder::InsSubDel,
        TieOrder::DelInsSub, TieOrder::DelSubIns,
        TieOrder::SubInsDel, TieOrder::SubDelIns
    ];

    /// Returns the directions from most to least preferred
    pub fn priority(self) -> [Direction; 3] {
        use Direction::*;
        match self {
            TieOrder::InsDelSub => [Insertion, Deletion, Substitution],
            TieOrder::InsSubDel => [Insertion, Substitution, Deletion],
            TieOrder::DelInsSub => [Deletion, Insertion, Substitution],
            TieOrder::DelSubIns => [Deletion, Substitution, Insertion],
            TieOrder::SubInsDel => [Substitution, Insertion, Deletion],
            TieOrder::SubDelIns => [Substitution, Deletion, Insertion]
        }
    }
}
