
use simple_error::bail;

/// A named sequence with an inclusive alignment window.
/// Bases outside of `[offset, end_aln]` are never aligned and show up as soft-masked in results.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    /// Identifier, usually the record name
    id: String,
    /// The bases
    seq: Vec<u8>,
    /// First base of the alignment window
    offset: usize,
    /// Last base of the alignment window, inclusive
    end_aln: usize
}

impl Sequence {
    /// Creates a sequence whose alignment window spans every base.
    /// # Arguments
    /// * `id` - identifier for the sequence
    /// * `seq` - the bases
    /// # Errors
    /// * if `seq` is empty
    pub fn new(id: &str, seq: &[u8]) -> Result<Sequence, Box<dyn std::error::Error>> {
        if seq.is_empty() {
            bail!("Sequence {id:?} is empty");
        }
        Ok(Sequence {
            id: id.to_string(),
            seq: seq.to_vec(),
            offset: 0,
            end_aln: seq.len() - 1
        })
    }

    /// Restricts the alignment window to `[offset, end_aln]`.
    /// # Arguments
    /// * `offset` - first windowed base, 0-based
    /// * `end_aln` - last windowed base, 0-based and inclusive
    /// # Errors
    /// * if the window is empty or runs past the end of the sequence
    pub fn with_window(mut self, offset: usize, end_aln: usize) -> Result<Sequence, Box<dyn std::error::Error>> {
        if offset > end_aln {
            bail!("Window start {offset} is after window end {end_aln} for {:?}", self.id);
        }
        if end_aln >= self.seq.len() {
            bail!("Window end {end_aln} is past the end of {:?} (length {})", self.id, self.seq.len());
        }
        self.offset = offset;
        self.end_aln = end_aln;
        Ok(self)
    }

    /// The bases inside the alignment window
    pub fn window(&self) -> &[u8] {
        &self.seq[self.offset..=self.end_aln]
    }

    /// Number of bases inside the alignment window
    pub fn window_len(&self) -> usize {
        self.end_aln - self.offset + 1
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn end_aln(&self) -> usize {
        self.end_aln
    }
}
