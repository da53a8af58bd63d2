
use simple_error::bail;

use crate::aln_config::DirectionStorage;
use crate::direction::Direction;

/// Cursor-style access to a flat run of direction cells.
/// Reading, writing, or seeking beyond `len()` is a programming error and panics.
/// The cursor itself may sit one past the end after an `advance()`.
pub trait DirectionStore {
    /// Total number of cells
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the cursor to an absolute cell index
    fn seek_from_start(&mut self, index: usize);

    /// Moves the cursor forward one cell
    fn advance(&mut self);

    /// Moves the cursor back one cell
    fn retreat(&mut self);

    /// Moves the cursor back `n` cells, e.g. one row up or one diagonal step
    fn retreat_by(&mut self, n: usize);

    /// Reads the cell under the cursor
    fn read(&self) -> Direction;

    /// Writes the cell under the cursor
    fn write(&mut self, direction: Direction);

    /// Index of the cell under the cursor
    fn current_index(&self) -> usize;
}

/// Reserves a zeroed buffer, reporting allocation failure instead of aborting
fn try_zeroed(len: usize) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut buffer: Vec<u8> = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Four 2-bit cells per byte, first cell in the lowest bits
#[derive(Clone, Debug)]
pub struct PackedCells {
    bytes: Vec<u8>,
    len: usize,
    index: usize
}

impl PackedCells {
    /// Creates a store of `len` cells, all Stop
    /// # Errors
    /// * if the memory cannot be allocated
    pub fn with_len(len: usize) -> Result<PackedCells, Box<dyn std::error::Error>> {
        Ok(PackedCells {
            bytes: try_zeroed(len.div_ceil(4))?,
            len,
            index: 0
        })
    }
}

impl DirectionStore for PackedCells {
    fn len(&self) -> usize {
        self.len
    }

    fn seek_from_start(&mut self, index: usize) {
        assert!(index <= self.len, "seek to {index} past {} cells", self.len);
        self.index = index;
    }

    #[inline]
    fn advance(&mut self) {
        self.index += 1;
    }

    #[inline]
    fn retreat(&mut self) {
        self.index -= 1;
    }

    #[inline]
    fn retreat_by(&mut self, n: usize) {
        self.index -= n;
    }

    #[inline]
    fn read(&self) -> Direction {
        assert!(self.index < self.len, "read at {} past {} cells", self.index, self.len);
        let shift = (self.index & 3) << 1;
        Direction::from_bits(self.bytes[self.index >> 2] >> shift)
    }

    #[inline]
    fn write(&mut self, direction: Direction) {
        assert!(self.index < self.len, "write at {} past {} cells", self.index, self.len);
        let shift = (self.index & 3) << 1;
        let byte = &mut self.bytes[self.index >> 2];
        *byte = (*byte & !(0b11 << shift)) | (direction.bits() << shift);
    }

    fn current_index(&self) -> usize {
        self.index
    }
}

/// One cell per byte
#[derive(Clone, Debug)]
pub struct ByteCells {
    cells: Vec<u8>,
    index: usize
}

impl ByteCells {
    /// Creates a store of `len` cells, all Stop
    /// # Errors
    /// * if the memory cannot be allocated
    pub fn with_len(len: usize) -> Result<ByteCells, Box<dyn std::error::Error>> {
        Ok(ByteCells {
            cells: try_zeroed(len)?,
            index: 0
        })
    }
}

impl DirectionStore for ByteCells {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn seek_from_start(&mut self, index: usize) {
        assert!(index <= self.cells.len(), "seek to {index} past {} cells", self.cells.len());
        self.index = index;
    }

    #[inline]
    fn advance(&mut self) {
        self.index += 1;
    }

    #[inline]
    fn retreat(&mut self) {
        self.index -= 1;
    }

    #[inline]
    fn retreat_by(&mut self, n: usize) {
        self.index -= n;
    }

    #[inline]
    fn read(&self) -> Direction {
        Direction::from_bits(self.cells[self.index])
    }

    #[inline]
    fn write(&mut self, direction: Direction) {
        self.cells[self.index] = direction.bits();
    }

    fn current_index(&self) -> usize {
        self.index
    }
}

/// The storage chosen for one matrix
#[derive(Clone, Debug)]
enum DirectionCells {
    Packed(PackedCells),
    Byte(ByteCells)
}

/// A `(qry_len + 1) x (ref_len + 1)` row-major grid of directions with a shared cursor.
/// Each row walks the reference window, each successive row is one more query base.
#[derive(Clone, Debug)]
pub struct DirectionMatrix {
    cells: DirectionCells,
    ref_len: usize,
    qry_len: usize
}

impl DirectionMatrix {
    /// Allocates a matrix for a reference window of `ref_len` bases and a query window of `qry_len` bases.
    /// # Arguments
    /// * `storage` - packed or byte cells
    /// * `ref_len` - reference window length
    /// * `qry_len` - query window length
    /// # Errors
    /// * if the cell count overflows or the memory cannot be allocated
    pub fn with_dimensions(storage: DirectionStorage, ref_len: usize, qry_len: usize) -> Result<DirectionMatrix, Box<dyn std::error::Error>> {
        let num_cells = match ref_len.checked_add(1)
            .zip(qry_len.checked_add(1))
            .and_then(|(cols, rows)| cols.checked_mul(rows)) {
            Some(n) => n,
            None => bail!("Direction matrix for a {ref_len} x {qry_len} window is too large")
        };
        let cells = match storage {
            DirectionStorage::Packed => DirectionCells::Packed(PackedCells::with_len(num_cells)?),
            DirectionStorage::Byte => DirectionCells::Byte(ByteCells::with_len(num_cells)?)
        };
        Ok(DirectionMatrix {
            cells,
            ref_len,
            qry_len
        })
    }

    /// Number of cells in one row, the reference window length plus the indel column
    pub fn row_len(&self) -> usize {
        self.ref_len + 1
    }

    /// Flat index of a cell
    /// # Arguments
    /// * `ref_col` - column, 0 is the indel column
    /// * `qry_row` - row, 0 is the indel row
    pub fn cell_index(&self, ref_col: usize, qry_row: usize) -> usize {
        qry_row * self.row_len() + ref_col
    }

    /// Convenience seek to a `(column, row)` cell
    pub fn seek_cell(&mut self, ref_col: usize, qry_row: usize) {
        let index = self.cell_index(ref_col, qry_row);
        self.seek_from_start(index);
    }

    // Getters
    pub fn ref_len(&self) -> usize {
        self.ref_len
    }

    pub fn qry_len(&self) -> usize {
        self.qry_len
    }
}

impl DirectionStore for DirectionMatrix {
    fn len(&self) -> usize {
        match &self.cells {
            DirectionCells::Packed(c) => c.len(),
            DirectionCells::Byte(c) => c.len()
        }
    }

    fn seek_from_start(&mut self, index: usize) {
        match &mut self.cells {
            DirectionCells::Packed(c) => c.seek_from_start(index),
            DirectionCells::Byte(c) => c.seek_from_start(index)
        }
    }

    #[inline]
    fn advance(&mut self) {
        match &mut self.cells {
            DirectionCells::Packed(c) => c.advance(),
            DirectionCells::Byte(c) => c.advance()
        }
    }

    #[inline]
    fn retreat(&mut self) {
        match &mut self.cells {
            DirectionCells::Packed(c) => c.retreat(),
            DirectionCells::Byte(c) => c.retreat()
        }
    }

    #[inline]
    fn retreat_by(&mut self, n: usize) {
        match &mut self.cells {
            DirectionCells::Packed(c) => c.retreat_by(n),
            DirectionCells::Byte(c) => c.retreat_by(n)
        }
    }

    #[inline]
    fn read(&self) -> Direction {
        match &self.cells {
            DirectionCells::Packed(c) => c.read(),
            DirectionCells::Byte(c) => c.read()
        }
    }

    #[inline]
    fn write(&mut self, direction: Direction) {
        match &mut self.cells {
            DirectionCells::Packed(c) => c.write(direction),
            DirectionCells::Byte(c) => c.write(direction)
        }
    }

    fn current_index(&self) -> usize {
        match &self.cells {
            DirectionCells::Packed(c) => c.current_index(),
            DirectionCells::Byte(c) => c.current_index()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: [Direction; 4] = [Direction::Substitution, Direction::Stop, Direction::Deletion, Direction::Insertion];

    /// Writes a repeating pattern through the cursor, then checks it with every kind of movement
    fn exercise_store<S: DirectionStore>(store: &mut S) {
        let len = store.len();
        store.seek_from_start(0);
        for i in 0..len {
            assert_eq!(store.current_index(), i);
            store.write(PATTERN[i % 4]);
            store.advance();
        }
        assert_eq!(store.current_index(), len);

        // walk backwards
        for i in (0..len).rev() {
            store.retreat();
            assert_eq!(store.read(), PATTERN[i % 4]);
        }

        // random seeks and jumps
        store.seek_from_start(len - 1);
        assert_eq!(store.read(), PATTERN[(len - 1) % 4]);
        store.retreat_by(5);
        assert_eq!(store.current_index(), len - 6);
        assert_eq!(store.read(), PATTERN[(len - 6) % 4]);

        // overwriting a cell leaves its neighbors alone
        store.seek_from_start(6);
        store.write(Direction::Insertion);
        store.seek_from_start(5);
        assert_eq!(store.read(), PATTERN[1]);
        store.advance();
        assert_eq!(store.read(), Direction::Insertion);
        store.advance();
        assert_eq!(store.read(), PATTERN[3]);
    }

    #[test]
    fn test_packed_cells() {
        // not a multiple of four to check the tail byte
        let mut store = PackedCells::with_len(23).unwrap();
        assert_eq!(store.bytes.len(), 6);
        exercise_store(&mut store);
    }

    #[test]
    fn test_byte_cells() {
        let mut store = ByteCells::with_len(23).unwrap();
        exercise_store(&mut store);
    }

    #[test]
    fn test_matrix_dimensions() {
        for storage in [DirectionStorage::Packed, DirectionStorage::Byte] {
            let mut matrix = DirectionMatrix::with_dimensions(storage, 4, 2).unwrap();
            assert_eq!(matrix.len(), 15);
            assert_eq!(matrix.row_len(), 5);
            assert_eq!(matrix.cell_index(3, 2), 13);
            exercise_store(&mut matrix);

            // a diagonal step is one row plus one cell
            matrix.seek_cell(3, 2);
            matrix.retreat_by(matrix.row_len() + 1);
            assert_eq!(matrix.current_index(), matrix.cell_index(2, 1));
        }
    }

    #[test]
    #[should_panic]
    fn test_packed_overrun() {
        let mut store = PackedCells::with_len(5).unwrap();
        store.seek_from_start(5);
        store.write(Direction::Deletion);
    }

    #[test]
    #[should_panic]
    fn test_byte_overrun() {
        let mut store = ByteCells::with_len(5).unwrap();
        store.seek_from_start(5);
        store.write(Direction::Deletion);
    }

    #[test]
    fn test_too_large() {
        let result = DirectionMatrix::with_dimensions(DirectionStorage::Packed, usize::MAX, 2);
        assert!(result.is_err());
        let result = DirectionMatrix::with_dimensions(DirectionStorage::Byte, 2, usize::MAX);
        assert!(result.is_err());
        // both lengths fit but the product does not
        let result = DirectionMatrix::with_dimensions(DirectionStorage::Byte, usize::MAX / 2, 3);
        assert!(result.is_err());
    }
}
