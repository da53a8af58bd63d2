
use simple_error::bail;

/// Converts a read and its CIGAR string into the aligned amplicon form used by the stitcher.
/// `M`, `=`, and `X` copy upper-cased read bases, `I` copies lower-cased read bases, `D` and `N` emit `-`,
/// `S` skips read bases, and `H` and `P` consume nothing.
/// # Arguments
/// * `read` - the read sequence as stored with the CIGAR, soft clips included
/// * `cigar` - the CIGAR string, e.g. `5S10M2I3M`
/// # Errors
/// * if the CIGAR is empty or malformed
/// * if the CIGAR consumes more or fewer read bases than the read has
/// # Examples
/// ```rust
/// use alnstitch::cigar::aligned_from_cigar;
/// let aligned = aligned_from_cigar(b"ACGTAC", "1S2M1I1D2M").unwrap();
/// assert_eq!(aligned, b"CGt-AC".to_vec());
/// ```
pub fn aligned_from_cigar(read: &[u8], cigar: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if cigar.is_empty() || cigar == "*" {
        bail!("Missing CIGAR string");
    }

    let mut aligned: Vec<u8> = Vec::with_capacity(read.len());
    let mut read_index = 0;
    let mut op_len: usize = 0;
    let mut has_len = false;
    for symbol in cigar.chars() {
        if let Some(digit) = symbol.to_digit(10) {
            op_len = match op_len.checked_mul(10).and_then(|l| l.checked_add(digit as usize)) {
                Some(l) => l,
                None => bail!("CIGAR operation length overflows in {cigar:?}")
            };
            has_len = true;
            continue;
        }
        if !has_len {
            bail!("CIGAR operation {symbol:?} has no length in {cigar:?}");
        }

        let consumes_read = matches!(symbol, 'M' | '=' | 'X' | 'I' | 'S');
        if consumes_read && read_index + op_len > read.len() {
            bail!("CIGAR {cigar:?} consumes more than the {} read bases", read.len());
        }
        match symbol {
            'M' | '=' | 'X' => aligned.extend(read[read_index..(read_index + op_len)].iter().map(|b| b.to_ascii_uppercase())),
            'I' => aligned.extend(read[read_index..(read_index + op_len)].iter().map(|b| b.to_ascii_lowercase())),
            'D' | 'N' => aligned.extend(std::iter::repeat(b'-').take(op_len)),
            'S' | 'H' | 'P' => {},
            _ => bail!("Unknown CIGAR operation {symbol:?} in {cigar:?}")
        }
        if consumes_read {
            read_index += op_len;
        }
        op_len = 0;
        has_len = false;
    }

    if has_len {
        bail!("CIGAR {cigar:?} ends with a length and no operation");
    }
    if read_index != read.len() {
        bail!("CIGAR {cigar:?} consumes {read_index} of the {} read bases", read.len());
    }
    Ok(aligned)
}
