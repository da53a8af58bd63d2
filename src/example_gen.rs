
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DNA: [u8; 4] = *b"ACGT";

/// Random nucleotide string
fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let base_distribution = Uniform::new(0, DNA.len());
    (0..len)
        .map(|_i| DNA[rng.sample(base_distribution)])
        .collect()
}

/// Copies a template with errors, returning the stitcher-style aligned form of the copy.
/// Upper-case bases sit on template columns, `-` is a deleted template base, and lower-case bases are inserted after the previous column.
/// Mismatch, insertion, and deletion are equally likely sub-components of `error_rate`.
fn mutate(rng: &mut StdRng, template: &[u8], error_rate: f64) -> Vec<u8> {
    let base_distribution = Uniform::new(0, DNA.len());
    let basem1_distribution = Uniform::new(1, DNA.len());
    let error_distribution = Uniform::new(0.0, 1.0);
    let error_type_distribution = Uniform::new(0, 3);

    let mut aligned = Vec::with_capacity(template.len());
    for &c in template.iter() {
        let is_error = rng.sample(error_distribution) < error_rate;
        if !is_error {
            aligned.push(c);
            continue;
        }
        match rng.sample(error_type_distribution) {
            0 => {
                // substitution
                let c_index = DNA.iter().position(|&d| d == c).unwrap_or(0);
                let alt_index = (c_index + rng.sample(basem1_distribution)) % DNA.len();
                aligned.push(DNA[alt_index]);
            },
            1 => {
                // deletion
                aligned.push(b'-');
            },
            2 => {
                // insertion after this base
                aligned.push(c);
                aligned.push(DNA[rng.sample(base_distribution)].to_ascii_lowercase());
            },
            _ => panic!("no impl")
        }
    }
    aligned
}

/// Strips an aligned copy down to the raw sequence
fn unalign(aligned: &[u8]) -> Vec<u8> {
    aligned.iter()
        .filter(|&&b| b != b'-')
        .map(|b| b.to_ascii_uppercase())
        .collect()
}

/// Creates random (reference, query) pairs where the query is a noisy copy of the reference
/// # Arguments
/// * `seq_len` - the reference length
/// * `num_pairs` - the number of pairs
/// * `error_rate` - overall error rate for the query copies
/// * `seed` - seed for the generator, the same seed always gives the same pairs
pub fn generate_pairs(seq_len: usize, num_pairs: usize, error_rate: f64, seed: u64) -> Vec<(Vec<u8>, Vec<u8>)> {
    assert!(seq_len > 0);
    assert!((0.0..=1.0).contains(&error_rate));

    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_pairs)
        .map(|_i| {
            let reference = random_dna(&mut rng, seq_len);
            let mut query = unalign(&mutate(&mut rng, &reference, error_rate));
            if query.is_empty() {
                // everything was deleted, keep at least one base
                query.push(reference[0]);
            }
            (reference, query)
        })
        .collect()
}

/// Creates a random reference and a tiling of noisy amplicons over it, already in the stitcher convention.
/// Amplicons start every `step` bases and are sorted by start; each tile is copied `copies` times.
/// # Arguments
/// * `ref_len` - the reference length
/// * `amplicon_len` - the length of each amplicon, the last tiles are cut short at the reference end
/// * `step` - distance between amplicon starts
/// * `copies` - number of amplicons per tile
/// * `error_rate` - overall error rate for each amplicon
pub fn generate_amplicons(ref_len: usize, amplicon_len: usize, step: usize, copies: usize, error_rate: f64) -> (Vec<u8>, Vec<(Vec<u8>, usize)>) {
    assert!(amplicon_len > 0 && step > 0);
    assert!((0.0..=1.0).contains(&error_rate));

    let mut rng = StdRng::seed_from_u64(0);
    let reference = random_dna(&mut rng, ref_len);
    let mut amplicons = vec![];
    for start in (0..ref_len).step_by(step) {
        let end = (start + amplicon_len).min(ref_len);
        for _c in 0..copies {
            amplicons.push((mutate(&mut rng, &reference[start..end], error_rate), start));
        }
    }
    (reference, amplicons)
}
