
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::sequence::BASES;

/// Creates a test set we can verify is working: a random template over `{ACGT}` and reads
/// sampled from it with uniform errors.
/// # Arguments
/// * `seq_len` - the length of the template
/// * `num_samples` - the number of reads to sample from the template
/// * `error_rate` - overall error rate, assumes mismatch, insertion, and deletion are equally likely sub-components of this error rate
pub fn generate_test(seq_len: usize, num_samples: usize, error_rate: f64) -> (Vec<u8>, Vec<Vec<u8>>) {
    assert!((0.0..=1.0).contains(&error_rate));

    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    generate_test_with_rng(&mut rng, seq_len, num_samples, error_rate)
}

/// Creates a test set from a caller-provided generator, for tests that need multiple distinct
/// datasets in one run.
/// # Arguments
/// * `rng` - the seeded generator to draw from
/// * `seq_len` - the length of the template
/// * `num_samples` - the number of reads to sample from the template
/// * `error_rate` - overall error rate, split evenly between mismatch, insertion, and deletion
pub fn generate_test_with_rng<R: Rng>(rng: &mut R, seq_len: usize, num_samples: usize, error_rate: f64) -> (Vec<u8>, Vec<Vec<u8>>) {
    let base_distribution = Uniform::new(0, 4_u8);
    let basem1_distribution = Uniform::new(0, 3_u8);
    let error_distribution = Uniform::new(0.0, 1.0);
    let error_type_distribution = Uniform::new(0, 3);

    let consensus: Vec<u8> = (0..seq_len)
        .map(|_i| BASES[rng.sample(base_distribution) as usize])
        .collect();

    let samples: Vec<Vec<u8>> = (0..num_samples)
        .map(|_i| {
            let mut seq = vec![];
            let mut con_index = 0;
            while con_index < consensus.len() {
                let c = consensus[con_index];
                let is_error = rng.sample(error_distribution) < error_rate;
                if is_error {
                    let error_type = rng.sample(error_type_distribution);
                    match error_type {
                        0 => {
                            // substitution
                            let sub_offset = rng.sample(basem1_distribution);
                            let base_offset = BASES.iter().position(|&b| b == c).unwrap() as u8;
                            let alt_c = BASES[((base_offset + 1 + sub_offset) % 4) as usize];
                            seq.push(alt_c);
                            con_index += 1;
                        },
                        1 => {
                            // deletion
                            con_index += 1;
                        },
                        2 => {
                            // insertion
                            let s = BASES[rng.sample(base_distribution) as usize];
                            seq.push(s);
                        },
                        _ => panic!("no impl")
                    }
                } else {
                    seq.push(c);
                    con_index += 1;
                }
            }

            // a fully deleted read is useless downstream, pad it with one true base
            if seq.is_empty() {
                seq.push(consensus[0]);
            }
            seq
        })
        .collect();

    (consensus, samples)
}
