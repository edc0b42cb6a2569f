
use simple_error::bail;

/// The base alphabet, in channel order.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Returns true if the symbol is one of the four bases.
pub fn is_valid_base(symbol: u8) -> bool {
    matches!(symbol, b'A' | b'C' | b'G' | b'T')
}

/// Returns the channel index of a base, A=0 C=1 G=2 T=3.
/// # Panics
/// * if the symbol is not a valid base; callers are expected to validate first
pub fn base_index(symbol: u8) -> usize {
    match symbol {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' => 3,
        _ => unreachable!("base_index called on non-base symbol: {}", symbol as char)
    }
}

/// Checks that a sequence is non-empty and drawn from the base alphabet.
/// # Arguments
/// * `label` - name used in the error message, e.g. "read" or "template"
/// * `sequence` - the sequence to check
/// # Errors
/// * if the sequence is empty or contains a non-ACGT symbol
pub fn validate_bases(label: &str, sequence: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    if sequence.is_empty() {
        bail!("Invalid input: {} is empty", label);
    }
    if let Some(&symbol) = sequence.iter().find(|&&s| !is_valid_base(s)) {
        bail!("Invalid input: {label} contains non-ACGT symbol: {:?}", symbol as char);
    }
    Ok(())
}

/// Returns the reverse complement of a base sequence.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev()
        .map(|&s| match s {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            _ => unreachable!("reverse_complement called on non-base symbol: {}", s as char)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bases() {
        assert!(validate_bases("read", b"ACGTACGT").is_ok());
        assert!(validate_bases("read", b"").is_err());
        assert!(validate_bases("read", b"ACGN").is_err());
        assert!(validate_bases("read", b"acgt").is_err());
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AACG"), b"CGTT".to_vec());
        assert_eq!(reverse_complement(b"T"), b"A".to_vec());
    }

    #[test]
    fn test_base_index() {
        for (expected, &base) in BASES.iter().enumerate() {
            assert_eq!(base_index(base), expected);
        }
    }
}
