// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

fn extend_homopolymer_stretch(base: u8, seq: &mut dyn Iterator<Item = &u8>) -> usize {
    let base = base.to_ascii_uppercase();
    seq.take_while(|c| c.to_ascii_uppercase() == base).count()
}

/// Length of the mono-base run the sequence starts with.
pub(crate) fn leading_run_len(seq: &[u8]) -> usize {
    match seq.first() {
        Some(&base) => extend_homopolymer_stretch(base, &mut seq.iter()),
        None => 0,
    }
}

/// Length of the mono-base run the sequence ends with.
pub(crate) fn trailing_run_len(seq: &[u8]) -> usize {
    match seq.last() {
        Some(&base) => extend_homopolymer_stretch(base, &mut seq.iter().rev()),
        None => 0,
    }
}

/// Number of leading (or trailing) bases equal to `base`.
pub(crate) fn bookend_len(seq: &[u8], base: u8, from_end: bool) -> usize {
    if from_end {
        extend_homopolymer_stretch(base, &mut seq.iter().rev())
    } else {
        extend_homopolymer_stretch(base, &mut seq.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs() {
        assert_eq!(leading_run_len(b"AAAACGTTT"), 4);
        assert_eq!(trailing_run_len(b"AAAACGTTT"), 3);
        assert_eq!(leading_run_len(b"CGT"), 1);
        assert_eq!(trailing_run_len(b""), 0);
        assert_eq!(bookend_len(b"NNACGN", b'N', false), 2);
        assert_eq!(bookend_len(b"NNACGN", b'N', true), 1);
        assert_eq!(bookend_len(b"ACGN", b'N', false), 0);
    }
}
