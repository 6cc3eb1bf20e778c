// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

pub mod cigar;
pub(crate) mod homopolymers;

/// Compare two bases, ignoring case.
pub(crate) fn bases_equal(a: u8, b: u8) -> bool {
    a.to_ascii_uppercase() == b.to_ascii_uppercase()
}

pub(crate) fn is_n(base: u8) -> bool {
    base.to_ascii_uppercase() == b'N'
}

/// Decode a Phred+33 encoded quality string into raw Phred values.
pub fn decode_phred33(qualities: &[u8]) -> Vec<u8> {
    qualities.iter().map(|q| q.saturating_sub(33)).collect()
}
