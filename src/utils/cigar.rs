// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Small helpers around `rust_htslib` cigar operations.

use std::mem;

use itertools::Itertools;
use rust_htslib::bam::record::{Cigar, CigarString};

/// Return an operation of the same kind as `op` with the given length.
pub(crate) fn with_len(op: &Cigar, len: u32) -> Cigar {
    match op {
        Cigar::Match(_) => Cigar::Match(len),
        Cigar::Ins(_) => Cigar::Ins(len),
        Cigar::Del(_) => Cigar::Del(len),
        Cigar::RefSkip(_) => Cigar::RefSkip(len),
        Cigar::SoftClip(_) => Cigar::SoftClip(len),
        Cigar::HardClip(_) => Cigar::HardClip(len),
        Cigar::Pad(_) => Cigar::Pad(len),
        Cigar::Equal(_) => Cigar::Equal(len),
        Cigar::Diff(_) => Cigar::Diff(len),
    }
}

pub(crate) fn same_kind(a: &Cigar, b: &Cigar) -> bool {
    mem::discriminant(a) == mem::discriminant(b)
}

/// Merge adjacent operations of the same kind and drop empty ones.
pub fn compress<I: IntoIterator<Item = Cigar>>(ops: I) -> CigarString {
    CigarString(
        ops.into_iter()
            .filter(|op| op.len() > 0)
            .coalesce(|a, b| {
                if same_kind(&a, &b) {
                    Ok(with_len(&a, a.len() + b.len()))
                } else {
                    Err((a, b))
                }
            })
            .collect(),
    )
}

pub fn prefix_softclip(cigar: &[Cigar]) -> u32 {
    match cigar.iter().find(|op| !matches!(op, Cigar::HardClip(_))) {
        Some(Cigar::SoftClip(l)) => *l,
        _ => 0,
    }
}

pub fn suffix_softclip(cigar: &[Cigar]) -> u32 {
    match cigar.iter().rev().find(|op| !matches!(op, Cigar::HardClip(_))) {
        Some(Cigar::SoftClip(l)) => *l,
        _ => 0,
    }
}

pub(crate) fn consumes_reference(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Del(_) | Cigar::RefSkip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

pub(crate) fn consumes_read(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Number of reference bases covered by the alignment.
pub fn reference_span(cigar: &[Cigar]) -> u32 {
    cigar
        .iter()
        .filter(|op| consumes_reference(op))
        .map(|op| op.len())
        .sum()
}

/// Number of read bases described by the cigar.
pub fn read_length(cigar: &[Cigar]) -> u32 {
    cigar
        .iter()
        .filter(|op| consumes_read(op))
        .map(|op| op.len())
        .sum()
}

/// Whether both cigars consist of exactly the same operations.
pub fn cigars_equal(a: &[Cigar], b: &[Cigar]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}
