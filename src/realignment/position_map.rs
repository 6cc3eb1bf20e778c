// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::ops::Range;

use rust_htslib::bam::record::{Cigar, CigarString};

use crate::utils::cigar;

/// Sentinel for read bases without a reference coordinate (inserted, clipped, unmapped).
pub const UNMAPPED: i64 = -1;

/// Maps each read base to its 1-based reference coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    positions: Vec<i64>,
}

impl PositionMap {
    pub fn new(positions: Vec<i64>) -> Self {
        PositionMap { positions }
    }

    /// Ungapped layout of `len` bases starting at reference position `start`. Positions before
    /// the start of the reference are unmapped.
    pub fn straight(start: i64, len: usize) -> Self {
        PositionMap {
            positions: (0..len as i64)
                .map(|i| if start + i >= 1 { start + i } else { UNMAPPED })
                .collect(),
        }
    }

    pub fn get(&self, i: usize) -> i64 {
        self.positions[i]
    }

    pub fn set(&mut self, i: usize, value: i64, is_sentinel: bool) {
        self.positions[i] = if is_sentinel { UNMAPPED } else { value };
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_mapped(&self, i: usize) -> bool {
        self.positions[i] != UNMAPPED
    }

    pub fn has_any_mappable_base(&self) -> bool {
        self.positions.iter().any(|&p| p != UNMAPPED)
    }

    pub fn first_mappable_base(&self) -> Option<i64> {
        self.positions.iter().copied().find(|&p| p != UNMAPPED)
    }

    pub fn last_mappable_base(&self) -> Option<i64> {
        self.positions.iter().rev().copied().find(|&p| p != UNMAPPED)
    }

    pub fn positions(&self) -> &[i64] {
        &self.positions
    }

    /// A map is valid if it has a mappable base and its mappable bases strictly increase.
    pub fn is_valid(&self) -> bool {
        let mut last = None;
        for &p in self.positions.iter().filter(|&&p| p != UNMAPPED) {
            if let Some(last) = last {
                if p <= last {
                    return false;
                }
            }
            last = Some(p);
        }
        last.is_some()
    }

    fn shift(&mut self, range: Range<usize>, offset: i64) -> bool {
        let mut any = false;
        for p in &mut self.positions[range] {
            if *p != UNMAPPED {
                *p += offset;
                any = true;
            }
        }
        any
    }

    /// Splice in an insertion of `len` bases starting at read index `start`. The run is
    /// truncated at the read end. Mappable bases after the run are shifted by `-len`.
    /// Returns the overwritten entries.
    pub fn splice_insertion(&mut self, start: usize, len: usize) -> Vec<i64> {
        let end = (start + len).min(self.len());
        let overwritten = self.positions[start..end].to_vec();
        for p in &mut self.positions[start..end] {
            *p = UNMAPPED;
        }
        let n = self.len();
        self.shift(end..n, -(len as i64));
        overwritten
    }

    /// Reverse `splice_insertion`.
    pub fn unsplice_insertion(&mut self, start: usize, len: usize, overwritten: &[i64]) {
        let end = start + overwritten.len();
        self.positions[start..end].copy_from_slice(overwritten);
        let n = self.len();
        self.shift(end..n, len as i64);
    }

    /// Splice in an insertion of `len` bases ending (inclusively) at read index `end`, walking
    /// backwards. The run is truncated at the read start. Mappable bases before the run are
    /// shifted by `+len`. Returns the first index of the run.
    pub fn splice_insertion_backward(&mut self, end: usize, len: usize) -> usize {
        let start = (end + 1).saturating_sub(len);
        for p in &mut self.positions[start..=end] {
            *p = UNMAPPED;
        }
        self.shift(0..start, len as i64);
        start
    }

    /// Splice in a deletion of `len` bases between read index `i` and `i + 1` by shifting
    /// all mappable bases after `i`. Returns whether any base was shifted.
    pub fn splice_deletion(&mut self, i: usize, len: usize) -> bool {
        let n = self.len();
        self.shift(i + 1..n, len as i64)
    }

    /// Splice in a deletion of `len` bases between read index `i` and `i + 1` by shifting
    /// all mappable bases up to and including `i`. Returns whether any base was shifted.
    pub fn splice_deletion_backward(&mut self, i: usize, len: usize) -> bool {
        self.shift(0..i + 1, -(len as i64))
    }

    /// Mark the first `prefix` and last `suffix` bases as unmapped.
    pub fn clip(&mut self, prefix: usize, suffix: usize) {
        let n = self.len();
        for i in (0..prefix.min(n)).chain(n.saturating_sub(suffix)..n) {
            self.positions[i] = UNMAPPED;
        }
    }

    /// Derive the cigar of the map. The first `prefix_clip` and last `suffix_clip` bases
    /// become softclips, unmapped bases in between become insertions and gaps between
    /// consecutive mapped bases become deletions.
    pub fn to_cigar(&self, prefix_clip: usize, suffix_clip: usize) -> CigarString {
        let n = self.len();
        let prefix_clip = prefix_clip.min(n);
        let suffix_clip = suffix_clip.min(n - prefix_clip);

        let mut ops = vec![Cigar::SoftClip(prefix_clip as u32)];
        let mut last = None;
        for &p in &self.positions[prefix_clip..n - suffix_clip] {
            if p == UNMAPPED {
                ops.push(Cigar::Ins(1));
            } else {
                if let Some(last) = last {
                    if p > last + 1 {
                        ops.push(Cigar::Del((p - last - 1) as u32));
                    }
                }
                ops.push(Cigar::Match(1));
                last = Some(p);
            }
        }
        ops.push(Cigar::SoftClip(suffix_clip as u32));

        cigar::compress(ops)
    }
}
