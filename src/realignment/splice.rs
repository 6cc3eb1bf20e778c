// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp;

use bio::alignment::distance::hamming;
use rust_htslib::bam::record::{Cigar, CigarString};

use crate::candidates::CandidateIndel;
use crate::read::Read;
use crate::realignment::options::RealignerOptions;
use crate::realignment::position_map::PositionMap;
use crate::realignment::result::RealignmentResult;
use crate::realignment::summary::AlignmentSummary;
use crate::realignment::GenomeSnippets;
use crate::utils::homopolymers::{bookend_len, leading_run_len, trailing_run_len};

const PROPORTION_EPSILON: f64 = 1e-9;

/// Side of the read from which indels are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Anchor {
    Left,
    Right,
}

/// Reasons for discarding a splice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rejection {
    /// The indel position is not covered by the read.
    NoAnchor,
    /// No read base is left on the far side of the deletion.
    UnanchoredDeletion,
    InvalidPositionMap,
    InsufficientRepeatAnchor,
    /// A duplication that is only partially contained in the read.
    PartialDuplication,
    InsertedSequenceMismatch,
    /// The indel sits in a mono-base run touching the read end.
    UnanchoredRepeat,
    MissingGenomeSnippet,
    ReferenceWindowExceeded,
}

impl Rejection {
    /// Whether the rejection hints at inconsistent input rather than a poor fit of the indel.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Rejection::MissingGenomeSnippet | Rejection::ReferenceWindowExceeded
        )
    }
}

pub(crate) type Attempt = std::result::Result<RealignmentResult, Rejection>;

/// The read with terminal Ns stripped, laid out without gaps from either end.
pub(crate) struct TrimmedRead<'a> {
    pub(crate) name: &'a str,
    pub(crate) sequence: &'a [u8],
    pub(crate) qualities: &'a [u8],
    pub(crate) n_prefix: usize,
    pub(crate) n_suffix: usize,
    left_map: PositionMap,
    right_map: PositionMap,
}

impl<'a> TrimmedRead<'a> {
    pub(crate) fn new(read: &'a Read) -> Self {
        let sequence = read.sequence();
        let n_prefix = bookend_len(sequence, b'N', false);
        let n_suffix = if n_prefix == sequence.len() {
            0
        } else {
            bookend_len(sequence, b'N', true)
        };
        let end = sequence.len() - n_suffix;
        let len = end - n_prefix;

        let left_start = read.unclipped_start() + n_prefix as i64;
        let right_start = read.unclipped_end() - n_suffix as i64 - len as i64 + 1;

        TrimmedRead {
            name: read.name(),
            sequence: &sequence[n_prefix..end],
            qualities: &read.qualities()[n_prefix..end],
            n_prefix,
            n_suffix,
            left_map: PositionMap::straight(left_start, len),
            right_map: PositionMap::straight(right_start, len),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sequence.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub(crate) fn map(&self, anchor: Anchor) -> &PositionMap {
        match anchor {
            Anchor::Left => &self.left_map,
            Anchor::Right => &self.right_map,
        }
    }
}

/// Read bases affected by a spliced indel.
#[derive(Debug, Clone, Copy)]
enum Site {
    /// Inserted bases `start..=end`.
    Insertion { start: usize, end: usize },
    /// Deleted stretch between `before` and `before + 1`.
    Deletion { before: usize },
}

impl Site {
    fn read_index(self) -> usize {
        match self {
            Site::Insertion { start, .. } => start,
            Site::Deletion { before } => before,
        }
    }

    fn bases_before(self) -> usize {
        match self {
            Site::Insertion { start, .. } => start,
            Site::Deletion { before } => before + 1,
        }
    }

    fn bases_after(self, read_len: usize) -> usize {
        match self {
            Site::Insertion { end, .. } => read_len - 1 - end,
            Site::Deletion { before } => read_len - before - 1,
        }
    }

    /// Whether the site lies within the mono-base runs of length `leading` and `trailing`
    /// at the read ends.
    fn is_within_terminal_run(self, leading: usize, trailing: usize, read_len: usize) -> bool {
        let trailing_start = read_len - trailing;
        match self {
            Site::Insertion { start, end } => start < leading || end >= trailing_start,
            Site::Deletion { before } => before + 1 < leading || before >= trailing_start,
        }
    }
}

/// Splices candidate indels into the position map of a read.
pub(crate) struct Splicer<'a> {
    options: &'a RealignerOptions,
    snippets: &'a GenomeSnippets,
    pair_specific: bool,
}

impl<'a> Splicer<'a> {
    pub(crate) fn new(
        options: &'a RealignerOptions,
        snippets: &'a GenomeSnippets,
        pair_specific: bool,
    ) -> Self {
        Splicer {
            options,
            snippets,
            pair_specific,
        }
    }

    /// Splice the given indels, in the given order, into the read and summarize the resulting
    /// alignment against the reference window of the first indel.
    pub(crate) fn splice(
        &self,
        read: &TrimmedRead,
        indels: &[&CandidateIndel],
        anchor: Anchor,
    ) -> Attempt {
        let mut map = read.map(anchor).clone();
        let mut sites = Vec::with_capacity(indels.len());
        let mut nified = Vec::new();
        let mut is_sketchy = false;

        for indel in indels {
            let site = match (anchor, indel.is_insertion()) {
                (Anchor::Left, true) => splice_insertion_left(&mut map, indel)?,
                (Anchor::Left, false) => splice_deletion_left(&mut map, indel)?,
                (Anchor::Right, true) => splice_insertion_right(&mut map, indel)?,
                (Anchor::Right, false) => splice_deletion_right(&mut map, indel)?,
            };
            if !map.is_valid() {
                return Err(Rejection::InvalidPositionMap);
            }

            if indel.is_repeat() && !self.has_repeat_anchor(site, indel, read.len()) {
                if self.pair_specific {
                    is_sketchy = true;
                } else {
                    return Err(Rejection::InsufficientRepeatAnchor);
                }
            }

            if let Site::Insertion { start, end } = site {
                let run_len = end - start + 1;
                let len = indel.length() as usize;
                if run_len < len && is_partial_duplication(indel, anchor) {
                    return Err(Rejection::PartialDuplication);
                }
                let expected = match anchor {
                    Anchor::Left => &indel.indel_sequence()[..run_len],
                    Anchor::Right => &indel.indel_sequence()[len - run_len..],
                };
                let observed = &read.sequence[start..=end];
                if observed != expected {
                    if !self.tolerates_mismatches(indel, observed, expected) {
                        return Err(Rejection::InsertedSequenceMismatch);
                    }
                    nified.extend(
                        observed
                            .iter()
                            .zip(expected)
                            .enumerate()
                            .filter(|(_, (a, b))| a != b)
                            .map(|(k, _)| start + k),
                    );
                }
            }
            sites.push((site, *indel));
        }

        let (cigar, masked) =
            self.mask_partial_insertions(map.to_cigar(0, 0), &sites, read.len());
        let position = map
            .first_mappable_base()
            .ok_or(Rejection::InvalidPositionMap)?;

        let snippet = self
            .snippets
            .get(indels[0])
            .ok_or(Rejection::MissingGenomeSnippet)?;
        let summary = AlignmentSummary::compute(
            position,
            &cigar,
            read.sequence,
            read.qualities,
            snippet,
            self.options.check_softclips_for_mismatches(),
        )
        .ok_or(Rejection::ReferenceWindowExceeded)?;

        let leading = leading_run_len(read.sequence);
        let trailing = trailing_run_len(read.sequence);
        if sites
            .iter()
            .filter(|(site, _)| !masked.covers(*site, read.len()))
            .any(|(site, _)| site.is_within_terminal_run(leading, trailing, read.len()))
        {
            if self.pair_specific {
                is_sketchy = true;
            } else {
                return Err(Rejection::UnanchoredRepeat);
            }
        }

        Ok(RealignmentResult {
            position,
            cigar,
            summary,
            position_map: map,
            indel_read_indices: sites.iter().map(|(site, _)| site.read_index()).collect(),
            nified_read_indices: nified,
            accepted_indels: indels.iter().map(|&indel| indel.clone()).collect(),
            is_sketchy,
            attempts: 0,
        })
    }

    fn has_repeat_anchor(&self, site: Site, indel: &CandidateIndel, read_len: usize) -> bool {
        let min_anchor = cmp::max(self.options.min_repeat_anchor(), indel.length()) as usize;
        let min_anchor_after = cmp::max(min_anchor, indel.ref_bases_before_unique() as usize);
        site.bases_before() >= min_anchor && site.bases_after(read_len) >= min_anchor_after
    }

    fn tolerates_mismatches(&self, indel: &CandidateIndel, observed: &[u8], expected: &[u8]) -> bool {
        if indel.length() < self.options.min_insertion_size_to_allow_mismatching_bases()
            || indel.is_duplication()
            || indel.has_approx_dups()
        {
            return false;
        }
        let max_mismatches = max_tolerated_mismatches(
            indel.length(),
            self.options.max_proportion_insert_sequence_mismatch(),
        );
        hamming(observed, expected) <= max_mismatches
    }

    /// Softclip insertions at the read ends that do not contain the full candidate or are
    /// too short to stand on their own.
    fn mask_partial_insertions(
        &self,
        cigar: CigarString,
        sites: &[(Site, &CandidateIndel)],
        read_len: usize,
    ) -> (CigarString, MaskedEnds) {
        let mut ops = cigar.0;
        let mut masked = MaskedEnds::default();
        let is_partial = |len: u32, touches: &dyn Fn(Site) -> bool| {
            let indel_len = sites
                .iter()
                .find(|(site, _)| touches(*site))
                .map_or(len, |(_, indel)| indel.length());
            (self.options.mask_partial_insertion() && len < indel_len)
                || len < self.options.min_unanchored_insertion_length()
        };

        if let Some(&Cigar::Ins(len)) = ops.first() {
            if is_partial(len, &|site: Site| matches!(site, Site::Insertion { start: 0, .. })) {
                ops[0] = Cigar::SoftClip(len);
                masked.start = true;
            }
        }
        if let Some(&Cigar::Ins(len)) = ops.last() {
            if is_partial(len, &|site: Site| {
                matches!(site, Site::Insertion { end, .. } if end == read_len - 1)
            }) {
                let last = ops.len() - 1;
                ops[last] = Cigar::SoftClip(len);
                masked.end = true;
            }
        }

        (CigarString(ops), masked)
    }
}

/// Read ends whose insertion was turned into a softclip.
#[derive(Debug, Clone, Copy, Default)]
struct MaskedEnds {
    start: bool,
    end: bool,
}

impl MaskedEnds {
    fn covers(self, site: Site, read_len: usize) -> bool {
        match site {
            Site::Insertion { start, end } => {
                (self.start && start == 0) || (self.end && end == read_len - 1)
            }
            Site::Deletion { .. } => false,
        }
    }
}

/// Whole number of mismatching bases allowed in an insertion of length `len`.
fn max_tolerated_mismatches(len: u32, proportion: f64) -> u64 {
    (len as f64 * proportion + PROPORTION_EPSILON).floor() as u64
}

fn is_partial_duplication(indel: &CandidateIndel, anchor: Anchor) -> bool {
    indel.is_duplication()
        || match anchor {
            Anchor::Left => indel.num_approx_dups_right() > 0,
            Anchor::Right => indel.num_approx_dups_left() > 0,
        }
}

fn left_anchor_index(map: &PositionMap, position: i64) -> Option<usize> {
    map.positions()
        .iter()
        .position(|&p| p == position)
        .filter(|&i| i + 1 < map.len())
}

fn splice_insertion_left(map: &mut PositionMap, indel: &CandidateIndel) -> Result<Site, Rejection> {
    let i = left_anchor_index(map, indel.position()).ok_or(Rejection::NoAnchor)?;
    let start = i + 1;
    let run_len = map.splice_insertion(start, indel.length() as usize).len();
    Ok(Site::Insertion {
        start,
        end: start + run_len - 1,
    })
}

fn splice_deletion_left(map: &mut PositionMap, indel: &CandidateIndel) -> Result<Site, Rejection> {
    let i = left_anchor_index(map, indel.position()).ok_or(Rejection::NoAnchor)?;
    if !map.splice_deletion(i, indel.length() as usize) {
        return Err(Rejection::UnanchoredDeletion);
    }
    Ok(Site::Deletion { before: i })
}

fn splice_insertion_right(
    map: &mut PositionMap,
    indel: &CandidateIndel,
) -> Result<Site, Rejection> {
    let end = (1..map.len())
        .rev()
        .find(|&i| map.get(i) == indel.position() + 1)
        .map(|i| i - 1)
        .ok_or(Rejection::NoAnchor)?;
    let start = map.splice_insertion_backward(end, indel.length() as usize);
    Ok(Site::Insertion { start, end })
}

fn splice_deletion_right(
    map: &mut PositionMap,
    indel: &CandidateIndel,
) -> Result<Site, Rejection> {
    let first_after = indel.position() + indel.length() as i64 + 1;
    let i = (1..map.len())
        .rev()
        .find(|&i| map.get(i) == first_after)
        .ok_or(Rejection::NoAnchor)?;
    let before = i - 1;
    if !map.splice_deletion_backward(before, indel.length() as usize) {
        return Err(Rejection::UnanchoredDeletion);
    }
    Ok(Site::Deletion { before })
}
