// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::iter;

use anyhow::Result;

use crate::errors::Error;
use crate::read::Read;
use crate::realignment::options::RealignerOptions;
use crate::realignment::position_map::{PositionMap, UNMAPPED};
use crate::realignment::result::RealignmentResult;
use crate::realignment::summary::{mismatch_map, AlignmentSummary, MatchType};
use crate::reference::GenomeSnippet;
use crate::utils::{cigar, is_n};

/// Restores terminal N clipping and the original softclips of a read on a realignment.
#[derive(Debug, new)]
pub struct SoftclipReapplier<'a> {
    options: &'a RealignerOptions,
}

impl<'a> SoftclipReapplier<'a> {
    /// Bring `result`, computed on the read without its terminal Ns, back onto the full read
    /// and recompute position, cigar and summary.
    pub fn reapply(
        &self,
        result: &mut RealignmentResult,
        read: &Read,
        n_prefix: usize,
        n_suffix: usize,
        snippet: &GenomeSnippet,
    ) -> Result<()> {
        let mut map = PositionMap::new(
            iter::repeat(UNMAPPED)
                .take(n_prefix)
                .chain(result.position_map.positions().iter().copied())
                .chain(iter::repeat(UNMAPPED).take(n_suffix))
                .collect(),
        );
        let n = map.len();

        // insertions masked at the read ends during splicing
        let mut prefix_clip = n_prefix + cigar::prefix_softclip(&result.cigar) as usize;
        let mut suffix_clip = n_suffix + cigar::suffix_softclip(&result.cigar) as usize;
        let (original_prefix, original_suffix) = if self.options.remask_softclips() {
            self.softclip_masks(read, &map, snippet)
        } else {
            (
                read.prefix_softclip() as usize,
                read.suffix_softclip() as usize,
            )
        };
        prefix_clip = prefix_clip.max(original_prefix);
        suffix_clip = suffix_clip.max(original_suffix);
        // absorb unaligned bases adjacent to the clips
        if prefix_clip > 0 {
            while prefix_clip < n && !map.is_mapped(prefix_clip) {
                prefix_clip += 1;
            }
        }
        if suffix_clip > 0 {
            while suffix_clip < n && !map.is_mapped(n - 1 - suffix_clip) {
                suffix_clip += 1;
            }
        }
        if prefix_clip + suffix_clip >= n {
            return Err(Error::NoMappableBases {
                name: read.name().to_owned(),
            }
            .into());
        }

        map.clip(prefix_clip, suffix_clip);
        let position = map.first_mappable_base().ok_or_else(|| Error::NoMappableBases {
            name: read.name().to_owned(),
        })?;
        let cigar = map.to_cigar(prefix_clip, suffix_clip);

        let summary = AlignmentSummary::compute(
            position,
            &cigar,
            read.sequence(),
            read.qualities(),
            snippet,
            self.options.check_softclips_for_mismatches(),
        )
        .ok_or_else(|| Error::MissingEditDistance {
            name: read.name().to_owned(),
            position,
            cigar: cigar.to_string(),
        })?;

        result.position = position;
        result.cigar = cigar;
        result.summary = summary;
        result.position_map = map;
        for idx in result
            .indel_read_indices
            .iter_mut()
            .chain(result.nified_read_indices.iter_mut())
        {
            *idx += n_prefix;
        }

        Ok(())
    }

    /// Number of bases to clip at either end: the original softclips, trimmed down to their
    /// innermost base that still needs masking.
    fn softclip_masks(
        &self,
        read: &Read,
        map: &PositionMap,
        snippet: &GenomeSnippet,
    ) -> (usize, usize) {
        let n = read.len();
        let prefix = read.prefix_softclip() as usize;
        let suffix = read.suffix_softclip() as usize;
        if self.options.keep_probe_softclips() {
            return (prefix, suffix);
        }

        let types = mismatch_map(read.sequence(), map, snippet);
        let needs_mask = |i: usize| {
            if self.options.mask_ns_only() {
                is_n(read.sequence()[i])
            } else {
                types[i] == MatchType::Mismatch
            }
        };

        let prefix_mask = (0..prefix.min(n))
            .rev()
            .find(|&i| needs_mask(i))
            .map_or(0, |i| i + 1);
        let suffix_mask = (n.saturating_sub(suffix)..n)
            .find(|&i| needs_mask(i))
            .map_or(0, |i| n - i);

        (prefix_mask, suffix_mask)
    }
}
