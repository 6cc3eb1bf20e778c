// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rust_htslib::bam::record::Cigar;

use crate::realignment::position_map::PositionMap;
use crate::reference::GenomeSnippet;
use crate::utils::{bases_equal, is_n};

/// Mismatch, match, indel and softclip statistics of an alignment against a reference window.
#[derive(Debug, Clone, Default, PartialEq, Eq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct AlignmentSummary {
    num_mismatches: u32,
    num_mismatches_including_softclip: u32,
    num_matches: u32,
    num_indels: u32,
    num_indel_bases: u32,
    num_inserted_bases: u32,
    num_deleted_bases: u32,
    num_softclips: u32,
    num_non_n_softclips: u32,
    sum_of_mismatching_qualities: u32,
    /// Matching bases before the first and after the last indel, whichever is smaller.
    anchor_length: u32,
}

impl AlignmentSummary {
    /// Summarize the alignment of `read_seq` at the 1-based `position` with the given cigar.
    ///
    /// Returns `None` if an aligned base falls outside of the reference window. Softclipped
    /// bases outside of the window are not checked for mismatches.
    pub fn compute(
        position: i64,
        cigar: &[Cigar],
        read_seq: &[u8],
        qualities: &[u8],
        reference: &GenomeSnippet,
        check_softclips_for_mismatches: bool,
    ) -> Option<Self> {
        let mut summary = AlignmentSummary::default();
        let mut softclip_mismatches = 0;
        let mut rpos = position;
        let mut qpos = 0;
        let mut seen_aligned = false;
        let mut matches_before_first_indel = 0;
        let mut matches_since_last_indel = 0;

        for op in cigar {
            match *op {
                Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) => {
                    seen_aligned = true;
                    for _ in 0..l {
                        let ref_base = reference.base(rpos)?;
                        let read_base = *read_seq.get(qpos)?;
                        if is_n(read_base) || is_n(ref_base) {
                            // neither match nor mismatch
                        } else if bases_equal(read_base, ref_base) {
                            summary.num_matches += 1;
                            matches_since_last_indel += 1;
                            if summary.num_indels == 0 {
                                matches_before_first_indel += 1;
                            }
                        } else {
                            summary.num_mismatches += 1;
                            summary.sum_of_mismatching_qualities +=
                                qualities.get(qpos).copied().unwrap_or(0) as u32;
                        }
                        rpos += 1;
                        qpos += 1;
                    }
                }
                Cigar::Ins(l) => {
                    summary.num_indels += 1;
                    summary.num_inserted_bases += l;
                    matches_since_last_indel = 0;
                    qpos += l as usize;
                }
                Cigar::Del(l) => {
                    seen_aligned = true;
                    summary.num_indels += 1;
                    summary.num_deleted_bases += l;
                    matches_since_last_indel = 0;
                    rpos += l as i64;
                }
                Cigar::RefSkip(l) => {
                    rpos += l as i64;
                }
                Cigar::SoftClip(l) => {
                    // leading clips sit left of the alignment start
                    let clip_start = if seen_aligned { rpos } else { rpos - l as i64 };
                    for k in 0..l as usize {
                        let read_base = *read_seq.get(qpos + k)?;
                        summary.num_softclips += 1;
                        if is_n(read_base) {
                            continue;
                        }
                        summary.num_non_n_softclips += 1;
                        if check_softclips_for_mismatches {
                            if let Some(ref_base) = reference.base(clip_start + k as i64) {
                                if !is_n(ref_base) && !bases_equal(read_base, ref_base) {
                                    softclip_mismatches += 1;
                                }
                            }
                        }
                    }
                    qpos += l as usize;
                }
                Cigar::HardClip(_) | Cigar::Pad(_) => (),
            }
        }

        summary.num_indel_bases = summary.num_inserted_bases + summary.num_deleted_bases;
        summary.num_mismatches_including_softclip = summary.num_mismatches + softclip_mismatches;
        summary.anchor_length = if summary.num_indels > 0 {
            matches_before_first_indel.min(matches_since_last_indel)
        } else {
            summary.num_matches
        };

        Some(summary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Match,
    Mismatch,
    /// Read or reference base is an N.
    NMismatch,
    Unmapped,
    /// Mapped outside of the reference window.
    Unknown,
}

/// Per read base classification against the reference window.
pub fn mismatch_map(
    read_seq: &[u8],
    position_map: &PositionMap,
    reference: &GenomeSnippet,
) -> Vec<MatchType> {
    read_seq
        .iter()
        .zip(position_map.positions())
        .map(|(&read_base, &pos)| {
            if !position_map_is_mapped(pos) {
                return MatchType::Unmapped;
            }
            match reference.base(pos) {
                None => MatchType::Unknown,
                Some(ref_base) if is_n(read_base) || is_n(ref_base) => MatchType::NMismatch,
                Some(ref_base) if bases_equal(read_base, ref_base) => MatchType::Match,
                Some(_) => MatchType::Mismatch,
            }
        })
        .collect()
}

fn position_map_is_mapped(pos: i64) -> bool {
    pos != crate::realignment::position_map::UNMAPPED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::CigarString;
    use std::convert::TryFrom;

    fn reference() -> GenomeSnippet {
        // positions 11..=30
        GenomeSnippet::new("chr1".to_owned(), b"ACGTACGTTTGGCCAAGGCA".to_vec(), 10)
    }

    fn summarize(position: i64, cigar: &str, read: &[u8]) -> Option<AlignmentSummary> {
        let cigar = CigarString::try_from(cigar).unwrap();
        let quals: Vec<u8> = (0..read.len() as u8).map(|i| 10 + i).collect();
        AlignmentSummary::compute(position, &cigar, read, &quals, &reference(), true)
    }

    #[test]
    fn test_perfect_match() {
        let summary = summarize(11, "8M", b"ACGTACGT").unwrap();
        assert_eq!(summary.num_matches(), 8);
        assert_eq!(summary.num_mismatches(), 0);
        assert_eq!(summary.anchor_length(), 8);
    }

    #[test]
    fn test_mismatches() {
        let summary = summarize(11, "8M", b"ACCTACGA").unwrap();
        assert_eq!(summary.num_mismatches(), 2);
        assert_eq!(summary.num_matches(), 6);
        // qualities 12 and 17
        assert_eq!(summary.sum_of_mismatching_qualities(), 29);
    }

    #[test]
    fn test_indels() {
        // ACGT [del AC] GTTT
        let summary = summarize(11, "4M2D4M", b"ACGTGTTT").unwrap();
        assert_eq!(summary.num_mismatches(), 0);
        assert_eq!(summary.num_indels(), 1);
        assert_eq!(summary.num_deleted_bases(), 2);
        assert_eq!(summary.num_indel_bases(), 2);
        assert_eq!(summary.anchor_length(), 4);

        // ACG [ins TT] TACGT
        let summary = summarize(11, "3M2I5M", b"ACGTTTACGT").unwrap();
        assert_eq!(summary.num_mismatches(), 0);
        assert_eq!(summary.num_inserted_bases(), 2);
        assert_eq!(summary.anchor_length(), 3);
    }

    #[test]
    fn test_softclips() {
        // leading clip covers positions 11 and 12 (AC), read has GG there
        let summary = summarize(13, "2S4M2S", b"GGGTACGA").unwrap();
        assert_eq!(summary.num_softclips(), 4);
        assert_eq!(summary.num_non_n_softclips(), 4);
        assert_eq!(summary.num_mismatches(), 0);
        // G vs A at 11, trailing A vs G at 18
        assert_eq!(summary.num_mismatches_including_softclip(), 2);

        let summary = summarize(13, "2S4M2S", b"NNGTACGT").unwrap();
        assert_eq!(summary.num_non_n_softclips(), 2);
        assert_eq!(summary.num_mismatches_including_softclip(), 0);
    }

    #[test]
    fn test_outside_window() {
        assert!(summarize(28, "4M", b"GCAA").is_none());
        // clipped bases may hang over the window
        assert!(summarize(11, "2S2M", b"TTAC").is_some());
    }

    #[test]
    fn test_mismatch_map() {
        let map = PositionMap::new(vec![
            crate::realignment::position_map::UNMAPPED,
            11,
            12,
            13,
            100,
        ]);
        let types = mismatch_map(b"AANGT", &map, &reference());
        assert_eq!(
            types,
            vec![
                MatchType::Unmapped,
                MatchType::Match,
                MatchType::NMismatch,
                MatchType::Mismatch,
                MatchType::Unknown
            ]
        );
    }
}
