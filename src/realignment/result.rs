// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rust_htslib::bam::record::CigarString;

use crate::candidates::CandidateIndel;
use crate::realignment::position_map::PositionMap;
use crate::realignment::summary::AlignmentSummary;

/// A realigned read: new position and cigar, alignment statistics and the indels that were
/// spliced in.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct RealignmentResult {
    #[getset(get_copy = "pub")]
    pub(crate) position: i64,
    #[getset(get = "pub")]
    pub(crate) cigar: CigarString,
    #[getset(get = "pub")]
    pub(crate) summary: AlignmentSummary,
    #[getset(get = "pub")]
    pub(crate) position_map: PositionMap,
    /// Read indices of the first inserted base (insertions) or of the base preceding the
    /// deleted stretch (deletions), one per spliced indel.
    #[getset(get = "pub")]
    pub(crate) indel_read_indices: Vec<usize>,
    /// Inserted bases that mismatch the candidate allele.
    #[getset(get = "pub")]
    pub(crate) nified_read_indices: Vec<usize>,
    #[getset(get = "pub")]
    pub(crate) accepted_indels: Vec<CandidateIndel>,
    /// Set if the result is only acceptable because of pair evidence.
    #[getset(get_copy = "pub")]
    pub(crate) is_sketchy: bool,
    #[getset(get_copy = "pub")]
    pub(crate) attempts: u32,
}

impl RealignmentResult {
    /// Unbeatable results end the search early.
    pub fn is_perfect(&self) -> bool {
        self.summary.num_indels() == 1
            && self.summary.num_mismatches() == 0
            && self.summary.num_mismatches_including_softclip() == 0
    }
}

/// Serializable view of a result.
#[derive(Debug, Clone, Serialize)]
pub struct RealignmentReport {
    pub position: i64,
    pub cigar: String,
    pub summary: AlignmentSummary,
    pub indels: Vec<String>,
    pub nified_read_indices: Vec<usize>,
    pub is_sketchy: bool,
    pub attempts: u32,
}

impl From<&RealignmentResult> for RealignmentReport {
    fn from(result: &RealignmentResult) -> Self {
        RealignmentReport {
            position: result.position,
            cigar: result.cigar.to_string(),
            summary: result.summary.clone(),
            indels: result.accepted_indels.iter().map(|indel| indel.key()).collect(),
            nified_read_indices: result.nified_read_indices.clone(),
            is_sketchy: result.is_sketchy,
            attempts: result.attempts,
        }
    }
}
