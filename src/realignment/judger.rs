// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::read::Read;
use crate::realignment::comparison::{AlignmentComparer, OriginalAlignmentComparer, Preference};
use crate::realignment::options::JudgerOptions;
use crate::realignment::result::RealignmentResult;
use crate::realignment::summary::AlignmentSummary;
use crate::utils::cigar;

/// Decides whether reads should be realigned and whether realignments are kept.
#[derive(Debug, Clone, Default, new)]
pub struct RealignmentJudger {
    options: JudgerOptions,
}

impl RealignmentJudger {
    pub fn options(&self) -> &JudgerOptions {
        &self.options
    }

    /// Whether the original alignment warrants a realignment attempt. `true` means realign,
    /// `false` means the original alignment is kept without trying any candidate.
    pub fn is_suspicious(&self, original: &AlignmentSummary) -> bool {
        if original.num_mismatches() > 0 || original.num_indels() > 0 {
            return true;
        }
        self.options.realign_clean_softclipped_reads() && original.num_softclips() > 0
    }

    /// Whether the realignment reproduces the original alignment.
    pub fn is_unchanged(&self, result: &RealignmentResult, read: &Read) -> bool {
        result.position() == read.position() && cigar::cigars_equal(result.cigar(), read.cigar())
    }

    pub fn is_better_or_equal(
        &self,
        result: &RealignmentResult,
        original: &AlignmentSummary,
        pair_specific: bool,
    ) -> bool {
        let summary = result.summary();
        if pair_specific {
            summary.num_mismatches()
                <= original.num_mismatches() + self.options.pair_specific_max_mismatch_increase()
                && summary.num_matches() >= original.num_matches()
        } else {
            let comparer = OriginalAlignmentComparer::new(self.options.softclip_mismatch_margin());
            match comparer.compare(Some(summary), Some(original)) {
                Preference::First | Preference::Tie => true,
                Preference::Second => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realignment::options::JudgerOptionsBuilder;
    use crate::reference::GenomeSnippet;
    use rust_htslib::bam::record::CigarString;
    use std::convert::TryFrom;

    fn summary(position: i64, cigar: &str, read: &[u8]) -> AlignmentSummary {
        let reference = GenomeSnippet::new("chr1".to_owned(), b"ACGTACGTACGTTTGGCCAA".to_vec(), 0);
        let cigar = CigarString::try_from(cigar).unwrap();
        AlignmentSummary::compute(position, &cigar, read, &vec![30; read.len()], &reference, true)
            .unwrap()
    }

    #[test]
    fn test_is_suspicious() {
        let judger = RealignmentJudger::default();
        assert!(!judger.is_suspicious(&summary(1, "8M", b"ACGTACGT")));
        assert!(judger.is_suspicious(&summary(1, "8M", b"ACGTTCGT")));
        assert!(judger.is_suspicious(&summary(1, "4M1I3M", b"ACGTTACG")));

        let clipped = summary(3, "2S6M", b"TTGTACGT");
        assert!(!judger.is_suspicious(&clipped));
        let judger = RealignmentJudger::new(
            JudgerOptionsBuilder::default()
                .realign_clean_softclipped_reads(true)
                .build()
                .unwrap(),
        );
        assert!(judger.is_suspicious(&clipped));
    }
}
