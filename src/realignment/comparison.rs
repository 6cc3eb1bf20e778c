// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Pairwise comparison of alignment summaries.
//!
//! All numeric thresholds used to weigh mismatches against indels live in this module.

use std::cmp::Ordering;

use crate::realignment::summary::AlignmentSummary;

/// Mismatch difference at which an alignment loses regardless of anything else.
const MAX_MISMATCH_DIFFERENCE: u32 = 3;
/// Up to this many mismatches, a single indel is preferred over several with equal indel bases.
const MAX_MISMATCHES_FOR_SINGLE_INDEL_PREFERENCE: u32 = 2;
/// Mismatch qualities only break ties when both alignments have between 1 and this many mismatches.
const MAX_MISMATCHES_FOR_QUALITY_TIEBREAK: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Preference {
    First,
    Second,
    Tie,
}

impl Preference {
    /// The preference seen from the other side.
    pub fn invert(self) -> Self {
        match self {
            Preference::First => Preference::Second,
            Preference::Second => Preference::First,
            Preference::Tie => Preference::Tie,
        }
    }

    fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Preference::First,
            Ordering::Greater => Preference::Second,
            Ordering::Equal => Preference::Tie,
        }
    }
}

pub trait AlignmentComparer {
    /// Decide which of the two alignments is preferable. A missing summary stands for a
    /// failed alignment.
    fn compare(&self, a: Option<&AlignmentSummary>, b: Option<&AlignmentSummary>) -> Preference;
}

/// Symmetric comparison between two candidate realignments.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAlignmentComparer;

impl AlignmentComparer for BasicAlignmentComparer {
    fn compare(&self, a: Option<&AlignmentSummary>, b: Option<&AlignmentSummary>) -> Preference {
        match (a, b) {
            (None, None) => Preference::Tie,
            (Some(_), None) => Preference::First,
            (None, Some(_)) => Preference::Second,
            (Some(a), Some(b)) => compare_summaries(a, b),
        }
    }
}

fn compare_summaries(a: &AlignmentSummary, b: &AlignmentSummary) -> Preference {
    if a.num_mismatches() >= b.num_mismatches() + MAX_MISMATCH_DIFFERENCE {
        return Preference::Second;
    }
    if b.num_mismatches() >= a.num_mismatches() + MAX_MISMATCH_DIFFERENCE {
        return Preference::First;
    }

    // a single mismatch is cheaper than several indels
    let single_mismatch_only = |x: &AlignmentSummary, y: &AlignmentSummary| {
        x.num_mismatches() == 1 && x.num_indels() == 0 && y.num_indels() > 1
    };
    if single_mismatch_only(a, b) {
        return Preference::First;
    }
    if single_mismatch_only(b, a) {
        return Preference::Second;
    }

    if a.num_mismatches() != b.num_mismatches() {
        return Preference::from_ordering(a.num_mismatches().cmp(&b.num_mismatches()));
    }

    if a.num_indel_bases() == b.num_indel_bases()
        && a.num_mismatches() <= MAX_MISMATCHES_FOR_SINGLE_INDEL_PREFERENCE
    {
        if a.num_indels() == 1 && b.num_indels() > 1 {
            return Preference::First;
        }
        if b.num_indels() == 1 && a.num_indels() > 1 {
            return Preference::Second;
        }
    }

    let qualities_decide = |x: &AlignmentSummary| {
        (1..=MAX_MISMATCHES_FOR_QUALITY_TIEBREAK).contains(&x.num_mismatches())
    };
    if qualities_decide(a) && qualities_decide(b) {
        let by_quality = a
            .sum_of_mismatching_qualities()
            .cmp(&b.sum_of_mismatching_qualities());
        if by_quality != Ordering::Equal {
            return Preference::from_ordering(by_quality);
        }
    }

    Preference::from_ordering(a.num_indels().cmp(&b.num_indels()))
}

/// Comparison of a realignment (first argument) against the original alignment (second
/// argument). A candidate has to clearly improve on the original to be preferred.
#[derive(Debug, Clone, Copy, new)]
pub struct OriginalAlignmentComparer {
    softclip_mismatch_margin: u32,
}

impl Default for OriginalAlignmentComparer {
    fn default() -> Self {
        OriginalAlignmentComparer::new(2)
    }
}

impl AlignmentComparer for OriginalAlignmentComparer {
    fn compare(
        &self,
        candidate: Option<&AlignmentSummary>,
        original: Option<&AlignmentSummary>,
    ) -> Preference {
        let (candidate, original) = match (candidate, original) {
            (Some(candidate), Some(original)) => (candidate, original),
            _ => return BasicAlignmentComparer.compare(candidate, original),
        };

        if candidate.num_mismatches() >= original.num_mismatches() + MAX_MISMATCH_DIFFERENCE
            || candidate.num_mismatches_including_softclip()
                >= original.num_mismatches_including_softclip() + MAX_MISMATCH_DIFFERENCE
        {
            return Preference::Second;
        }

        if original.num_mismatches_including_softclip()
            >= candidate.num_mismatches_including_softclip() + self.softclip_mismatch_margin
            && candidate.num_mismatches() <= original.num_mismatches()
        {
            return Preference::First;
        }

        // trading exactly one mismatch for one more indel
        if candidate.num_indels() == original.num_indels() + 1
            && candidate.num_mismatches() + 1 == original.num_mismatches()
        {
            return if original.num_mismatches() == 1
                && original.num_indels() == 0
                && candidate.num_indel_bases() == 1
            {
                Preference::First
            } else {
                Preference::Second
            };
        }

        compare_summaries(candidate, original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::GenomeSnippet;
    use itertools::iproduct;
    use rust_htslib::bam::record::CigarString;
    use std::convert::TryFrom;

    const REFERENCE: &[u8] = b"ACGTACGTACGTTTGGCCAAGGCATTCAGTCAGGTCA";

    fn summary_at(position: i64, cigar: &str, read: &[u8], quals: u8) -> AlignmentSummary {
        let reference = GenomeSnippet::new("chr1".to_owned(), REFERENCE.to_vec(), 0);
        let cigar = CigarString::try_from(cigar).unwrap();
        let quals = vec![quals; read.len()];
        AlignmentSummary::compute(position, &cigar, read, &quals, &reference, true).unwrap()
    }

    fn summary(cigar: &str, read: &[u8], quals: u8) -> AlignmentSummary {
        summary_at(1, cigar, read, quals)
    }

    fn summaries() -> Vec<AlignmentSummary> {
        vec![
            summary("12M", b"ACGTACGTACGT", 30),
            summary("12M", b"ACGTACCTACGT", 30),
            summary("12M", b"ACGTACCTACGT", 10),
            summary("12M", b"ACGAACCTACGA", 30),
            summary("12M", b"TTTTACGTACGT", 30),
            summary("4M1I7M", b"ACGTTACGTACG", 30),
            summary("4M1I3M1D4M", b"ACGTTACGACGT", 30),
            summary("4M2D8M", b"ACGTGTACGTTT", 30),
            summary("2M1I2M1I7M", b"ACTGTAACGTACG", 20),
            summary("4M1I7M", b"ACGTTACCTACG", 30),
            summary_at(3, "2S10M", b"TTGTACGTACGT", 30),
        ]
    }

    #[test]
    fn test_basic_is_antisymmetric() {
        let summaries = summaries();
        for (a, b) in iproduct!(&summaries, &summaries) {
            let forward = BasicAlignmentComparer.compare(Some(a), Some(b));
            let backward = BasicAlignmentComparer.compare(Some(b), Some(a));
            assert_eq!(forward, backward.invert(), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_none_loses() {
        let s = summary("12M", b"ACGTACGTACGT", 30);
        assert_eq!(BasicAlignmentComparer.compare(Some(&s), None), Preference::First);
        assert_eq!(BasicAlignmentComparer.compare(None, Some(&s)), Preference::Second);
        assert_eq!(BasicAlignmentComparer.compare(None, None), Preference::Tie);
    }

    #[test]
    fn test_basic_rules() {
        let clean = summary("12M", b"ACGTACGTACGT", 30);
        let one_mismatch = summary("12M", b"ACGTACCTACGT", 30);
        let one_mismatch_low_qual = summary("12M", b"ACGTACCTACGT", 10);
        let three_mismatches = summary("12M", b"TTTTACGTACGT", 30);
        let insertion = summary("4M1I7M", b"ACGTTACGTACG", 30);
        let two_indels = summary("4M1I3M1D4M", b"ACGTTACGACGT", 30);

        assert_eq!(
            BasicAlignmentComparer.compare(Some(&insertion), Some(&three_mismatches)),
            Preference::First
        );
        assert_eq!(
            BasicAlignmentComparer.compare(Some(&one_mismatch), Some(&two_indels)),
            Preference::First
        );
        assert_eq!(
            BasicAlignmentComparer.compare(Some(&one_mismatch_low_qual), Some(&one_mismatch)),
            Preference::First
        );
        assert_eq!(
            BasicAlignmentComparer.compare(Some(&clean), Some(&insertion)),
            Preference::First
        );
        assert_eq!(
            BasicAlignmentComparer.compare(Some(&one_mismatch), Some(&one_mismatch)),
            Preference::Tie
        );
    }

    #[test]
    fn test_original_comparer() {
        let comparer = OriginalAlignmentComparer::default();
        let clean = summary("12M", b"ACGTACGTACGT", 30);
        let one_mismatch = summary("12M", b"ACGTACCTACGT", 30);
        let insertion = summary("4M1I7M", b"ACGTTACGTACG", 30);
        let insertion_with_mismatch = summary("4M1I7M", b"ACGTTACCTACG", 30);
        let deletion = summary("4M2D8M", b"ACGTGTACGTTT", 30);
        let clipped = summary_at(3, "2S10M", b"TTGTACGTACGT", 30);

        // original is clean, any mismatch loses
        assert_eq!(
            comparer.compare(Some(&insertion_with_mismatch), Some(&clean)),
            Preference::Second
        );
        // one-for-one trade with a single inserted base
        assert_eq!(
            comparer.compare(Some(&insertion), Some(&one_mismatch)),
            Preference::First
        );
        // one-for-one trade with a multi base indel
        assert_eq!(
            comparer.compare(Some(&deletion), Some(&one_mismatch)),
            Preference::Second
        );
        // resolves two clipped mismatches
        assert_eq!(comparer.compare(Some(&clean), Some(&clipped)), Preference::First);
        assert_eq!(comparer.compare(None, Some(&clean)), Preference::Second);
    }
}
