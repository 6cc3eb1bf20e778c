// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Indel-aware realignment of reads.
//!
//! A read is laid out without gaps from either of its ends and candidate indels are spliced
//! into that layout. Each splice is validated and summarized against the reference, and the
//! best alignment found is brought back onto the full read by the `SoftclipReapplier`.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use itertools::Itertools;

use crate::candidates::{CandidateIndel, IndelRanker};
use crate::errors::Error;
use crate::read::Read;
use crate::reference::GenomeSnippet;

pub mod comparison;
pub mod driver;
pub mod judger;
pub mod options;
pub mod position_map;
pub mod result;
pub mod softclips;
pub mod splice;
pub mod summary;

pub use comparison::{
    AlignmentComparer, BasicAlignmentComparer, OriginalAlignmentComparer, Preference,
};
pub use driver::{RealignmentDriver, RealignmentOutcome};
pub use judger::RealignmentJudger;
pub use options::{JudgerOptions, JudgerOptionsBuilder, RealignerOptions, RealignerOptionsBuilder};
pub use position_map::{PositionMap, UNMAPPED};
pub use result::{RealignmentReport, RealignmentResult};
pub use softclips::SoftclipReapplier;
pub use splice::{Anchor, Rejection};
pub use summary::AlignmentSummary;

use splice::{Splicer, TrimmedRead};

/// Reference windows of the candidate indels.
pub type GenomeSnippets = HashMap<CandidateIndel, GenomeSnippet>;

/// Realigns reads against candidate indels.
#[derive(Debug, Clone, Default, new)]
pub struct ReadRealigner {
    options: RealignerOptions,
}

impl ReadRealigner {
    pub fn options(&self) -> &RealignerOptions {
        &self.options
    }

    /// Find the best realignment of the read through one or two of the given candidates.
    ///
    /// Returns `None` if no candidate could be spliced into the read. Whether the result
    /// improves on the original alignment is up to the `RealignmentJudger`.
    pub fn realign(
        &self,
        read: &Read,
        candidates: &[CandidateIndel],
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> Result<Option<RealignmentResult>> {
        let trimmed = TrimmedRead::new(read);
        if trimmed.is_empty() {
            debug!("read {} consists of Ns only, skipping", read.name());
            return Ok(None);
        }

        let ranked = IndelRanker.ranked(candidates);
        let mut result = match self.best_alignment(&trimmed, &ranked, snippets, pair_specific) {
            Some(result) => result,
            None => return Ok(None),
        };

        let snippet = result
            .accepted_indels
            .first()
            .and_then(|indel| snippets.get(indel))
            .ok_or_else(|| Error::MissingEditDistance {
                name: read.name().to_owned(),
                position: result.position,
                cigar: result.cigar.to_string(),
            })?;
        SoftclipReapplier::new(&self.options).reapply(
            &mut result,
            read,
            trimmed.n_prefix,
            trimmed.n_suffix,
            snippet,
        )?;

        debug!(
            "realigned read {} to {} {} (attempts: {}, sketchy: {})",
            read.name(),
            result.position,
            result.cigar,
            result.attempts,
            result.is_sketchy
        );
        Ok(Some(result))
    }

    /// Search the best alignment over the candidates in ranked order, before softclips are
    /// reapplied. Terminal Ns are not part of the returned alignment.
    pub fn get_best_alignment(
        &self,
        read: &Read,
        candidates: &[CandidateIndel],
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> Option<RealignmentResult> {
        let trimmed = TrimmedRead::new(read);
        if trimmed.is_empty() {
            return None;
        }
        let ranked = IndelRanker.ranked(candidates);
        self.best_alignment(&trimmed, &ranked, snippets, pair_specific)
    }

    /// Splice the given indels into the read in exactly the given order.
    pub fn splice_indels(
        &self,
        read: &Read,
        indels: &[&CandidateIndel],
        anchor: Anchor,
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> std::result::Result<RealignmentResult, Rejection> {
        let trimmed = TrimmedRead::new(read);
        if trimmed.is_empty() || indels.is_empty() {
            return Err(Rejection::NoAnchor);
        }
        Splicer::new(&self.options, snippets, pair_specific).splice(&trimmed, indels, anchor)
    }

    fn best_alignment(
        &self,
        read: &TrimmedRead,
        ranked: &[&CandidateIndel],
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> Option<RealignmentResult> {
        let splicer = Splicer::new(&self.options, snippets, pair_specific);
        let mut best = None;
        let mut attempts = 0;

        for &indel in ranked {
            let left = attempt(&splicer, read, &[indel], Anchor::Left);
            let right = attempt(&splicer, read, &[indel], Anchor::Right);
            attempts += 2;

            best = better(best, better(left, right));
            if best.as_ref().map_or(false, RealignmentResult::is_perfect) {
                return best.map(|result| with_attempts(result, attempts));
            }
        }

        if self.options.realign_pairs() {
            for (i, &first) in ranked.iter().enumerate() {
                for &second in &ranked[i + 1..] {
                    if !first.can_coexist(second) {
                        continue;
                    }
                    let pair = [first, second]
                        .iter()
                        .copied()
                        .sorted_by(|a, b| splice_order(a, b))
                        .collect_vec();
                    let candidate = attempt(&splicer, read, &pair, Anchor::Left);
                    attempts += 1;
                    best = better(best, candidate);
                }
            }
        }

        best.map(|result| with_attempts(result, attempts))
    }
}

/// Co-occurring indels are spliced by position, insertions before deletions.
fn splice_order(a: &CandidateIndel, b: &CandidateIndel) -> Ordering {
    a.position()
        .cmp(&b.position())
        .then_with(|| b.is_insertion().cmp(&a.is_insertion()))
}

fn attempt(
    splicer: &Splicer,
    read: &TrimmedRead,
    indels: &[&CandidateIndel],
    anchor: Anchor,
) -> Option<RealignmentResult> {
    match splicer.splice(read, indels, anchor) {
        Ok(result) => Some(result),
        Err(rejection) => {
            let keys = indels.iter().map(|indel| indel.key()).join(", ");
            if rejection.is_failure() {
                warn!(
                    "unable to evaluate {}-anchored splice of {} into read {}: {}",
                    anchor, keys, read.name, rejection
                );
            } else {
                trace!(
                    "rejected {}-anchored splice of {} into read {}: {}",
                    anchor,
                    keys,
                    read.name,
                    rejection
                );
            }
            None
        }
    }
}

/// The better of both, the first on ties.
fn better(
    a: Option<RealignmentResult>,
    b: Option<RealignmentResult>,
) -> Option<RealignmentResult> {
    let preference = BasicAlignmentComparer.compare(
        a.as_ref().map(RealignmentResult::summary),
        b.as_ref().map(RealignmentResult::summary),
    );
    match preference {
        Preference::Second => b,
        Preference::First | Preference::Tie => a,
    }
}

fn with_attempts(mut result: RealignmentResult, attempts: u32) -> RealignmentResult {
    result.attempts = attempts;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use bio_types::strand::Strand;

    // positions 1001 to 1120
    const REFERENCE: &[u8] = b"CGTATGCTCACGAGTCGACTCGTGCGAGCGTAGATCAGTATGCAGACTGCAGCTAGTCGTGATGTCAGTGAGTCGCTACGCTAGCTCAGCTGCACGCAGCTGTATCATAGCAGACATACG";
    // positions 2001 to 2051, with a run of six As at 2020
    const REPEAT_REFERENCE: &[u8] = b"ACGTCAGCTAGCATCGCTGAAAAAACGTGCATCGATGCTAGCATGACTGCA";

    fn read(sequence: &[u8], position: i64) -> Read {
        let cigar = format!("{}M", sequence.len());
        Read::with_cigar_str(
            "read",
            sequence,
            &vec![30; sequence.len()],
            position,
            &cigar,
            Strand::Forward,
        )
        .unwrap()
    }

    fn indel(pos: i64, ref_allele: &[u8], alt_allele: &[u8]) -> CandidateIndel {
        CandidateIndel::new("chr1", pos, ref_allele, alt_allele).unwrap()
    }

    fn snippets(indels: &[&CandidateIndel], reference: &[u8], start: i64) -> GenomeSnippets {
        indels
            .iter()
            .map(|&indel| {
                let snippet = GenomeSnippet::new("chr1".to_owned(), reference.to_vec(), start);
                (indel.clone(), snippet)
            })
            .collect()
    }

    #[test]
    fn test_clean_insertion_short_circuits() {
        let _ = env_logger::builder().is_test(true).try_init();
        let insertion = indel(1030, b"G", b"GCGTA").known(true);
        let decoy = indel(1040, b"ATG", b"A").observations(3);
        let snippets = snippets(&[&insertion, &decoy], REFERENCE, 1000);
        // CGAGTCGACTCGTGCGAGCG [CGTA] TAGATCAGTATGCAGA
        let read = read(b"CGAGTCGACTCGTGCGAGCGCGTATAGATCAGTATGCAGA", 1011);
        let realigner = ReadRealigner::default();
        let candidates = vec![decoy.clone(), insertion.clone()];

        let best = realigner
            .get_best_alignment(&read, &candidates, &snippets, false)
            .unwrap();
        assert_eq!(best.attempts(), 2);

        let result = realigner
            .realign(&read, &candidates, &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(result.position(), 1011);
        assert_eq!(result.cigar().to_string(), "20M4I16M");
        assert_eq!(result.summary().num_mismatches(), 0);
        assert_eq!(result.summary().num_indels(), 1);
        assert_eq!(result.indel_read_indices(), &[20]);
        assert_eq!(result.accepted_indels(), &[insertion]);
        assert!(!result.is_sketchy());

        let original = AlignmentSummary::compute(
            read.position(),
            read.cigar(),
            read.sequence(),
            read.qualities(),
            &snippets[&decoy],
            true,
        )
        .unwrap();
        let judger = RealignmentJudger::default();
        assert!(judger.is_suspicious(&original));
        assert!(!judger.is_unchanged(&result, &read));
        assert!(judger.is_better_or_equal(&result, &original, false));
    }

    #[test]
    fn test_inserted_sequence_mismatch_tolerance() {
        let insertion = indel(1060, b"T", b"TGACCA");
        let snippets = snippets(&[&insertion], REFERENCE, 1000);
        let candidates = vec![insertion];
        let realigner = ReadRealigner::default();

        // one of five inserted bases differs (GTCCA)
        let read = read(b"GACTGCAGCTAGTCGTGTCCAGATGTCAGTGAGTCGCTACG", 1045);
        let result = realigner
            .realign(&read, &candidates, &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(result.cigar().to_string(), "16M5I20M");
        assert_eq!(result.nified_read_indices(), &[17]);

        // two of five inserted bases differ (GTCGA)
        let read = self::read(b"GACTGCAGCTAGTCGTGTCGAGATGTCAGTGAGTCGCTACG", 1045);
        assert!(realigner
            .realign(&read, &candidates, &snippets, false)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_repeat_anchor_boundary() {
        let insertion = indel(1070, b"G", b"GCA").repeat(0);
        let snippets = snippets(&[&insertion], REFERENCE, 1000);
        let realigner = ReadRealigner::default();

        // nine bases before the insertion
        let short = read(b"ATGTCAGTGCAAGTCGCTACGCTAGCTCAGC", 1062);
        assert_eq!(
            realigner
                .splice_indels(&short, &[&insertion], Anchor::Left, &snippets, false)
                .unwrap_err(),
            Rejection::InsufficientRepeatAnchor
        );
        let sketchy = realigner
            .splice_indels(&short, &[&insertion], Anchor::Left, &snippets, true)
            .unwrap();
        assert!(sketchy.is_sketchy());
        assert_eq!(sketchy.cigar().to_string(), "9M2I20M");

        // ten bases before the insertion
        let anchored = read(b"GATGTCAGTGCAAGTCGCTACGCTAGCTCAGC", 1061);
        let result = realigner
            .splice_indels(&anchored, &[&insertion], Anchor::Left, &snippets, false)
            .unwrap();
        assert!(!result.is_sketchy());
        assert_eq!(result.cigar().to_string(), "10M2I20M");
    }

    #[test]
    fn test_ambiguous_repeat_deletion() {
        let deletion = indel(2019, b"GAA", b"G").repeat(4);
        let snippets = snippets(&[&deletion], REPEAT_REFERENCE, 2000);
        let candidates = vec![deletion];
        let realigner = ReadRealigner::default();
        // GCTG [AA] AAAACGTGCATCGATGCTAG
        let read = read(b"GCTGAAAACGTGCATCGATGCTAG", 2016);

        assert!(realigner
            .realign(&read, &candidates, &snippets, false)
            .unwrap()
            .is_none());

        let result = realigner
            .realign(&read, &candidates, &snippets, true)
            .unwrap()
            .unwrap();
        assert!(result.is_sketchy());
        assert_eq!(result.position(), 2016);
        assert_eq!(result.cigar().to_string(), "4M2D20M");
    }

    #[test]
    fn test_coexisting_indels() {
        let insertion = indel(1030, b"G", b"GCGTA");
        let deletion = indel(1050, b"CAGC", b"C");
        let (insertion_key, deletion_key) = (insertion.key(), deletion.key());
        let insertion = insertion.partner(&deletion_key);
        let deletion = deletion.partner(&insertion_key);
        let snippets = snippets(&[&insertion, &deletion], REFERENCE, 1000);
        let read = read(
            b"CGAGTCGACTCGTGCGAGCGCGTATAGATCAGTATGCAGACTGCTAGTCGTGATGTCAGTGAGTCG",
            1011,
        );
        let realigner = ReadRealigner::default();

        let result = realigner
            .realign(&read, &[deletion.clone(), insertion.clone()], &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(result.cigar().to_string(), "20M4I20M3D22M");
        assert_eq!(result.summary().num_mismatches(), 0);
        assert_eq!(result.attempts(), 5);
        assert_eq!(result.indel_read_indices(), &[20, 43]);

        // splicing the deletion first places it at the wrong read position
        let wrong_order = realigner
            .splice_indels(&read, &[&deletion, &insertion], Anchor::Left, &snippets, false)
            .unwrap();
        assert_ne!(wrong_order.cigar(), result.cigar());
        assert!(wrong_order.summary().num_mismatches() > 0);

        // without pair search, the insertion alone is the best we get
        let realigner = ReadRealigner::new(
            RealignerOptionsBuilder::default()
                .realign_pairs(false)
                .build()
                .unwrap(),
        );
        let single = realigner
            .realign(&read, &[deletion, insertion], &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(single.summary().num_indels(), 1);
        assert_eq!(single.attempts(), 4);
    }

    #[test]
    fn test_original_preferred() {
        let deletion = indel(1030, b"GTAG", b"G");
        let snippets = snippets(&[&deletion], REFERENCE, 1000);
        let read = read(b"CGAGTCGACTCGTGCGAGCGTAGATCAGTATGCAGACTGC", 1011);
        let original = AlignmentSummary::compute(
            read.position(),
            read.cigar(),
            read.sequence(),
            read.qualities(),
            &snippets[&deletion],
            true,
        )
        .unwrap();
        assert_eq!(original.num_mismatches(), 0);

        let result = ReadRealigner::default()
            .realign(&read, &[deletion], &snippets, false)
            .unwrap()
            .unwrap();
        assert!(result.summary().num_mismatches() > 0);

        let judger = RealignmentJudger::default();
        assert!(!judger.is_suspicious(&original));
        assert!(!judger.is_better_or_equal(&result, &original, false));
    }

    #[test]
    fn test_terminal_ns() {
        let insertion = indel(1030, b"G", b"GCGTA");
        let snippets = snippets(&[&insertion], REFERENCE, 1000);
        let read = Read::with_cigar_str(
            "read",
            b"NNCGAGTCGACTCGTGCGAGCGCGTATAGATCAGTATGCAGANN",
            &[30; 44],
            1011,
            "2S40M2S",
            Strand::Forward,
        )
        .unwrap();

        let result = ReadRealigner::default()
            .realign(&read, &[insertion], &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(result.position(), 1011);
        assert_eq!(result.cigar().to_string(), "2S20M4I16M2S");
        assert_eq!(result.indel_read_indices(), &[22]);
    }

    #[test]
    fn test_partial_insertion_stays_masked() {
        // the read ends two bases into the insertion TGCA
        let reference = b"GATCCTAGGCATTGACCGTATGCAAGTCTGAC";
        let insertion = indel(120, b"A", b"ATGCA");
        let snippets = snippets(&[&insertion], reference, 100);
        let read = read(b"GATCCTAGGCATTGACCGTATG", 101);

        let result = ReadRealigner::default()
            .realign(&read, &[insertion], &snippets, false)
            .unwrap()
            .unwrap();
        assert_eq!(result.position(), 101);
        assert_eq!(result.cigar().to_string(), "20M2S");
        assert_eq!(result.summary().num_indels(), 0);
        assert_eq!(result.summary().num_softclips(), 2);
    }
}
