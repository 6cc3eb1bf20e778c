// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use rayon::prelude::*;

use crate::candidates::{CandidateIndel, IndelRanker};
use crate::read::Read;
use crate::realignment::judger::RealignmentJudger;
use crate::realignment::result::RealignmentResult;
use crate::realignment::summary::AlignmentSummary;
use crate::realignment::{GenomeSnippets, ReadRealigner};

#[derive(Debug, Clone, Display)]
pub enum RealignmentOutcome {
    /// The original alignment is not suspicious.
    Skipped,
    /// No candidate could be spliced into the read.
    NoRealignment,
    /// The best realignment equals the original alignment.
    Unchanged,
    /// The best realignment does not improve on the original alignment.
    Rejected(RealignmentResult),
    Realigned(RealignmentResult),
}

impl RealignmentOutcome {
    pub fn realigned(&self) -> Option<&RealignmentResult> {
        match self {
            RealignmentOutcome::Realigned(result) => Some(result),
            _ => None,
        }
    }

    /// The best realignment, whether it was kept or not.
    pub fn result(&self) -> Option<&RealignmentResult> {
        match self {
            RealignmentOutcome::Realigned(result) | RealignmentOutcome::Rejected(result) => {
                Some(result)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, new)]
pub struct RealignmentDriver {
    realigner: ReadRealigner,
    judger: RealignmentJudger,
}

impl RealignmentDriver {
    /// Candidates near the read, best ranked first and at most as many as configured.
    pub fn candidates_for<'a>(
        &self,
        read: &Read,
        candidates: &'a [CandidateIndel],
    ) -> Vec<&'a CandidateIndel> {
        let padding = read.len() as i64;
        let (start, end) = (
            read.unclipped_start() - padding,
            read.unclipped_end() + padding,
        );
        let mut nearby: Vec<_> = candidates
            .iter()
            .filter(|indel| indel.position() >= start && indel.position() <= end)
            .collect();
        nearby.sort_by(|a, b| IndelRanker.compare(a, b));
        nearby.truncate(self.realigner.options().max_candidates_per_read());
        nearby
    }

    pub fn realign_read(
        &self,
        read: &Read,
        candidates: &[CandidateIndel],
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> Result<RealignmentOutcome> {
        let nearby: Vec<CandidateIndel> = self
            .candidates_for(read, candidates)
            .into_iter()
            .cloned()
            .collect();
        let snippet = match nearby.first() {
            Some(indel) => match snippets.get(indel) {
                Some(snippet) => snippet,
                None => {
                    warn!("no reference window for {}, skipping read {}", indel, read.name());
                    return Ok(RealignmentOutcome::NoRealignment);
                }
            },
            None => return Ok(RealignmentOutcome::NoRealignment),
        };

        let original = match AlignmentSummary::compute(
            read.position(),
            read.cigar(),
            read.sequence(),
            read.qualities(),
            snippet,
            self.realigner.options().check_softclips_for_mismatches(),
        ) {
            Some(summary) => summary,
            None => {
                warn!(
                    "original alignment of read {} exceeds the reference window, skipping",
                    read.name()
                );
                return Ok(RealignmentOutcome::NoRealignment);
            }
        };
        if !self.judger.is_suspicious(&original) {
            return Ok(RealignmentOutcome::Skipped);
        }

        let result = match self
            .realigner
            .realign(read, &nearby, snippets, pair_specific)?
        {
            Some(result) => result,
            None => return Ok(RealignmentOutcome::NoRealignment),
        };

        Ok(if self.judger.is_unchanged(&result, read) {
            RealignmentOutcome::Unchanged
        } else if self
            .judger
            .is_better_or_equal(&result, &original, pair_specific)
        {
            RealignmentOutcome::Realigned(result)
        } else {
            RealignmentOutcome::Rejected(result)
        })
    }

    /// Realign reads in parallel. Outcomes are in the order of the reads.
    pub fn realign_reads(
        &self,
        reads: &[Read],
        candidates: &[CandidateIndel],
        snippets: &GenomeSnippets,
        pair_specific: bool,
    ) -> Result<Vec<RealignmentOutcome>> {
        reads
            .par_iter()
            .map(|read| self.realign_read(read, candidates, snippets, pair_specific))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realignment::options::RealignerOptionsBuilder;
    use crate::reference::GenomeSnippet;
    use bio_types::strand::Strand;

    const REFERENCE: &[u8] = b"CGTATGCTCACGAGTCGACTCGTGCGAGCGTAGATCAGTATGCAGACTGCAGCTAGTCGTGATGTCAGTGAGTCGCTACGCTAGCTCAGCTGCACGCAGCTGTATCATAGCAGACATACG";

    fn setup() -> (Vec<CandidateIndel>, GenomeSnippets) {
        let candidates = vec![
            CandidateIndel::new("chr1", 1030, b"G", b"GCGTA").unwrap(),
            CandidateIndel::new("chr1", 1118, b"TA", b"T").unwrap(),
        ];
        let snippets = candidates
            .iter()
            .map(|indel| {
                (
                    indel.clone(),
                    GenomeSnippet::new("chr1".to_owned(), REFERENCE.to_vec(), 1000),
                )
            })
            .collect();
        (candidates, snippets)
    }

    fn read(name: &str, sequence: &[u8]) -> Read {
        let cigar = format!("{}M", sequence.len());
        Read::with_cigar_str(
            name,
            sequence,
            &vec![30; sequence.len()],
            1011,
            &cigar,
            Strand::Forward,
        )
        .unwrap()
    }

    #[test]
    fn test_candidates_for() {
        let (candidates, _) = setup();
        let driver = RealignmentDriver::default();
        let read = read("r1", b"CGAGTCGACTCGTGCGAGCG");
        let nearby = driver.candidates_for(&read, &candidates);
        assert_eq!(nearby, vec![&candidates[0]]);

        let driver = RealignmentDriver::new(
            ReadRealigner::new(
                RealignerOptionsBuilder::default()
                    .max_candidates_per_read(0)
                    .build()
                    .unwrap(),
            ),
            RealignmentJudger::default(),
        );
        assert!(driver.candidates_for(&read, &candidates).is_empty());
    }

    #[test]
    fn test_realign_reads() {
        let (candidates, snippets) = setup();
        let reads = vec![
            read("realigned", b"CGAGTCGACTCGTGCGAGCGCGTATAGATCAGTATGCAGA"),
            read("clean", b"CGAGTCGACTCGTGCGAGCGTAGATCAGTATGCAGACTGC"),
        ];
        let driver = RealignmentDriver::default();
        let outcomes = driver
            .realign_reads(&reads, &candidates, &snippets, false)
            .unwrap();

        let result = outcomes[0].realigned().unwrap();
        assert_eq!(result.cigar().to_string(), "20M4I16M");
        assert!(matches!(outcomes[1], RealignmentOutcome::Skipped));
    }
}
