// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Self-contained realignment testcases.
//!
//! A testcase bundles a single read, the candidate indels around it, the reference window
//! they live in, the options to use and the expected outcome. Testcases are stored as YAML.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use bio_types::strand::Strand;

use crate::candidates::CandidateIndel;
use crate::errors::Error;
use crate::read::Read;
use crate::realignment::{
    GenomeSnippets, JudgerOptions, ReadRealigner, RealignerOptions, RealignmentDriver,
    RealignmentJudger, RealignmentOutcome,
};
use crate::reference::GenomeSnippet;
use crate::utils::decode_phred33;

const DEFAULT_QUALITY: u8 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestcaseRead {
    pub name: String,
    pub sequence: String,
    /// Phred+33 encoded. If omitted, every base gets a quality of 30.
    #[serde(default)]
    pub qualities: Option<String>,
    pub position: i64,
    pub cigar: String,
    #[serde(default)]
    pub reverse: bool,
}

/// Reference window. `start` is the position preceding the first base of `sequence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestcaseReference {
    pub chrom: String,
    pub start: i64,
    pub sequence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestcaseIndel {
    pub chrom: String,
    pub position: i64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    #[serde(default)]
    pub known: bool,
    #[serde(default)]
    pub observations: u32,
    /// Reference bases before the repeat becomes unique, if the indel lies in a repeat.
    #[serde(default)]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub duplication: bool,
    #[serde(default)]
    pub approx_dups: Option<(u32, u32)>,
    #[serde(default)]
    pub partner: Option<String>,
}

impl TestcaseIndel {
    fn candidate(&self) -> Result<CandidateIndel> {
        let mut indel = CandidateIndel::new(
            &self.chrom,
            self.position,
            self.ref_allele.as_bytes(),
            self.alt_allele.as_bytes(),
        )?
        .known(self.known)
        .observations(self.observations)
        .duplication(self.duplication);
        if let Some(ref_bases_before_unique) = self.repeat {
            indel = indel.repeat(ref_bases_before_unique);
        }
        if let Some((left, right)) = self.approx_dups {
            indel = indel.approx_dups(left, right);
        }
        if let Some(partner) = &self.partner {
            indel = indel.partner(partner);
        }
        Ok(indel)
    }
}

/// What the driver should report. Unset fields are not checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub realigned: bool,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub cigar: Option<String>,
    #[serde(default)]
    pub mismatches: Option<u32>,
    #[serde(default)]
    pub sketchy: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testcase {
    pub read: TestcaseRead,
    pub reference: TestcaseReference,
    pub indels: Vec<TestcaseIndel>,
    #[serde(default)]
    pub pair_specific: bool,
    #[serde(default)]
    pub realigner: RealignerOptions,
    #[serde(default)]
    pub judger: JudgerOptions,
    pub expected: Expectation,
}

impl Testcase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = File::open(path)
            .with_context(|| format!("unable to open testcase {}", path.display()))?;
        let testcase: Testcase = serde_yaml::from_reader(reader)
            .with_context(|| format!("unable to parse testcase {}", path.display()))?;
        Ok(testcase)
    }

    pub fn read(&self) -> Result<Read> {
        let sequence = self.read.sequence.as_bytes();
        let qualities = match &self.read.qualities {
            Some(qualities) => decode_phred33(qualities.as_bytes()),
            None => vec![DEFAULT_QUALITY; sequence.len()],
        };
        let strand = if self.read.reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        };
        Read::with_cigar_str(
            &self.read.name,
            sequence,
            &qualities,
            self.read.position,
            &self.read.cigar,
            strand,
        )
    }

    pub fn candidates(&self) -> Result<Vec<CandidateIndel>> {
        self.indels.iter().map(|indel| indel.candidate()).collect()
    }

    /// Every candidate is served the reference window of the testcase.
    pub fn snippets(&self, candidates: &[CandidateIndel]) -> Result<GenomeSnippets> {
        let snippet = GenomeSnippet::new(
            self.reference.chrom.clone(),
            self.reference.sequence.as_bytes().to_ascii_uppercase(),
            self.reference.start,
        );
        candidates
            .iter()
            .map(|indel| {
                if indel.chrom() != snippet.chrom() {
                    return Err(Error::InvalidTestcase {
                        msg: format!(
                            "indel {} is not located on reference contig {}",
                            indel,
                            snippet.chrom()
                        ),
                    }
                    .into());
                }
                Ok((indel.clone(), snippet.clone()))
            })
            .collect()
    }

    pub fn driver(&self) -> RealignmentDriver {
        RealignmentDriver::new(
            ReadRealigner::new(self.realigner.clone()),
            RealignmentJudger::new(self.judger.clone()),
        )
    }

    pub fn run(&self) -> Result<RealignmentOutcome> {
        let read = self.read()?;
        let candidates = self.candidates()?;
        let snippets = self.snippets(&candidates)?;
        self.driver()
            .realign_read(&read, &candidates, &snippets, self.pair_specific)
    }

    /// Compare an outcome against the expectation of the testcase.
    pub fn check(&self, outcome: &RealignmentOutcome) -> Result<()> {
        let unexpected = |field: &str, expected: String, found: String| -> Result<()> {
            Err(Error::UnexpectedOutcome {
                expected: format!("{} {}", field, expected),
                found: format!("{} {}", field, found),
            }
            .into())
        };

        let result = match (outcome.realigned(), self.expected.realigned) {
            (Some(result), true) => result,
            (None, false) => return Ok(()),
            (Some(result), false) => {
                return unexpected(
                    "outcome",
                    "no realignment".to_owned(),
                    format!("realignment {}:{}", result.position(), result.cigar()),
                )
            }
            (None, true) => {
                return unexpected(
                    "outcome",
                    "realignment".to_owned(),
                    format!("{:?}", outcome),
                )
            }
        };

        if let Some(position) = self.expected.position {
            if position != result.position() {
                return unexpected("position", position.to_string(), result.position().to_string());
            }
        }
        if let Some(cigar) = &self.expected.cigar {
            if *cigar != result.cigar().to_string() {
                return unexpected("cigar", cigar.clone(), result.cigar().to_string());
            }
        }
        if let Some(mismatches) = self.expected.mismatches {
            let found = result.summary().num_mismatches();
            if mismatches != found {
                return unexpected("mismatches", mismatches.to_string(), found.to_string());
            }
        }
        if let Some(sketchy) = self.expected.sketchy {
            if sketchy != result.is_sketchy() {
                return unexpected(
                    "sketchy",
                    sketchy.to_string(),
                    result.is_sketchy().to_string(),
                );
            }
        }
        Ok(())
    }
}
