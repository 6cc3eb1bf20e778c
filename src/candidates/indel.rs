// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::str::{self, FromStr};

use anyhow::Result;
use regex::Regex;

use crate::errors::{self, Error};
use crate::utils::bases_equal;

lazy_static! {
    static ref INDEL_KEY_RE: Regex =
        Regex::new(r"^(?P<chrom>[^:\s]+):(?P<pos>\d+)\s+(?P<ref>[ACGTNacgtn]+)>(?P<alt>[ACGTNacgtn]+)$")
            .unwrap();
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum IndelType {
    #[strum(serialize = "INS")]
    Insertion,
    #[strum(serialize = "DEL")]
    Deletion,
}

/// A candidate insertion or deletion that reads may be realigned against.
///
/// Positions are 1-based and point to the anchor base shared by REF and ALT, as in VCF.
/// Indels are expected to be left-aligned by the discovery stage that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct CandidateIndel {
    #[getset(get = "pub")]
    chrom: String,
    #[getset(get_copy = "pub")]
    position: i64,
    #[getset(get_copy = "pub")]
    indel_type: IndelType,
    #[getset(get_copy = "pub")]
    length: u32,
    #[getset(get = "pub")]
    ref_allele: Vec<u8>,
    #[getset(get = "pub")]
    alt_allele: Vec<u8>,
    #[getset(get_copy = "pub")]
    is_known: bool,
    #[getset(get_copy = "pub")]
    observation_count: u32,
    #[getset(get_copy = "pub")]
    is_repeat: bool,
    #[getset(get_copy = "pub")]
    is_duplication: bool,
    #[getset(get_copy = "pub")]
    num_approx_dups_left: u32,
    #[getset(get_copy = "pub")]
    num_approx_dups_right: u32,
    /// Reference bases following the indel that still belong to the repeat.
    #[getset(get_copy = "pub")]
    ref_bases_before_unique: u32,
    #[getset(get_copy = "pub")]
    in_multi: bool,
    #[getset(get = "pub")]
    other_indel: Option<String>,
}

impl CandidateIndel {
    /// Create a new candidate from VCF-style alleles. Type and length are derived from the
    /// alleles; the shorter allele has to consist of the anchor base only.
    pub fn new(chrom: &str, position: i64, ref_allele: &[u8], alt_allele: &[u8]) -> Result<Self> {
        let invalid = |msg| errors::invalid_indel(chrom, position, ref_allele, alt_allele, msg);

        if ref_allele.is_empty() || alt_allele.is_empty() {
            return Err(invalid("empty allele").into());
        }
        if position < 1 {
            return Err(invalid("position has to be 1-based").into());
        }
        if ref_allele.len() == alt_allele.len() {
            return Err(invalid("alleles of equal length do not describe an indel").into());
        }
        if ref_allele.len().min(alt_allele.len()) != 1 {
            return Err(invalid("shorter allele has to consist of the anchor base only").into());
        }
        if !bases_equal(ref_allele[0], alt_allele[0]) {
            return Err(invalid("alleles do not share the anchor base").into());
        }

        let (indel_type, length) = if alt_allele.len() > ref_allele.len() {
            (IndelType::Insertion, alt_allele.len() - ref_allele.len())
        } else {
            (IndelType::Deletion, ref_allele.len() - alt_allele.len())
        };

        Ok(CandidateIndel {
            chrom: chrom.to_owned(),
            position,
            indel_type,
            length: length as u32,
            ref_allele: ref_allele.to_ascii_uppercase(),
            alt_allele: alt_allele.to_ascii_uppercase(),
            is_known: false,
            observation_count: 0,
            is_repeat: false,
            is_duplication: false,
            num_approx_dups_left: 0,
            num_approx_dups_right: 0,
            ref_bases_before_unique: 0,
            in_multi: false,
            other_indel: None,
        })
    }

    pub fn known(mut self, is_known: bool) -> Self {
        self.is_known = is_known;
        self
    }

    pub fn observations(mut self, count: u32) -> Self {
        self.observation_count = count;
        self
    }

    /// Mark the indel as lying in a repeat that extends `ref_bases_before_unique` bases
    /// to the right of it.
    pub fn repeat(mut self, ref_bases_before_unique: u32) -> Self {
        self.is_repeat = true;
        self.ref_bases_before_unique = ref_bases_before_unique;
        self
    }

    pub fn duplication(mut self, is_duplication: bool) -> Self {
        self.is_duplication = is_duplication;
        self
    }

    pub fn approx_dups(mut self, left: u32, right: u32) -> Self {
        self.num_approx_dups_left = left;
        self.num_approx_dups_right = right;
        self
    }

    /// Link this indel to a co-occurring partner, given by its key.
    pub fn partner(mut self, other_indel: &str) -> Self {
        self.in_multi = true;
        self.other_indel = Some(other_indel.to_owned());
        self
    }

    pub fn is_insertion(&self) -> bool {
        self.indel_type == IndelType::Insertion
    }

    pub fn is_deletion(&self) -> bool {
        self.indel_type == IndelType::Deletion
    }

    /// Inserted (or deleted) bases without the anchor base.
    pub fn indel_sequence(&self) -> &[u8] {
        match self.indel_type {
            IndelType::Insertion => &self.alt_allele[1..],
            IndelType::Deletion => &self.ref_allele[1..],
        }
    }

    /// Whether any approximate duplicates of the indel sequence flank it.
    pub fn has_approx_dups(&self) -> bool {
        self.num_approx_dups_left + self.num_approx_dups_right > 0
    }

    /// Unique textual key of the form `CHROM:POS REF>ALT`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Whether the two indels were observed together and may be spliced into the same read.
    pub fn can_coexist(&self, other: &CandidateIndel) -> bool {
        if !(self.in_multi && other.in_multi) || self == other {
            return false;
        }
        let names = |indel: &CandidateIndel, partner: &CandidateIndel| {
            indel
                .other_indel
                .as_ref()
                .map_or(false, |key| *key == partner.key())
        };
        names(self, other) && names(other, self)
    }
}

impl fmt::Display for CandidateIndel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom,
            self.position,
            String::from_utf8_lossy(&self.ref_allele),
            String::from_utf8_lossy(&self.alt_allele)
        )
    }
}

impl FromStr for CandidateIndel {
    type Err = anyhow::Error;

    fn from_str(key: &str) -> Result<Self> {
        let captures = INDEL_KEY_RE
            .captures(key.trim())
            .ok_or_else(|| Error::InvalidIndelKey {
                key: key.to_owned(),
            })?;
        let pos: i64 = captures["pos"].parse()?;
        CandidateIndel::new(
            &captures["chrom"],
            pos,
            captures["ref"].as_bytes(),
            captures["alt"].as_bytes(),
        )
    }
}
