// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("read {name} has {seq_len} bases but {qual_len} quality values")]
    QualityLengthMismatch {
        name: String,
        seq_len: usize,
        qual_len: usize,
    },
    #[error("invalid cigar string '{cigar}' for read {name}")]
    InvalidCigar { name: String, cigar: String },
    #[error("invalid indel at {chrom}:{pos} ({ref_allele}>{alt_allele}): {msg}")]
    InvalidIndel {
        chrom: String,
        pos: i64,
        ref_allele: String,
        alt_allele: String,
        msg: String,
    },
    #[error("invalid indel key '{key}', expected CHROM:POS REF>ALT")]
    InvalidIndelKey { key: String },
    #[error("read {name} does not have any mappable bases after realignment")]
    NoMappableBases { name: String },
    #[error("unable to compute alignment summary for read {name}: alignment at {position} with cigar {cigar} exceeds the reference window")]
    MissingEditDistance {
        name: String,
        position: i64,
        cigar: String,
    },
    #[error("contig {contig} not found in reference")]
    UnknownContig { contig: String },
    #[error("invalid testcase: {msg}")]
    InvalidTestcase { msg: String },
    #[error("testcase expected {expected}, found {found}")]
    UnexpectedOutcome { expected: String, found: String },
}

pub(crate) fn invalid_indel(
    chrom: &str,
    pos: i64,
    ref_allele: &[u8],
    alt_allele: &[u8],
    msg: &str,
) -> Error {
    Error::InvalidIndel {
        chrom: chrom.to_owned(),
        pos,
        ref_allele: String::from_utf8_lossy(ref_allele).into_owned(),
        alt_allele: String::from_utf8_lossy(alt_allele).into_owned(),
        msg: msg.to_owned(),
    }
}
