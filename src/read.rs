// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::convert::TryFrom;
use std::str;

use anyhow::Result;
use bio_types::strand::Strand;
use rust_htslib::bam;
use rust_htslib::bam::record::CigarString;

use crate::errors::Error;
use crate::realignment::RealignmentResult;
use crate::utils::cigar;

/// A sequencing read together with its original alignment.
///
/// Positions are 1-based and refer to the first aligned (i.e. not softclipped) base.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Read {
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    sequence: Vec<u8>,
    #[getset(get = "pub")]
    qualities: Vec<u8>,
    #[getset(get_copy = "pub")]
    position: i64,
    #[getset(get = "pub")]
    cigar: CigarString,
    #[getset(get_copy = "pub")]
    strand: Strand,
}

impl Read {
    pub fn new(
        name: &str,
        sequence: &[u8],
        qualities: &[u8],
        position: i64,
        cigar: CigarString,
        strand: Strand,
    ) -> Result<Self> {
        if sequence.len() != qualities.len() {
            return Err(Error::QualityLengthMismatch {
                name: name.to_owned(),
                seq_len: sequence.len(),
                qual_len: qualities.len(),
            }
            .into());
        }
        if cigar::read_length(&cigar) as usize != sequence.len() {
            return Err(Error::InvalidCigar {
                name: name.to_owned(),
                cigar: cigar.to_string(),
            }
            .into());
        }
        Ok(Read {
            name: name.to_owned(),
            sequence: sequence.to_ascii_uppercase(),
            qualities: qualities.to_owned(),
            position,
            cigar,
            strand,
        })
    }

    /// Parse the cigar from its textual representation.
    pub fn with_cigar_str(
        name: &str,
        sequence: &[u8],
        qualities: &[u8],
        position: i64,
        cigar: &str,
        strand: Strand,
    ) -> Result<Self> {
        let cigar = CigarString::try_from(cigar).map_err(|_| Error::InvalidCigar {
            name: name.to_owned(),
            cigar: cigar.to_owned(),
        })?;
        Read::new(name, sequence, qualities, position, cigar, strand)
    }

    /// Build a read from a BAM record. Hardclips are dropped from the cigar since the
    /// clipped bases are not part of the record.
    pub fn from_record(record: &bam::Record) -> Result<Self> {
        let name = str::from_utf8(record.qname())?;
        let cigar = CigarString(
            record
                .cigar()
                .iter()
                .filter(|op| !matches!(op, bam::record::Cigar::HardClip(_)))
                .copied()
                .collect(),
        );
        let strand = if record.is_reverse() {
            Strand::Reverse
        } else {
            Strand::Forward
        };
        Read::new(
            name,
            &record.seq().as_bytes(),
            record.qual(),
            record.pos() + 1,
            cigar,
            strand,
        )
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn prefix_softclip(&self) -> u32 {
        cigar::prefix_softclip(&self.cigar)
    }

    pub fn suffix_softclip(&self) -> u32 {
        cigar::suffix_softclip(&self.cigar)
    }

    /// Last aligned reference position (1-based, inclusive).
    pub fn end_position(&self) -> i64 {
        self.position + cigar::reference_span(&self.cigar) as i64 - 1
    }

    /// Reference position the first read base would have if the softclip was aligned.
    pub fn unclipped_start(&self) -> i64 {
        self.position - self.prefix_softclip() as i64
    }

    /// Reference position the last read base would have if the softclip was aligned.
    pub fn unclipped_end(&self) -> i64 {
        self.end_position() + self.suffix_softclip() as i64
    }
}

/// Write position and cigar of a realignment back onto the given record.
pub fn apply_to_record(record: &mut bam::Record, result: &RealignmentResult) {
    let qname = record.qname().to_owned();
    let seq = record.seq().as_bytes();
    let qual = record.qual().to_owned();
    record.set(&qname, Some(result.cigar()), &seq, &qual);
    record.set_pos(result.position() - 1);
}
