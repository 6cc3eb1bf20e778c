// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::{Mutex, RwLock};

use anyhow::Result;
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::errors::Error;

/// A window of the reference genome.
///
/// `start` is the 0-based genome offset of the first base, hence the 1-based reference
/// position `p` is found at `sequence[p - 1 - start]`.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct GenomeSnippet {
    #[getset(get = "pub")]
    chrom: String,
    #[getset(get = "pub")]
    sequence: Vec<u8>,
    #[getset(get_copy = "pub")]
    start: i64,
}

impl GenomeSnippet {
    /// Reference base at the given 1-based position, if covered by the window.
    pub fn base(&self, position: i64) -> Option<u8> {
        let idx = self.offset(position);
        if idx < 0 {
            None
        } else {
            self.sequence.get(idx as usize).copied()
        }
    }

    /// Offset of the given 1-based position within the window.
    fn offset(&self, position: i64) -> i64 {
        position - 1 - self.start
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A lazy buffer for reference sequences.
pub struct Buffer {
    reader: RwLock<fasta::IndexedReader<fs::File>>,
    sequences: Mutex<LruCache<String, Arc<Vec<u8>>>>,
    reference_path: Option<PathBuf>,
}

impl Buffer {
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, capacity: usize) -> Result<Self> {
        let fasta: fasta::IndexedReader<fs::File> = fasta::IndexedReader::from_file(&path)?;
        Ok(Buffer {
            reader: RwLock::new(fasta),
            sequences: Mutex::new(LruCache::with_capacity(capacity)),
            reference_path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn reference_path(&self) -> Option<&PathBuf> {
        self.reference_path.as_ref()
    }

    /// Load given chromosome and return it as a slice. This is O(1) if chromosome was loaded before.
    pub fn seq(&self, chrom: &str) -> Result<Arc<Vec<u8>>> {
        let mut sequences = self.sequences.lock().unwrap();

        if let Some(sequence) = sequences.get(chrom) {
            return Ok(Arc::clone(sequence));
        }

        let known = self
            .reader
            .read()
            .unwrap()
            .index
            .sequences()
            .iter()
            .any(|s| s.name == chrom);
        if !known {
            return Err(Error::UnknownContig {
                contig: chrom.to_owned(),
            }
            .into());
        }

        let mut sequence = Vec::new();
        {
            let mut reader = self.reader.write().unwrap();
            reader.fetch_all(chrom)?;
            reader.read(&mut sequence)?;
        }
        sequence.make_ascii_uppercase();
        let sequence = Arc::new(sequence);

        sequences.insert(chrom.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }

    /// Snippet of `radius` bases around the given 1-based position, clamped to the chromosome.
    pub fn snippet(&self, chrom: &str, position: i64, radius: u64) -> Result<GenomeSnippet> {
        let seq = self.seq(chrom)?;
        let center = cmp::max(position - 1, 0) as usize;
        let start = center.saturating_sub(radius as usize);
        let end = cmp::min(center + radius as usize + 1, seq.len());
        let start = cmp::min(start, end);

        Ok(GenomeSnippet::new(
            chrom.to_owned(),
            seq[start..end].to_owned(),
            start as i64,
        ))
    }
}
