// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use derive_builder::Builder;

fn default_min_repeat_anchor() -> u32 {
    10
}

fn default_min_insertion_size_to_allow_mismatching_bases() -> u32 {
    5
}

fn default_max_proportion_insert_sequence_mismatch() -> f64 {
    0.2
}

fn default_max_candidates_per_read() -> usize {
    10
}

fn default_softclip_mismatch_margin() -> u32 {
    2
}

fn default_pair_specific_max_mismatch_increase() -> u32 {
    2
}

fn enabled() -> bool {
    true
}

/// Tuning of the read realigner.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize, Serialize, CopyGetters)]
#[builder(pattern = "owned")]
#[getset(get_copy = "pub")]
pub struct RealignerOptions {
    /// Minimal number of read bases on either side of an indel inside a repeat.
    #[builder(default = "default_min_repeat_anchor()")]
    #[serde(default = "default_min_repeat_anchor")]
    min_repeat_anchor: u32,
    /// Inserted sequences of at least this length may differ from the candidate allele.
    #[builder(default = "default_min_insertion_size_to_allow_mismatching_bases()")]
    #[serde(default = "default_min_insertion_size_to_allow_mismatching_bases")]
    min_insertion_size_to_allow_mismatching_bases: u32,
    /// Maximal fraction of inserted bases that may mismatch the candidate allele.
    #[builder(default = "default_max_proportion_insert_sequence_mismatch()")]
    #[serde(default = "default_max_proportion_insert_sequence_mismatch")]
    max_proportion_insert_sequence_mismatch: f64,
    /// Insertions at read ends shorter than this are softclipped.
    #[builder(default)]
    #[serde(default)]
    min_unanchored_insertion_length: u32,
    /// Softclip insertions at read ends that do not cover the full candidate.
    #[builder(default = "true")]
    #[serde(default = "enabled")]
    mask_partial_insertion: bool,
    /// Try pairs of co-occurring candidates.
    #[builder(default = "true")]
    #[serde(default = "enabled")]
    realign_pairs: bool,
    /// Re-clip mismatching stretches inside the original softclips.
    #[builder(default = "true")]
    #[serde(default = "enabled")]
    remask_softclips: bool,
    /// Only re-clip N bases.
    #[builder(default)]
    #[serde(default)]
    mask_ns_only: bool,
    /// Keep original softclips entirely.
    #[builder(default)]
    #[serde(default)]
    keep_probe_softclips: bool,
    #[builder(default = "true")]
    #[serde(default = "enabled")]
    check_softclips_for_mismatches: bool,
    #[builder(default = "default_max_candidates_per_read()")]
    #[serde(default = "default_max_candidates_per_read")]
    max_candidates_per_read: usize,
}

impl Default for RealignerOptions {
    fn default() -> Self {
        RealignerOptions {
            min_repeat_anchor: default_min_repeat_anchor(),
            min_insertion_size_to_allow_mismatching_bases:
                default_min_insertion_size_to_allow_mismatching_bases(),
            max_proportion_insert_sequence_mismatch:
                default_max_proportion_insert_sequence_mismatch(),
            min_unanchored_insertion_length: 0,
            mask_partial_insertion: true,
            realign_pairs: true,
            remask_softclips: true,
            mask_ns_only: false,
            keep_probe_softclips: false,
            check_softclips_for_mismatches: true,
            max_candidates_per_read: default_max_candidates_per_read(),
        }
    }
}

/// Acceptance criteria for realignments.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize, Serialize, CopyGetters)]
#[builder(pattern = "owned")]
#[getset(get_copy = "pub")]
pub struct JudgerOptions {
    /// Realign reads without mismatches or indels if they carry softclips.
    #[builder(default)]
    #[serde(default)]
    realign_clean_softclipped_reads: bool,
    /// Reduction of mismatches (softclips included) that lets a realignment win outright.
    #[builder(default = "default_softclip_mismatch_margin()")]
    #[serde(default = "default_softclip_mismatch_margin")]
    softclip_mismatch_margin: u32,
    #[builder(default = "default_pair_specific_max_mismatch_increase()")]
    #[serde(default = "default_pair_specific_max_mismatch_increase")]
    pair_specific_max_mismatch_increase: u32,
}

impl Default for JudgerOptions {
    fn default() -> Self {
        JudgerOptions {
            realign_clean_softclipped_reads: false,
            softclip_mismatch_margin: default_softclip_mismatch_margin(),
            pair_specific_max_mismatch_increase: default_pair_specific_max_mismatch_increase(),
        }
    }
}
