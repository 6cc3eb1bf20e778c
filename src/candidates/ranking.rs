// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Ordering;

use crate::candidates::CandidateIndel;

/// Search order over candidate indels: known before novel, longer before shorter,
/// more observations first, then by ascending position.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRanker;

impl IndelRanker {
    pub fn compare(&self, a: &CandidateIndel, b: &CandidateIndel) -> Ordering {
        b.is_known()
            .cmp(&a.is_known())
            .then_with(|| b.length().cmp(&a.length()))
            .then_with(|| b.observation_count().cmp(&a.observation_count()))
            .then_with(|| a.position().cmp(&b.position()))
    }

    /// Sort in place. The sort is stable, so indels that compare equal keep their input order.
    pub fn rank(&self, indels: &mut [CandidateIndel]) {
        indels.sort_by(|a, b| self.compare(a, b));
    }

    pub fn ranked<'a>(&self, indels: &'a [CandidateIndel]) -> Vec<&'a CandidateIndel> {
        let mut ranked: Vec<_> = indels.iter().collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked
    }
}
