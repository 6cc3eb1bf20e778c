// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate strum_macros;

pub mod candidates;
pub mod cli;
pub mod errors;
pub mod read;
pub mod realignment;
pub mod reference;
pub mod testcase;
pub mod utils;

pub use crate::candidates::{CandidateIndel, IndelType};
pub use crate::read::Read;
pub use crate::realignment::{GenomeSnippets, ReadRealigner, RealignmentDriver, RealignmentResult};
pub use crate::reference::GenomeSnippet;
