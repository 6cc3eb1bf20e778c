// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use crate::realignment::{RealignmentOutcome, RealignmentReport};
use crate::testcase::Testcase;

#[derive(Debug, StructOpt, Serialize, Deserialize, Clone)]
#[structopt(
    name = "indel-realigner",
    about = "Indel-aware realignment of sequencing reads against candidate indels.",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub enum IndelRealigner {
    #[structopt(
        name = "realign",
        about = "Realign the read of a YAML testcase against its candidate indels and print the outcome as JSON.",
        setting = structopt::clap::AppSettings::ColoredHelp
    )]
    Realign {
        #[structopt(parse(from_os_str), help = "YAML testcase with read, indels and reference.")]
        testcase: PathBuf,
        #[structopt(
            long = "pair-specific",
            help = "Treat the read as evidence for a pair-specific indel (overrides the testcase)."
        )]
        pair_specific: bool,
        #[structopt(
            long,
            help = "Fail if the outcome differs from the expectation stored in the testcase."
        )]
        check: bool,
        #[structopt(
            parse(from_os_str),
            long,
            help = "JSON file that shall contain the outcome (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(long, short, help = "Print debug messages.")]
        verbose: bool,
    },
}

impl IndelRealigner {
    pub fn is_verbose(&self) -> bool {
        match self {
            IndelRealigner::Realign { verbose, .. } => *verbose,
        }
    }
}

#[derive(Debug, Serialize)]
struct OutcomeReport {
    read: String,
    outcome: String,
    result: Option<RealignmentReport>,
}

impl OutcomeReport {
    fn new(read: &str, outcome: &RealignmentOutcome) -> Self {
        OutcomeReport {
            read: read.to_owned(),
            outcome: outcome.to_string(),
            result: outcome.result().map(RealignmentReport::from),
        }
    }
}

pub fn run(opt: IndelRealigner) -> Result<()> {
    match opt {
        IndelRealigner::Realign {
            testcase,
            pair_specific,
            check,
            output,
            ..
        } => {
            let mut testcase = Testcase::load(&testcase)?;
            testcase.pair_specific |= pair_specific;

            let outcome = testcase.run()?;
            info!("read {}: {}", testcase.read.name, outcome);

            let report = OutcomeReport::new(&testcase.read.name, &outcome);
            match output {
                Some(path) => serde_json::to_writer_pretty(File::create(path)?, &report)?,
                None => serde_json::to_writer_pretty(io::stdout(), &report)?,
            }

            if check {
                testcase.check(&outcome)?;
            }
        }
    }
    Ok(())
}
