use std::path::Path;

use anyhow::Result;

use indel_realigner::realignment::RealignmentOutcome;
use indel_realigner::testcase::Testcase;

pub(crate) struct LoadedTestcase {
    inner: Testcase,
    outcome: Option<RealignmentOutcome>,
}

pub(crate) fn load_testcase(path: impl AsRef<Path>) -> Result<LoadedTestcase> {
    let _ = env_logger::builder().is_test(true).try_init();
    Ok(LoadedTestcase {
        inner: Testcase::load(path.as_ref().join("testcase.yaml"))?,
        outcome: None,
    })
}

impl LoadedTestcase {
    pub(crate) fn run(&mut self) -> Result<()> {
        self.outcome = Some(self.inner.run()?);
        Ok(())
    }

    pub(crate) fn check(&self) {
        let outcome = self
            .outcome
            .as_ref()
            .expect("bug: testcase has to be run before checking");
        if let Err(e) = self.inner.check(outcome) {
            panic!("{} (outcome: {:?})", e, outcome);
        }
    }
}
