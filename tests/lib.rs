use std::path::Path;

mod common;

use common::load_testcase;

macro_rules! testcase {
    ($name:ident) => {
        #[test]
        fn $name() {
            let name = stringify!($name);
            let mut testcase = load_testcase(
                &Path::new(file!())
                    .parent()
                    .unwrap()
                    .join("resources/testcases")
                    .join(name),
            )
            .unwrap();
            testcase.run().unwrap();
            testcase.check();
        }
    };
}

// known insertion fitting the read perfectly
testcase!(clean_insertion);
testcase!(insertion_with_mismatching_base);
testcase!(insertion_mismatch_limit);
testcase!(ambiguous_repeat_deletion);
testcase!(ambiguous_repeat_deletion_pair_specific);
testcase!(coexisting_indels);
testcase!(clean_read_not_realigned);
testcase!(terminal_ns);
