//! The built-in sample suite.
//!
//! These test cases exercise nesting, subcases declared from helper
//! functions, BDD scenarios, failure aggregation across passes, re-entry
//! after fatal failures, identical sibling names, suites and skipping. Some of
//! them fail on purpose.

use crate::engine::Pass;
use crate::runner::TestCase;
use crate::SubcaseError;

pub const LOTS_OF_NESTED: &str = "lots of nested subcases";
pub const FROM_FUNCTION: &str = "subcases can be used in a separate function as well";
pub const VECTORS: &str = "Scenario: vectors can be sized and resized";
pub const FAIL_DESPITE_LAST: &str = "test case should fail even though the last subcase passes";
pub const REENTERED: &str = "fails from an exception but gets re-entered to traverse all subcases";
pub const NESTED_HELPERS: &str = "Nested - related to https://github.com/onqtam/doctest/issues/282";
pub const SUITE_CASE: &str = "suite1t1";
pub const WITH_DESC: &str = "with desc";
pub const SKIPPED: &str = "skipped";

pub fn sample_suite() -> Vec<TestCase> {
    vec![
        TestCase::new(LOTS_OF_NESTED, lots_of_nested),
        TestCase::new(FROM_FUNCTION, |pass| {
            call_func(pass)?;
            pass.message("lala");
            Ok(())
        }),
        TestCase::scenario("vectors can be sized and resized", vectors),
        TestCase::new(FAIL_DESPITE_LAST, |pass| {
            pass.subcase("one", |pass| {
                pass.check(false, "false");
                Ok(())
            })?;
            pass.subcase("two", |pass| {
                pass.check(true, "true");
                Ok(())
            })
        }),
        TestCase::new(REENTERED, |pass| {
            pass.subcase("level zero", |pass| {
                pass.subcase("one", |pass| pass.require(false, "false"))?;
                pass.subcase("two", |pass| pass.require(false, "false"))
            })
        }),
        TestCase::new(NESTED_HELPERS, |pass| {
            pass.subcase("generate data variant 1", |pass| {
                let data = 44;
                checks(pass, data)
            })?;
            pass.subcase("generate data variant 1", |pass| {
                let data = 80;
                checks(pass, data)
            })
        }),
        TestCase::new(SUITE_CASE, |_| Ok(())).in_suite("suite1"),
        TestCase::new(SUITE_CASE, |_| Ok(())).in_suite("suite1"),
        TestCase::new(SUITE_CASE, |_| Ok(())).in_suite("suite11"),
        TestCase::new(WITH_DESC, |_| Ok(())).with_description("shouldn't take more than 500ms"),
        TestCase::new(SKIPPED, |_| Ok(())).skipped(true),
    ]
}

fn lots_of_nested(pass: &mut Pass<'_>) -> Result<(), SubcaseError> {
    pass.message("root");
    pass.subcase("", |pass| {
        pass.message("1");
        pass.subcase("", |pass| {
            pass.message("1.1");
            Ok(())
        })
    })?;
    pass.subcase("", |pass| {
        pass.message("2");
        pass.subcase("", |pass| {
            pass.message("2.1");
            Ok(())
        })?;
        pass.subcase("", |pass| {
            // everything below must stay undiscovered
            pass.fail("")?;

            pass.message("2.2");
            pass.subcase("", |pass| {
                pass.message("2.2.1");
                pass.subcase("", |pass| {
                    pass.message("2.2.1.1");
                    Ok(())
                })?;
                pass.subcase("", |pass| {
                    pass.message("2.2.1.2");
                    Ok(())
                })
            })
        })?;
        pass.subcase("", |pass| {
            pass.message("2.3");
            Ok(())
        })?;
        pass.subcase("", |pass| {
            pass.message("2.4");
            Ok(())
        })
    })
}

fn call_func(pass: &mut Pass<'_>) -> Result<(), SubcaseError> {
    pass.subcase("from function...", |pass| {
        pass.message("print me twice");
        pass.subcase("sc1", |pass| {
            pass.message("hello! from sc1");
            Ok(())
        })?;
        pass.subcase("sc2", |pass| {
            pass.message("hello! from sc2");
            Ok(())
        })
    })
}

// The size expectations after `resize(10)` and `reserve(0)` are wrong on
// purpose; this scenario is expected to report two failed checks.
fn vectors(pass: &mut Pass<'_>) -> Result<(), SubcaseError> {
    pass.given("A vector with some items", |pass| {
        let mut v = vec![0_i32; 5];

        pass.require(v.len() == 5, "v.len() == 5")?;
        pass.require(v.capacity() >= 5, "v.capacity() >= 5")?;

        pass.when("the size is increased", |pass| {
            v.resize(10, 0);

            pass.then("the size and capacity change", |pass| {
                pass.check_eq(v.len(), 20);
                pass.check(v.capacity() >= 10, "v.capacity() >= 10");
                Ok(())
            })
        })?;
        pass.when("the size is reduced", |pass| {
            v.resize(0, 0);

            pass.then("the size changes but not capacity", |pass| {
                pass.check_eq(v.len(), 0);
                pass.check(v.capacity() >= 5, "v.capacity() >= 5");
                Ok(())
            })
        })?;
        pass.when("more capacity is reserved", |pass| {
            v.reserve(10);

            pass.then("the capacity changes but not the size", |pass| {
                pass.check_eq(v.len(), 5);
                pass.check(v.capacity() >= 10, "v.capacity() >= 10");
                Ok(())
            })
        })?;
        pass.when("less capacity is reserved", |pass| {
            v.reserve(0);

            pass.then("neither size nor capacity are changed", |pass| {
                pass.check_eq(v.len(), 10);
                pass.check(v.capacity() >= 5, "v.capacity() >= 5");
                Ok(())
            })
        })
    })
}

fn checks(pass: &mut Pass<'_>, data: i32) -> Result<(), SubcaseError> {
    pass.subcase("check data 1", |pass| pass.require(data % 2 == 0, "data % 2 == 0"))?;
    pass.subcase("check data 2", |pass| pass.require(data % 4 == 0, "data % 4 == 0"))
}
