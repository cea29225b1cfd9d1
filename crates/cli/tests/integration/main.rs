mod apply_tests;
mod common;
mod info_tests;
mod plan_tests;
