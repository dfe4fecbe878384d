//! Test support utilities.

pub mod mocks;
