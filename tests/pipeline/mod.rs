//! End-to-end pipeline tests exercised through the public `a7c::pipeline`
//! API rather than any single stage's internals.

mod backends;
mod report;
