//! Integration tests

mod e2e_test;
mod market_test;
mod reconnect_test;
mod support;
