//! Integration test entry point
//!
//! Groups the wiremock-based Web API tests into one binary.

mod common;
mod test_tickets;
mod test_webapp;
