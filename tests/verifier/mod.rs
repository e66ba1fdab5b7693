//! Step definitions and scenarios for the verifier feature.

mod bdd_steps;
mod scenarios;
mod test_helpers;
