//! Crate-level integration and BDD tests.

pub(crate) mod support;
