//! Maxima accepted for declared lengths before a record is rejected.
//!
//! A corrupt log can declare arbitrarily large counts; these bounds keep a
//! bad length from turning into a huge allocation before the truncation
//! check has a chance to fire.

pub(crate) const MAX_STRING_SIZE: usize = 100_000;
pub(crate) const MAX_GENERIC_ARITY: usize = 1_000;
