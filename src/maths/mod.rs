//! Numeric support: the deterministic process RNG and the special functions
//! backing the significance kernel.

pub mod special;
