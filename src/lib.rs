//! Interim Power - mid-experiment statistical power estimation for A/B tests
//!
//! This library estimates how likely a running experiment is to detect its
//! target effect if it continues for the remaining days, under fixed-horizon
//! or sequential testing, from the interim statistics of a stats engine.

pub mod cli;
pub mod power;
