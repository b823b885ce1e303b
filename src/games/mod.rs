//! Game implementations.

pub mod backgammon;
