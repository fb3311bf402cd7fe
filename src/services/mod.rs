// src/services/mod.rs

pub mod gate;
pub mod grading;
pub mod lookup;
pub mod quiz_window;

#[cfg(test)]
pub(crate) mod testing;
