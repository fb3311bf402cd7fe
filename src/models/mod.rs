// src/models/mod.rs

pub mod attempt;
pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod payment;
pub mod question;
pub mod quiz;
pub mod user;
