// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod payment;
pub mod quiz;
pub mod quiz_window;
