#![warn(clippy::pedantic)]

pub mod json;
pub mod log;
