#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod exercise;
mod graph;
mod manager;
mod name;
mod path;
mod service;
mod validation;
mod visualization;
mod workout;

pub use error::*;
pub use exercise::*;
pub use graph::*;
pub use manager::*;
pub use name::*;
pub use path::*;
pub use service::*;
pub use validation::*;
pub use visualization::*;
pub use workout::*;
