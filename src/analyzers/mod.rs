//! Grade conversion and aggregation.
//!
//! Converts grades between grading scales through a shared performance axis,
//! averages them per subject and overall, and labels American-scale values
//! with letters.

pub mod aggregate;
pub mod convert;
pub mod letter;
pub mod types;
pub mod utility;
