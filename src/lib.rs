pub mod analyzers;
pub mod book;
pub mod config;
pub mod error;
pub mod output;
pub mod semester;
pub mod store;
pub mod system;

pub use analyzers::aggregate::{aggregate, display_grades};
pub use analyzers::convert::{convert, denormalize, normalize};
pub use analyzers::types::{DisplayGrade, DisplayLabel, DisplayPreference, Grade, GradeAggregate};
pub use error::GradeError;
pub use system::{GradeRange, GradeSystem, grade_range};
