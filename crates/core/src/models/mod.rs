pub mod course;
pub mod credential;
pub mod email;
pub mod school;
pub mod sync;
pub mod teacher;
pub mod term;
