pub mod document;
pub mod review;
pub mod settings;
