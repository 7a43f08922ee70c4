pub mod constants;
pub mod gesture;
pub mod observation;
pub mod settings;
