pub mod labels;
pub mod status;
