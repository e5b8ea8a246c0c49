pub mod case_study;
pub mod showcase_item;
pub mod video;
