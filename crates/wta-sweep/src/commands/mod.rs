pub mod clean;
pub mod doctor;
pub mod plan;
pub mod run;
pub mod scripts;
