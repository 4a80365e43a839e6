pub mod machine;
pub mod mode;
pub mod scores;
pub mod scoring;
