pub mod refresh;
pub mod closest;
pub mod details;
pub mod tag;
