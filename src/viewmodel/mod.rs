pub mod details;
pub mod observable;
pub mod recipes;
