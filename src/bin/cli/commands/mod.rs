pub mod cards;
pub mod clear;
pub mod imagine;
pub mod profile;
pub mod review;
pub mod solve;
pub mod synthesize;
