pub mod db;
pub mod org;
pub mod plan;
pub mod token;
