pub mod serialize;
pub mod binary_search;
