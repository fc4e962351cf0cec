//! Chain queries.

pub mod account;
pub mod blocks;
pub mod mapper;
pub mod neurons;
pub mod storage;
