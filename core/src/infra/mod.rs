//! Infrastructure layer - persistence engine and transport boundary

pub mod db;
pub mod rpc;
