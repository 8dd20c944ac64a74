//! Command implementations, one module per command group

pub mod ec2;
pub mod lambda;
pub mod profile;
pub mod rds;
pub mod s3;
pub mod utils;
