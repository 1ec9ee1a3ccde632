//! Data source implementations

pub mod data_source_localpasswordpolicy;

pub use data_source_localpasswordpolicy::LocalPasswordPolicyDataSource;
