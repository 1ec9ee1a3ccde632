//! Generic reconciliation of Terraform state against the appliance REST API

pub mod codec;
pub mod error;
pub mod locator;
pub mod reconciler;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use codec::{Intent, RestResource};
pub use error::ReconcileError;
pub use locator::{ListLocator, Locator};
pub use reconciler::Reconciler;
pub use transport::{RawResponse, Transport};
