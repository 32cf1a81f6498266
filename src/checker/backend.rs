//! Checker trait shared by all data-source backends

#[cfg(test)]
use mockall::automock;

use crate::checker::error::CheckError;
use crate::external_data::ExternalData;

/// Trait for looking up the latest version of an external data record
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Short name of the backend, matching the `type` of its checker data
    fn name(&self) -> &'static str;

    /// Returns true if this checker handles `data`
    fn should_check(&self, data: &ExternalData) -> bool;

    /// Looks up the latest version of `data` and hands it to the recorder
    ///
    /// # Panics
    /// If `should_check(data)` is false; callers must only pass eligible records.
    async fn check(&self, data: &ExternalData) -> Result<(), CheckError>;
}
