use std::future::Future;
use std::pin::Pin;

use crate::{ModelRequest, ProviderId, RequestOutcome};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One vendor family behind a common request contract.
///
/// `request` never fails outright: every failure, including validation and
/// transport errors, is captured into the returned [`RequestOutcome`].
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// True when the secret or endpoint this family needs is configured.
    fn check_credential(&self) -> bool;

    fn request<'a>(&'a self, request: ModelRequest) -> ProviderFuture<'a, RequestOutcome>;
}
