//! The application-facing seam: one call per parsed request.

use std::future::Future;

use crate::http::request::Request;
use crate::http::response::Response;

/// Application logic invoked once per request.
///
/// Returning `None` makes the session answer `500 Internal Server Error`.
pub trait Handler: Send + Sync + 'static {
    fn serve(&self, request: &Request) -> impl Future<Output = Option<Response>> + Send;
}

/// Adapts a synchronous closure into a [`Handler`].
pub struct FnHandler<F>(pub F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
{
    async fn serve(&self, request: &Request) -> Option<Response> {
        (self.0)(request)
    }
}
