#[cfg(any(test, feature = "test-support"))]
mod fake;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;
pub use session::GlpiSession;
pub use transport::{ApiRequest, ApiResponse, GlpiTransport, HttpTransport};
