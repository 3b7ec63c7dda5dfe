//! Outbound HTTP clients for the VEPS service roles.
//!
//! Provides the shared keep-alive transport, the bearer-token cache used on
//! service-to-service calls, and clients for the three downstream surfaces:
//! the validator (`HttpValidatorClient` implements the router's
//! [`IntegrityHandler`](veps_pipeline::IntegrityHandler)), the context store
//! (`HttpContextStore` implements [`ContextStore`](veps_store::ContextStore)),
//! and the fracture archive (`HttpFractureArchive` implements
//! [`FractureArchive`](veps_fracture::FractureArchive)).

pub mod error;
pub mod fracture;
pub mod store;
pub mod token;
pub mod transport;
pub mod validator;

pub use error::{ClientError, ClientResult};
pub use fracture::HttpFractureArchive;
pub use store::HttpContextStore;
pub use token::{IssuedToken, StaticTokenSource, TokenCache, TokenSource};
pub use transport::HttpTransport;
pub use validator::HttpValidatorClient;
