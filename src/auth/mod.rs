//! GitHub App authentication.
//!
//! An App proves its identity with an RS256 assertion signed by its private
//! key, then trades that assertion for an installation token scoped to one
//! repository. Tokens live about an hour and are cached per repository.

pub mod authenticator;
pub mod cache;
pub mod clock;
pub mod error;
pub mod jwt;

pub use authenticator::AppAuthenticator;
pub use cache::{CredentialCache, InstallationCredential, REFRESH_BUFFER_SECS};
pub use clock::{Clock, SystemClock};
pub use error::AuthError;
pub use jwt::{AppClaims, AppSigner, KeyEncoding, detect_encoding, normalize_pem};
