// src/auth/mod.rs
// =============================================================================
// This module handles Google service account authentication.
//
// Submodules:
// - token: Exchanges service account credentials for a bearer token
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod token;

// Re-export public items from submodules
// This lets users write `auth::Authenticator` instead of
// `auth::token::Authenticator`
pub use token::{AccessToken, Authenticator, ServiceAccountKey};
