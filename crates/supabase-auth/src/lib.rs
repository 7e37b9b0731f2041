//! Supabase auth provider for Session Keeper.
//!
//! This crate provides:
//! - Email/password sign-in against the Supabase Auth REST API
//! - Token refresh and sign-out through the [`AuthProvider`] boundary
//! - Mapping of GoTrue failures onto typed [`AuthError`]s
//!
//! [`AuthProvider`]: session_refresh::AuthProvider
//! [`AuthError`]: session_refresh::AuthError

mod errors;
mod provider;

#[cfg(test)]
mod test_server;

pub use provider::SupabaseAuthProvider;
