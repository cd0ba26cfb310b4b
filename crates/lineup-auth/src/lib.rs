//! # lineup-auth
//!
//! Session handling for the roster client: a [`SessionGate`] that signs
//! in against a [`CredentialProvider`], classifies failures into coarse
//! [`SignInError`] variants, and publishes the resulting
//! [`Session`](lineup_core::Session) over a watch channel.
//!
//! Two rules shape the gate:
//!
//! - **Classification prefers structure**: a machine-readable error code
//!   decides the variant; message wording is only a fallback, and
//!   unmatched errors pass their message through unchanged.
//! - **Sign-out cannot fail**: the local session clears before the
//!   provider is called, and provider failures are logged, never
//!   returned.
//!
//! [`CredentialProvider`]: lineup_store::CredentialProvider

mod error;
mod gate;

pub use error::SignInError;
pub use gate::SessionGate;
