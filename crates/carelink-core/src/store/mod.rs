// # Credential Store Implementations
//
// This module provides implementations of the CredentialStore trait for
// different persistence strategies. Platform-specific secure stores
// (Keychain, Keystore) live outside the workspace and implement the same
// trait.

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
