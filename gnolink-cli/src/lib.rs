//! GnoLink CLI library.
//!
//! Subcommands for generating throwaway wallets, checking balances, and
//! funding a wallet from a local key.

pub mod commands;
