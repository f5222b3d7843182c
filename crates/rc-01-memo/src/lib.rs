//! # RC-01 Memo Parser
//!
//! Decodes the intent attached to foreign-chain transactions.
//!
//! A memo is a `:`-separated ASCII string. The first field selects the
//! transaction type (case-insensitive, abbreviations allowed); the rest are
//! type-specific arguments.
//!
//! ```text
//! TYPE:ARG1[:ARG2[:ARG3]]
//! ```
//!
//! | Type | Arguments |
//! |------|-----------|
//! | `stake` / `st` / `+` | asset, asset address (required off the RUNE-hosting chains) |
//! | `unstake` / `withdraw` / `wd` / `-` | asset, basis points (default 10000) |
//! | `swap` / `s` / `=` | asset, destination (optional), slip limit (optional) |
//! | `add` / `a` / `%` | asset |
//! | `outbound`, `refund` | inbound tx id |
//! | `bond` | node address |
//! | `migrate`, `ragnarok`, `yggdrasil+`, `yggdrasil-` | block height |
//! | `leave`, `reserve`, `noop` | none |
//! | `switch` | destination address |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod memo;

pub use errors::MemoError;
pub use memo::Memo;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
