//! Service-account authentication: assertion signing and token exchange.

pub mod assertion;
pub mod exchange;

pub use assertion::{signed_assertion, Assertion};
pub use exchange::{HttpTokenExchanger, TokenExchanger, TokenGrant};
