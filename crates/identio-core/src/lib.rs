#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod clock;
mod config;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::IdentityConfig;
pub use token::{SystemTokens, TokenError, TokenSource};
