//! Wire-agnostic types, the adapter contract, and the event system shared
//! by every `provider-gateway` crate.
//!
//! `provider-gateway-core` is the leaf of the workspace: it has no
//! knowledge of rate limiting or retries, only the shapes those components
//! pass between each other.

mod adapter;
mod clock;
mod config;
mod error;
pub mod events;
mod types;

pub use adapter::{Adapter, DEFAULT_CALL_CLASS};
pub use clock::{Clock, SystemClock, TestClock};
pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use error::{DispatchOutcome, GatewayError, GatewayResult};
pub use types::{NormalizedLimitInfo, NormalizedRequest, NormalizedResponse};
