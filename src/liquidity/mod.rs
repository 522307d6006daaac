pub mod approval;
pub mod burn;
pub mod currency;
pub mod error;
pub mod math;
pub mod method;
pub mod orchestrator;
pub mod permit;
pub mod pool;

pub use approval::{ApprovalState, ConfirmationPolicy};
pub use burn::{BurnField, PoolSnapshot};
pub use currency::CurrencyId;
pub use orchestrator::{AuthorizationOutcome, RemovalSession, RemovalSettings};
pub use pool::{PoolLocator, load_pool};
