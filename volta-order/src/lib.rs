pub mod ledger;
pub mod manager;
pub mod poller;
pub mod reconcile;

pub use ledger::ShopLedger;
pub use manager::{IntakeOutcome, IntakeRequest, OrderError, OrderManager};
pub use poller::{PollSummary, PollerConfig, StatusPoller};
pub use reconcile::normalize_status;
