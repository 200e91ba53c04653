pub mod commission;
pub mod finance;
pub mod gateway;
pub mod ledger;
pub mod processor;

pub use commission::CommissionService;
pub use finance::AdminAggregator;
pub use gateway::SimulatedGateway;
pub use ledger::BookingLedger;
pub use processor::{ChargeInput, PaymentProcessor};

#[cfg(test)]
pub(crate) mod testing;
