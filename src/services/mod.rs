// Ledger core
pub mod consistency;
pub mod production_ledger;
pub mod status_aggregator;

// Master data
pub mod orders;
pub mod plans;
pub mod products;

pub use production_ledger::ProductionLedgerService;
pub use status_aggregator::StatusAggregatorService;
