pub mod cache;
pub mod denomination;
pub mod dividend;
pub mod error;
pub mod flows;
pub mod ledger;
pub mod model;
pub mod selection;
