//! # Repository Implementations
//!
//! One repository per aggregate. Plain reads go through the pool; every
//! method that participates in a multi-step operation takes
//! `&mut SqliteConnection` so the service layer owns the transaction
//! boundary. Guarded writes (`WHERE settled = 0`, `WHERE status = 'open'`,
//! `WHERE closed_at IS NULL`) report through `rows_affected`, and the
//! service maps a zero count to the matching domain rejection.

pub mod card;
pub mod installment;
pub mod ledger;
pub mod operator;
pub mod receipt;
pub mod register;
pub mod sale;
