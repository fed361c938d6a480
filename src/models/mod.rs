pub mod account;
pub mod common;
pub mod generation;
pub mod pagination;
pub mod payment;
pub mod transaction;

pub use account::*;
pub use common::*;
pub use generation::*;
pub use pagination::*;
pub use payment::*;
pub use transaction::*;
