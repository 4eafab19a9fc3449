pub mod balance;
pub mod block;

pub use balance::Balance;
pub use block::{Operation, SignedBlock, Transaction, TransferOperation, TransferToVestingOperation};
