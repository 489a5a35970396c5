//! C ABI shared between the locker and loadable modules.

pub mod abi;
pub mod safety;
