//! Transaction service client
//!
//! REST boundary to the relay collaborator: pending transactions,
//! proposals, confirmations, account info, best-effort gas estimation
//! and off-chain messages. Consumed, never reimplemented.

pub mod client;

pub use client::{
    Confirmation, MessageConfirmation, ProposeTransactionBody, SafeMessage, ServiceTransaction,
    TransactionService,
};
