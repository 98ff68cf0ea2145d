// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to keep stack and change set ARNs apart at compile time.

mod id;
mod stack_name;

pub use id::{Arn, ChangeSetArn, StackArn};
pub use stack_name::{MAX_NAME_LEN, MAX_STACK_NAME_LEN, StackName, StackNameError};
