//! Command handlers.
//!
//! | File          | Invocation              | Description                        |
//! |---------------|-------------------------|------------------------------------|
//! | `run.rs`      | `run-backup` (default)  | Authenticate, wake, trigger        |

pub mod run;
