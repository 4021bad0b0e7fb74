//! CLI command implementations.
//!
//! | Module  | Commands handled                   |
//! |---------|------------------------------------|
//! | `serve` | `Serve`                            |
//! | `apps`  | `List`, `Add`, `Remove`, `Move`    |

pub mod apps;
pub mod serve;

pub use apps::{cmd_add, cmd_list, cmd_move, cmd_remove};
pub use serve::cmd_serve;
