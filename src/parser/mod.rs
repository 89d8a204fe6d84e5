//! Parser combinators over a [`TokenCursor`].
//!
//! - `state`: the cursor, its backtrack stack and the outcome types
//! - `combinators`: `and`, `or`, `many`, `optional`, `attempt`, `label`, `map`
//! - `primitives`: `any_of`, `any_except`, `end_of_input`
//! - `runner`: `run` and `run_on_string`

mod combinators;
mod primitives;
mod runner;
mod state;

pub use combinators::*;
pub use primitives::*;
pub use runner::*;
pub use state::*;
