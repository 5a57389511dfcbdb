//! Integer recurrences written in accumulator-passing style.
//!
//! Each function is a public wrapper plus a private engine whose recursive
//! call is its last action. The pair is declared inside [`tco::tco!`], which
//! turns those tail calls into iterations of a single loop, so evaluation
//! never grows the stack no matter how deep the recurrence goes.
//!
//! All arithmetic is on [`Word`] and wraps on overflow.

pub mod fact;
pub mod fib;
pub mod mult;
pub mod power;
pub mod product;

pub use fact::fact;
pub use fib::fib;
pub use mult::mult;
pub use power::power;
pub use product::product;

/// The machine word every recurrence works in.
pub type Word = u32;
