extern crate source_span;

pub mod charset;
pub mod automaton;
pub mod regexp;
pub mod generate;

pub use charset::{CharSet, MAX_CHAR, MIN_CHAR};
pub use automaton::{Automaton, DictionaryBuilder, StateId, Transition};
pub use regexp::{AutomatonProvider, RegExp, Syntax};
pub use generate::Xeger;
