mod predicate;
mod rule;
mod selector;
mod structure;
mod value;

pub use predicate::*;
pub use rule::*;
pub use selector::*;
pub use structure::*;
pub use value::*;
