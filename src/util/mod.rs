pub mod intern;
pub mod src;
pub mod stack;

pub use self::{
    intern::{ident, Ident},
    src::Line,
    stack::ensure_sufficient_stack,
};
