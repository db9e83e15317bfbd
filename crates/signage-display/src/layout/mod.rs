//! Declarative layout: the tree model and the interpreter that turns it into
//! page structure.

mod interpreter;
mod node;

pub use interpreter::{Exclusions, Placement, interpret, load_data, realize_sizes};
pub use node::{Content, LayoutNode, LayoutTree, Loader};
