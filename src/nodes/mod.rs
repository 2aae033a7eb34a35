//! Built-in node types.

mod combine;
mod shapes;
mod transform;

use crate::node::repository::NodeRepository;

pub use combine::{merge, resample};
pub use shapes::{ellipse, line, number, rect, star};
pub use transform::{copy, transform};

/// Register every built-in type.
pub fn register_builtins(repo: &mut NodeRepository) {
    for ty in [
        rect(),
        ellipse(),
        star(),
        line(),
        number(),
        transform(),
        copy(),
        merge(),
        resample(),
    ] {
        repo.register(ty);
    }
}
