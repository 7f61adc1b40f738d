pub mod author_repository;
pub mod post_repository;

pub use author_repository::{AuthorRepository, AuthorSeed};
pub use post_repository::{PostRepository, PostSeed};

use feedline_types::Patch;
use rusqlite::types::Value;

/// Append a SET fragment and parameter for one patched column.
/// `Keep` contributes nothing, `Clear` binds NULL.
pub(crate) fn push_assignment(
    assignments: &mut Vec<String>,
    params: &mut Vec<Value>,
    column: &str,
    patch: &Patch<String>,
) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => {
            assignments.push(format!("{column} = ?"));
            params.push(Value::Null);
        }
        Patch::Set(value) => {
            assignments.push(format!("{column} = ?"));
            params.push(Value::Text(value.clone()));
        }
    }
}
