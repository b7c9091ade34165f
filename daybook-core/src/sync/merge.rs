//! Merging of local and remote to-do lists.

use std::collections::HashMap;

use crate::models::TodoItem;

/// Combines two to-do lists into one, deduplicated by id.
///
/// Local items are inserted first, then remote ones. On an id collision the
/// remote item replaces the local one wholesale but keeps the local position;
/// remote-only ids are appended in remote order. Items with an empty id or
/// blank text are dropped and text is trimmed.
pub fn merge_todos(local: &[TodoItem], remote: &[TodoItem]) -> Vec<TodoItem> {
    let mut out: Vec<TodoItem> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in local.iter().chain(remote) {
        let text = item.text.trim();
        if item.id.is_empty() || text.is_empty() {
            continue;
        }
        let item = TodoItem {
            id: item.id.clone(),
            text: text.to_string(),
            done: item.done,
        };
        match index.get(&item.id) {
            Some(&pos) => out[pos] = item,
            None => {
                index.insert(item.id.clone(), out.len());
                out.push(item);
            }
        }
    }

    out
}
