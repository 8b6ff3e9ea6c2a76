use domains::PostOrdering;

/// Maps a sort token to an ordering. Unknown tokens, including the empty
/// string, fall back to newest-first.
pub fn resolve(sort_key: &str) -> PostOrdering {
    match sort_key {
        "recent" => PostOrdering::Recent,
        "hot" => PostOrdering::Hot,
        _ => PostOrdering::Created,
    }
}
