//! Target list parsing for teleport commands

/// Parse the raw target argument of a teleport command.
///
/// - Absent or blank input targets the actor themself
/// - Otherwise a comma-separated list of player names; segments are
///   trimmed, empty segments dropped, and duplicates keep their first
///   position
/// - Input consisting only of separators yields an empty list (the
///   command is accepted and moves nobody)
///
/// Names are never validated here; connectivity is the dispatcher's
/// concern.
pub fn parse_targets(raw: Option<&str>, actor_id: &str) -> Vec<String> {
    let Some(raw) = raw else {
        return vec![actor_id.to_string()];
    };
    if raw.trim().is_empty() {
        return vec![actor_id.to_string()];
    }

    let mut targets: Vec<String> = Vec::new();
    for segment in raw.split(',') {
        let name = segment.trim();
        if name.is_empty() {
            continue;
        }
        if !targets.iter().any(|t| t == name) {
            targets.push(name.to_string());
        }
    }
    targets
}
