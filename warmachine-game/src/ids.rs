//! Process-unique identifiers for log entries, hoards and generated entities.

use uuid::Uuid;

/// Create a fresh identifier string.
#[must_use]
pub fn create_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..256).map(|_| create_id()).collect();
        assert_eq!(ids.len(), 256);
    }
}
