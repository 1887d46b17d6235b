use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use super::types::{Role, Turn};
use crate::result::ExecutionResult;

static COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Visible turn history. Turns are never edited; at most one ready turn is live.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(content: &str) -> Turn {
        new_turn(Role::User, content)
    }

    pub fn assistant(content: &str) -> Turn {
        new_turn(Role::Assistant, content)
    }

    pub fn assistant_with(
        content: &str,
        snippet: Option<String>,
        result: Option<ExecutionResult>,
        ready: bool,
    ) -> Turn {
        let mut turn = new_turn(Role::Assistant, content);
        turn.snippet = snippet;
        turn.result = result;
        turn.ready = ready;
        turn
    }

    /// Appends `turn`; a new ready turn supersedes the previous one.
    pub fn push(&mut self, turn: Turn) -> Turn {
        if turn.ready {
            self.prune_ready();
        }
        self.turns.push(turn.clone());
        turn
    }

    /// Removes pending-confirmation turns and returns how many were dropped.
    pub fn prune_ready(&mut self) -> usize {
        let before = self.turns.len();
        self.turns.retain(|turn| !turn.ready);
        before - self.turns.len()
    }

    pub fn pending(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|turn| turn.ready)
    }

    /// The most recent `limit` turns, oldest first.
    pub fn list(&self, limit: usize) -> Vec<Turn> {
        let start = self.turns.len().saturating_sub(limit);
        self.turns[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

fn new_turn(role: Role, content: &str) -> Turn {
    Turn {
        id: next_id(),
        role,
        content: content.to_string(),
        snippet: None,
        result: None,
        ready: false,
        created_at: Utc::now(),
    }
}

fn next_id() -> String {
    let count = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("turn_{}_{}", Utc::now().timestamp_millis(), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(content: &str) -> Turn {
        Conversation::assistant_with(content, Some("{}".to_string()), None, true)
    }

    #[test]
    fn new_ready_turn_supersedes_old_one() {
        let mut log = Conversation::new();
        log.push(Conversation::user("create a db"));
        log.push(ready("first"));
        log.push(Conversation::user("use another name"));
        log.push(ready("second"));
        let turns = log.list(10);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns.iter().filter(|t| t.ready).count(), 1);
        assert_eq!(log.pending().map(|t| t.content.as_str()), Some("second"));
    }

    #[test]
    fn list_returns_latest_turns_in_order() {
        let mut log = Conversation::new();
        for idx in 0..5 {
            log.push(Conversation::user(&idx.to_string()));
        }
        let contents: Vec<String> = log.list(2).into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["3", "4"]);
        assert_eq!(log.list(100).len(), 5);
    }

    #[test]
    fn ids_are_unique() {
        let a = Conversation::user("a");
        let b = Conversation::user("b");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("turn_"));
    }

    #[test]
    fn prune_reports_removed_turns() {
        let mut log = Conversation::new();
        log.push(ready("pending"));
        assert_eq!(log.prune_ready(), 1);
        assert!(log.pending().is_none());
        assert!(log.is_empty());
    }
}
