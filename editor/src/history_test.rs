use super::*;

fn entry(tag: &str) -> HistoryEntry {
    HistoryEntry {
        bitmap: format!("data:image/png;base64,{tag}"),
        layers: LayerStack::new(),
        selected_id: None,
        background: "#ffffff".into(),
    }
}

fn tags(history: &History) -> Vec<String> {
    history
        .entries()
        .iter()
        .map(|e| e.bitmap.trim_start_matches("data:image/png;base64,").to_owned())
        .collect()
}

#[test]
fn new_history_is_empty() {
    let history = History::default();
    assert!(history.is_empty());
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert!(history.current().is_none());
    assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
}

#[test]
fn single_entry_cannot_undo() {
    let mut history = History::default();
    history.record(entry("a"));
    assert!(!history.can_undo());
    assert!(history.undo().is_none());
    assert_eq!(history.cursor(), 0);
}

#[test]
fn undo_and_redo_move_cursor() {
    let mut history = History::default();
    history.record(entry("a"));
    history.record(entry("b"));
    history.record(entry("c"));

    assert_eq!(history.undo().map(|e| e.bitmap.clone()), Some(entry("b").bitmap));
    assert_eq!(history.undo().map(|e| e.bitmap.clone()), Some(entry("a").bitmap));
    assert!(history.undo().is_none());

    assert_eq!(history.redo().map(|e| e.bitmap.clone()), Some(entry("b").bitmap));
    assert_eq!(history.redo().map(|e| e.bitmap.clone()), Some(entry("c").bitmap));
    assert!(history.redo().is_none());
}

#[test]
fn record_after_undo_discards_redo_tail() {
    let mut history = History::default();
    history.record(entry("a"));
    history.record(entry("b"));
    history.record(entry("c"));
    history.undo();
    history.undo();
    history.record(entry("d"));

    assert_eq!(tags(&history), vec!["a", "d"]);
    assert!(!history.can_redo());
    assert_eq!(history.cursor(), 1);
}

#[test]
fn limit_drops_oldest_entries() {
    let mut history = History::new(3);
    for tag in ["a", "b", "c", "d", "e"] {
        history.record(entry(tag));
    }
    assert_eq!(tags(&history), vec!["c", "d", "e"]);
    assert_eq!(history.cursor(), 2);
    assert_eq!(history.current().map(|e| e.bitmap.clone()), Some(entry("e").bitmap));
}

#[test]
fn zero_limit_is_raised_to_one() {
    let mut history = History::new(0);
    history.record(entry("a"));
    history.record(entry("b"));
    assert_eq!(tags(&history), vec!["b"]);
}

#[test]
fn entry_serde_round_trip_keeps_selection() {
    let mut e = entry("x");
    e.selected_id = Some(uuid::Uuid::new_v4());
    let json = serde_json::to_string(&e).unwrap();
    let back: HistoryEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
}
