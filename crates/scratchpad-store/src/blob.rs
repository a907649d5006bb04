//! Stored value shapes.
//!
//! Three generations of the scratchpad wrote three different JSON values under
//! the state key:
//!
//! |------------|---------------------------------------------|----------------|
//! | Shape      | Example                                     | Upgrade        |
//! |------------|---------------------------------------------|----------------|
//! | Current    | `{"tabs":[...],"currentTabIndex":1}`        | as is          |
//! | TabList    | `[{"title":"a","content":"x"}]`             | index 0        |
//! | Text       | `"hello"`                                   | one "New Tab"  |
//! |------------|---------------------------------------------|----------------|
//!
//! Parsing is a single untagged deserialize, tried in the order above.

use serde::Deserialize;

use scratchpad_types::{Tab, TabError, TabState};

/// A stored value in any known shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PersistedBlob {
    Current(TabState),
    TabList(Vec<Tab>),
    Text(String),
}

/// Which shape a blob had, for logging and load reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobShape {
    Current,
    TabList,
    Text,
}

impl PersistedBlob {
    /// Parse a raw stored value.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn shape(&self) -> BlobShape {
        match self {
            PersistedBlob::Current(_) => BlobShape::Current,
            PersistedBlob::TabList(_) => BlobShape::TabList,
            PersistedBlob::Text(_) => BlobShape::Text,
        }
    }

    /// Upgrade to the canonical state.
    ///
    /// Fails only for a tab list that is empty or carries a blank title.
    pub fn into_state(self) -> Result<TabState, TabError> {
        match self {
            PersistedBlob::Current(state) => Ok(state),
            PersistedBlob::TabList(tabs) => TabState::new(tabs, 0),
            PersistedBlob::Text(text) => Ok(TabState::from_text(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current() {
        let blob =
            PersistedBlob::parse(r#"{"tabs":[{"title":"a","content":"x"}],"currentTabIndex":0}"#)
                .unwrap();
        assert_eq!(blob.shape(), BlobShape::Current);
        assert_eq!(blob.into_state().unwrap().active_content(), "x");
    }

    #[test]
    fn test_parse_legacy_text() {
        let blob = PersistedBlob::parse(r#""hello""#).unwrap();
        assert_eq!(blob.shape(), BlobShape::Text);
        let state = blob.into_state().unwrap();
        assert_eq!(state.tabs(), &[Tab::new("New Tab", "hello")]);
        assert_eq!(state.current_tab_index(), 0);
    }

    #[test]
    fn test_parse_legacy_tab_list() {
        let blob = PersistedBlob::parse(
            r#"[{"title":"one","content":"1"},{"title":"two","content":"2"}]"#,
        )
        .unwrap();
        assert_eq!(blob.shape(), BlobShape::TabList);
        let state = blob.into_state().unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.current_tab_index(), 0);
        assert_eq!(state.active_tab().title, "one");
    }

    #[test]
    fn test_empty_tab_list_does_not_upgrade() {
        let blob = PersistedBlob::parse("[]").unwrap();
        assert_eq!(blob.into_state(), Err(TabError::NoTabs));
    }

    #[test]
    fn test_unrecognised_shapes() {
        for raw in [
            "42",
            "null",
            "{not json",
            r#"{"tabs":[{"title":"a"}],"currentTabIndex":3}"#,
            r#"{"something":"else"}"#,
            r#"[1, 2, 3]"#,
        ] {
            assert!(PersistedBlob::parse(raw).is_err(), "{raw} should not parse");
        }
    }
}
