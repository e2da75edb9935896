use crate::mime::TIMESTAMP_FORMAT;
use std::collections::BTreeMap;

/// Format identifier to raw payload.
pub type DataMap = BTreeMap<String, Vec<u8>>;

/// One read of a buffer as returned by the platform.
///
/// `data` may carry the `TIMESTAMP` pseudo-format next to the real payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub data: DataMap,
    pub owner: Option<String>,
}

impl RawSnapshot {
    pub fn new(data: DataMap) -> Self {
        Self { data, owner: None }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// The raw `TIMESTAMP` value, if the owner supplied a non-empty one.
    pub fn timestamp_token(&self) -> Option<&[u8]> {
        self.data
            .get(TIMESTAMP_FORMAT)
            .map(Vec::as_slice)
            .filter(|token| !token.is_empty())
    }

    /// Copy of the payloads restricted to `formats`.
    pub fn filter(&self, formats: &[String]) -> DataMap {
        filter_formats(&self.data, formats)
    }
}

/// Buffer contents plus the title of the window that owned them.
#[derive(Debug, Clone, Default)]
pub struct ClipboardSnapshot {
    pub data: DataMap,
    pub owner: String,
}

impl ClipboardSnapshot {
    /// Compares payloads only; owner is ignored.
    pub fn same_data(&self, other: &ClipboardSnapshot, formats: &[String]) -> bool {
        filter_formats(&self.data, formats) == filter_formats(&other.data, formats)
    }
}

pub fn filter_formats(data: &DataMap, formats: &[String]) -> DataMap {
    formats
        .iter()
        .filter_map(|format| data.get(format).map(|bytes| (format.clone(), bytes.clone())))
        .collect()
}

/// Builds a [`DataMap`] from string pairs. Mostly handy in tests and the CLI.
pub fn data_map<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> DataMap {
    entries
        .into_iter()
        .map(|(format, payload)| (format.to_string(), payload.as_bytes().to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::{MIME_HTML, MIME_TEXT};

    fn formats(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn timestamp_token_ignores_missing_and_empty() {
        let mut snapshot = RawSnapshot::new(data_map([(MIME_TEXT, "a")]));
        assert_eq!(snapshot.timestamp_token(), None);

        snapshot.data.insert(TIMESTAMP_FORMAT.to_string(), Vec::new());
        assert_eq!(snapshot.timestamp_token(), None);

        snapshot.data.insert(TIMESTAMP_FORMAT.to_string(), b"100".to_vec());
        assert_eq!(snapshot.timestamp_token(), Some(&b"100"[..]));
    }

    #[test]
    fn filter_drops_unsubscribed_formats() {
        let snapshot = RawSnapshot::new(data_map([
            (MIME_TEXT, "a"),
            (MIME_HTML, "<b>a</b>"),
            (TIMESTAMP_FORMAT, "100"),
        ]));
        let filtered = snapshot.filter(&formats(&[MIME_TEXT, "image/png"]));
        assert_eq!(filtered, data_map([(MIME_TEXT, "a")]));
    }

    #[test]
    fn same_data_ignores_owner_and_other_formats() {
        let a = ClipboardSnapshot {
            data: data_map([(MIME_TEXT, "a"), (MIME_HTML, "x")]),
            owner: "Editor".into(),
        };
        let b = ClipboardSnapshot {
            data: data_map([(MIME_TEXT, "a"), (MIME_HTML, "y")]),
            owner: "Terminal".into(),
        };
        assert!(a.same_data(&b, &formats(&[MIME_TEXT])));
        assert!(!a.same_data(&b, &formats(&[MIME_TEXT, MIME_HTML])));
    }
}
