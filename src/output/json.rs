//! JSON output formatter for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "2cf24dba...": [
//!     {"name": "A", "path": "/data/A", "size": 5, "hash": "2cf24dba..."},
//!     {"name": "B", "path": "/data/B", "size": 5, "hash": "2cf24dba..."}
//!   ],
//!   "486ea462...": [
//!     {"name": "C", "path": "/data/C", "size": 5, "hash": "486ea462..."}
//!   ]
//! }
//! ```
//!
//! Digests are emitted in sorted order so that two scans of the same tree
//! print the same document.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::duplicates::DigestGroups;
use crate::scanner::FileRecord;

/// Serializable view over a [`DigestGroups`] map.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonOutput<'a> {
    groups: BTreeMap<&'a str, &'a [FileRecord]>,
}

impl<'a> JsonOutput<'a> {
    /// Create a JSON view of `groups`.
    ///
    /// # Example
    ///
    /// ```
    /// use fdups::duplicates::DigestGroups;
    /// use fdups::output::json::JsonOutput;
    ///
    /// let groups = DigestGroups::new();
    /// assert_eq!(JsonOutput::new(&groups).to_json().unwrap(), "{}");
    /// ```
    #[must_use]
    pub fn new(groups: &'a DigestGroups) -> Self {
        Self {
            groups: groups.iter().collect(),
        }
    }

    /// Number of groups in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if the view holds no group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON output to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W, pretty: bool) -> anyhow::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut writer, self)?;
        } else {
            serde_json::to_writer(&mut writer, self)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn groups() -> DigestGroups {
        let mut groups = DigestGroups::new();
        for (name, digest) in [("b", "bb"), ("a1", "aa"), ("a2", "aa")] {
            let mut record = FileRecord::new(PathBuf::from(format!("/d/{name}")), 4);
            record.digest = digest.to_string();
            groups.insert(record);
        }
        groups
    }

    #[test]
    fn test_empty_groups() {
        let groups = DigestGroups::new();
        let output = JsonOutput::new(&groups);
        assert!(output.is_empty());
        assert_eq!(output.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_compact_json_is_sorted_by_digest() {
        let groups = groups();
        let json = JsonOutput::new(&groups).to_json().unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"aa":[{"name":"a1","path":"/d/a1","size":4,"hash":"aa"},"#,
                r#"{"name":"a2","path":"/d/a2","size":4,"hash":"aa"}],"#,
                r#""bb":[{"name":"b","path":"/d/b","size":4,"hash":"bb"}]}"#
            )
        );
    }

    #[test]
    fn test_pretty_json_parses_back() {
        let groups = groups();
        let pretty = JsonOutput::new(&groups).to_json_pretty().unwrap();
        assert!(pretty.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(value["aa"].as_array().unwrap().len(), 2);
        assert_eq!(value["bb"][0]["name"], "b");
    }

    #[test]
    fn test_write_to_appends_newline() {
        let groups = groups();
        let mut buffer = Vec::new();
        JsonOutput::new(&groups).write_to(&mut buffer, false).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(text.lines().count(), 1);
    }
}
