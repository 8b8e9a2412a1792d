// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::Deserialize;

use crate::error::{self, Result};

/// Position of a comment within an asset, in seconds.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Timestamp(f64);

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        // Adding positive zero turns -0.0 into 0.0 and leaves everything else
        // alone.
        Self(value + 0.0)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Comment {
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) draw_data: Option<serde_json::Value>,
}

/// The server's view of an uploaded asset. Rebuilt on every fetch.
#[derive(Clone, Debug)]
pub(crate) struct FileReference {
    pub(crate) id: String,
    pub(crate) size: u64,
    pub(crate) comments: BTreeMap<Timestamp, Vec<Comment>>,
}

impl FileReference {
    pub(crate) fn comments_at(&self, timestamp: f64) -> &[Comment] {
        self.comments
            .get(&Timestamp::from(timestamp))
            .map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Deserialize)]
struct Owner {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    #[serde(default)]
    timestamp: f64,
    owner: Owner,
    #[serde(default)]
    text: String,
    #[serde(default)]
    draw_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Payload {
    id: String,
    filesize: String,
    #[serde(default)]
    comments: Vec<CommentPayload>,
}

/// The service reports sizes as decimal strings such as `"1048576.0"`. Only
/// the part before the first `.` counts.
pub(crate) fn parse_size(value: &str) -> Result<u64> {
    let integral = value.split('.').next().unwrap_or_default();
    integral
        .parse()
        .map_err(|e| error::Conversion::FileSize(value.to_owned(), e).into())
}

impl TryFrom<Payload> for FileReference {
    type Error = error::Error;

    fn try_from(value: Payload) -> Result<Self> {
        let size = parse_size(&value.filesize)?;

        let mut comments: BTreeMap<Timestamp, Vec<Comment>> = BTreeMap::new();
        for comment in value.comments {
            comments
                .entry(comment.timestamp.into())
                .or_default()
                .push(Comment {
                    username: comment.owner.name,
                    text: comment.text,
                    draw_data: comment.draw_data,
                });
        }

        Ok(Self {
            id: value.id,
            size,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn negative_zero_shares_the_zero_bucket() -> Result<()> {
        let payload: Payload = serde_json::from_value(json!({
            "id": "f-1",
            "filesize": "1.0",
            "comments": [
                {"timestamp": 0.0, "owner": {"name": "alice"}, "text": "A"},
                {"timestamp": -0.0, "owner": {"name": "bob"}, "text": "B"},
            ],
        }))?;
        let reference = FileReference::try_from(payload)?;

        assert_eq!(reference.comments.len(), 1);
        assert_eq!(reference.comments_at(-0.0).len(), 2);
        assert_eq!(Timestamp::from(-0.0), Timestamp::from(0.0));
        assert_eq!(Timestamp::from(-0.0).to_string(), "0.000");
        Ok(())
    }

    #[test]
    fn size_is_truncated() -> Result<()> {
        assert_eq!(parse_size("1048576.0")?, 1_048_576);
        assert_eq!(parse_size("1048576.99")?, 1_048_576);
        assert_eq!(parse_size("42")?, 42);
        assert!(parse_size("").is_err());
        assert!(parse_size("-1.0").is_err());
        Ok(())
    }

    #[test]
    fn comments_sharing_a_timestamp_keep_server_order() -> Result<()> {
        let payload: Payload = serde_json::from_value(json!({
            "id": "f-1",
            "filesize": "2048.0",
            "comments": [
                {"timestamp": 100.0, "owner": {"name": "alice"}, "text": "A"},
                {"timestamp": 12.5, "owner": {"name": "carol"}, "text": "C",
                 "draw_data": {"strokes": []}},
                {"timestamp": 100.0, "owner": {"name": "bob"}, "text": "B"},
            ],
        }))?;
        let reference = FileReference::try_from(payload)?;

        assert_eq!(reference.id, "f-1");
        assert_eq!(reference.size, 2048);
        assert_eq!(
            reference
                .comments_at(100.0)
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>(),
            ["A", "B"],
        );
        assert_eq!(
            reference.comments_at(12.5)[0].draw_data,
            Some(json!({"strokes": []})),
        );
        assert!(reference.comments_at(1.0).is_empty());

        let order = reference.comments.keys().copied().collect::<Vec<_>>();
        assert_eq!(order, [Timestamp::from(12.5), Timestamp::from(100.0)]);
        Ok(())
    }
}
