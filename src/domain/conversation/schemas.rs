use serde::{Deserialize, Serialize};

/// List endpoints answer either with a bare array or with a paginated envelope.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Page<T> {
	Bare(Vec<T>),
	Envelope {
		#[serde(default)]
		count: Option<u64>,
		#[serde(default)]
		next: Option<String>,
		#[serde(default)]
		previous: Option<String>,
		#[serde(default = "Vec::new")]
		results: Vec<T>,
	},
}

impl<T> Page<T> {
	pub fn next_page(&self) -> Option<&str> {
		match self {
			Self::Bare(_) => None,
			Self::Envelope { next, .. } => next.as_deref(),
		}
	}

	pub fn into_results(self) -> Vec<T> {
		match self {
			Self::Bare(items) => items,
			Self::Envelope { results, .. } => results,
		}
	}
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct SendMessage {
	pub application_id: u64,
	pub content: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct MarkAsRead {
	pub application_id: u64,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Default)]
pub struct MarkAsReadResponse {
	#[serde(default)]
	pub marked_read_count: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct TokenRefresh {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub(crate) struct TokenRefreshResponse {
	#[serde(default)]
	pub access: Option<String>,
}

#[test]
fn test_page_shapes() {
	let bare: Page<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
	assert_eq!(bare.next_page(), None);
	assert_eq!(bare.into_results(), vec![1, 2, 3]);

	let envelope: Page<u32> =
		serde_json::from_str(r#"{"count": 4, "next": "http://x/api/applications/?page=2", "previous": null, "results": [1, 2]}"#).unwrap();
	assert_eq!(envelope.next_page(), Some("http://x/api/applications/?page=2"));
	assert_eq!(envelope.into_results(), vec![1, 2]);

	let empty: Page<u32> = serde_json::from_str(r#"{"count": 0}"#).unwrap();
	assert!(empty.into_results().is_empty());
}
