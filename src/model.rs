use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub mod prismic;

/// Opaque continuation URL handed out by the CMS.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Post {
    pub uid: Option<String>,
    #[serde(with = "time::serde::iso8601::option")]
    pub first_publication_date: Option<OffsetDateTime>,
    pub data: PostData,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<Banner>,
    pub content: Vec<ContentSection>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Banner {
    pub url: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ContentSection {
    pub heading: Option<String>,
    pub body: Vec<RichTextBlock>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct RichTextBlock {
    pub kind: Option<String>,
    pub text: String,
}

/// Posts loaded so far plus the cursor for the next page, if any.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PostPagination {
    pub next_page: Option<Cursor>,
    pub results: Vec<Post>,
}

impl PostPagination {
    /// Appends `posts` after the existing results and takes `next_page` as the new cursor.
    pub fn appended(mut self, posts: Vec<Post>, next_page: Option<Cursor>) -> Self {
        self.results.extend(posts);
        self.next_page = next_page;
        self
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> Post {
        Post {
            uid: Some(title.to_lowercase()),
            data: PostData {
                title: Some(title.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn appending_keeps_order_and_replaces_cursor() {
        let pagination = PostPagination {
            next_page: Some(Cursor("https://cms/page/2".into())),
            results: vec![titled("First")],
        };

        let pagination = pagination.appended(vec![titled("Second"), titled("Third")], None);

        let titles: Vec<_> = pagination
            .results
            .iter()
            .filter_map(|post| post.data.title.as_deref())
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert!(!pagination.has_next_page());
    }

    #[test]
    fn appending_does_not_deduplicate() {
        let pagination = PostPagination {
            next_page: None,
            results: vec![titled("Same")],
        };

        let pagination = pagination.appended(
            vec![titled("Same")],
            Some(Cursor("https://cms/page/3".into())),
        );

        assert_eq!(pagination.results.len(), 2);
        assert_eq!(
            pagination.next_page,
            Some(Cursor("https://cms/page/3".into()))
        );
    }
}
