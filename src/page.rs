use serde::Serialize;

use crate::{
    date::{format_publication_date, Locale},
    model::{Post, PostPagination},
    post::ReadingTime,
};

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct Html(pub String);

/// URL of the listing page under `base_path`.
pub fn home_path(base_path: &str) -> String {
    if base_path.is_empty() {
        "/".to_string()
    } else {
        base_path.to_string()
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Chrome {
    pub site_name: String,
    pub lang: &'static str,
    pub base_path: String,
    pub home: String,
    pub title: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct PostItem {
    pub href: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub author: String,
}

impl PostItem {
    pub fn new(post: &Post, base_path: &str, locale: Locale) -> Self {
        PostItem {
            href: post
                .uid
                .as_deref()
                .map(|uid| format!("{base_path}/post/{uid}")),
            title: post.data.title.clone().unwrap_or_default(),
            subtitle: post.data.subtitle.clone().unwrap_or_default(),
            date: format_publication_date(post.first_publication_date, locale),
            author: post.data.author.clone().unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Listing {
    #[serde(flatten)]
    pub chrome: Chrome,
    pub posts: Vec<PostItem>,
    /// Page number the "load more" control points at, when there is more.
    pub next_page: Option<u32>,
    pub load_error: bool,
}

impl Listing {
    pub fn new(
        chrome: Chrome,
        pagination: &PostPagination,
        pages_shown: u32,
        load_error: bool,
        locale: Locale,
    ) -> Self {
        let posts = pagination
            .results
            .iter()
            .map(|post| PostItem::new(post, &chrome.base_path, locale))
            .collect();

        Listing {
            chrome,
            posts,
            next_page: pagination.has_next_page().then_some(pages_shown + 1),
            load_error,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Section {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct PostDetail {
    #[serde(flatten)]
    pub chrome: Chrome,
    pub banner_url: Option<String>,
    pub title: String,
    pub date: String,
    pub author: String,
    pub reading_minutes: u64,
    pub sections: Vec<Section>,
}

impl PostDetail {
    pub fn new(chrome: Chrome, post: &Post, reading: ReadingTime, locale: Locale) -> Self {
        PostDetail {
            chrome,
            banner_url: post.data.banner.as_ref().map(|banner| banner.url.clone()),
            title: post.data.title.clone().unwrap_or_default(),
            date: format_publication_date(post.first_publication_date, locale),
            author: post.data.author.clone().unwrap_or_default(),
            reading_minutes: reading.minutes,
            sections: post
                .data
                .content
                .iter()
                .map(|section| Section {
                    heading: section.heading.clone().unwrap_or_default(),
                    paragraphs: section.body.iter().map(|block| block.text.clone()).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cursor, PostData};

    fn chrome() -> Chrome {
        Chrome {
            site_name: "spacetraveling".into(),
            lang: "pt-BR",
            base_path: "/blog".into(),
            home: "/blog".into(),
            title: "Home".into(),
        }
    }

    #[test]
    fn item_without_uid_has_no_link() {
        let post = Post {
            data: PostData {
                title: Some("Orphan".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let item = PostItem::new(&post, "", Locale::PtBr);
        assert_eq!(item.href, None);
        assert_eq!(item.date, "Data indisponível");
        assert_eq!(item.subtitle, "");
    }

    #[test]
    fn item_links_under_base_path() {
        let post = Post {
            uid: Some("hooks".into()),
            ..Default::default()
        };
        let item = PostItem::new(&post, "/blog", Locale::PtBr);
        assert_eq!(item.href.as_deref(), Some("/blog/post/hooks"));
    }

    #[test]
    fn next_page_only_while_cursor_remains() {
        let mut pagination = PostPagination::default();
        let listing = Listing::new(chrome(), &pagination, 1, false, Locale::PtBr);
        assert_eq!(listing.next_page, None);

        pagination.next_page = Some(Cursor("https://cms/next".into()));
        let listing = Listing::new(chrome(), &pagination, 3, false, Locale::PtBr);
        assert_eq!(listing.next_page, Some(4));
    }
}
