use serde::Deserialize;

use crate::model::{Banner, ContentSection, Cursor, Post, PostData, RichTextBlock};

/// One page of search results as returned by the CMS.
#[derive(Deserialize, Debug, Default)]
pub struct RawPage {
    #[serde(default)]
    pub next_page: Option<Cursor>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RawDocument {
    pub uid: Option<String>,
    pub first_publication_date: Option<String>,
    pub data: Option<RawPostData>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RawPostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<RawImage>,
    #[serde(default)]
    pub content: Vec<RawSection>,
}

#[derive(Deserialize, Debug)]
pub struct RawImage {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RawSection {
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Vec<RawBlock>,
}

#[derive(Deserialize, Debug)]
pub struct RawBlock {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// `GET {endpoint}` response; only the refs matter here.
#[derive(Deserialize, Debug)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiRef {
    #[serde(rename = "ref")]
    pub id: String,
    #[serde(default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.id.as_str())
    }
}

impl RawDocument {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn into_post(self) -> Post {
        let first_publication_date = self.first_publication_date.as_deref().and_then(|raw| {
            let parsed = crate::date::parse_publication_date(raw);
            if parsed.is_none() {
                tracing::warn!(uid = ?self.uid, raw, "unparseable publication date");
            }
            parsed
        });

        Post {
            uid: self.uid,
            first_publication_date,
            data: self.data.map(RawPostData::into_data).unwrap_or_default(),
        }
    }
}

impl RawPostData {
    fn into_data(self) -> PostData {
        PostData {
            title: self.title,
            subtitle: self.subtitle,
            author: self.author,
            banner: self
                .banner
                .and_then(|banner| banner.url)
                .map(|url| Banner { url }),
            content: self
                .content
                .into_iter()
                .map(|section| ContentSection {
                    heading: section.heading,
                    body: section
                        .body
                        .into_iter()
                        .map(|block| RichTextBlock {
                            kind: block.kind,
                            text: block.text,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl RawPage {
    pub fn into_posts(self) -> (Vec<Post>, Option<Cursor>) {
        let posts = self.results.into_iter().map(RawDocument::into_post).collect();
        (posts, self.next_page)
    }
}
