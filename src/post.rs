use std::num::NonZeroU32;

use crate::{
    gateway::{Gateway, GatewayError},
    model::{ContentSection, Post},
};

#[derive(Debug)]
pub enum Resolution {
    Found(Post),
    NotFound,
}

/// Looks a post up by slug. Documents without data count as missing.
pub async fn resolve(
    gateway: &dyn Gateway,
    document_type: &str,
    slug: &str,
) -> Result<Resolution, GatewayError> {
    match gateway.get_by_uid(document_type, slug).await? {
        Some(raw) if raw.has_data() => Ok(Resolution::Found(raw.into_post())),
        _ => {
            tracing::info!(slug, "post not found");
            Ok(Resolution::NotFound)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: u64,
}

/// Heading then body text of every section, in document order.
fn text_fragments(content: &[ContentSection]) -> impl Iterator<Item = &str> {
    content.iter().flat_map(|section| {
        section
            .heading
            .as_deref()
            .into_iter()
            .chain(section.body.iter().map(|block| block.text.as_str()))
    })
}

pub fn reading_time(content: &[ContentSection], words_per_minute: NonZeroU32) -> ReadingTime {
    let words: usize = text_fragments(content)
        .map(|fragment| fragment.split_whitespace().count())
        .sum();

    let minutes = (words as f64 / f64::from(words_per_minute.get())).round() as u64;

    ReadingTime { words, minutes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gateway::fake::{raw_document, FakeGateway},
        model::RichTextBlock,
    };

    const WPM: NonZeroU32 = match NonZeroU32::new(150) {
        Some(wpm) => wpm,
        None => unreachable!(),
    };

    fn section(heading: &str, paragraphs: &[&str]) -> ContentSection {
        ContentSection {
            heading: Some(heading.to_string()),
            body: paragraphs
                .iter()
                .map(|text| RichTextBlock {
                    kind: Some("paragraph".into()),
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    #[test]
    fn short_post_rounds_down_to_zero() {
        let content = [section("A", &["one two three"])];
        assert_eq!(
            reading_time(&content, WPM),
            ReadingTime {
                words: 4,
                minutes: 0
            }
        );
    }

    #[test]
    fn rounds_to_nearest_minute() {
        let content = [section("Heading", &[words(149).as_str()])];
        assert_eq!(reading_time(&content, WPM).minutes, 1);

        let content = [section("Heading", &[words(224).as_str()])];
        assert_eq!(reading_time(&content, WPM).minutes, 2);

        let content = [section("Heading", &[words(223).as_str()])];
        assert_eq!(reading_time(&content, WPM).minutes, 1);
    }

    #[test]
    fn doubling_words_never_decreases_minutes() {
        for n in [0, 10, 74, 75, 150, 400, 1000] {
            let single = [section("h", &[words(n).as_str()])];
            let double = [section("h", &[words(n).as_str(), words(n).as_str()])];
            assert!(reading_time(&double, WPM).minutes >= reading_time(&single, WPM).minutes);
        }
    }

    #[test]
    fn fragments_follow_document_order() {
        let content = [
            section("First", &["a b", "c"]),
            section("Second", &["d"]),
        ];
        let fragments: Vec<_> = text_fragments(&content).collect();
        assert_eq!(fragments, ["First", "a b", "c", "Second", "d"]);
    }

    #[test]
    fn missing_heading_and_empty_blocks_are_skipped() {
        let content = [ContentSection {
            heading: None,
            body: vec![
                RichTextBlock::default(),
                RichTextBlock {
                    kind: None,
                    text: "  spaced   out  ".into(),
                },
            ],
        }];
        assert_eq!(reading_time(&content, WPM).words, 2);
    }

    #[test]
    fn custom_reading_speed() {
        let content = [section("h", &[words(299).as_str()])];
        let wpm = NonZeroU32::new(300).unwrap();
        assert_eq!(reading_time(&content, wpm).minutes, 1);
    }

    #[tokio::test]
    async fn known_slug_is_found() {
        let gateway = FakeGateway::new(&["como-utilizar-hooks"], None);
        let resolution = resolve(&gateway, "posts", "como-utilizar-hooks")
            .await
            .unwrap();

        let Resolution::Found(post) = resolution else {
            panic!("expected a post");
        };
        assert_eq!(post.uid.as_deref(), Some("como-utilizar-hooks"));
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let gateway = FakeGateway::new(&["como-utilizar-hooks"], None);
        let resolution = resolve(&gateway, "posts", "nope").await.unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[tokio::test]
    async fn document_without_data_is_not_found() {
        struct DataLess;

        #[async_trait::async_trait]
        impl Gateway for DataLess {
            async fn query_by_type(
                &self,
                _: &str,
                _: u32,
            ) -> Result<crate::model::prismic::RawPage, GatewayError> {
                Ok(Default::default())
            }

            async fn get_by_uid(
                &self,
                _: &str,
                uid: &str,
            ) -> Result<Option<crate::model::prismic::RawDocument>, GatewayError> {
                let mut raw = raw_document(uid, "ignored");
                raw.data = None;
                Ok(Some(raw))
            }

            async fn fetch_page(
                &self,
                _: &crate::model::Cursor,
            ) -> Result<crate::model::prismic::RawPage, GatewayError> {
                Ok(Default::default())
            }
        }

        let resolution = resolve(&DataLess, "posts", "empty").await.unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
    }
}
