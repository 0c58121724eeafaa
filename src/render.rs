use std::num::NonZeroU32;

use tera::{Context, Tera};

use crate::{
    date::Locale,
    model::{Post, PostPagination},
    page::{home_path, Chrome, Html, Listing, PostDetail},
    post::reading_time,
};

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("post.html", include_str!("../templates/post.html")),
    ("fallback.html", include_str!("../templates/fallback.html")),
];

pub struct Renderer {
    tera: Tera,
    site_name: String,
    base_path: String,
    locale: Locale,
    words_per_minute: NonZeroU32,
}

impl Renderer {
    pub fn new(
        site_name: &str,
        base_path: &str,
        locale: Locale,
        words_per_minute: NonZeroU32,
    ) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;

        Ok(Renderer {
            tera,
            site_name: site_name.to_string(),
            base_path: base_path.to_string(),
            locale,
            words_per_minute,
        })
    }

    fn chrome(&self, title: &str) -> Chrome {
        Chrome {
            site_name: self.site_name.clone(),
            lang: self.locale.tag(),
            base_path: self.base_path.clone(),
            home: home_path(&self.base_path),
            title: title.to_string(),
        }
    }

    fn render<T: serde::Serialize>(&self, template: &str, view: &T) -> Result<Html, tera::Error> {
        let context = Context::from_serialize(view)?;
        self.tera.render(template, &context).map(Html)
    }

    pub fn listing(
        &self,
        pagination: &PostPagination,
        pages_shown: u32,
        load_error: bool,
    ) -> Result<Html, tera::Error> {
        let view = Listing::new(
            self.chrome("Home"),
            pagination,
            pages_shown,
            load_error,
            self.locale,
        );
        self.render("index.html", &view)
    }

    pub fn post(&self, post: &Post) -> Result<Html, tera::Error> {
        let reading = reading_time(&post.data.content, self.words_per_minute);
        let view = PostDetail::new(self.chrome("Post"), post, reading, self.locale);
        self.render("post.html", &view)
    }

    /// Placeholder shown while a post is generated on demand.
    pub fn fallback(&self) -> Result<Html, tera::Error> {
        self.render("fallback.html", &self.chrome("Post"))
    }
}
