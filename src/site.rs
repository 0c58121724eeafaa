use std::{
    collections::HashSet,
    num::NonZeroU32,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures_util::{stream, StreamExt, TryStreamExt};

use crate::{
    config::{Config, FallbackMode},
    error::AppError,
    gateway::Gateway,
    listing::{ListingController, LoadMore},
    model::PostPagination,
    page::{home_path, Html},
    post::{self, Resolution},
    render::Renderer,
    store::{Lookup, PageStore, Rendered},
};

/// A page the site can generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The listing with this many pages of posts loaded.
    Listing { pages: u32 },
    Post { slug: String },
}

impl Target {
    /// Store key, relative to the base path.
    pub fn route(&self) -> String {
        match self {
            Target::Listing { pages: 1 } => "/".to_string(),
            Target::Listing { pages } => format!("/?page={pages}"),
            Target::Post { slug } => format!("/post/{slug}"),
        }
    }

    /// Where `build` writes this page, relative to the output directory.
    pub fn output_path(&self) -> Option<PathBuf> {
        match self {
            Target::Listing { pages: 1 } => Some(PathBuf::from("index.html")),
            Target::Listing { .. } => None,
            Target::Post { slug } => {
                let slug = slug::slugify(slug);
                (!slug.is_empty()).then(|| Path::new("post").join(&slug).join("index.html"))
            }
        }
    }
}

struct Generated {
    rendered: Rendered,
    /// Pages that only show part of what was asked for are not kept.
    cacheable: bool,
}

/// What a request gets back.
#[derive(Debug, PartialEq)]
pub enum Served {
    Ready(Rendered),
    Placeholder(Html),
}

pub struct Site {
    gateway: Arc<dyn Gateway>,
    renderer: Renderer,
    store: PageStore,
    document_type: String,
    page_size: NonZeroU32,
    base_path: String,
    fallback: FallbackMode,
    max_listing_pages: NonZeroU32,
    prerender_page_size: NonZeroU32,
    prerender_concurrency: usize,
}

impl Site {
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Result<Self, AppError> {
        let base_path = config.net.base_path();
        let renderer = Renderer::new(
            &config.site.name,
            &base_path,
            config.site.locale,
            config.site.words_per_minute,
        )?;

        Ok(Site {
            gateway,
            renderer,
            store: PageStore::new(config.site.revalidate(), config.site.max_cached_pages),
            document_type: config.prismic.document_type.clone(),
            page_size: config.prismic.page_size,
            base_path,
            fallback: config.site.fallback,
            max_listing_pages: config.site.max_listing_pages,
            prerender_page_size: config.site.prerender_page_size,
            prerender_concurrency: config.site.prerender_concurrency.max(1),
        })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Clamps a requested listing page number to what the site is willing to replay.
    pub fn listing_target(&self, page: Option<u32>) -> Target {
        let pages = page.unwrap_or(1).clamp(1, self.max_listing_pages.get());
        Target::Listing { pages }
    }

    async fn generate_listing(&self, pages: u32) -> Result<Generated, AppError> {
        let first = self
            .gateway
            .query_by_type(&self.document_type, self.page_size.get())
            .await?;
        let (results, next_page) = first.into_posts();
        let controller = ListingController::new(PostPagination { next_page, results });
        let state = controller.subscribe();

        let mut shown = 1;
        let mut load_error = false;
        while shown < pages && controller.can_load_more() {
            match controller.load_more(self.gateway.as_ref()).await {
                Ok(LoadMore::Appended(_)) => shown += 1,
                Ok(LoadMore::Exhausted | LoadMore::InFlight) => break,
                Err(err) => {
                    tracing::warn!(pages, shown, error = %err, "listing truncated");
                    load_error = true;
                    break;
                }
            }
        }

        let html = self.renderer.listing(&state.borrow(), shown, load_error)?;
        Ok(Generated {
            rendered: Rendered::Page(html),
            cacheable: !load_error,
        })
    }

    async fn generate_post(&self, slug: &str) -> Result<Generated, AppError> {
        let rendered = match post::resolve(self.gateway.as_ref(), &self.document_type, slug).await? {
            Resolution::Found(post) => Rendered::Page(self.renderer.post(&post)?),
            Resolution::NotFound => Rendered::Redirect(home_path(&self.base_path)),
        };

        Ok(Generated {
            rendered,
            cacheable: true,
        })
    }

    async fn generate(&self, target: &Target) -> Result<Generated, AppError> {
        match target {
            Target::Listing { pages } => self.generate_listing(*pages).await,
            Target::Post { slug } => self.generate_post(slug).await,
        }
    }

    /// Generates `target` and stores the result if it may be kept.
    async fn generate_and_store(&self, target: &Target) -> Result<Rendered, AppError> {
        let route = target.route();
        let generated = self.generate(target).await?;
        if generated.cacheable {
            self.store.fill(&route, generated.rendered.clone()).await;
        }
        Ok(generated.rendered)
    }

    /// Runs a claimed generation in the background. Failures are recorded in the store.
    fn spawn_generation(self: &Arc<Self>, target: Target) {
        let site = Arc::clone(self);
        tokio::spawn(async move {
            let route = target.route();
            match site.generate(&target).await {
                Ok(Generated {
                    rendered,
                    cacheable: true,
                }) => {
                    tracing::debug!(route = %route, "generated in background");
                    site.store.fill(&route, rendered).await;
                }
                Ok(_) => site.store.release(&route).await,
                Err(err) => {
                    tracing::error!(route = %route, error = %crate::compat::error_chain(&err), "background generation failed");
                    site.store.fail(&route).await;
                }
            }
        });
    }

    pub async fn serve(self: &Arc<Self>, target: Target) -> Result<Served, AppError> {
        let route = target.route();
        let placeholder_allowed =
            matches!(target, Target::Post { .. }) && self.fallback == FallbackMode::Placeholder;

        match self.store.lookup(&route).await {
            Lookup::Fresh(rendered) => Ok(Served::Ready(rendered)),
            Lookup::Stale(rendered) => {
                if self.store.claim(&route).await {
                    tracing::debug!(route = %route, "revalidating");
                    self.spawn_generation(target);
                }
                Ok(Served::Ready(rendered))
            }
            // A placeholder would only lead back here, so the error is surfaced instead.
            Lookup::Failed => {
                tracing::debug!(route = %route, "retrying failed generation in the foreground");
                Ok(Served::Ready(self.generate_and_store(&target).await?))
            }
            Lookup::Missing | Lookup::Generating if placeholder_allowed => {
                if self.store.claim(&route).await {
                    tracing::info!(route = %route, "generating on demand");
                    self.spawn_generation(target);
                }
                Ok(Served::Placeholder(self.renderer.fallback()?))
            }
            Lookup::Missing | Lookup::Generating => {
                Ok(Served::Ready(self.generate_and_store(&target).await?))
            }
        }
    }

    /// Slugs of the posts generated ahead of time.
    async fn known_slugs(&self) -> Result<Vec<String>, AppError> {
        let page = self
            .gateway
            .query_by_type(&self.document_type, self.prerender_page_size.get())
            .await?;
        Ok(page.results.into_iter().filter_map(|raw| raw.uid).collect())
    }

    /// Generates the first listing page and the known posts, fetching posts concurrently.
    pub async fn prerender(&self) -> Result<Vec<(Target, Rendered)>, AppError> {
        let listing = Target::Listing { pages: 1 };
        let mut pages = vec![(listing.clone(), self.generate_and_store(&listing).await?)];

        let slugs = self.known_slugs().await?;
        tracing::info!(posts = slugs.len(), "prerendering");

        let posts: Vec<(Target, Rendered)> = stream::iter(slugs)
            .map(|slug| async move {
                let target = Target::Post { slug };
                let rendered = self.generate_and_store(&target).await?;
                Ok::<_, AppError>((target, rendered))
            })
            .buffer_unordered(self.prerender_concurrency)
            .try_collect()
            .await?;

        pages.extend(posts);
        Ok(pages)
    }

    /// Prerenders the site and writes every page to `out`. Returns the files written.
    ///
    /// Slugs that map to an already written file are skipped.
    pub async fn export(&self, out: &Path) -> Result<Vec<PathBuf>, AppError> {
        let mut written = Vec::new();
        let mut taken = HashSet::new();

        for (target, rendered) in self.prerender().await? {
            let Rendered::Page(Html(html)) = rendered else {
                tracing::info!(route = %target.route(), "skipping redirect");
                continue;
            };
            let Some(relative) = target.output_path() else {
                continue;
            };
            if !taken.insert(relative.clone()) {
                tracing::warn!(
                    route = %target.route(),
                    path = %relative.display(),
                    "output path already written, skipping"
                );
                continue;
            }

            let path = out.join(relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, html).await?;
            tracing::debug!(path = %path.display(), "wrote page");
            written.push(path);
        }

        Ok(written)
    }
}
