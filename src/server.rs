use std::{path::Path, sync::Arc};

use axum::{
    extract::{Path as UrlPath, State},
    response::{Html as HtmlResponse, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    compat::MyQuery,
    error::AppError,
    page::Html,
    site::{Served, Site, Target},
    store::Rendered,
};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListingQuery {
    page: Option<u32>,
}

impl IntoResponse for Served {
    fn into_response(self) -> Response {
        match self {
            Served::Ready(Rendered::Page(Html(html))) | Served::Placeholder(Html(html)) => {
                HtmlResponse(html).into_response()
            }
            Served::Ready(Rendered::Redirect(to)) => Redirect::temporary(&to).into_response(),
        }
    }
}

async fn listing(
    State(site): State<Arc<Site>>,
    MyQuery(query): MyQuery<ListingQuery>,
) -> Result<Served, AppError> {
    let target = site.listing_target(query.page);
    site.serve(target).await
}

async fn post(
    State(site): State<Arc<Site>>,
    UrlPath(slug): UrlPath<String>,
) -> Result<Served, AppError> {
    site.serve(Target::Post { slug }).await
}

pub fn router(site: Arc<Site>, static_dir: Option<&Path>) -> Router {
    let mut routes = Router::new()
        .route("/", get(listing))
        .route("/post/:slug", get(post));

    if let Some(dir) = static_dir {
        routes = routes.nest_service("/static", ServeDir::new(dir));
    }

    let base_path = site.base_path().to_string();
    let routes = routes.with_state(site);

    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    };

    app.layer(TraceLayer::new_for_http())
}
