use crate::ApiError;
use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use bookrec_core::{Book, Recommender, ScoredItem, Strategy, DEFAULT_K};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Deserialize)]
struct SimilarParams {
    k: Option<usize>,
}

#[derive(Deserialize)]
struct RecommendRequest {
    user_id: String,
    k: Option<usize>,
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    items: usize,
    users: usize,
    books: usize,
}

#[derive(Serialize)]
struct BookScore<'a> {
    item_id: &'a str,
    score: f32,
    title: Option<&'a str>,
    author: Option<&'a str>,
    tags: &'a [String],
}

#[derive(Serialize)]
struct SimilarResponse<'a> {
    item_id: &'a str,
    similar: Vec<BookScore<'a>>,
}

#[derive(Serialize)]
struct RecommendResponse<'a> {
    user_id: &'a str,
    strategy: Strategy,
    items: Vec<BookScore<'a>>,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    count: usize,
    results: Vec<&'a Book>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        recommender: Arc<Recommender>,
        host: &str,
        port: u16,
    ) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(recommender.clone()))
                .configure(RestApi::configure)
        })
        .bind((host, port))?
        .run()
        .await
    }

    /// Routes and extractor settings. The recommender itself must be
    /// registered as `web::Data<Arc<Recommender>>` by the caller.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.app_data(
            web::QueryConfig::default()
                .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
        )
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
        )
        .route("/health", web::get().to(health))
        .route("/similar/{item_id}", web::get().to(similar))
        .route("/recommend", web::post().to(recommend))
        .route("/search", web::get().to(search))
        .default_service(web::to(unmatched));
    }
}

async fn health(recommender: web::Data<Arc<Recommender>>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        items: recommender.model().n_items(),
        users: recommender.model().n_users(),
        books: recommender.catalog().len(),
    })
}

async fn similar(
    recommender: web::Data<Arc<Recommender>>,
    path: web::Path<String>,
    query: web::Query<SimilarParams>,
) -> Result<HttpResponse, ApiError> {
    let item_id = path.into_inner();
    let k = query.k.unwrap_or(DEFAULT_K);

    let neighbors = recommender.similar(&item_id, k)?;
    Ok(HttpResponse::Ok().json(SimilarResponse {
        item_id: &item_id,
        similar: with_metadata(&recommender, &neighbors),
    }))
}

async fn recommend(
    recommender: web::Data<Arc<Recommender>>,
    req: web::Json<RecommendRequest>,
) -> Result<HttpResponse, ApiError> {
    let k = req.k.unwrap_or(DEFAULT_K);

    let recs = recommender.recommend(&req.user_id, k)?;
    debug!(
        "Recommend for '{}' via {:?}: {} items",
        recs.user_id,
        recs.strategy,
        recs.items.len()
    );
    Ok(HttpResponse::Ok().json(RecommendResponse {
        user_id: &recs.user_id,
        strategy: recs.strategy,
        items: with_metadata(&recommender, &recs.items),
    }))
}

async fn search(
    recommender: web::Data<Arc<Recommender>>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let results = recommender.search(&query.q, query.limit)?;
    Ok(HttpResponse::Ok().json(SearchResponse {
        count: results.len(),
        results,
    }))
}

async fn unmatched(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound(format!(
        "no route for {} {}",
        req.method(),
        req.path()
    )))
}

fn with_metadata<'a>(recommender: &'a Recommender, items: &'a [ScoredItem]) -> Vec<BookScore<'a>> {
    items
        .iter()
        .map(|item| {
            let book = recommender.book(&item.item_id);
            BookScore {
                item_id: &item.item_id,
                score: item.score,
                title: book.map(|b| b.title.as_str()),
                author: book.map(|b| b.author.as_str()),
                tags: book.map(|b| b.tags.as_slice()).unwrap_or(&[]),
            }
        })
        .collect()
}
