use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_ingest::{
    router, AppState, CatalogConfig, CatalogResult, CatalogService, SourceFormat, SourceResponse,
    SourceSpec, Transport,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const CATALOG: &str = "\
id,name,description,category,price,popularity,net_feedback
a,Lamp,Warm desk light,Home,10,5,1
b,Desk,\"Oak, large\",Home|Office,20,9,2
c,Chair,Ergonomic,Office,30,7,3
";

struct Fixed;

#[async_trait]
impl Transport for Fixed {
    async fn open(&self, _: &SourceSpec) -> CatalogResult<SourceResponse> {
        Ok(SourceResponse::from_bytes(200, "text/csv; charset=utf-8", CATALOG))
    }
}

fn app() -> Router {
    let config = CatalogConfig {
        sources: vec![SourceSpec::new("Fixture CSV", "https://fixture/p.csv", SourceFormat::Csv)],
        primary_from_env: true,
        ..CatalogConfig::default()
    };
    router(AppState::new(CatalogService::with_transport(&config, Arc::new(Fixed))))
}

async fn get(app: Router, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn price_bounds_are_inclusive() -> anyhow::Result<()> {
    let (status, body) = get(app(), "/api/products?minPrice=15&maxPrice=25").await?;
    assert_eq!(status, StatusCode::OK);

    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["price"], 20.0);
    assert_eq!(products[0]["description"], "Oak, large");
    assert_eq!(products[0]["dataSource"], "Fixture CSV");
    assert_eq!(body["pagination"]["totalProducts"], 1);
    assert_eq!(body["dataSource"], "Fixture CSV");
    assert!(body["debugInfo"]["lastErrorDetails"].is_null());
    Ok(())
}

#[tokio::test]
async fn blank_price_bounds_are_ignored() -> anyhow::Result<()> {
    let (status, body) = get(app(), "/api/products?minPrice=&maxPrice=25&sortBy=price&sortOrder=asc").await?;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<f64> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["price"].as_f64())
        .collect();
    assert_eq!(prices, [10.0, 20.0]);

    let (status, _) = get(app(), "/api/products?minPrice=cheap").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn defaults_sort_by_popularity_descending() -> anyhow::Result<()> {
    let (_, body) = get(app(), "/api/products").await?;
    let ids: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert_eq!(ids, ["b", "c", "a"]);
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["filters"]["categories"], serde_json::json!(["Home", "Office"]));
    assert_eq!(body["filters"]["priceRange"]["min"], 10.0);
    assert_eq!(body["filters"]["priceRange"]["max"], 30.0);
    Ok(())
}

#[tokio::test]
async fn sort_and_page_parameters() -> anyhow::Result<()> {
    let (_, body) = get(app(), "/api/products?sortBy=name&sortOrder=asc&limit=2&page=2").await?;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Lamp");
    assert_eq!(body["pagination"]["hasPrevPage"], true);
    assert_eq!(body["pagination"]["hasNextPage"], false);
    Ok(())
}

#[tokio::test]
async fn invalid_parameters_are_bad_requests() -> anyhow::Result<()> {
    for uri in [
        "/api/products?page=0",
        "/api/products?limit=0",
        "/api/products?page=two",
        "/api/products?sortBy=color",
    ] {
        let (status, body) = get(app(), uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string());
        assert!(body["details"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn debug_reports_primary_probe() -> anyhow::Result<()> {
    let (status, body) = get(app(), "/api/debug").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primarySource"]["name"], "Fixture CSV");
    assert_eq!(body["primarySource"]["fromEnv"], true);
    assert_eq!(body["fetchTest"]["status"], 200);
    assert_eq!(body["fetchTest"]["isHtml"], false);
    assert!(body["fetchTest"]["contentPreview"]
        .as_str()
        .unwrap()
        .starts_with("id,name"));
    assert!(body["fetchError"].is_null());
    assert_eq!(body["cache"]["expired"], true);
    Ok(())
}

#[tokio::test]
async fn health_check() -> anyhow::Result<()> {
    let (status, body) = get(app(), "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "catalog_ingest");
    Ok(())
}

struct Exploding;

#[async_trait]
impl Transport for Exploding {
    async fn open(&self, _: &SourceSpec) -> CatalogResult<SourceResponse> {
        panic!("transport exploded")
    }
}

#[tokio::test]
async fn handler_panics_become_json_500() -> anyhow::Result<()> {
    let config = CatalogConfig::default();
    let app = router(AppState::new(CatalogService::with_transport(&config, Arc::new(Exploding))));
    let (status, body) = get(app, "/api/products").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch products");
    assert_eq!(body["details"], "transport exploded");
    Ok(())
}
