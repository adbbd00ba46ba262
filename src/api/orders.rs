use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};

use super::dto::{
    page_response, parse_status, views, ApiResponse, CreateOrderRequest, ListQuery, OrderView, RangeQuery,
    SearchQuery, StatusQuery,
};
use super::error::ApiError;
use super::AppState;
use crate::domain::order::PageRequest;

type ApiResult = Result<HttpResponse, ApiError>;

/// POST /api/orders
pub async fn create(state: web::Data<AppState>, body: web::Json<CreateOrderRequest>) -> ApiResult {
    let draft = body.into_inner().validate()?;
    let order = state.manager.create(draft).await?;

    Ok(HttpResponse::Created()
        .json(ApiResponse::ok(OrderView::from(order)).with_message("Order created successfully")))
}

/// GET /api/orders/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult {
    let order = state.manager.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(OrderView::from(order))))
}

/// GET /api/orders?page=&size=&sort=
pub async fn list(state: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult {
    let page = state.manager.list(&query.page_request()?).await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/orders/status/{status}
pub async fn by_status(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let status = parse_status(&path)?;
    let orders = state.manager.list_by_status(status).await?;
    let count = orders.len();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(views(orders)).with("count", count)))
}

/// GET /api/orders/search?customerName=&page=&size=
pub async fn search(state: web::Data<AppState>, query: web::Query<SearchQuery>) -> ApiResult {
    let query = query.into_inner();
    let text = query.customer_name.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("customerName is required".to_string()));
    }

    let page = state
        .manager
        .search_by_customer(text, &PageRequest::new(query.page, query.size))
        .await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// GET /api/orders/recent
pub async fn recent(state: web::Data<AppState>) -> ApiResult {
    let orders = state.manager.recent_orders().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(views(orders))))
}

/// GET /api/orders/range?start=&end=
pub async fn range(state: web::Data<AppState>, query: web::Query<RangeQuery>) -> ApiResult {
    if query.start > query.end {
        return Err(ApiError::Validation("start must not be after end".to_string()));
    }

    let orders = state.manager.orders_between(query.start, query.end).await?;
    let count = orders.len();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(views(orders)).with("count", count)))
}

/// GET /api/orders/summary
pub async fn summary(state: web::Data<AppState>) -> ApiResult {
    let counts: Map<String, Value> = state
        .manager
        .status_summary()
        .await?
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), Value::from(count)))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(counts)))
}

/// DELETE /api/orders/{id}
pub async fn cancel(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult {
    let order = state.manager.cancel(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(OrderView::from(order)).with_message("Order cancelled")))
}

/// PATCH /api/orders/{id}/status?status=
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<StatusQuery>,
) -> ApiResult {
    let status = parse_status(&query.status)?;
    let order = state.manager.update_status(path.into_inner(), status).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(OrderView::from(order)).with_message("Order status updated")))
}
