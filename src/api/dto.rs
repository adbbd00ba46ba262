use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::domain::order::{Order, OrderDraft, OrderStatus, Page, PageRequest, Sort, UnknownStatus};

// ============================================================================
// Response Envelope
// ============================================================================

/// `{ "success": .., "message": .., "data": .., <extra fields> }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            extra: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            extra: Map::new(),
        }
    }
}

// ============================================================================
// Order Views
// ============================================================================

/// Human-readable label for a status. Presentation only; never stored.
pub fn status_text(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order received",
        OrderStatus::Confirmed => "Order confirmed",
        OrderStatus::Preparing => "Cooking",
        OrderStatus::Ready => "Ready for pickup",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i64,
    pub customer_name: String,
    pub menu_item: String,
    pub quantity: i32,
    pub total_price: i32,
    pub status: OrderStatus,
    pub status_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            menu_item: order.menu_item,
            quantity: order.quantity,
            total_price: order.total_price,
            status: order.status,
            status_text: status_text(order.status),
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

pub fn views(orders: Vec<Order>) -> Vec<OrderView> {
    orders.into_iter().map(OrderView::from).collect()
}

/// Page contents plus the paging fields the list endpoints report.
pub fn page_response(page: Page<Order>) -> ApiResponse<Vec<OrderView>> {
    let Page {
        content,
        total_elements,
        total_pages,
        number,
        ..
    } = page;

    ApiResponse::ok(views(content))
        .with("totalElements", total_elements)
        .with("totalPages", total_pages)
        .with("currentPage", number)
}

// ============================================================================
// Requests
// ============================================================================

const MAX_CUSTOMER_NAME: usize = 100;
const MAX_MENU_ITEM: usize = 200;
const MAX_NOTES: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub menu_item: String,
    pub quantity: i32,
    pub total_price: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(self) -> Result<OrderDraft, ApiError> {
        let customer_name = required(self.customer_name, "customerName", MAX_CUSTOMER_NAME)?;
        let menu_item = required(self.menu_item, "menuItem", MAX_MENU_ITEM)?;

        if self.quantity < 1 {
            return Err(ApiError::Validation("quantity must be at least 1".to_string()));
        }
        if self.total_price < 0 {
            return Err(ApiError::Validation("totalPrice must not be negative".to_string()));
        }

        let mut draft = OrderDraft::new(customer_name, menu_item, self.quantity, self.total_price);
        if let Some(notes) = self.notes.filter(|n| !n.trim().is_empty()) {
            if notes.chars().count() > MAX_NOTES {
                return Err(ApiError::Validation(format!(
                    "notes must be at most {} characters",
                    MAX_NOTES
                )));
            }
            draft = draft.with_notes(notes);
        }
        Ok(draft)
    }
}

fn required(value: String, field: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        let request = PageRequest::new(self.page, self.size);
        match self.sort.as_deref() {
            None => Ok(request),
            Some(raw) => {
                let sort: Sort = raw.parse().map_err(ApiError::Validation)?;
                Ok(request.with_sort(sort))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub customer_name: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

fn default_size() -> u32 {
    10
}

pub fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    raw.parse()
        .map_err(|e: UnknownStatus| ApiError::Validation(e.to_string()))
}
