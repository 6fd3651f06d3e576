//! Request and response bodies.
//!
//! Money goes over the wire as integer cents (`*_cents` fields); discount
//! percentages as plain numbers with up to two decimals (`12.5`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{
    BundleTier, Discount, DiscountScope, Expense, Page, PaymentMethod, Product, SalesSummary,
    TopProduct, TransactionItemView, TransactionView,
};

// =============================================================================
// Query strings
// =============================================================================

/// Shared list parameters. Each endpoint reads the ones it understands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(U) -> T) -> Self {
        let page = page.map(f);
        PageResponse {
            data: page.data,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub discount_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    /// Backdating for imports; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub line_total_cents: i64,
}

impl From<TransactionItemView> for TransactionItemResponse {
    fn from(item: TransactionItemView) -> Self {
        TransactionItemResponse {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            line_total_cents: item.line_total.cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: String,
    pub total_amount_cents: i64,
    pub profit_cents: i64,
    pub discount_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransactionItemResponse>,
}

impl From<TransactionView> for TransactionResponse {
    fn from(view: TransactionView) -> Self {
        TransactionResponse {
            id: view.id,
            total_amount_cents: view.total_amount.cents(),
            profit_cents: view.profit.cents(),
            discount_code: view.discount_code,
            payment_method: view.payment_method,
            created_at: view.created_at,
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BundleBody {
    pub quantity: i64,
    pub price_cents: i64,
}

impl From<BundleTier> for BundleBody {
    fn from(tier: BundleTier) -> Self {
        BundleBody {
            quantity: tier.quantity,
            price_cents: tier.price.cents(),
        }
    }
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub bundle: Option<BundleBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock: i64,
    pub bundle: Option<BundleBody>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id,
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            cost_cents: product.cost.cents(),
            stock: product.stock,
            bundle: product.bundle.map(Into::into),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// Body of `POST /discounts` and `PUT /discounts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountRequest {
    pub name: String,
    pub code: String,
    pub scope: DiscountScope,
    pub percentage: f64,
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountResponse {
    pub id: String,
    pub name: String,
    pub code: String,
    pub scope: DiscountScope,
    pub percentage: f64,
    pub product_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Discount> for DiscountResponse {
    fn from(discount: Discount) -> Self {
        DiscountResponse {
            id: discount.id,
            name: discount.name,
            code: discount.code,
            scope: discount.scope,
            percentage: discount.percentage.as_percent(),
            product_id: discount.product_id,
            created_at: discount.created_at,
            updated_at: discount.updated_at,
        }
    }
}

// =============================================================================
// Expenses
// =============================================================================

/// Body of `POST /expenses` and `PUT /expenses/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    pub amount_cents: i64,
    pub category: Option<String>,
    pub incurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    pub category: Option<String>,
    pub incurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        ExpenseResponse {
            id: expense.id,
            description: expense.description,
            amount_cents: expense.amount.cents(),
            category: expense.category,
            incurred_at: expense.incurred_at,
            created_at: expense.created_at,
        }
    }
}

// =============================================================================
// Analytics
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopProductResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

impl From<TopProduct> for TopProductResponse {
    fn from(top: TopProduct) -> Self {
        TopProductResponse {
            product_id: top.product_id,
            name: top.name,
            quantity: top.quantity,
            revenue_cents: top.revenue.cents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub transaction_count: i64,
    pub items_sold: i64,
    pub revenue_cents: i64,
    pub profit_cents: i64,
    pub expenses_cents: i64,
    pub net_income_cents: i64,
    pub top_products: Vec<TopProductResponse>,
}

impl From<SalesSummary> for SummaryResponse {
    fn from(summary: SalesSummary) -> Self {
        SummaryResponse {
            transaction_count: summary.transaction_count,
            items_sold: summary.items_sold,
            revenue_cents: summary.revenue.cents(),
            profit_cents: summary.profit.cents(),
            expenses_cents: summary.expenses.cents(),
            net_income_cents: summary.net_income.cents(),
            top_products: summary.top_products.into_iter().map(Into::into).collect(),
        }
    }
}
