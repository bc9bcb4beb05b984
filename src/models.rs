use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Users

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_chef: bool,
    pub is_customer: bool,
    pub is_company: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_chef: bool,
    pub is_customer: bool,
    pub is_company: bool,
}

// Companies

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CompanyEntity {
    pub id: i32,
    pub user_id: Option<i32>,
    pub company_name: String,
    pub email: String,
    pub food_type: String,
    pub category: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::companies)]
pub struct CreateCompanyEntity {
    pub user_id: Option<i32>,
    pub company_name: String,
    pub email: String,
    pub food_type: String,
    pub category: String,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::companies)]
pub struct UpdateCompanyEntity {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub food_type: Option<String>,
    pub category: Option<String>,
}

// Subscription plans

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::subscription_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionPlanEntity {
    pub id: i32,
    pub plan_name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub meals_per_week: i32,
    pub company_id: i32,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::subscription_plans)]
pub struct CreateSubscriptionPlanEntity {
    pub plan_name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub meals_per_week: i32,
    pub company_id: i32,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::subscription_plans)]
pub struct UpdateSubscriptionPlanEntity {
    pub plan_name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub meals_per_week: Option<i32>,
}

// Customers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: i32,
    pub user_id: Option<i32>,
    pub customer_name: Option<String>,
    pub gender: String,
    pub age: Option<i32>,
    pub mobile: String,
    pub address: Option<String>,
    pub subscription_plan_id: Option<i32>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::customers)]
pub struct CreateCustomerEntity {
    pub user_id: Option<i32>,
    pub customer_name: Option<String>,
    pub gender: String,
    pub age: Option<i32>,
    pub mobile: String,
    pub address: Option<String>,
    pub subscription_plan_id: Option<i32>,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::customers)]
pub struct UpdateCustomerEntity {
    pub customer_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub subscription_plan_id: Option<i32>,
}

// Meal kits

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::meal_kits)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MealKitEntity {
    pub id: i32,
    pub meal_name: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub chef_id: i32,
    pub ingredients: String,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::meal_kits)]
pub struct CreateMealKitEntity {
    pub meal_name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub chef_id: i32,
    pub ingredients: String,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::meal_kits)]
pub struct UpdateMealKitEntity {
    pub meal_name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub ingredients: Option<String>,
}

// Chef plans

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::chef_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChefPlanEntity {
    pub id: i32,
    pub user_id: Option<i32>,
    pub chef_id: i32,
    pub plan_name: String,
    pub cooking_experience: i32,
    pub event_type: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::chef_plans)]
pub struct CreateChefPlanEntity {
    pub chef_id: i32,
    pub plan_name: String,
    pub cooking_experience: i32,
    pub event_type: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::chef_plans)]
pub struct UpdateChefPlanEntity {
    pub plan_name: Option<String>,
    pub cooking_experience: Option<i32>,
    pub event_type: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
}

// Gift cards

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::gift_cards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GiftCardEntity {
    pub id: i32,
    pub gift_type: String,
    pub gift_amount: i32,
    pub quantity: i32,
    pub customer_id: i32,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::gift_cards)]
pub struct CreateGiftCardEntity {
    #[serde(default = "default_gift_type")]
    pub gift_type: String,
    pub gift_amount: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub customer_id: i32,
}

fn default_gift_type() -> String {
    "Meal".to_string()
}

fn default_quantity() -> i32 {
    1
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::gift_cards)]
pub struct UpdateGiftCardEntity {
    pub gift_type: Option<String>,
    pub gift_amount: Option<i32>,
    pub quantity: Option<i32>,
}

// Cart items

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemEntity {
    pub id: i32,
    pub customer_id: i32,
    pub gift_card_id: i32,
    pub quantity: i32,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CreateCartItemEntity {
    pub customer_id: i32,
    pub gift_card_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct UpdateCartItemEntity {
    pub gift_card_id: Option<i32>,
    pub quantity: Option<i32>,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub customer_id: i32,
    pub meal_kit_id: i32,
    pub status: String,
    pub payment_status: String,
    pub order_date: DateTime<Utc>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
    pub idempotency_key: Option<String>,
    pub currency: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub customer_id: i32,
    pub meal_kit_id: i32,
    pub status: String,
    pub payment_status: String,
    pub razorpay_order_id: Option<String>,
    pub total_price: BigDecimal,
    pub idempotency_key: Option<String>,
    pub currency: String,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrderEntity {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

// Reviews

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewEntity {
    pub id: i32,
    pub customer_id: i32,
    pub meal_kit_id: i32,
    pub rating: i32,
    pub comment: String,
    pub review_date: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::reviews)]
pub struct CreateReviewEntity {
    pub customer_id: i32,
    pub meal_kit_id: i32,
    pub rating: i32,
    pub comment: String,
}

#[derive(AsChangeset, Deserialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::reviews)]
pub struct UpdateReviewEntity {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

// Token blacklist

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::token_blacklist)]
#[diesel(primary_key(jti))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlacklistedTokenEntity {
    pub jti: Uuid,
    pub user_id: i32,
    pub blacklisted_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::token_blacklist)]
pub struct CreateBlacklistedTokenEntity {
    pub jti: Uuid,
    pub user_id: i32,
}
