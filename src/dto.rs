//! Nested read-only JSON representations. List/detail endpoints embed their
//! relations as sub-objects (order ⊃ customer + meal kit, customer ⊃
//! subscription plan ⊃ company, …); relations are batch-loaded by id to keep
//! list endpoints at a fixed number of queries.

use std::collections::HashMap;

use anyhow::Context;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        CartItemEntity, ChefPlanEntity, CompanyEntity, CustomerEntity, GiftCardEntity,
        MealKitEntity, OrderEntity, ReviewEntity, SubscriptionPlanEntity,
    },
    schema::{companies, customers, gift_cards, meal_kits, subscription_plans},
};

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct SubscriptionPlanJson {
    pub id: i32,
    pub plan_name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub meals_per_week: i32,
    pub company: Option<CompanyEntity>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CustomerJson {
    pub id: i32,
    pub user_id: Option<i32>,
    pub customer_name: Option<String>,
    pub gender: String,
    pub age: Option<i32>,
    pub mobile: String,
    pub address: Option<String>,
    pub subscription_plan: Option<SubscriptionPlanJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct MealKitJson {
    pub id: i32,
    pub meal_name: String,
    pub description: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub ingredients: String,
    pub chef: Option<CustomerJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ChefPlanJson {
    pub id: i32,
    pub user_id: Option<i32>,
    pub plan_name: String,
    pub cooking_experience: i32,
    pub event_type: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<BigDecimal>,
    pub chef: Option<CustomerJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct GiftCardJson {
    pub id: i32,
    pub gift_type: String,
    pub gift_amount: i32,
    pub quantity: i32,
    pub customer: Option<CustomerJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CartItemJson {
    pub id: i32,
    pub quantity: i32,
    pub user: Option<CustomerJson>,
    pub gift_card: Option<GiftCardJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct OrderJson {
    pub id: i32,
    pub status: String,
    pub payment_status: String,
    pub order_date: DateTime<Utc>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
    pub currency: String,
    pub user: Option<CustomerJson>,
    pub meal_kit: Option<MealKitJson>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ReviewJson {
    pub id: i32,
    pub rating: i32,
    pub comment: String,
    pub review_date: DateTime<Utc>,
    pub user: Option<CustomerJson>,
    pub meal_kit: Option<MealKitJson>,
}

// Projection of already-fetched entity pages into their JSON shape.

pub async fn subscription_plans_json(
    conn: &mut AsyncPgConnection,
    plans: Vec<SubscriptionPlanEntity>,
) -> Result<Vec<SubscriptionPlanJson>, AppError> {
    let company_ids: Vec<i32> = plans.iter().map(|p| p.company_id).collect();
    let company_by_id = company_map(conn, &company_ids).await?;

    Ok(plans
        .into_iter()
        .map(|p| SubscriptionPlanJson {
            id: p.id,
            plan_name: p.plan_name,
            description: p.description,
            price: p.price,
            meals_per_week: p.meals_per_week,
            company: company_by_id.get(&p.company_id).cloned(),
        })
        .collect())
}

pub async fn customers_json(
    conn: &mut AsyncPgConnection,
    rows: Vec<CustomerEntity>,
) -> Result<Vec<CustomerJson>, AppError> {
    let plan_ids: Vec<i32> = rows.iter().filter_map(|c| c.subscription_plan_id).collect();
    let plan_by_id = plan_map(conn, &plan_ids).await?;

    Ok(rows
        .into_iter()
        .map(|c| {
            let plan = c
                .subscription_plan_id
                .and_then(|id| plan_by_id.get(&id).cloned());
            CustomerJson {
                id: c.id,
                user_id: c.user_id,
                customer_name: c.customer_name,
                gender: c.gender,
                age: c.age,
                mobile: c.mobile,
                address: c.address,
                subscription_plan: plan,
            }
        })
        .collect())
}

pub async fn meal_kits_json(
    conn: &mut AsyncPgConnection,
    kits: Vec<MealKitEntity>,
) -> Result<Vec<MealKitJson>, AppError> {
    let chef_ids: Vec<i32> = kits.iter().map(|k| k.chef_id).collect();
    let chef_by_id = customer_map(conn, &chef_ids).await?;

    Ok(kits
        .into_iter()
        .map(|k| MealKitJson {
            id: k.id,
            meal_name: k.meal_name,
            description: k.description,
            price: k.price,
            ingredients: k.ingredients,
            chef: chef_by_id.get(&k.chef_id).cloned(),
        })
        .collect())
}

pub async fn chef_plans_json(
    conn: &mut AsyncPgConnection,
    plans: Vec<ChefPlanEntity>,
) -> Result<Vec<ChefPlanJson>, AppError> {
    let chef_ids: Vec<i32> = plans.iter().map(|p| p.chef_id).collect();
    let chef_by_id = customer_map(conn, &chef_ids).await?;

    Ok(plans
        .into_iter()
        .map(|p| ChefPlanJson {
            id: p.id,
            user_id: p.user_id,
            plan_name: p.plan_name,
            cooking_experience: p.cooking_experience,
            event_type: p.event_type,
            price: p.price,
            chef: chef_by_id.get(&p.chef_id).cloned(),
        })
        .collect())
}

pub async fn gift_cards_json(
    conn: &mut AsyncPgConnection,
    cards: Vec<GiftCardEntity>,
) -> Result<Vec<GiftCardJson>, AppError> {
    let customer_ids: Vec<i32> = cards.iter().map(|c| c.customer_id).collect();
    let customer_by_id = customer_map(conn, &customer_ids).await?;

    Ok(cards
        .into_iter()
        .map(|card| GiftCardJson {
            id: card.id,
            gift_type: card.gift_type,
            gift_amount: card.gift_amount,
            quantity: card.quantity,
            customer: customer_by_id.get(&card.customer_id).cloned(),
        })
        .collect())
}

pub async fn cart_items_json(
    conn: &mut AsyncPgConnection,
    items: Vec<CartItemEntity>,
) -> Result<Vec<CartItemJson>, AppError> {
    let customer_ids: Vec<i32> = items.iter().map(|i| i.customer_id).collect();
    let gift_card_ids: Vec<i32> = items.iter().map(|i| i.gift_card_id).collect();
    let customer_by_id = customer_map(conn, &customer_ids).await?;
    let card_by_id = gift_card_map(conn, &gift_card_ids).await?;

    Ok(items
        .into_iter()
        .map(|item| CartItemJson {
            id: item.id,
            quantity: item.quantity,
            user: customer_by_id.get(&item.customer_id).cloned(),
            gift_card: card_by_id.get(&item.gift_card_id).cloned(),
        })
        .collect())
}

pub async fn orders_json(
    conn: &mut AsyncPgConnection,
    orders: Vec<OrderEntity>,
) -> Result<Vec<OrderJson>, AppError> {
    let customer_ids: Vec<i32> = orders.iter().map(|o| o.customer_id).collect();
    let meal_kit_ids: Vec<i32> = orders.iter().map(|o| o.meal_kit_id).collect();
    let customer_by_id = customer_map(conn, &customer_ids).await?;
    let kit_by_id = meal_kit_map(conn, &meal_kit_ids).await?;

    Ok(orders
        .into_iter()
        .map(|o| OrderJson {
            id: o.id,
            status: o.status,
            payment_status: o.payment_status,
            order_date: o.order_date,
            razorpay_order_id: o.razorpay_order_id,
            razorpay_payment_id: o.razorpay_payment_id,
            razorpay_signature: o.razorpay_signature,
            total_price: o.total_price,
            currency: o.currency,
            user: customer_by_id.get(&o.customer_id).cloned(),
            meal_kit: kit_by_id.get(&o.meal_kit_id).cloned(),
        })
        .collect())
}

pub async fn reviews_json(
    conn: &mut AsyncPgConnection,
    reviews: Vec<ReviewEntity>,
) -> Result<Vec<ReviewJson>, AppError> {
    let customer_ids: Vec<i32> = reviews.iter().map(|r| r.customer_id).collect();
    let meal_kit_ids: Vec<i32> = reviews.iter().map(|r| r.meal_kit_id).collect();
    let customer_by_id = customer_map(conn, &customer_ids).await?;
    let kit_by_id = meal_kit_map(conn, &meal_kit_ids).await?;

    Ok(reviews
        .into_iter()
        .map(|r| ReviewJson {
            id: r.id,
            rating: r.rating,
            comment: r.comment,
            review_date: r.review_date,
            user: customer_by_id.get(&r.customer_id).cloned(),
            meal_kit: kit_by_id.get(&r.meal_kit_id).cloned(),
        })
        .collect())
}

// Relation maps, keyed by id.

async fn company_map(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<HashMap<i32, CompanyEntity>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<CompanyEntity> = companies::table
        .filter(companies::id.eq_any(ids))
        .select(CompanyEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to load companies")?;

    Ok(rows.into_iter().map(|c| (c.id, c)).collect())
}

async fn plan_map(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<HashMap<i32, SubscriptionPlanJson>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<SubscriptionPlanEntity> = subscription_plans::table
        .filter(subscription_plans::id.eq_any(ids))
        .select(SubscriptionPlanEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to load subscription plans")?;

    let plans = subscription_plans_json(conn, rows).await?;
    Ok(plans.into_iter().map(|p| (p.id, p)).collect())
}

async fn customer_map(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<HashMap<i32, CustomerJson>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<CustomerEntity> = customers::table
        .filter(customers::id.eq_any(ids))
        .select(CustomerEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to load customers")?;

    let customers = customers_json(conn, rows).await?;
    Ok(customers.into_iter().map(|c| (c.id, c)).collect())
}

async fn meal_kit_map(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<HashMap<i32, MealKitJson>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<MealKitEntity> = meal_kits::table
        .filter(meal_kits::id.eq_any(ids))
        .select(MealKitEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to load meal kits")?;

    let kits = meal_kits_json(conn, rows).await?;
    Ok(kits.into_iter().map(|k| (k.id, k)).collect())
}

async fn gift_card_map(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<HashMap<i32, GiftCardJson>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<GiftCardEntity> = gift_cards::table
        .filter(gift_cards::id.eq_any(ids))
        .select(GiftCardEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to load gift cards")?;

    let cards = gift_cards_json(conn, rows).await?;
    Ok(cards.into_iter().map(|c| (c.id, c)).collect())
}
