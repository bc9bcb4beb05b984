pub mod auth;
pub mod cart_items;
pub mod chef_plans;
pub mod companies;
pub mod customers;
pub mod gift_cards;
pub mod meal_kits;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod subscription_plans;
