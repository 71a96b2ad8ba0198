pub mod order_book;
pub mod plan;
pub mod product;
pub mod production;
pub mod user;

pub mod prelude {
    pub use super::order_book::Entity as OrderBook;
    pub use super::plan::Entity as Plan;
    pub use super::product::Entity as Product;
    pub use super::production::Entity as Production;
    pub use super::user::Entity as User;
}
