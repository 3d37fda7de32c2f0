//! Business logic services for the Retail Inventory Management Platform

pub mod activity;
pub mod customer;
pub mod money;
pub mod order;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod warehouse;

pub use activity::ActivityLogService;
pub use customer::CustomerService;
pub use money::MoneyService;
pub use order::OrderService;
pub use product::ProductService;
pub use purchase::PurchaseService;
pub use sale::SaleService;
pub use settings::SettingsService;
pub use stock::StockService;
pub use warehouse::WarehouseService;
