//! PostgreSQL implementations of the store traits.

pub mod notification;
pub mod prescription;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod user;

pub use notification::NotificationRepository;
pub use prescription::PrescriptionRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;
pub use sale::SaleRepository;
pub use user::UserRepository;
