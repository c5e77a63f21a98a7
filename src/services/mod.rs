// Phone inventory services
pub mod phone_query;
pub mod phone_registry;

pub use phone_query::{PageRequest, PhoneListItem, PhonePage, PhoneQueryService};
pub use phone_registry::{PhoneRegistry, RegisterPhone};
