// Guard state: the policy store and the records it holds
pub mod policy_store;
pub mod target;

pub use policy_store::PolicyStore;
pub use target::{ParameterKey, Target};
