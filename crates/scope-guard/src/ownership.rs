// Single-owner capability injected into the guard
//
// The guard does not derive ownership itself. It asks a capability whether a
// caller is the owner and tells it when ownership moves. `SingleOwner` is the
// standard implementation; hosts with their own ownership primitive implement
// the trait instead.
use crate::types::Address;

#[cfg_attr(test, mockall::automock)]
pub trait OwnerCapability {
    /// Current owner, or `None` once ownership has been renounced
    fn owner(&self) -> Option<Address>;

    /// Whether `caller` may perform owner-only operations
    fn is_owner(&self, caller: &Address) -> bool {
        self.owner().as_ref() == Some(caller)
    }

    /// Hand ownership to `new_owner`; `None` renounces it
    fn transfer(&mut self, new_owner: Option<Address>);
}

/// Plain owner slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleOwner {
    owner: Option<Address>,
}

impl SingleOwner {
    pub const fn new(owner: Address) -> Self {
        Self { owner: Some(owner) }
    }
}

impl OwnerCapability for SingleOwner {
    fn owner(&self) -> Option<Address> {
        self.owner
    }

    fn transfer(&mut self, new_owner: Option<Address>) {
        self.owner = new_owner;
    }
}
