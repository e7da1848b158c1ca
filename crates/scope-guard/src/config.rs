//! Policy provisioning from configuration files
//!
//! A policy file describes the targets a guard should allow and how each one is
//! scoped. Applying it goes through the administration API, so every entry is
//! owner-checked and shows up in the event journal like a manual change.
//!
//! ```toml
//! owner = "0x00000000000000000000000000000000000000aa"
//!
//! [[targets]]
//! address = "0x00000000000000000000000000000000000000d0"
//! allowed = true
//! scoped = true
//! value_allowed = true
//!
//! [[targets.functions]]
//! signature = "transfer(address,uint256)"
//! parameters = [{ index = 0, address = "0x00000000000000000000000000000000000000a1" }]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

use crate::guard::ScopeGuard;
use crate::ownership::OwnerCapability;
use crate::types::{Address, Selector, Word};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Expected guard owner; checked against the guard when applying
    #[serde(default)]
    pub owner: Option<Address>,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub address: Address,

    #[serde(default)]
    pub allowed: bool,

    #[serde(default)]
    pub scoped: bool,

    #[serde(default)]
    pub delegate_call_allowed: bool,

    #[serde(default)]
    pub fallback_allowed: bool,

    #[serde(default)]
    pub value_allowed: bool,

    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
}

/// A function is named either by its raw selector or by its canonical signature
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    #[serde(default)]
    pub selector: Option<Selector>,

    #[serde(default)]
    pub signature: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterConfig {
    pub index: usize,

    #[serde(flatten)]
    pub value: ParameterValue,
}

/// Allowed parameter value in one of its accepted encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    /// Raw 32-byte word
    Word(Word),
    /// Address, left-padded to a word
    Address(Address),
    /// Unsigned integer, big-endian and left-padded to a word
    Uint(u64),
}

impl ParameterValue {
    pub fn to_word(self) -> Word {
        match self {
            Self::Word(word) => word,
            Self::Address(address) => address.to_word(),
            Self::Uint(value) => Word::from_uint(u128::from(value)),
        }
    }
}

impl FunctionConfig {
    /// Selector named by this entry
    pub fn resolve_selector(&self) -> Result<Selector> {
        match (&self.selector, &self.signature) {
            (Some(selector), None) => Ok(*selector),
            (None, Some(signature)) => Ok(Selector::from_signature(signature)),
            (Some(selector), Some(signature)) => {
                let derived = Selector::from_signature(signature);
                if derived != *selector {
                    bail!("selector {selector} does not match signature {signature} ({derived})");
                }
                Ok(derived)
            }
            (None, None) => bail!("function entry needs a selector or a signature"),
        }
    }
}

impl PolicyConfig {
    /// Load and validate a policy file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse policy file: {}", path.display()))
    }

    /// Parse and validate policy text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid policy TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject entries that cannot be applied unambiguously
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.address) {
                bail!("target {} is listed more than once", target.address);
            }
            for function in &target.functions {
                function
                    .resolve_selector()
                    .with_context(|| format!("Invalid function entry on target {}", target.address))?;
            }
        }
        Ok(())
    }

    /// Provision `guard` with this policy, acting as `caller`.
    ///
    /// Stops at the first rejected change; changes applied before it remain.
    pub fn apply<O: OwnerCapability>(&self, guard: &mut ScopeGuard<O>, caller: &Address) -> Result<()> {
        if let Some(expected) = self.owner {
            if guard.owner() != Some(expected) {
                bail!("policy expects owner {expected}, guard is owned by {:?}", guard.owner());
            }
        }

        for target in &self.targets {
            let address = target.address;
            guard.set_target_allowed(caller, address, target.allowed)?;
            guard.set_scoped(caller, address, target.scoped)?;
            guard.set_delegate_call_allowed_on_target(caller, address, target.delegate_call_allowed)?;
            guard.set_fallback_allowed_on_target(caller, address, target.fallback_allowed)?;
            guard.set_value_allowed_on_target(caller, address, target.value_allowed)?;

            for function in &target.functions {
                let selector = function.resolve_selector()?;
                guard.set_allowed_function(caller, address, selector, true)?;
                for parameter in &function.parameters {
                    guard.set_parameter_allowed_on_function(
                        caller,
                        address,
                        selector,
                        parameter.index,
                        parameter.value.to_word(),
                        true,
                    )?;
                }
            }
        }

        info!(targets = self.targets.len(), "policy applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GuardError;

    const POLICY: &str = r#"
owner = "0x00000000000000000000000000000000000000aa"

[[targets]]
address = "0x00000000000000000000000000000000000000d0"
allowed = true
scoped = true
value_allowed = true

[[targets.functions]]
signature = "transfer(address,uint256)"
parameters = [
    { index = 0, address = "0x00000000000000000000000000000000000000a1" },
    { index = 0, uint = 7 },
]

[[targets.functions]]
selector = "0x095ea7b3"

[[targets]]
address = "0x00000000000000000000000000000000000000d1"
allowed = true
delegate_call_allowed = true
"#;

    fn owner() -> Address {
        "0x00000000000000000000000000000000000000aa".parse().unwrap()
    }

    #[test]
    fn test_parse_policy() {
        let config = PolicyConfig::from_toml_str(POLICY).unwrap();
        assert_eq!(config.owner, Some(owner()));
        assert_eq!(config.targets.len(), 2);

        let functions = &config.targets[0].functions;
        assert_eq!(
            functions[0].resolve_selector().unwrap(),
            Selector::from_signature("transfer(address,uint256)")
        );
        assert_eq!(functions[0].parameters[1].value, ParameterValue::Uint(7));
        assert_eq!(functions[1].resolve_selector().unwrap(), Selector([0x09, 0x5e, 0xa7, 0xb3]));
        assert!(!config.targets[1].scoped);
    }

    #[test]
    fn test_apply_policy() {
        let config = PolicyConfig::from_toml_str(POLICY).unwrap();
        let mut guard = ScopeGuard::new(owner(), owner());
        guard.drain_events();
        config.apply(&mut guard, &owner()).unwrap();

        let d0: Address = "0x00000000000000000000000000000000000000d0".parse().unwrap();
        let d1: Address = "0x00000000000000000000000000000000000000d1".parse().unwrap();
        let a1: Address = "0x00000000000000000000000000000000000000a1".parse().unwrap();
        let transfer = Selector::from_signature("transfer(address,uint256)");

        assert!(guard.is_scoped(&d0));
        assert!(guard.is_value_allowed(&d0));
        assert!(guard.is_allowed_parameter(&d0, transfer, 0, a1.to_word()));
        assert!(guard.is_allowed_parameter(&d0, transfer, 0, Word::from_uint(7)));
        assert!(guard.is_allowed_to_delegate_call(&d1));
        assert!(!guard.is_scoped(&d1));

        // 5 flags + 2 functions + 2 parameters, then 5 flags
        assert_eq!(guard.events().len(), 14);
    }

    #[test]
    fn test_apply_requires_owner() {
        let config = PolicyConfig::from_toml_str(POLICY).unwrap();
        let mut guard = ScopeGuard::new(owner(), owner());
        let stranger = Address::repeat_byte(0x99);

        let err = config.apply(&mut guard, &stranger).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GuardError>(),
            Some(&GuardError::NotOwner { caller: stranger })
        );
        assert_eq!(guard.store().target_count(), 0);

        let mut other = ScopeGuard::new(stranger, stranger);
        assert!(config.apply(&mut other, &stranger).is_err());
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = r#"
[[targets]]
address = "0x00000000000000000000000000000000000000d0"
[[targets]]
address = "0x00000000000000000000000000000000000000d0"
"#;
        assert!(PolicyConfig::from_toml_str(duplicate).is_err());

        let nameless = r#"
[[targets]]
address = "0x00000000000000000000000000000000000000d0"
[[targets.functions]]
"#;
        assert!(PolicyConfig::from_toml_str(nameless).is_err());

        let mismatched = r#"
[[targets]]
address = "0x00000000000000000000000000000000000000d0"
[[targets.functions]]
selector = "0xdeadbeef"
signature = "transfer(address,uint256)"
"#;
        assert!(PolicyConfig::from_toml_str(mismatched).is_err());

        let bad_address = r#"
[[targets]]
address = "0x1234"
"#;
        assert!(PolicyConfig::from_toml_str(bad_address).is_err());
    }
}
