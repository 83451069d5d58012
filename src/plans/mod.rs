//! Static plan-entitlement table.
//!
//! One [`PlanEntitlement`] per tier, loaded once at startup and never
//! mutated at runtime. The built-in values below are the product's
//! published ceilings; individual tiers can be overridden wholesale from
//! `config.toml`.

use serde::{Deserialize, Serialize};

use crate::types::{Limit, PlanTier};

const GIB: u64 = 1024 * 1024 * 1024;

/// What one plan tier entitles a user to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntitlement {
    /// Display name (e.g., "Basic").
    pub name: String,
    pub requests_per_month: Limit,
    pub requests_per_day: Limit,
    pub requests_per_minute: Limit,
    /// Model identifiers this tier may call.
    pub allowed_models: Vec<String>,
    /// Storage ceiling in bytes.
    pub storage_limit: Limit,
    /// Maximum number of world elements.
    pub max_elements: Limit,
}

impl PlanEntitlement {
    pub fn allows_model(&self, model: &str) -> bool {
        self.allowed_models.iter().any(|allowed| allowed == model)
    }

    fn basic() -> Self {
        Self {
            name: "Basic".to_string(),
            requests_per_month: Limit::Limited(1000),
            requests_per_day: Limit::Limited(50),
            requests_per_minute: Limit::Limited(5),
            allowed_models: vec!["gpt-4o-mini".to_string()],
            storage_limit: Limit::Limited(GIB),
            max_elements: Limit::Limited(100),
        }
    }

    fn pro() -> Self {
        Self {
            name: "Pro".to_string(),
            requests_per_month: Limit::Limited(20_000),
            requests_per_day: Limit::Limited(500),
            requests_per_minute: Limit::Limited(20),
            allowed_models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "claude-3-sonnet-20240620".to_string(),
            ],
            storage_limit: Limit::Limited(20 * GIB),
            max_elements: Limit::Limited(2000),
        }
    }

    fn enterprise() -> Self {
        Self {
            name: "Enterprise".to_string(),
            requests_per_month: Limit::Unlimited,
            requests_per_day: Limit::Unlimited,
            requests_per_minute: Limit::Limited(60),
            allowed_models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "gpt-4-turbo".to_string(),
                "claude-3-opus-20240229".to_string(),
                "claude-3-sonnet-20240620".to_string(),
                "claude-3-5-sonnet-20240620".to_string(),
            ],
            storage_limit: Limit::Limited(200 * GIB),
            max_elements: Limit::Unlimited,
        }
    }
}

/// The full entitlement table, one entry per tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCatalog {
    #[serde(default = "PlanEntitlement::basic")]
    pub basic: PlanEntitlement,
    #[serde(default = "PlanEntitlement::pro")]
    pub pro: PlanEntitlement,
    #[serde(default = "PlanEntitlement::enterprise")]
    pub enterprise: PlanEntitlement,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            basic: PlanEntitlement::basic(),
            pro: PlanEntitlement::pro(),
            enterprise: PlanEntitlement::enterprise(),
        }
    }
}

impl PlanCatalog {
    pub fn get(&self, tier: PlanTier) -> &PlanEntitlement {
        match tier {
            PlanTier::Basic => &self.basic,
            PlanTier::Pro => &self.pro,
            PlanTier::Enterprise => &self.enterprise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ceilings() {
        let catalog = PlanCatalog::default();

        let basic = catalog.get(PlanTier::Basic);
        assert_eq!(basic.requests_per_month, Limit::Limited(1000));
        assert_eq!(basic.requests_per_day, Limit::Limited(50));
        assert_eq!(basic.requests_per_minute, Limit::Limited(5));
        assert_eq!(basic.storage_limit, Limit::Limited(GIB));
        assert_eq!(basic.max_elements, Limit::Limited(100));

        let pro = catalog.get(PlanTier::Pro);
        assert_eq!(pro.requests_per_month, Limit::Limited(20_000));
        assert_eq!(pro.requests_per_day, Limit::Limited(500));
        assert_eq!(pro.requests_per_minute, Limit::Limited(20));
        assert_eq!(pro.storage_limit, Limit::Limited(20 * GIB));
        assert_eq!(pro.max_elements, Limit::Limited(2000));

        let enterprise = catalog.get(PlanTier::Enterprise);
        assert_eq!(enterprise.requests_per_month, Limit::Unlimited);
        assert_eq!(enterprise.requests_per_day, Limit::Unlimited);
        assert_eq!(enterprise.requests_per_minute, Limit::Limited(60));
        assert_eq!(enterprise.storage_limit, Limit::Limited(200 * GIB));
        assert_eq!(enterprise.max_elements, Limit::Unlimited);
    }

    #[test]
    fn test_allowed_models_per_tier() {
        let catalog = PlanCatalog::default();

        assert!(catalog.basic.allows_model("gpt-4o-mini"));
        assert!(!catalog.basic.allows_model("gpt-4o"));

        assert!(catalog.pro.allows_model("claude-3-sonnet-20240620"));
        assert!(!catalog.pro.allows_model("claude-3-opus-20240229"));

        assert!(catalog.enterprise.allows_model("claude-3-opus-20240229"));
        assert!(catalog.enterprise.allows_model("claude-3-5-sonnet-20240620"));
        assert!(!catalog.enterprise.allows_model("o1-preview"));
    }

    #[test]
    fn test_partial_override_keeps_other_tiers() {
        let toml = r#"
            [pro]
            name = "Pro"
            requests_per_month = 50000
            requests_per_day = 1000
            requests_per_minute = 30
            allowed_models = ["gpt-4o"]
            storage_limit = "unlimited"
            max_elements = 5000
        "#;

        let catalog: PlanCatalog = toml::from_str(toml).unwrap();
        assert_eq!(catalog.pro.requests_per_month, Limit::Limited(50_000));
        assert_eq!(catalog.pro.storage_limit, Limit::Unlimited);
        // Untouched tiers fall back to the built-ins.
        assert_eq!(catalog.basic.requests_per_day, Limit::Limited(50));
        assert_eq!(catalog.enterprise.requests_per_minute, Limit::Limited(60));
    }
}
