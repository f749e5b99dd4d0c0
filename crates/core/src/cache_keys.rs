//! Response-cache key and invalidation-pattern registry.
//!
//! Every cached read is a [`CacheResource`] variant and every bulk
//! invalidation is a [`CachePattern`] variant, so the set of keys the
//! service can produce is closed and testable. Keys are namespaced as
//! `cache:<resource>[:<id>][:<query>]`; patterns end in a single `*`.
//!
//! Query parameters go through [`CacheQuery`], which sorts and
//! percent-encodes them. The encoded form never contains `:` so a query
//! segment cannot be mistaken for an id or a sub-namespace.

use crate::types::DbId;

/// Namespace shared by every response-cache key.
pub const KEY_PREFIX: &str = "cache";

// ---------------------------------------------------------------------------
// CacheQuery
// ---------------------------------------------------------------------------

/// Canonicalized query parameters.
///
/// Two queries with the same parameters in any order produce the same
/// string; different parameter sets never do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CacheQuery {
    params: Vec<(String, String)>,
}

impl CacheQuery {
    /// Build from arbitrary `(key, value)` pairs. Order does not matter.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        params.sort();
        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as `k1=v1&k2=v2` with every component percent-encoded.
    pub fn canonical(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CacheQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

// ---------------------------------------------------------------------------
// CacheResource
// ---------------------------------------------------------------------------

/// A cacheable read, one variant per cached endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheResource {
    Customers(CacheQuery),
    Customer(DbId),
    CustomerTransactions(DbId),
    Dashboard(CacheQuery),
    Tiers(CacheQuery),
    Tier(DbId),
    AppTypes,
    AppType(DbId),
    CoinConversionRules,
    CouponCategories(CacheQuery),
    CouponCategory(DbId),
    CouponBrands(CacheQuery),
    CouponBrand(DbId),
    PaymentMethods(CacheQuery),
    PaymentMethod(DbId),
    PointsExpirationRules,
    PointsExpirationRule(DbId),
    PointsExpirationRulesByUser(DbId),
    PointCriteria,
    PointCriterion(DbId),
    RedemptionRules,
    RedemptionRule(DbId),
    RedemptionHistory(DbId),
    ReferralPrograms,
    ThemeSettings,
    TriggerEvents(CacheQuery),
    TriggerEvent(DbId),
    TriggerServices(CacheQuery),
    TriggerService(DbId),
    TriggerServicesByEvent(DbId),
    EligibilityCriteria(CacheQuery),
    EligibilityCriteriaForTier(DbId),
    /// Ad hoc resource. `prefix` must be a plain identifier.
    Custom {
        prefix: String,
        id: Option<String>,
        query: CacheQuery,
    },
}

impl CacheResource {
    /// Render the cache key for this resource.
    pub fn key(&self) -> String {
        match self {
            Self::Customers(q) => listed("customers", q),
            Self::Customer(id) => by_id("customer", *id),
            Self::CustomerTransactions(id) => format!("{KEY_PREFIX}:customer:{id}:transactions"),
            Self::Dashboard(q) => listed("dashboard", q),
            Self::Tiers(q) => listed("tiers", q),
            Self::Tier(id) => by_id("tier", *id),
            Self::AppTypes => plain("app_types"),
            Self::AppType(id) => by_id("app_type", *id),
            Self::CoinConversionRules => plain("coin_conversion_rules"),
            Self::CouponCategories(q) => listed("coupon_categories", q),
            Self::CouponCategory(id) => by_id("coupon_category", *id),
            Self::CouponBrands(q) => listed("coupon_brands", q),
            Self::CouponBrand(id) => by_id("coupon_brand", *id),
            Self::PaymentMethods(q) => listed("payment_methods", q),
            Self::PaymentMethod(id) => by_id("payment_method", *id),
            Self::PointsExpirationRules => plain("points_expiration_rules"),
            Self::PointsExpirationRule(id) => by_id("points_expiration_rules", *id),
            Self::PointsExpirationRulesByUser(user_id) => {
                format!("{KEY_PREFIX}:points_expiration_rules:user:{user_id}")
            }
            Self::PointCriteria => plain("point_criteria"),
            Self::PointCriterion(id) => by_id("point_criteria", *id),
            Self::RedemptionRules => plain("redemption_rules"),
            Self::RedemptionRule(id) => by_id("redemption_rules", *id),
            Self::RedemptionHistory(user_id) => by_id("redemption_history", *user_id),
            Self::ReferralPrograms => plain("referral_programs"),
            Self::ThemeSettings => plain("theme_settings"),
            Self::TriggerEvents(q) => listed("trigger_events", q),
            Self::TriggerEvent(id) => by_id("trigger_event", *id),
            Self::TriggerServices(q) => listed("trigger_services", q),
            Self::TriggerService(id) => by_id("trigger_service", *id),
            Self::TriggerServicesByEvent(event_id) => {
                format!("{KEY_PREFIX}:trigger_services:event:{event_id}")
            }
            Self::EligibilityCriteria(q) => listed("eligibility_criteria", q),
            Self::EligibilityCriteriaForTier(tier_id) => {
                format!("{KEY_PREFIX}:eligibility_criteria:tier:{tier_id}")
            }
            Self::Custom { prefix, id, query } => format!(
                "{KEY_PREFIX}:{prefix}:{}:{}",
                id.as_deref().unwrap_or(""),
                query.canonical()
            ),
        }
    }
}

fn plain(resource: &str) -> String {
    format!("{KEY_PREFIX}:{resource}")
}

fn by_id(resource: &str, id: DbId) -> String {
    format!("{KEY_PREFIX}:{resource}:{id}")
}

fn listed(resource: &str, query: &CacheQuery) -> String {
    format!("{KEY_PREFIX}:{resource}:{}", query.canonical())
}

// ---------------------------------------------------------------------------
// CachePattern
// ---------------------------------------------------------------------------

/// A family of cache keys removed together by a pattern sweep.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CachePattern {
    AllCustomers,
    /// Every key nested under one customer (transactions, ...).
    CustomerScoped(DbId),
    AllDashboard,
    AllTiers,
    AllCouponCategories,
    AllCouponBrands,
    AllPaymentMethods,
    AllTriggerEvents,
    /// Also covers the by-event trigger service keys.
    AllTriggerServices,
    AllEligibilityCriteria,
    Custom(String),
}

impl CachePattern {
    /// Render the glob for this pattern.
    pub fn glob(&self) -> String {
        match self {
            Self::AllCustomers => wildcard("customers"),
            Self::CustomerScoped(id) => format!("{KEY_PREFIX}:customer:{id}:*"),
            Self::AllDashboard => wildcard("dashboard"),
            Self::AllTiers => wildcard("tiers"),
            Self::AllCouponCategories => wildcard("coupon_categories"),
            Self::AllCouponBrands => wildcard("coupon_brands"),
            Self::AllPaymentMethods => wildcard("payment_methods"),
            Self::AllTriggerEvents => wildcard("trigger_events"),
            Self::AllTriggerServices => wildcard("trigger_services"),
            Self::AllEligibilityCriteria => wildcard("eligibility_criteria"),
            Self::Custom(prefix) => wildcard(prefix),
        }
    }
}

fn wildcard(resource: &str) -> String {
    format!("{KEY_PREFIX}:{resource}:*")
}

// ---------------------------------------------------------------------------
// Invalidation
// ---------------------------------------------------------------------------

/// The exact keys and patterns one write makes stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub keys: Vec<CacheResource>,
    pub patterns: Vec<CachePattern>,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, resource: CacheResource) -> Self {
        self.keys.push(resource);
        self
    }

    pub fn pattern(mut self, pattern: CachePattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// A tier was updated or deleted.
    pub fn tier_write(tier_id: DbId) -> Self {
        Self::new()
            .key(CacheResource::Tier(tier_id))
            .pattern(CachePattern::AllTiers)
    }

    /// A tier was created; only listings can be stale.
    pub fn tier_created() -> Self {
        Self::new().pattern(CachePattern::AllTiers)
    }

    /// Any eligibility criteria record was created, updated or deleted.
    pub fn eligibility_criteria_write() -> Self {
        Self::new().pattern(CachePattern::AllEligibilityCriteria)
    }

    /// A customer's own record changed (e.g. tier reassignment).
    ///
    /// Views nested under the customer embed its tier, so they go too.
    pub fn customer_write(customer_id: DbId) -> Self {
        Self::new()
            .key(CacheResource::Customer(customer_id))
            .pattern(CachePattern::CustomerScoped(customer_id))
            .pattern(CachePattern::AllCustomers)
            .pattern(CachePattern::AllDashboard)
    }

    /// Rendered exact keys.
    pub fn key_strings(&self) -> Vec<String> {
        self.keys.iter().map(CacheResource::key).collect()
    }

    /// Rendered glob patterns.
    pub fn pattern_strings(&self) -> Vec<String> {
        self.patterns.iter().map(CachePattern::glob).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn q(pairs: &[(&str, &str)]) -> CacheQuery {
        CacheQuery::from_pairs(pairs.iter().copied())
    }

    /// Literal-prefix match, valid for the single-trailing-`*` patterns.
    fn covered_by(pattern: &CachePattern, key: &str) -> bool {
        let glob = pattern.glob();
        key.starts_with(glob.trim_end_matches('*'))
    }

    fn every_resource() -> Vec<CacheResource> {
        let query = q(&[("page", "2")]);
        vec![
            CacheResource::Customers(CacheQuery::default()),
            CacheResource::Customers(query.clone()),
            CacheResource::Customer(1),
            CacheResource::CustomerTransactions(1),
            CacheResource::Dashboard(query.clone()),
            CacheResource::Tiers(CacheQuery::default()),
            CacheResource::Tiers(query.clone()),
            CacheResource::Tier(1),
            CacheResource::AppTypes,
            CacheResource::AppType(1),
            CacheResource::CoinConversionRules,
            CacheResource::CouponCategories(query.clone()),
            CacheResource::CouponCategory(1),
            CacheResource::CouponBrands(query.clone()),
            CacheResource::CouponBrand(1),
            CacheResource::PaymentMethods(query.clone()),
            CacheResource::PaymentMethod(1),
            CacheResource::PointsExpirationRules,
            CacheResource::PointsExpirationRule(1),
            CacheResource::PointsExpirationRulesByUser(1),
            CacheResource::PointCriteria,
            CacheResource::PointCriterion(1),
            CacheResource::RedemptionRules,
            CacheResource::RedemptionRule(1),
            CacheResource::RedemptionHistory(1),
            CacheResource::ReferralPrograms,
            CacheResource::ThemeSettings,
            CacheResource::TriggerEvents(query.clone()),
            CacheResource::TriggerEvent(1),
            CacheResource::TriggerServices(query.clone()),
            CacheResource::TriggerServices(q(&[("event", "1")])),
            CacheResource::TriggerService(1),
            CacheResource::TriggerServicesByEvent(1),
            CacheResource::EligibilityCriteria(query.clone()),
            CacheResource::EligibilityCriteriaForTier(1),
            CacheResource::Custom {
                prefix: "reports".into(),
                id: Some("1".into()),
                query,
            },
        ]
    }

    // -- CacheQuery -----------------------------------------------------------

    #[test]
    fn query_is_order_insensitive() {
        let a = q(&[("status", "active"), ("page", "1")]);
        let b = q(&[("page", "1"), ("status", "active")]);
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), "page=1&status=active");
    }

    #[test]
    fn query_encoding_prevents_collisions() {
        let smuggled = q(&[("a", "1&b=2")]);
        let split = q(&[("a", "1"), ("b", "2")]);
        assert_ne!(smuggled.canonical(), split.canonical());
    }

    #[test]
    fn query_never_contains_colon() {
        let query = q(&[("range", "10:20"), ("x:y", "z")]);
        assert!(!query.canonical().contains(':'));
    }

    #[test]
    fn empty_query_renders_empty() {
        assert!(CacheQuery::default().is_empty());
        assert_eq!(CacheQuery::default().canonical(), "");
    }

    // -- CacheResource --------------------------------------------------------

    #[test]
    fn keys_follow_namespace_template() {
        assert_eq!(CacheResource::Tier(7).key(), "cache:tier:7");
        assert_eq!(CacheResource::Tiers(CacheQuery::default()).key(), "cache:tiers:");
        assert_eq!(
            CacheResource::Customers(q(&[("page", "2")])).key(),
            "cache:customers:page=2"
        );
        assert_eq!(
            CacheResource::CustomerTransactions(3).key(),
            "cache:customer:3:transactions"
        );
        assert_eq!(CacheResource::AppTypes.key(), "cache:app_types");
    }

    #[test]
    fn every_resource_key_is_distinct() {
        let resources = every_resource();
        let keys: HashSet<String> = resources.iter().map(CacheResource::key).collect();
        assert_eq!(keys.len(), resources.len());
    }

    #[test]
    fn by_user_and_by_id_expiration_rules_do_not_collide() {
        assert_ne!(
            CacheResource::PointsExpirationRule(5).key(),
            CacheResource::PointsExpirationRulesByUser(5).key()
        );
    }

    #[test]
    fn key_generation_is_deterministic() {
        for resource in every_resource() {
            assert_eq!(resource.key(), resource.clone().key());
        }
    }

    // -- CachePattern ---------------------------------------------------------

    #[test]
    fn patterns_use_single_trailing_wildcard() {
        assert_eq!(CachePattern::AllCustomers.glob(), "cache:customers:*");
        assert_eq!(CachePattern::AllTiers.glob(), "cache:tiers:*");
        assert_eq!(CachePattern::CustomerScoped(9).glob(), "cache:customer:9:*");
        assert_eq!(CachePattern::Custom("reports".into()).glob(), "cache:reports:*");
    }

    #[test]
    fn list_patterns_cover_every_query_variant() {
        assert!(covered_by(&CachePattern::AllTiers, &CacheResource::Tiers(CacheQuery::default()).key()));
        assert!(covered_by(&CachePattern::AllTiers, &CacheResource::Tiers(q(&[("page", "3")])).key()));
        assert!(!covered_by(&CachePattern::AllTiers, &CacheResource::Tier(1).key()));
    }

    #[test]
    fn trigger_services_pattern_covers_by_event_keys() {
        assert!(covered_by(
            &CachePattern::AllTriggerServices,
            &CacheResource::TriggerServicesByEvent(4).key()
        ));
        assert!(!covered_by(
            &CachePattern::AllTriggerServices,
            &CacheResource::TriggerService(4).key()
        ));
    }

    #[test]
    fn criteria_pattern_covers_per_tier_keys() {
        assert!(covered_by(
            &CachePattern::AllEligibilityCriteria,
            &CacheResource::EligibilityCriteriaForTier(2).key()
        ));
    }

    #[test]
    fn customer_scope_excludes_customer_record_itself() {
        let scope = CachePattern::CustomerScoped(3);
        assert!(covered_by(&scope, &CacheResource::CustomerTransactions(3).key()));
        assert!(!covered_by(&scope, &CacheResource::Customer(3).key()));
        assert!(!covered_by(&scope, &CacheResource::CustomerTransactions(33).key()));
    }

    // -- Invalidation ---------------------------------------------------------

    #[test]
    fn tier_write_targets_tier_key_and_tier_listings() {
        let inv = Invalidation::tier_write(1);
        assert_eq!(inv.key_strings(), vec!["cache:tier:1".to_string()]);
        assert_eq!(inv.pattern_strings(), vec!["cache:tiers:*".to_string()]);
    }

    #[test]
    fn customer_write_sweeps_listings() {
        let inv = Invalidation::customer_write(8);
        assert_eq!(inv.key_strings(), vec!["cache:customer:8".to_string()]);
        assert!(inv.pattern_strings().contains(&"cache:customers:*".to_string()));
        assert!(inv.pattern_strings().contains(&"cache:customer:8:*".to_string()));
    }
}
