//! Context keys written and read by the built-in stages.

/// Sales manager review marker.
pub const SUPERVISOR: &str = "supervisor";
/// Prospected leads, as mailbox strings.
pub const PROSPECTS: &str = "prospects";
/// Outreach status and recipients.
pub const OUTREACH: &str = "outreach";
/// Scheduled meetings keyed by lead name.
pub const APPOINTMENTS: &str = "appointments";
/// Proposal status.
pub const PROPOSAL: &str = "proposal";
/// Base compliance gate flag.
pub const COMPLIANCE: &str = "compliance";

/// Client onboarding confirmation.
pub const ACCOUNT_MANAGER: &str = "account_manager";
/// Growth strategy artifact reference.
pub const GROWTH_STRATEGY: &str = "growth_strategy";
/// Funnel design artifact reference.
pub const FUNNEL: &str = "funnel";
/// Creative asset references.
pub const CREATIVES: &str = "creatives";
/// Simulated media plan.
pub const MEDIA_PLAN: &str = "media_plan";
/// Ads compliance gate flag.
pub const ADS_COMPLIANCE: &str = "ads_compliance";

/// Optional caller-supplied operating region.
pub const REGION: &str = "region";
/// Optional caller-supplied brand kit override.
pub const BRAND_KIT: &str = "brand_kit";

/// Keys a base team run adds, in stage order.
pub const BASE_TEAM_KEYS: [&str; 6] = [SUPERVISOR, PROSPECTS, OUTREACH, APPOINTMENTS, PROPOSAL, COMPLIANCE];

/// Keys a client team run adds, in stage order.
pub const CLIENT_TEAM_KEYS: [&str; 6] = [
    ACCOUNT_MANAGER,
    GROWTH_STRATEGY,
    FUNNEL,
    CREATIVES,
    MEDIA_PLAN,
    ADS_COMPLIANCE,
];
