mod eligibility;
mod eviction;
