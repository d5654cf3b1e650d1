//! Tests for the context module.

#[cfg(test)]
mod tests {
    use crate::context::{Context, ContextValue};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_set_and_get() {
        let mut ctx = Context::new();
        ctx.set("supervisor", "reviewed");

        assert_eq!(ctx.get("supervisor"), Some(&ContextValue::from("reviewed")));
        assert!(ctx.contains_key("supervisor"));
        assert!(!ctx.contains_key("prospects"));
    }

    #[test]
    fn test_context_set_overwrites() {
        let mut ctx = Context::new().with("compliance", false);
        ctx.set("compliance", true);

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("compliance").and_then(ContextValue::as_flag), Some(true));
    }

    #[test]
    fn test_context_keys_sorted() {
        let ctx: Context = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_require_missing_key() {
        let ctx = Context::new();
        let err = ctx.require_list("outreach_specialist", "prospects").unwrap_err();

        assert_eq!(err.kind(), "MissingDependency");
        assert!(err.to_string().contains("outreach_specialist"));
    }

    #[test]
    fn test_require_wrong_type() {
        let ctx = Context::new().with("prospects", "not a list");
        let err = ctx.require_list("outreach_specialist", "prospects").unwrap_err();

        assert_eq!(err.kind(), "UnexpectedType");
        assert!(err.to_string().contains("a list"));
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_require_typed_values() {
        let ctx = Context::new()
            .with("funnel", "clients/acme/funnel.json")
            .with("media_plan", ContextValue::map([("mode", "simulated")]));

        assert_eq!(ctx.require_text("qa", "funnel").unwrap(), "clients/acme/funnel.json");
        assert!(ctx.require_map("qa", "media_plan").unwrap().contains_key("mode"));
        assert!(ctx.require_text("qa", "media_plan").is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_entries() {
        let json = serde_json::json!({
            "region": "United States",
            "brand_kit": {"primary_color": "#000000"},
            "vip": true,
            "tags": ["dental"]
        });

        let ctx = Context::from_json(json.clone()).unwrap();
        assert_eq!(ctx.len(), 4);
        assert_eq!(ctx.to_json(), json);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Context::from_json(serde_json::json!(["a"])).is_err());
        assert!(Context::from_json(serde_json::json!({"n": 3})).is_err());
    }

    #[test]
    fn test_mentions() {
        let ctx = Context::new().with(
            "account_manager",
            ContextValue::map([("client", "Acme Clinic")]),
        );

        assert!(ctx.mentions("Acme Clinic"));
        assert!(!ctx.mentions("Beta Dental"));
    }
}
