use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::context::Context;

// Wire keys. `k_activityId` keeps its casing for compatibility with
// existing consumers.
pub const PARENT_ACTIVITY_ID_KEY: &str = "k_parentactivityid";
pub const CLOUD_EVENT_ID_KEY: &str = "k_cloudeventid";
pub const PARENT_CLOUD_EVENT_ID_KEY: &str = "k_parentcloudeventid";
pub const ACTIVITY_ID_KEY: &str = "k_activityId";

/// Loosely typed parameter map exchanged with callers
pub type Params = HashMap<String, Value>;

/// Correlation identifiers for one logical operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TracingProperties {
    pub cloud_event_id: String,
    pub parent_cloud_event_id: String,
    pub activity_id: String,
    pub parent_activity_id: String,
}

impl TracingProperties {
    /// Fresh identifiers, with parents taken from `params` when present.
    pub fn from_params(params: Option<&Params>) -> Self {
        let cloud_event_id = Uuid::new_v4().to_string();
        let activity_id = Uuid::new_v4().to_string();

        let parent_activity_id = string_param(params, PARENT_ACTIVITY_ID_KEY)
            .filter(|id| !id.is_empty())
            .unwrap_or(activity_id.as_str())
            .to_string();
        let parent_cloud_event_id = string_param(params, CLOUD_EVENT_ID_KEY)
            .unwrap_or_default()
            .to_string();

        Self {
            cloud_event_id,
            parent_cloud_event_id,
            activity_id,
            parent_activity_id,
        }
    }
}

fn string_param<'a>(params: Option<&'a Params>, key: &str) -> Option<&'a str> {
    params?.get(key)?.as_str()
}

/// Context key for [`TracingProperties`]
struct TracingKey;

/// Returns a context carrying freshly generated tracing identifiers.
///
/// Parent identifiers are read from `params` under `k_parentactivityid` and
/// `k_cloudeventid`; only string values are honoured. Without a parent
/// activity id the new activity id is its own parent.
pub fn attach_tracing(ctx: &Context, params: Option<&Params>) -> Context {
    ctx.with_value::<TracingKey, _>(TracingProperties::from_params(params))
}

/// Tracing identifiers attached to `ctx`, if any.
pub fn tracing_properties(ctx: &Context) -> Option<&TracingProperties> {
    ctx.value::<TracingKey, TracingProperties>()
}

/// Writes the identifiers on `ctx` into `params` (or a new map) under the
/// four wire keys. Without identifiers the map is returned untouched.
pub fn extract_tracing(ctx: &Context, params: Option<Params>) -> Params {
    let mut params = params.unwrap_or_default();
    if let Some(tracing) = tracing_properties(ctx) {
        params.insert(
            PARENT_ACTIVITY_ID_KEY.to_string(),
            Value::from(tracing.parent_activity_id.as_str()),
        );
        params.insert(
            CLOUD_EVENT_ID_KEY.to_string(),
            Value::from(tracing.cloud_event_id.as_str()),
        );
        params.insert(
            PARENT_CLOUD_EVENT_ID_KEY.to_string(),
            Value::from(tracing.parent_cloud_event_id.as_str()),
        );
        params.insert(
            ACTIVITY_ID_KEY.to_string(),
            Value::from(tracing.activity_id.as_str()),
        );
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get<'a>(params: &'a Params, key: &str) -> &'a str {
        params[key].as_str().unwrap()
    }

    #[test]
    fn test_attach_without_params() {
        let ctx = attach_tracing(&Context::background(), None);
        let params = extract_tracing(&ctx, None);

        assert_eq!(params.len(), 4);
        assert!(!get(&params, ACTIVITY_ID_KEY).is_empty());
        assert!(!get(&params, CLOUD_EVENT_ID_KEY).is_empty());
        assert_eq!(
            get(&params, PARENT_ACTIVITY_ID_KEY),
            get(&params, ACTIVITY_ID_KEY)
        );
        assert_eq!(get(&params, PARENT_CLOUD_EVENT_ID_KEY), "");
    }

    #[test]
    fn test_attach_with_parent_params() {
        let input = Params::from([
            (PARENT_ACTIVITY_ID_KEY.to_string(), json!("P")),
            (CLOUD_EVENT_ID_KEY.to_string(), json!("C")),
        ]);
        let ctx = attach_tracing(&Context::background(), Some(&input));
        let params = extract_tracing(&ctx, None);

        assert_eq!(get(&params, PARENT_ACTIVITY_ID_KEY), "P");
        assert_eq!(get(&params, PARENT_CLOUD_EVENT_ID_KEY), "C");
        assert!(!get(&params, ACTIVITY_ID_KEY).is_empty());
        assert_ne!(get(&params, ACTIVITY_ID_KEY), "P");
        assert!(!get(&params, CLOUD_EVENT_ID_KEY).is_empty());
        assert_ne!(get(&params, CLOUD_EVENT_ID_KEY), "C");
    }

    #[test]
    fn test_non_string_params_are_ignored() {
        let input = Params::from([
            (PARENT_ACTIVITY_ID_KEY.to_string(), json!(17)),
            (CLOUD_EVENT_ID_KEY.to_string(), json!(null)),
        ]);
        let ctx = attach_tracing(&Context::background(), Some(&input));
        let props = tracing_properties(&ctx).unwrap();

        assert_eq!(props.parent_activity_id, props.activity_id);
        assert_eq!(props.parent_cloud_event_id, "");
    }

    #[test]
    fn test_empty_parent_activity_falls_back() {
        let input = Params::from([(PARENT_ACTIVITY_ID_KEY.to_string(), json!(""))]);
        let ctx = attach_tracing(&Context::background(), Some(&input));
        let props = tracing_properties(&ctx).unwrap();
        assert_eq!(props.parent_activity_id, props.activity_id);
    }

    #[test]
    fn test_extract_without_tracing() {
        let params = extract_tracing(&Context::background(), None);
        assert!(params.is_empty());

        let existing = Params::from([("other".to_string(), json!(1))]);
        let params = extract_tracing(&Context::background(), Some(existing.clone()));
        assert_eq!(params, existing);
    }

    #[test]
    fn test_extract_preserves_existing_entries() {
        let ctx = attach_tracing(&Context::background(), None);
        let existing = Params::from([("other".to_string(), json!("x"))]);
        let params = extract_tracing(&ctx, Some(existing));

        assert_eq!(params.len(), 5);
        assert_eq!(params["other"], json!("x"));
    }

    #[test]
    fn test_activity_key_casing() {
        let ctx = attach_tracing(&Context::background(), None);
        let params = extract_tracing(&ctx, None);
        assert!(params.contains_key("k_activityId"));
        assert!(!params.contains_key("k_activityid"));
    }

    #[test]
    fn test_each_attach_generates_new_ids() {
        let first = attach_tracing(&Context::background(), None);
        let second = attach_tracing(&Context::background(), None);
        assert_ne!(
            tracing_properties(&first).unwrap().activity_id,
            tracing_properties(&second).unwrap().activity_id
        );
    }

    #[test]
    fn test_properties_serialize_pascal_case() {
        let props = TracingProperties {
            cloud_event_id: "c".to_string(),
            parent_cloud_event_id: "pc".to_string(),
            activity_id: "a".to_string(),
            parent_activity_id: "pa".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&props).unwrap(),
            json!({
                "CloudEventId": "c",
                "ParentCloudEventId": "pc",
                "ActivityId": "a",
                "ParentActivityId": "pa"
            })
        );
    }
}
