//! Query Gateway
//!
//! Validates tool requests, resolves them to canonical request specs, and
//! serves them through the fingerprint cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::cache::{
    CacheStats, Clock, Fingerprint, FingerprintCache, Lookup, RequestSpec, SystemClock,
};
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::summary;
use crate::models::{FetchOutcome, FetchResults, SearchItem, SearchRequest};
use crate::upstream::{HttpSegmentationClient, SegmentationApi};

/// Upstream endpoint for segmentation queries.
pub const SEGMENTATION_ENDPOINT: &str = "/query/segmentation";
/// Aggregation unit used when none is given.
pub const DEFAULT_UNIT: &str = "day";
/// Breakdown expression used when none is given.
pub const DEFAULT_BREAKDOWN: &str = r#"properties["platform"]"#;
/// Default range start, in days before today.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
/// How many allowed events an unknown-event error lists.
pub const ALLOWED_SAMPLE_SIZE: usize = 10;

// == Query Gateway ==
/// Search/fetch front end over the fingerprint cache and the upstream API.
#[derive(Clone)]
pub struct QueryGateway {
    cache: Arc<RwLock<FingerprintCache>>,
    upstream: Arc<dyn SegmentationApi>,
    clock: Arc<dyn Clock>,
    allowed_events: BTreeSet<String>,
}

impl QueryGateway {
    // == Constructor ==
    pub fn new(
        cache: Arc<RwLock<FingerprintCache>>,
        upstream: Arc<dyn SegmentationApi>,
        clock: Arc<dyn Clock>,
        allowed_events: BTreeSet<String>,
    ) -> Self {
        Self {
            cache,
            upstream,
            clock,
            allowed_events,
        }
    }

    /// Wires the HTTP client, the wall clock and an empty cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = HttpSegmentationClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(RwLock::new(FingerprintCache::new())),
            Arc::new(upstream),
            Arc::new(SystemClock),
            config.allowed_events.clone(),
        ))
    }

    /// Current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Event Resolution ==
    /// Picks the event to query and checks it against the allow-list.
    ///
    /// An explicit `event` wins; otherwise a single-word `query` is taken as
    /// the event name.
    pub fn resolve_event(&self, req: &SearchRequest) -> Result<String> {
        let mut event = req.event.as_deref().unwrap_or("").trim().to_string();
        if event.is_empty() && !req.query.contains(char::is_whitespace) {
            event = req.query.trim().to_string();
        }
        if event.is_empty() {
            return Err(GatewayError::EventRequired);
        }

        if !self.allowed_events.is_empty() && !self.allowed_events.contains(&event) {
            return Err(GatewayError::UnknownEvent {
                event,
                allowed_sample: self
                    .allowed_events
                    .iter()
                    .take(ALLOWED_SAMPLE_SIZE)
                    .cloned()
                    .collect(),
            });
        }

        Ok(event)
    }

    // == Spec Construction ==
    /// Canonical segmentation spec for a request, with defaults relative to `today`.
    pub fn build_spec(req: &SearchRequest, event: &str, today: NaiveDate) -> RequestSpec {
        let from_date = non_empty(&req.from_date).map(String::from).unwrap_or_else(|| {
            (today - Duration::days(DEFAULT_LOOKBACK_DAYS))
                .format("%Y-%m-%d")
                .to_string()
        });
        let to_date = non_empty(&req.to_date)
            .map(String::from)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        let spec = RequestSpec::new(SEGMENTATION_ENDPOINT)
            .with_param("event", event)
            .with_param("from_date", from_date)
            .with_param("to_date", to_date)
            .with_param("unit", non_empty(&req.unit).unwrap_or(DEFAULT_UNIT))
            .with_param("on", non_empty(&req.breakdown).unwrap_or(DEFAULT_BREAKDOWN));

        match non_empty(&req.where_clause) {
            Some(filter) => spec.with_param("where", filter),
            None => spec,
        }
    }

    // == Search ==
    /// Runs (or reuses) a segmentation query and returns its summary item.
    #[instrument(skip(self, req), fields(event = tracing::field::Empty))]
    pub async fn search(&self, req: SearchRequest) -> Result<Vec<SearchItem>> {
        let event = self.resolve_event(&req)?;
        tracing::Span::current().record("event", event.as_str());

        let today = self.clock.now().date_naive();
        let spec = Self::build_spec(&req, &event, today);
        let id = Fingerprint::of(&spec);

        // Lock released before the upstream call; concurrent misses may both query.
        let now = self.clock.now();
        let lookup = self.cache.write().await.lookup(&id, now);
        let stale = matches!(lookup, Lookup::Stale(_));
        let payload = match lookup {
            Lookup::Fresh(entry) => {
                debug!(
                    id = %id,
                    age_secs = entry.age(now).num_seconds(),
                    "Serving search from cache"
                );
                entry.payload
            }
            Lookup::Stale(_) | Lookup::Miss => {
                info!(id = %id, stale, "Querying upstream");
                let payload = self.upstream.query(&spec).await?;
                self.cache
                    .write()
                    .await
                    .store(id.clone(), spec.clone(), payload.clone(), self.clock.now());
                payload
            }
        };

        let title = summary::title(
            &event,
            spec.param("from_date").unwrap_or_default(),
            spec.param("to_date").unwrap_or_default(),
            spec.param("on").unwrap_or_default(),
        );
        Ok(vec![summary::summarize(&id, title, &payload, req.top_k)])
    }

    // == Fetch ==
    /// Re-runs the stored query of every known id and returns the live payloads.
    ///
    /// Results keep request order. Unknown ids yield a per-id error marker.
    /// Upstream failures abort the batch.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn fetch(&self, ids: &[String]) -> Result<FetchResults> {
        let mut out = FetchResults::new();

        for raw in ids {
            if out.contains(raw) {
                continue;
            }

            let entry = self.cache.read().await.get(&Fingerprint::from_raw(raw.as_str()));
            let outcome = match entry {
                None => {
                    debug!(id = %raw, "Fetch for unknown id");
                    FetchOutcome::unknown_id()
                }
                Some(entry) => {
                    let payload = self.upstream.query(&entry.spec).await?;
                    FetchOutcome::Found {
                        meta: query_meta(&entry.spec),
                        payload,
                    }
                }
            };
            out.insert(raw.clone(), outcome);
        }

        Ok(out)
    }
}

/// Endpoint name plus every parameter of a spec, as fetch reports it.
fn query_meta(spec: &RequestSpec) -> Map<String, Value> {
    let endpoint = spec.endpoint().rsplit('/').next().unwrap_or_default();
    let mut meta = Map::new();
    meta.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
    for (name, value) in spec.params() {
        meta.insert(name.clone(), Value::String(value.clone()));
    }
    meta
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{freshness_ttl, ManualClock};
    use crate::config::parse_allowed_events;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    struct MockApi {
        calls: AtomicUsize,
        response: parking_lot::Mutex<Result<Value>>,
    }

    impl MockApi {
        fn returning(payload: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: parking_lot::Mutex::new(Ok(payload)),
            })
        }

        fn set_response(&self, response: Result<Value>) {
            *self.response.lock() = response;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SegmentationApi for MockApi {
        async fn query(&self, _spec: &RequestSpec) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().clone()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
    }

    fn gateway(api: Arc<MockApi>, clock: Arc<ManualClock>, allowed: &str) -> QueryGateway {
        QueryGateway::new(
            Arc::new(RwLock::new(FingerprintCache::new())),
            api,
            clock,
            parse_allowed_events(allowed),
        )
    }

    fn purchase_request() -> SearchRequest {
        SearchRequest {
            from_date: Some("2024-01-01".to_string()),
            to_date: Some("2024-01-08".to_string()),
            ..SearchRequest::for_event("purchase")
        }
    }

    fn platform_payload() -> Value {
        json!({
            "data": {"ios": {"2024-01-01": 4}, "android": {"2024-01-01": 2}},
            "series": ["2024-01-01"]
        })
    }

    #[tokio::test]
    async fn test_search_caches_within_window() {
        let api = MockApi::returning(platform_payload());
        let clock = Arc::new(ManualClock::new(t0()));
        let gw = gateway(api.clone(), clock.clone(), "");

        let first = gw.search(purchase_request()).await.unwrap();
        assert_eq!(api.calls(), 1);

        clock.advance(Duration::minutes(5));
        let second = gw.search(purchase_request()).await.unwrap();
        assert_eq!(api.calls(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_search_refreshes_after_window() {
        let api = MockApi::returning(platform_payload());
        let clock = Arc::new(ManualClock::new(t0()));
        let gw = gateway(api.clone(), clock.clone(), "");

        gw.search(purchase_request()).await.unwrap();
        clock.advance(freshness_ttl());
        api.set_response(Ok(json!({"data": {"web": {}}})));

        let refreshed = gw.search(purchase_request()).await.unwrap();
        assert_eq!(api.calls(), 2);
        assert_eq!(refreshed[0].text, "web");

        // Refreshed entry is fresh again
        gw.search(purchase_request()).await.unwrap();
        assert_eq!(api.calls(), 2);
        let stats = gw.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.stale), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_search_summary_shape() {
        let api = MockApi::returning(platform_payload());
        let gw = gateway(api, Arc::new(ManualClock::new(t0())), "");

        let items = gw.search(purchase_request()).await.unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert!(item.id.starts_with("seg#"));
        assert_eq!(item.title, r#"purchase · 2024-01-01→2024-01-08 · by "platform""#);
        assert_eq!(item.text, "ios, android");
        let preview = item.preview.as_ref().unwrap();
        assert_eq!(preview.top, vec!["ios", "android"]);
        assert_eq!(preview.series, json!(["2024-01-01"]));
    }

    #[tokio::test]
    async fn test_search_requires_event_for_multi_word_query() {
        let api = MockApi::returning(json!({}));
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");

        let req = SearchRequest {
            query: "daily active users".to_string(),
            ..SearchRequest::default()
        };
        assert_eq!(gw.search(req).await, Err(GatewayError::EventRequired));

        let empty = SearchRequest::default();
        assert_eq!(gw.search(empty).await, Err(GatewayError::EventRequired));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_word_query_is_the_event() {
        let api = MockApi::returning(json!({}));
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");

        let req = SearchRequest {
            query: "purchase".to_string(),
            ..SearchRequest::default()
        };
        let items = assert_ok!(gw.search(req).await);
        assert!(items[0].title.starts_with("purchase · "));
        assert_eq!(items[0].text, "no data");
    }

    #[tokio::test]
    async fn test_search_rejects_unknown_event() {
        let api = MockApi::returning(json!({}));
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "sign_up_success");

        let err = assert_err!(gw.search(SearchRequest::for_event("login")).await);
        assert_eq!(
            err,
            GatewayError::UnknownEvent {
                event: "login".to_string(),
                allowed_sample: vec!["sign_up_success".to_string()],
            }
        );
        assert!(err.to_string().contains("sign_up_success"));
        assert_eq!(api.calls(), 0);

        assert_ok!(gw.search(SearchRequest::for_event("sign_up_success")).await);
    }

    #[test]
    fn test_unknown_event_sample_is_bounded() {
        let allowed: Vec<String> = (0..25).map(|i| format!("event_{:02}", i)).collect();
        let gw = gateway(
            MockApi::returning(json!({})),
            Arc::new(ManualClock::new(t0())),
            &allowed.join(","),
        );

        match gw.resolve_event(&SearchRequest::for_event("login")) {
            Err(GatewayError::UnknownEvent { allowed_sample, .. }) => {
                assert_eq!(allowed_sample.len(), ALLOWED_SAMPLE_SIZE);
                assert_eq!(allowed_sample[0], "event_00");
            }
            other => panic!("expected unknown event, got {:?}", other),
        }
    }

    #[test]
    fn test_build_spec_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let spec = QueryGateway::build_spec(&SearchRequest::for_event("purchase"), "purchase", today);

        assert_eq!(spec.endpoint(), SEGMENTATION_ENDPOINT);
        assert_eq!(spec.param("from_date"), Some("2024-01-01"));
        assert_eq!(spec.param("to_date"), Some("2024-01-08"));
        assert_eq!(spec.param("unit"), Some(DEFAULT_UNIT));
        assert_eq!(spec.param("on"), Some(DEFAULT_BREAKDOWN));
        assert_eq!(spec.param("where"), None);
    }

    #[test]
    fn test_build_spec_treats_empty_strings_as_missing() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let req = SearchRequest {
            unit: Some(String::new()),
            breakdown: Some(String::new()),
            where_clause: Some(String::new()),
            from_date: Some(String::new()),
            ..SearchRequest::for_event("purchase")
        };
        let spec = QueryGateway::build_spec(&req, "purchase", today);

        assert_eq!(spec.param("from_date"), Some("2024-02-23"));
        assert_eq!(spec.param("unit"), Some(DEFAULT_UNIT));
        assert_eq!(spec.param("on"), Some(DEFAULT_BREAKDOWN));
        assert_eq!(spec.param("where"), None);
    }

    #[tokio::test]
    async fn test_filter_changes_fingerprint() {
        let api = MockApi::returning(json!({}));
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");

        let plain = gw.search(purchase_request()).await.unwrap();
        let filtered = gw
            .search(SearchRequest {
                where_clause: Some(r#"properties["country"] == "FR""#.to_string()),
                ..purchase_request()
            })
            .await
            .unwrap();

        assert_ne!(plain[0].id, filtered[0].id);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_mixes_found_and_unknown_ids() {
        let api = MockApi::returning(platform_payload());
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");
        let id = gw.search(purchase_request()).await.unwrap()[0].id.clone();

        let ids = vec![id.clone(), "seg#not-a-real-id".to_string()];
        let out = gw.fetch(&ids).await.unwrap();

        assert_eq!(out.len(), 2);
        match out.get(&id).unwrap() {
            FetchOutcome::Found { meta, payload } => {
                assert_eq!(meta["endpoint"], "segmentation");
                assert_eq!(meta["event"], "purchase");
                assert_eq!(meta["from_date"], "2024-01-01");
                assert_eq!(payload, &platform_payload());
            }
            other => panic!("expected payload, got {:?}", other),
        }
        assert_eq!(
            out.get("seg#not-a-real-id"),
            Some(&FetchOutcome::unknown_id())
        );
    }

    #[tokio::test]
    async fn test_fetch_always_queries_upstream() {
        let api = MockApi::returning(platform_payload());
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");
        let id = gw.search(purchase_request()).await.unwrap()[0].id.clone();
        assert_eq!(api.calls(), 1);

        gw.fetch(&[id.clone()]).await.unwrap();
        gw.fetch(&[id.clone(), id]).await.unwrap();
        // One live call per fetch; the duplicate id is collapsed
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_after_window_serves_live_payload_without_refreshing() {
        let api = MockApi::returning(platform_payload());
        let clock = Arc::new(ManualClock::new(t0()));
        let gw = gateway(api.clone(), clock.clone(), "");
        let id = gw.search(purchase_request()).await.unwrap()[0].id.clone();

        clock.advance(freshness_ttl() + Duration::minutes(1));
        let live = json!({"data": {"web": {}}});
        api.set_response(Ok(live.clone()));

        let out = gw.fetch(&[id.clone()]).await.unwrap();
        match out.get(&id).unwrap() {
            FetchOutcome::Found { payload, .. } => assert_eq!(payload, &live),
            other => panic!("expected payload, got {:?}", other),
        }
        assert_eq!(api.calls(), 2);

        // Fetch left created_at alone, so search still sees a stale entry
        let again = gw.search(purchase_request()).await.unwrap();
        assert_eq!(api.calls(), 3);
        assert_eq!(again[0].id, id);
        let stats = gw.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.stale), (0, 1, 1));
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_from_search_and_fetch() {
        let api = MockApi::returning(platform_payload());
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");
        let id = gw.search(purchase_request()).await.unwrap()[0].id.clone();

        api.set_response(Err(GatewayError::RateLimited));
        assert_eq!(gw.fetch(&[id]).await, Err(GatewayError::RateLimited));

        let other = SearchRequest::for_event("refund");
        assert_eq!(gw.search(other).await, Err(GatewayError::RateLimited));
    }

    #[tokio::test]
    async fn test_failed_upstream_call_is_not_cached() {
        let api = MockApi::returning(json!({}));
        api.set_response(Err(GatewayError::Upstream {
            status: 500,
            body: "boom".to_string(),
        }));
        let gw = gateway(api.clone(), Arc::new(ManualClock::new(t0())), "");

        assert!(gw.search(purchase_request()).await.is_err());
        assert_eq!(gw.stats().await.total_entries, 0);

        api.set_response(Ok(platform_payload()));
        assert_ok!(gw.search(purchase_request()).await);
        assert_eq!(api.calls(), 2);
    }
}
