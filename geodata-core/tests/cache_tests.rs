// Tests for the discovery cache

use geodata_core::cache::DiscoveryCache;
use geodata_scanner::{LinkResolver, SourceDefinition};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const PAGE_2025: &str = r#"<html><body>
    <a href="/uploads/Embargos_Adm_IMAC_2025.zip">Embargos 2025</a>
</body></html>"#;

const PAGE_2025_V2: &str = r#"<html><body>
    <a href="/uploads/v2/Embargos_Adm_IMAC_2025.rar">Embargos 2025 (atualizado)</a>
</body></html>"#;

fn enforcement_source(server: &MockServer) -> SourceDefinition {
    SourceDefinition::new("FISCALIZACAO", format!("{}/fiscalizacao/", server.uri()))
        .with_target("Embargos_Adm_IMAC_2025", "imac_embargos_2025.zip")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

// ============================================================================
// Freshness Tests
// ============================================================================

#[tokio::test]
async fn test_cache_hit_within_ttl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fiscalizacao/"))
        .respond_with(html(PAGE_2025))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = LinkResolver::new(vec![enforcement_source(&mock_server)]).unwrap();
    let cache = DiscoveryCache::new(resolver, Duration::from_secs(3600));

    let first = cache.get_links().await;
    let second = cache.get_links().await;

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert!(cache.is_fresh().await);
    // MockServer verifies the single request on drop
}

#[tokio::test]
async fn test_cache_refreshes_after_ttl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fiscalizacao/"))
        .respond_with(html(PAGE_2025))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fiscalizacao/"))
        .respond_with(html(PAGE_2025_V2))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = LinkResolver::new(vec![enforcement_source(&mock_server)]).unwrap();
    let cache = DiscoveryCache::new(resolver, Duration::from_millis(50));

    let first = cache.get_links().await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!cache.is_fresh().await);

    let second = cache.get_links().await;

    assert!(first[0].url.ends_with("/uploads/Embargos_Adm_IMAC_2025.zip"));
    assert!(second[0].url.ends_with("/uploads/v2/Embargos_Adm_IMAC_2025.rar"));
    assert_eq!(second[0].filename, "imac_embargos_2025.zip");
}

#[tokio::test]
async fn test_age_is_reported_after_first_scan() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(PAGE_2025))
        .mount(&mock_server)
        .await;

    let resolver = LinkResolver::new(vec![enforcement_source(&mock_server)]).unwrap();
    let cache = DiscoveryCache::new(resolver, Duration::from_secs(60));

    assert!(cache.age().await.is_none());
    cache.get_links().await;
    assert!(cache.age().await.unwrap() < Duration::from_secs(60));
    assert_eq!(cache.ttl(), Duration::from_secs(60));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

/// Concurrent callers share one scan instead of stampeding the upstream site
#[tokio::test]
async fn test_concurrent_callers_share_one_scan() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fiscalizacao/"))
        .respond_with(html(PAGE_2025).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = LinkResolver::new(vec![enforcement_source(&mock_server)]).unwrap();
    let cache = DiscoveryCache::new(resolver, Duration::from_secs(3600));

    let (a, b, c) = tokio::join!(cache.get_links(), cache.get_links(), cache.get_links());

    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.len(), 1);
}
