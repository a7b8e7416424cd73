// End-to-end tests: discovery through bundling

use geodata_core::{CoreError, GeodataHub, RunOutcome, Settings};
use geodata_scanner::SourceDefinition;
use std::sync::{Arc, Mutex};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn settings_for(sources: Vec<SourceDefinition>) -> Settings {
    Settings {
        sources,
        ..Settings::default()
    }
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_process_discovers_downloads_and_bundles() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "/licenciamento/",
        ResponseTemplate::new(200).set_body_string(
            r#"<ul>
                <li><a href="/files/SUPRESSAO_2025.zip">Supressão</a></li>
                <li><a href="/files/manual.pdf">USO-ALTERNATIVO (manual)</a></li>
                <li><a href="/files/uso_alt.zip">USO-ALTERNATIVO</a></li>
            </ul>"#,
        ),
    )
    .await;
    mount(
        &mock_server,
        "/files/SUPRESSAO_2025.zip",
        ResponseTemplate::new(200).set_body_bytes(b"supressao".to_vec()),
    )
    .await;
    mount(
        &mock_server,
        "/files/uso_alt.zip",
        ResponseTemplate::new(200).set_body_bytes(b"uso".to_vec()),
    )
    .await;

    let settings = settings_for(vec![
        SourceDefinition::new("LICENCIAMENTO", format!("{}/licenciamento/", mock_server.uri()))
            .with_target("SUPRESSAO", "imac_supressao.zip")
            .with_target("USO-ALTERNATIVO", "imac_uso_alternativo.zip"),
    ]);
    let hub = GeodataHub::from_settings(&settings).unwrap();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let lines_clone = lines.clone();
    let outcome = hub
        .process(
            None,
            Some(Arc::new(move |line: String| {
                lines_clone.lock().unwrap().push(line);
            })),
        )
        .await
        .unwrap();

    let RunOutcome::Bundled(result) = outcome else {
        panic!("expected a bundle");
    };
    assert_eq!(result.succeeded_count(), 2);
    assert_eq!(result.outcomes[0].filename, "imac_supressao.zip");
    assert_eq!(result.outcomes[1].filename, "imac_uso_alternativo.zip");
    assert!(result.archive_name().starts_with("Geodata_IMAC_"));

    let lines = lines.lock().unwrap().clone();
    assert_eq!(lines[0], "2 archive(s) identified, starting downloads");
    assert_eq!(lines.len(), 3);

    result.release();
}

#[tokio::test]
async fn test_no_matches_is_no_links_found() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "/licenciamento/",
        ResponseTemplate::new(200).set_body_string("<p>Em manutenção</p>"),
    )
    .await;

    let settings = settings_for(vec![
        SourceDefinition::new("LICENCIAMENTO", format!("{}/licenciamento/", mock_server.uri()))
            .with_target("SUPRESSAO", "imac_supressao.zip"),
    ]);
    let hub = GeodataHub::from_settings(&settings).unwrap();

    let outcome = hub.process(None, None).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NoLinksFound));
}

#[tokio::test]
async fn test_all_sources_down_is_no_links_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let settings = settings_for(vec![
        SourceDefinition::new("A", format!("{}/a/", mock_server.uri()))
            .with_target("SUPRESSAO", "a.zip"),
        SourceDefinition::new("B", format!("{}/b/", mock_server.uri()))
            .with_target("EMBARGOS", "b.zip"),
    ]);
    let hub = GeodataHub::from_settings(&settings).unwrap();

    let outcome = hub.process(None, None).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NoLinksFound));
}

#[tokio::test]
async fn test_no_sources_is_no_links_found() {
    let hub = GeodataHub::from_settings(&settings_for(Vec::new())).unwrap();
    let outcome = hub.process(None, None).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NoLinksFound));
}

#[tokio::test]
async fn test_repeated_runs_reuse_discovery() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/licenciamento/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/s.zip">SUPRESSAO</a>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"s".to_vec()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let settings = settings_for(vec![
        SourceDefinition::new("LICENCIAMENTO", format!("{}/licenciamento/", mock_server.uri()))
            .with_target("SUPRESSAO", "imac_supressao.zip"),
    ]);
    let hub = GeodataHub::from_settings(&settings).unwrap();

    for _ in 0..2 {
        match hub.process(None, None).await.unwrap() {
            RunOutcome::Bundled(result) => {
                assert_eq!(result.succeeded_count(), 1);
                result.release();
            }
            RunOutcome::NoLinksFound => panic!("expected a bundle"),
        }
    }
    assert!(hub.cache().is_fresh().await);
}

#[test]
fn test_invalid_settings_are_rejected() {
    let settings = settings_for(vec![
        SourceDefinition::new("A", "https://example.com/a").with_target("X", "same.zip"),
        SourceDefinition::new("B", "https://example.com/b").with_target("Y", "same.zip"),
    ]);

    let result = GeodataHub::from_settings(&settings);
    assert!(matches!(result, Err(CoreError::Config(_))));
}
