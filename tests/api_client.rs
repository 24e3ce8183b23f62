use std::fs;
use std::path::PathBuf;

use mockito::Matcher;
use scout_terminal::football_api::{ApiError, FootballDataClient};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn resolves_team_with_auth_header() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/competitions/2014/teams")
        .match_header("X-Auth-Token", "secret-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(read_fixture("football_data_teams.json"))
        .create();

    let client = FootballDataClient::new(server.url(), Some("secret-key".to_string()));
    let team = client.resolve_team("barcelona", "2014").unwrap().unwrap();
    assert_eq!(team.id, 81);
    assert_eq!(team.name, "FC Barcelona");
    mock.assert();
}

#[test]
fn fetches_finished_matches_with_limit() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/teams/81/matches")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("status".into(), "FINISHED".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(read_fixture("football_data_matches.json"))
        .create();

    let client = FootballDataClient::new(server.url(), Some("secret-key".to_string()));
    let matches = client.recent_matches(81, 5).unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].home_team, "Sevilla FC");
    mock.assert();
}

#[test]
fn forbidden_status_is_surfaced() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/competitions/2021/teams")
        .with_status(403)
        .with_body(r#"{"message":"The resource you are looking for is restricted."}"#)
        .create();

    let client = FootballDataClient::new(server.url(), Some("bad-key".to_string()));
    let err = client.resolve_team("Liverpool", "2021").unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("restricted"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[test]
fn trailing_slash_in_base_url_is_ignored() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/competitions/2002/teams")
        .with_status(200)
        .with_body(r#"{"teams": []}"#)
        .create();

    let client = FootballDataClient::new(format!("{}/", server.url()), Some("k".to_string()));
    assert!(client.resolve_team("Bayern", "2002").unwrap().is_none());
    mock.assert();
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let client = FootballDataClient::new("http://127.0.0.1:1", Some("secret-key".to_string()));
    let err = client.resolve_team("Liverpool", "2021").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}
