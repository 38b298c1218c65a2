//! Metadata loading from local description files.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use datadok_fetch::{
    ArchiveError, DatadokClient, DatadokConfig, MetadataSource, PathResolver, StammeVariables,
};

const DESCRIPTION: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FileDescription xmlns="http://www.ssb.no/ns/meta" xmlns:cl="http://www.ssb.no/ns/meta/codelist">
  <ContextVariable id="1">
    <Title>id</Title>
    <Properties><Datatype>Heltall</Datatype><Length>5</Length><StartPosition>1</StartPosition></Properties>
  </ContextVariable>
  <ContextVariable id="2">
    <Title>name</Title>
    <Properties><Datatype>Tekst</Datatype><Length>10</Length><StartPosition>6</StartPosition></Properties>
  </ContextVariable>
  <ContextVariable id="3">
    <Title>status</Title>
    <Properties><Datatype>Tekst</Datatype><Length>2</Length><StartPosition>16</StartPosition></Properties>
    <cl:Codelist>
      <cl:CodelistMeta><cl:Title>status_codes</cl:Title></cl:CodelistMeta>
      <cl:Codes>
        <cl:Code><cl:CodeValue>01</cl:CodeValue><cl:CodeText>Active</cl:CodeText></cl:Code>
      </cl:Codes>
    </cl:Codelist>
  </ContextVariable>
</FileDescription>"#;

fn offline_client() -> DatadokClient {
    DatadokClient::new(DatadokConfig::default().with_endpoint("http://127.0.0.1:9/describe"))
        .unwrap()
}

#[test]
fn fetch_source_reads_local_xml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("description.xml");
    fs::write(&path, DESCRIPTION).unwrap();

    let source = MetadataSource::parse(path.to_str().unwrap());
    let metadata = offline_client().fetch_source(&source).unwrap();

    let names: Vec<&str> = metadata.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "status"]);
    assert_eq!(metadata.field("status").unwrap().codelist.as_deref(), Some("status_codes"));
    assert_eq!(metadata.codelists.len(), 1);
    assert_eq!(metadata.codelists[0].label, "Active");
    assert!(metadata.division.is_none());
}

#[test]
fn fetch_source_rejects_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("description.txt");
    fs::write(&path, "Value cannot be null.").unwrap();

    let source = MetadataSource::File(path);
    let err = offline_client().fetch_source(&source).unwrap_err();
    assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));
}

#[test]
fn unreachable_service_stops_the_search() {
    let client = offline_client();
    let err = client.describe("$UTD/arkiv/g2020").unwrap_err();
    assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));

    let config = client.config().clone();
    let resolver = PathResolver::new(&client, &config).with_stamme(StammeVariables::default());
    let err = resolver.find_metapath("$UTD/arkiv/g2020").unwrap_err();
    assert!(matches!(err, ArchiveError::MetadataUnavailable { .. }));
}

/// Serves one canned HTTP response per connection, in order.
fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local address");
    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&buffer[..read]),
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/xml; charset=utf-8\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{address}/GetFileDescriptionByPath")
}

fn client_for(endpoint: String) -> DatadokClient {
    DatadokClient::new(DatadokConfig::default().with_endpoint(endpoint).with_timeout_secs(5))
        .expect("client")
}

#[test]
fn fetch_reports_unusable_responses() {
    let client = client_for(serve(vec![
        ("500 Internal Server Error", ""),
        ("200 OK", "<string>Value cannot be null.</string>"),
        ("200 OK", "garbage"),
    ]));

    for _ in 0..3 {
        let err = client.fetch("$UTD/arkiv/g2020").unwrap_err();
        assert!(
            matches!(err, ArchiveError::MetadataUnavailable { .. }),
            "unexpected error: {err:?}"
        );
    }
}

#[test]
fn describe_treats_unknown_paths_as_missing() {
    let client = client_for(serve(vec![
        ("404 Not Found", ""),
        ("200 OK", "<string>Value cannot be null.</string>"),
        ("200 OK", "garbage"),
        ("200 OK", DESCRIPTION),
    ]));

    assert!(client.describe("a").expect("status").is_none());
    assert!(client.describe("b").expect("null marker").is_none());
    assert!(client.describe("c").is_err());
    let metadata = client.describe("d").expect("description").expect("described");
    assert_eq!(metadata.fields.len(), 3);
}
