use std::io::{BufRead, BufReader, Read, Write};
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;

use serde_json::{json, Value};
use turnweaver::engine::llm_client::{GeminiClient, TextGenerator};
use turnweaver::model::config::{ConfigUpdate, Configuration};
use turnweaver::TransportError;

struct Captured {
    headers: Vec<String>,
    body: Value,
}

/// Serve exactly one HTTP response, handing the parsed request back.
fn one_shot(status: &'static str, body: String) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v1beta/models/test:generateContent", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let captured = read_request(&stream);
        let _ = tx.send(captured);

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    });

    (url, rx)
}

/// Like `one_shot`, but holds the accepted connection until `release` fires.
fn gated_one_shot(
    body: String,
) -> (String, mpsc::Receiver<()>, mpsc::Sender<()>, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v1beta/models/test:generateContent", listener.local_addr().unwrap());
    let (accepted_tx, accepted_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        accepted_tx.send(()).unwrap();
        release_rx.recv().unwrap();

        let _ = tx.send(read_request(&stream));
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    });

    (url, accepted_rx, release_tx, rx)
}

fn read_request(stream: &TcpStream) -> Captured {
    let mut reader = BufReader::new(stream);
    let mut headers = Vec::new();
    let mut content_length = 0;

    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end().to_string();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
        headers.push(line.to_lowercase());
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    Captured {
        headers,
        body: serde_json::from_slice(&body).unwrap(),
    }
}

fn client_for(url: String) -> GeminiClient {
    GeminiClient::new(Configuration {
        endpoint: url,
        credential: "secret-key".into(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn candidate(text: &str) -> String {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]}).to_string()
}

#[test]
fn generate_returns_candidate_text() {
    let (url, rx) = one_shot("200 OK", candidate("{\"story\":\"hi\"}"));
    let client = client_for(url);

    let text = client.generate("tell me a story").unwrap();
    assert_eq!(text, "{\"story\":\"hi\"}");

    let request = rx.recv().unwrap();
    assert!(request.headers.iter().any(|h| h == "x-goog-api-key: secret-key"));
    assert_eq!(request.body["contents"][0]["parts"][0]["text"], "tell me a story");
    assert_eq!(request.body["generationConfig"]["temperature"].as_f64().unwrap() as f32, 0.9);
    assert_eq!(request.body["safetySettings"].as_array().unwrap().len(), 4);
}

#[test]
fn non_success_status_is_transport_error() {
    let body = json!({"error": {"code": 403, "message": "API key invalid", "status": "PERMISSION_DENIED"}});
    let (url, _rx) = one_shot("403 Forbidden", body.to_string());
    let client = client_for(url);

    match client.generate("x") {
        Err(TransportError::Status { status, detail }) => {
            assert_eq!(status, 403);
            assert_eq!(detail, "PERMISSION_DENIED: API key invalid");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn response_without_text_is_transport_error() {
    let (url, _rx) = one_shot("200 OK", json!({"candidates": []}).to_string());
    let client = client_for(url);

    assert!(matches!(client.generate("x"), Err(TransportError::MissingText)));
}

#[test]
fn connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/generate", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(url);
    assert!(matches!(client.generate("x"), Err(TransportError::Request(_))));
    assert!(!client.test_connectivity());
}

#[test]
fn connectivity_check_accepts_four_choices() {
    let payload = json!({
        "story": "Connection test successful.",
        "choices": [
            {"id": "1", "text": "Continue"},
            {"id": "2", "text": "Look around"},
            {"id": "3", "text": "Wait"},
            {"id": "4", "text": "Go back"}
        ]
    });
    let (url, _rx) = one_shot("200 OK", candidate(&format!("```json\n{payload}\n```")));

    assert!(client_for(url).test_connectivity());
}

#[test]
fn config_update_applies_to_next_call() {
    let (url, rx) = one_shot("200 OK", candidate("ok"));
    let client = client_for("http://127.0.0.1:9/unused".into());

    client.update_config(ConfigUpdate {
        endpoint: Some(url),
        credential: Some("rotated".into()),
    });
    assert_eq!(client.generate("x").unwrap(), "ok");

    let request = rx.recv().unwrap();
    assert!(request.headers.iter().any(|h| h == "x-goog-api-key: rotated"));
}

#[test]
fn in_flight_call_keeps_its_config() {
    let (url, accepted, release, rx) = gated_one_shot(candidate("ok"));
    let client = client_for(url);

    thread::scope(|scope| {
        let call = scope.spawn(|| client.generate("x"));

        accepted.recv().unwrap();
        client.update_config(ConfigUpdate::credential("rotated"));
        release.send(()).unwrap();

        assert_eq!(call.join().unwrap().unwrap(), "ok");
    });

    let request = rx.recv().unwrap();
    assert!(request.headers.iter().any(|h| h == "x-goog-api-key: secret-key"));
    assert!(!request.headers.iter().any(|h| h.contains("rotated")));
}

#[test]
fn connectivity_without_credential_stays_offline() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}/generate", listener.local_addr().unwrap());

    for credential in ["", "YOUR_API_KEY_HERE"] {
        let client = GeminiClient::new(Configuration {
            endpoint: url.clone(),
            credential: credential.into(),
            timeout_secs: 5,
        })
        .unwrap();

        assert!(!client.test_connectivity());
    }

    match listener.accept() {
        Err(e) => assert_eq!(e.kind(), ErrorKind::WouldBlock),
        Ok((_, peer)) => panic!("unexpected connection from {peer}"),
    }
}
