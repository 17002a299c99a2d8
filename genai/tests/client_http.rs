use deckgen_genai::{GeminiClient, GenAiError};
use std::io::Read;
use std::thread;

/// Serves `responses` in order on an ephemeral port and hands back
/// `(base_url, join_handle)`. Each captured request is `(url, api_key, body)`.
fn serve(
    responses: Vec<(u16, String)>,
) -> (String, thread::JoinHandle<Vec<(String, String, String)>>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let mut request = server.recv().unwrap();
            let mut req_body = String::new();
            request.as_reader().read_to_string(&mut req_body).unwrap();
            let key = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("x-goog-api-key"))
                .map(|h| h.value.to_string())
                .unwrap_or_default();
            seen.push((request.url().to_string(), key, req_body));
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .unwrap();
            let response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            request.respond(response).unwrap();
        }
        seen
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn content_round_over_http() {
    let deck = r##"{"mainTitle":"Bees","subtitle":"Pollinators","themeColor":"#F59E0B","coverImagePrompt":"a bee","slides":[{"title":"Hive","layout":"grid","description":"a hive","content":[{"text":"Queen","icon":"Award"}]}]}"##;
    let body = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": deck }] } }]
    })
    .to_string();
    let (base, server) = serve(vec![(200, body)]);

    let client = GeminiClient::new("secret".to_string()).with_api_base(base);
    let result = client.generate_presentation("All about bees").await.unwrap();
    assert_eq!(result.main_title, "Bees");
    assert_eq!(result.slides[0].content[0].text, "Queen");

    let seen = server.join().unwrap();
    let (url, key, req_body) = &seen[0];
    assert!(url.ends_with(":generateContent"));
    assert!(url.contains(&client.content_model));
    assert_eq!(key, "secret");
    assert!(req_body.contains("All about bees"));
    assert!(req_body.contains("responseSchema"));
}

#[tokio::test]
async fn image_round_over_http() {
    let with_image = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } }] } }]
    })
    .to_string();
    let without_image = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "I cannot draw that" }] } }]
    })
    .to_string();
    let (base, server) = serve(vec![(200, with_image), (200, without_image)]);

    let client = GeminiClient::new("k".to_string()).with_api_base(base);
    let first = client.generate_image("a hive").await.unwrap();
    assert_eq!(first.unwrap().mime_type, "image/png");
    let second = client.generate_image("a queen").await.unwrap();
    assert!(second.is_none());

    let seen = server.join().unwrap();
    assert!(seen[0].0.contains(&client.image_model));
    assert!(seen[0].2.contains("presentation slide illustration for: a hive"));
}

#[tokio::test]
async fn http_errors_surface_status() {
    let (base, server) = serve(vec![(429, r#"{"error":"quota"}"#.to_string())]);

    let client = GeminiClient::new("k".to_string()).with_api_base(base);
    let err = client.generate_presentation("topic").await.unwrap_err();
    match err {
        GenAiError::Status { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.join().unwrap();
}
