#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests for the conversation pipeline over real SQLite and LanceDB
// stores, with Ollama replaced by a mock HTTP server

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lica::LicaError;
use lica::admin::{ProductAdmin, ProductRegistration};
use lica::assistant::ConversationOrchestrator;
use lica::config::{Config, OllamaConfig};
use lica::database::lancedb::VectorStore;
use lica::database::sqlite::SharedCatalog;
use lica::embeddings::ollama::OllamaClient;
use lica::providers::{EmbeddingProvider, Providers};
use lica::session::ChatSession;

const DIMENSION: u32 = 4;

struct TestEnv {
    config: Config,
    providers: Providers,
    _temp_dir: TempDir,
}

async fn create_test_env(server: &MockServer) -> TestEnv {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_test_env_in(server, temp_dir).await
}

async fn create_test_env_in(server: &MockServer, temp_dir: TempDir) -> TestEnv {
    let address = server.address();
    let config = Config {
        ollama: OllamaConfig {
            host: address.ip().to_string(),
            port: address.port(),
            embedding_dimension: DIMENSION,
            ..OllamaConfig::default()
        },
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let ollama = Arc::new(
        OllamaClient::new(&config.ollama)
            .expect("should create client")
            .with_retry_attempts(1),
    );
    let vectors = VectorStore::new(&config)
        .await
        .expect("should open vector store");
    let providers = Providers {
        embeddings: Arc::clone(&ollama) as Arc<dyn EmbeddingProvider>,
        completions: ollama,
        vectors: Arc::new(vectors),
        catalog: Arc::new(SharedCatalog::new(config.database_path())),
    };

    TestEnv {
        config,
        providers,
        _temp_dir: temp_dir,
    }
}

fn registration(code: &str, name: &str, embedding: Vec<f32>) -> ProductRegistration {
    ProductRegistration {
        code: code.to_string(),
        name: name.to_string(),
        description: format!("{name} para a casa toda"),
        usage_instructions: format!("Aplique {name} e passe um pano"),
        price: 12.5,
        category: "Limpeza".to_string(),
        image_url: format!("https://example.com/{code}.png"),
        featured: false,
        embedding: Some(embedding),
        embedding_text: None,
    }
}

async fn mount_chat_reply(server: &MockServer, marker: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": reply},
            "done": true
        })))
        .mount(server)
        .await;
}

async fn mount_embedding(server: &MockServer, vector: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [vector]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn saved_products_are_found_and_attached() {
    let server = MockServer::start().await;
    let env = create_test_env(&server).await;

    let admin = ProductAdmin::new(&env.providers);
    admin
        .save_product(&registration("P1", "Limpa Vidros", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .expect("should save P1");
    admin
        .save_product(&registration("P2", "Cera Líquida", vec![0.0, 1.0, 0.0, 0.0]))
        .await
        .expect("should save P2");

    mount_embedding(&server, &[1.0, 0.0, 0.0, 0.0]).await;
    mount_chat_reply(&server, "precisam ser buscados", "SIM").await;
    mount_chat_reply(&server, "Reescreva a mensagem", "limpa vidros").await;
    mount_chat_reply(
        &server,
        "Use as seguintes",
        "Encontrei! O Limpa Vidros deixa tudo brilhando.",
    )
    .await;

    let orchestrator = ConversationOrchestrator::new(&env.providers, &env.config);
    let reply = orchestrator
        .turn("vocês têm algo para janelas?", &[], None)
        .await
        .expect("turn should succeed");

    assert_eq!(reply.reply_text, "Encontrei! O Limpa Vidros deixa tudo brilhando.");
    let attached = reply.attached_product.expect("product should be attached");
    assert_eq!(attached.code, "P1");
    assert_eq!(attached.usage_instructions, "Aplique Limpa Vidros e passe um pano");
    let similarity = attached.similarity.expect("similarity should be reported");
    assert!((similarity - 1.0).abs() < 1e-4);

    let candidates = reply.context.relevant_products.expect("candidates recorded");
    let codes: Vec<&str> = candidates.iter().map(|product| product.code.as_str()).collect();
    assert_eq!(codes, vec!["P1", "P2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn session_reports_fallback_when_ollama_fails() {
    let server = MockServer::start().await;
    let env = create_test_env(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let mut session = ChatSession::new(ConversationOrchestrator::new(&env.providers, &env.config));
    let reply = session.send("oi").await;

    assert!(reply.failed);
    assert_eq!(reply.text, lica::session::SESSION_FALLBACK_MESSAGE);
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn resaving_a_product_replaces_both_records() {
    let server = MockServer::start().await;
    let env = create_test_env(&server).await;
    let admin = ProductAdmin::new(&env.providers);

    admin
        .save_product(&registration("P1", "Limpa Vidros", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .expect("should save");
    let mut updated = registration("P1", "Limpa Vidros Plus", vec![0.0, 0.0, 1.0, 0.0]);
    updated.price = 15.0;
    let saved = admin.save_product(&updated).await.expect("should resave");

    assert_eq!(saved.name, "Limpa Vidros Plus");
    assert!((saved.price - 15.0).abs() < f64::EPSILON);

    let records = env
        .providers
        .vectors
        .fetch(&["P1".to_string()])
        .await
        .expect("should fetch");
    assert_eq!(records.len(), 1);
    assert_eq!(records["P1"].metadata.name, "Limpa Vidros Plus");
    assert_eq!(records["P1"].vector, vec![0.0, 0.0, 1.0, 0.0]);

    let catalog = env
        .providers
        .catalog
        .find_by_code("P1")
        .await
        .expect("should query")
        .expect("record should exist");
    assert_eq!(catalog.name, "Limpa Vidros Plus");
}

#[tokio::test(flavor = "multi_thread")]
async fn saving_into_a_table_of_another_dimension_writes_nothing() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("should create temp dir");
    VectorStore::open(&temp_dir.path().join("vectors"), 3)
        .await
        .expect("should create a 3-dimensional table");

    let env = create_test_env_in(&server, temp_dir).await;
    assert_eq!(env.providers.vectors.dimension(), 3);

    let admin = ProductAdmin::new(&env.providers);
    let result = admin
        .save_product(&registration("P1", "Limpa Vidros", vec![1.0, 0.0, 0.0, 0.0]))
        .await;
    assert!(matches!(result, Err(LicaError::Validation(_))));

    let catalog = env
        .providers
        .catalog
        .find_by_code("P1")
        .await
        .expect("should query");
    assert!(catalog.is_none());
}
