use super::*;
use crate::assistant::testing::{
    FakeCatalog, FakeEmbeddings, FakeVectorIndex, Harness, ScriptedCompletions,
};

fn registration() -> ProductRegistration {
    ProductRegistration {
        code: "P10".to_string(),
        name: "Limpa Vidros".to_string(),
        description: "Deixa vidros sem manchas".to_string(),
        usage_instructions: "Borrife e passe um pano seco".to_string(),
        price: 9.9,
        category: "Vidros".to_string(),
        image_url: "https://example.com/p10.png".to_string(),
        featured: true,
        embedding: None,
        embedding_text: None,
    }
}

fn admin_harness(embeddings: FakeEmbeddings, catalog: FakeCatalog, dimension: usize) -> Harness {
    Harness::new(
        embeddings,
        ScriptedCompletions::default(),
        FakeVectorIndex::with_dimension(dimension),
        catalog,
    )
}

#[test]
fn validation_rejects_missing_fields() {
    assert!(registration().validate().is_ok());

    let cases: [fn(&mut ProductRegistration); 6] = [
        |r| r.code = "  ".to_string(),
        |r| r.name = String::new(),
        |r| r.image_url = String::new(),
        |r| r.price = -1.0,
        |r| r.price = f64::NAN,
        |r| r.embedding = Some(Vec::new()),
    ];
    for (i, mutate) in cases.into_iter().enumerate() {
        let mut invalid = registration();
        mutate(&mut invalid);
        assert!(
            matches!(invalid.validate(), Err(LicaError::Validation(_))),
            "case {i} should fail"
        );
    }
}

#[test]
fn default_embedding_text_joins_non_empty_fields() {
    let mut product = registration();
    product.description = "  ".to_string();
    assert_eq!(
        product.default_embedding_text(),
        "Limpa Vidros\nBorrife e passe um pano seco"
    );
}

#[tokio::test]
async fn saves_catalog_then_vector_with_code_as_id() {
    let harness = admin_harness(
        FakeEmbeddings::returning(vec![0.1, 0.2, 0.3]),
        FakeCatalog::default(),
        3,
    );
    let admin = ProductAdmin::new(&harness.providers());

    let saved = admin.save_product(&registration()).await.expect("should save");
    assert_eq!(saved.code, "P10");
    assert!(saved.active);

    let stored = harness.catalog.get("P10").expect("catalog record written");
    assert_eq!(stored.price, 9.9);
    assert!(stored.featured);

    let vectors = harness.vectors.upserted();
    assert_eq!(vectors.len(), 1);
    assert_eq!(vectors[0].id, "P10");
    assert_eq!(vectors[0].metadata.product_code, "P10");
    assert_eq!(vectors[0].metadata.usage_instructions, "Borrife e passe um pano seco");
    assert_eq!(vectors[0].vector, vec![0.1, 0.2, 0.3]);

    assert_eq!(
        harness.embeddings.calls(),
        vec!["Limpa Vidros\nDeixa vidros sem manchas\nBorrife e passe um pano seco"]
    );
}

#[tokio::test]
async fn given_embedding_skips_provider() {
    let harness = admin_harness(FakeEmbeddings::failing(), FakeCatalog::default(), 2);
    let admin = ProductAdmin::new(&harness.providers());
    let mut product = registration();
    product.embedding = Some(vec![0.5, 0.5]);

    admin.save_product(&product).await.expect("should save");
    assert!(harness.embeddings.calls().is_empty());
    assert_eq!(harness.vectors.upserted()[0].vector, vec![0.5, 0.5]);
}

#[tokio::test]
async fn embedding_text_overrides_product_fields() {
    let harness = admin_harness(FakeEmbeddings::returning(vec![1.0, 0.0]), FakeCatalog::default(), 2);
    let admin = ProductAdmin::new(&harness.providers());
    let mut product = registration();
    product.embedding_text = Some(" limpador de vidro e espelho ".to_string());

    admin.save_product(&product).await.expect("should save");
    assert_eq!(harness.embeddings.calls(), vec!["limpador de vidro e espelho"]);
}

#[tokio::test]
async fn wrong_dimension_writes_nothing() {
    let harness = admin_harness(FakeEmbeddings::returning(vec![1.0, 0.0]), FakeCatalog::default(), 768);
    let admin = ProductAdmin::new(&harness.providers());

    let result = admin.save_product(&registration()).await;
    assert!(matches!(result, Err(LicaError::Validation(_))));
    assert!(harness.catalog.get("P10").is_none());
    assert!(harness.vectors.upserted().is_empty());
}

#[tokio::test]
async fn catalog_failure_skips_vector_write() {
    let catalog = FakeCatalog {
        fail: true,
        ..FakeCatalog::default()
    };
    let harness = admin_harness(FakeEmbeddings::returning(vec![1.0, 0.0]), catalog, 2);
    let admin = ProductAdmin::new(&harness.providers());

    let result = admin.save_product(&registration()).await;
    assert!(matches!(result, Err(LicaError::Database(_))));
    assert!(harness.vectors.upserted().is_empty());
}

#[tokio::test]
async fn embedding_failure_writes_nothing() {
    let harness = admin_harness(FakeEmbeddings::failing(), FakeCatalog::default(), 2);
    let admin = ProductAdmin::new(&harness.providers());

    let result = admin.save_product(&registration()).await;
    assert!(matches!(result, Err(LicaError::Embedding(_))));
    assert!(harness.catalog.get("P10").is_none());
}
