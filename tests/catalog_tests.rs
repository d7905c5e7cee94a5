mod common;

use harvesthub::{
    models::{Category, OrderStatus},
    services::{
        catalog::{self, CatalogError, CategoryFilter, ProductForm, ProductPatch},
        orders,
    },
    store::memory::MemoryStore,
};

use common::{dec, demo_catalog, insert_order, setup_tracing};

fn kale() -> ProductForm {
    ProductForm {
        name: "Curly Kale".into(),
        price: dec("3.10"),
        image_url: "https://images.example.com/kale.jpeg".into(),
        description: "Hardy winter greens".into(),
        category: Category::Vegetable,
    }
}

#[tokio::test]
async fn catalog_can_be_filtered_by_category() {
    let catalog = demo_catalog();

    let all = catalog::list_products(&catalog.store, CategoryFilter::All)
        .await
        .unwrap();
    let fruit = catalog::list_products(&catalog.store, CategoryFilter::Fruit)
        .await
        .unwrap();
    let vegetables = catalog::list_products(&catalog.store, CategoryFilter::Vegetable)
        .await
        .unwrap();

    assert_eq!(all.len(), 3);
    let names: Vec<&str> = fruit.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Apples", "Bananas"]);
    assert_eq!(vegetables.len(), 1);
    assert_eq!(vegetables[0].id, catalog.carrots.id);
}

#[tokio::test]
async fn created_products_show_up_in_the_catalog() {
    setup_tracing();
    let store = MemoryStore::new();

    let created = catalog::create_product(&store, &kale()).await.unwrap();
    let fetched = catalog::get_product(&store, created.id).await.unwrap();

    assert_eq!(fetched.name, "Curly Kale");
    assert_eq!(fetched.price, dec("3.10"));
    assert_eq!(fetched.category, Category::Vegetable);
}

#[tokio::test]
async fn invalid_products_never_reach_the_store() {
    setup_tracing();
    let store = MemoryStore::new();
    let form = ProductForm {
        name: String::new(),
        price: dec("0"),
        ..kale()
    };

    let result = catalog::create_product(&store, &form).await;

    match result {
        Err(CatalogError::Invalid(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn partial_updates_leave_other_fields_alone() {
    let catalog = demo_catalog();

    let updated = catalog::update_product(
        &catalog.store,
        catalog.apples.id,
        &ProductPatch {
            price: Some(dec("3.25")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.price, dec("3.25"));
    assert_eq!(updated.name, catalog.apples.name);
    assert_eq!(updated.description, catalog.apples.description);
}

#[tokio::test]
async fn empty_patch_returns_the_current_product() {
    let catalog = demo_catalog();

    let product =
        catalog::update_product(&catalog.store, catalog.carrots.id, &ProductPatch::default())
            .await
            .unwrap();

    assert_eq!(product.id, catalog.carrots.id);
    assert_eq!(product.price, dec("1.49"));
}

#[tokio::test]
async fn updating_or_deleting_unknown_products_is_not_found() {
    let catalog = demo_catalog();
    let patch = ProductPatch {
        name: Some("Ghost".into()),
        ..Default::default()
    };

    assert!(matches!(
        catalog::update_product(&catalog.store, 404, &patch).await,
        Err(CatalogError::NotFound)
    ));
    assert!(matches!(
        catalog::delete_product(&catalog.store, 404).await,
        Err(CatalogError::NotFound)
    ));
    assert!(matches!(
        catalog::get_product(&catalog.store, 404).await,
        Err(CatalogError::NotFound)
    ));
}

#[tokio::test]
async fn deleting_a_product_keeps_past_orders_intact() {
    let catalog = demo_catalog();
    let order = insert_order(
        &catalog.store,
        "HH-KEEP001",
        OrderStatus::Delivered,
        &[(&catalog.apples, 5)],
    )
    .await;

    catalog::delete_product(&catalog.store, catalog.apples.id)
        .await
        .unwrap();

    let details = orders::get_order(&catalog.store, order.id).await.unwrap();
    assert_eq!(details.order_items.len(), 1);
    assert_eq!(details.total_price, dec("14.95"));
    assert!(matches!(
        catalog::get_product(&catalog.store, catalog.apples.id).await,
        Err(CatalogError::NotFound)
    ));
}
