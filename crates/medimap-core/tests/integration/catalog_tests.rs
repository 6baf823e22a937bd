//! Integration tests for CatalogService.

use crate::integration::common::{MockStore, two_region_store};
use medimap_core::catalog::MAX_LIST_LIMIT;
use medimap_core::{AppError, CatalogService};

#[tokio::test]
async fn test_list_regions_ordered_by_code() {
    let store = MockStore::new();
    store.add_region(93, "Provence-Alpes-Côte d'Azur");
    store.add_region(11, "Île-de-France");
    let service = CatalogService::new(store);

    let regions = service.list_regions().await.unwrap();

    let codes: Vec<i32> = regions.iter().map(|r| r.code).collect();
    assert_eq!(codes, vec![11, 93]);
}

#[tokio::test]
async fn test_region_lookups() {
    let store = two_region_store();
    let service = CatalogService::new(store);

    let by_code = service.region_by_code(93).await.unwrap();
    let by_id = service.region_by_id(by_code.id).await.unwrap();

    assert_eq!(by_code, by_id);
    assert!(matches!(
        service.region_by_code(99).await,
        Err(AppError::RegionNotFound(99))
    ));
    assert!(matches!(
        service.region_by_id(999).await,
        Err(AppError::RegionIdNotFound(999))
    ));
}

#[tokio::test]
async fn test_list_drugs_pages_by_id() {
    let store = MockStore::new();
    for i in 0..5 {
        store.add_drug(&format!("34009300000{:02}", i), &format!("DRUG {}", i));
    }
    let service = CatalogService::new(store);

    let first = service.list_drugs(0, 2).await.unwrap();
    let second = service.list_drugs(2, 2).await.unwrap();
    let tail = service.list_drugs(4, 2).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(tail.len(), 1);
    assert!(first[1].id < second[0].id);
    assert_eq!(tail[0].name, "DRUG 4");
}

#[tokio::test]
async fn test_list_drugs_caps_limit() {
    let store = MockStore::new();
    for i in 0..(MAX_LIST_LIMIT + 5) {
        store.add_drug(&format!("{:013}", i), "GENERIC");
    }
    let service = CatalogService::new(store);

    let page = service.list_drugs(0, MAX_LIST_LIMIT * 2).await.unwrap();

    assert_eq!(page.len(), MAX_LIST_LIMIT);
}

#[tokio::test]
async fn test_list_drugs_rejects_skip_past_i64() {
    let store = MockStore::new();
    store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    let service = CatalogService::new(store);

    let result = service.list_drugs(usize::MAX, 10).await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_drug_by_id() {
    let store = MockStore::new();
    let id = store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    let service = CatalogService::new(store);

    assert_eq!(service.drug_by_id(id).await.unwrap().cip_code, "3400930000001");
    assert!(matches!(
        service.drug_by_id(id + 100).await,
        Err(AppError::DrugNotFound(_))
    ));
}
