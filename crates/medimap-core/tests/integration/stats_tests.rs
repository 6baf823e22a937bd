//! Integration tests for StatsService.

use crate::integration::common::{EmptyScanStore, FailingStore, MockStore, two_region_store};
use medimap_core::{AppError, Ratio, StatsService};
use rust_decimal::Decimal;

fn eur(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[tokio::test]
async fn test_region_totals_orders_by_reimbursement() {
    let service = StatsService::new(two_region_store());

    let totals = service.region_totals(2023).await.unwrap();

    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].code, 11);
    assert_eq!(totals[0].total_units, 1000);
    assert_eq!(totals[0].total_reimbursed, eur(500_000));
    assert_eq!(totals[1].code, 93);
    assert_eq!(totals[1].total_reimbursed, eur(120_000));
}

#[tokio::test]
async fn test_region_totals_is_stable_for_identical_state() {
    let store = MockStore::new();
    store.add_region_total(84, "Auvergne-Rhône-Alpes", 2023, 10, 10_000);
    store.add_region_total(24, "Centre-Val de Loire", 2023, 10, 10_000);
    store.add_region_total(53, "Bretagne", 2023, 10, 10_000);
    let service = StatsService::new(store);

    let first = service.region_totals(2023).await.unwrap();
    let second = service.region_totals(2023).await.unwrap();

    assert_eq!(first, second);
    let codes: Vec<i32> = first.iter().map(|s| s.code).collect();
    assert_eq!(codes, vec![24, 53, 84], "Ties are ordered by region code");
}

#[tokio::test]
async fn test_region_totals_sums_multiple_rows_per_region() {
    let store = MockStore::new();
    let idf = store.add_region(11, "Île-de-France");
    store.add_fact(Some(idf), None, 2023, 600, 300_000);
    store.add_fact(Some(idf), None, 2023, 400, 200_000);
    let service = StatsService::new(store);

    let totals = service.region_totals(2023).await.unwrap();

    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total_units, 1000);
    assert_eq!(totals[0].total_reimbursed, eur(500_000));
}

#[tokio::test]
async fn test_region_totals_ignores_per_drug_rows() {
    let store = two_region_store();
    let doliprane = store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    // Per-drug row for Île-de-France (region id 1) must not inflate the aggregate
    store.add_fact(Some(1), Some(doliprane), 2023, 50, 9_999);
    let service = StatsService::new(store);

    let totals = service.region_totals(2023).await.unwrap();

    assert_eq!(totals[0].total_reimbursed, eur(500_000));
}

#[tokio::test]
async fn test_region_totals_empty_year() {
    let service = StatsService::new(two_region_store());

    let totals = service.region_totals(1999).await.unwrap();

    assert!(totals.is_empty());
}

#[tokio::test]
async fn test_region_detail() {
    let service = StatsService::new(two_region_store());

    let detail = service.region_detail(93, 2023).await.unwrap();

    assert_eq!(detail.code, 93);
    assert_eq!(detail.name, "Provence-Alpes-Côte d'Azur");
    assert_eq!(detail.year, 2023);
    assert_eq!(detail.total_units, 400);
    assert_eq!(detail.total_reimbursed, eur(120_000));
}

#[tokio::test]
async fn test_region_detail_known_region_without_facts_is_zero() {
    let service = StatsService::new(two_region_store());

    let detail = service.region_detail(11, 2020).await.unwrap();

    assert_eq!(detail.total_units, 0);
    assert_eq!(detail.total_reimbursed, Decimal::ZERO);
}

#[tokio::test]
async fn test_region_detail_unknown_code() {
    let service = StatsService::new(two_region_store());

    let result = service.region_detail(99, 2023).await;

    assert!(matches!(result, Err(AppError::RegionNotFound(99))));
}

#[tokio::test]
async fn test_national_overview_matches_region_totals() {
    let store = two_region_store();
    store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    store.add_drug("3400930000002", "IBUPROFENE 400MG");
    let service = StatsService::new(store);

    let overview = service.national_overview(2023).await.unwrap();
    let totals = service.region_totals(2023).await.unwrap();

    assert_eq!(overview.year, 2023);
    assert_eq!(overview.total_units, 1400);
    assert_eq!(overview.total_reimbursed, eur(620_000));
    assert_eq!(
        overview.total_reimbursed,
        totals.iter().map(|s| s.total_reimbursed).sum::<Decimal>()
    );
    assert_eq!(overview.region_count, 2);
    assert_eq!(overview.drug_count, 2);
}

#[tokio::test]
async fn test_national_overview_empty_year() {
    let service = StatsService::new(two_region_store());

    let overview = service.national_overview(1999).await.unwrap();

    assert_eq!(overview.total_units, 0);
    assert_eq!(overview.total_reimbursed, Decimal::ZERO);
    assert_eq!(overview.region_count, 0);
}

/// Île-de-France 5000.00 and PACA 1200.00 give a mean of 3100.00;
/// PACA sits 1900.00 (61.29%) below it and ranks 2nd of 2.
#[tokio::test]
async fn test_compare_to_national_below_mean() {
    let service = StatsService::new(two_region_store());

    let cmp = service.compare_to_national(93, 2023).await.unwrap();

    assert_eq!(cmp.code, 93);
    assert_eq!(cmp.region_value, eur(120_000));
    assert_eq!(cmp.national_mean, eur(310_000));
    assert_eq!(cmp.difference, eur(-190_000));
    assert_eq!(cmp.percent_difference, Ratio::Defined(eur(-6129)));
    assert_eq!(cmp.rank, Some(2));
    assert_eq!(cmp.region_count, 2);
}

#[tokio::test]
async fn test_compare_to_national_above_mean() {
    let service = StatsService::new(two_region_store());

    let cmp = service.compare_to_national(11, 2023).await.unwrap();

    assert_eq!(cmp.difference, eur(190_000));
    assert_eq!(cmp.percent_difference, Ratio::Defined(eur(6129)));
    assert_eq!(cmp.rank, Some(1));
}

#[tokio::test]
async fn test_compare_to_national_zero_mean_is_undefined() {
    let store = MockStore::new();
    store.add_region_total(11, "Île-de-France", 2023, 0, 0);
    store.add_region_total(93, "Provence-Alpes-Côte d'Azur", 2023, 0, 0);
    let service = StatsService::new(store);

    let cmp = service.compare_to_national(11, 2023).await.unwrap();

    assert_eq!(cmp.national_mean, Decimal::ZERO);
    assert_eq!(cmp.difference, Decimal::ZERO);
    assert_eq!(cmp.percent_difference, Ratio::Undefined);
}

#[tokio::test]
async fn test_compare_to_national_empty_year_is_undefined() {
    let service = StatsService::new(two_region_store());

    let cmp = service.compare_to_national(11, 1999).await.unwrap();

    assert_eq!(cmp.region_value, Decimal::ZERO);
    assert_eq!(cmp.percent_difference, Ratio::Undefined);
    assert_eq!(cmp.rank, None);
    assert_eq!(cmp.region_count, 0);
}

#[tokio::test]
async fn test_compare_to_national_unranked_region() {
    let store = two_region_store();
    store.add_region(44, "Grand Est");
    let service = StatsService::new(store);

    let cmp = service.compare_to_national(44, 2023).await.unwrap();

    assert_eq!(cmp.region_value, Decimal::ZERO);
    assert_eq!(cmp.difference, eur(-310_000));
    assert_eq!(cmp.percent_difference, Ratio::Defined(eur(-10_000)));
    assert_eq!(cmp.rank, None);
    assert_eq!(cmp.region_count, 2);
}

#[tokio::test]
async fn test_compare_to_national_unknown_code() {
    let service = StatsService::new(two_region_store());

    let result = service.compare_to_national(99, 2023).await;

    assert!(matches!(result, Err(AppError::RegionNotFound(99))));
}

#[tokio::test]
async fn test_compare_to_national_reads_value_from_year_totals() {
    // Per-region reads still see Île-de-France's 5000.00 while the year scan is empty.
    let service = StatsService::new(EmptyScanStore(two_region_store()));

    let detail = service.region_detail(11, 2023).await.unwrap();
    let cmp = service.compare_to_national(11, 2023).await.unwrap();

    assert_eq!(detail.total_reimbursed, eur(500_000));
    assert_eq!(cmp.name, "Île-de-France");
    assert_eq!(cmp.region_value, Decimal::ZERO);
    assert_eq!(cmp.national_mean, Decimal::ZERO);
    assert_eq!(cmp.difference, Decimal::ZERO);
    assert_eq!(cmp.percent_difference, Ratio::Undefined);
    assert_eq!(cmp.rank, None);
    assert_eq!(cmp.region_count, 0);
}

#[tokio::test]
async fn test_compare_to_national_unknown_code_with_empty_scan() {
    let service = StatsService::new(EmptyScanStore(two_region_store()));

    let result = service.compare_to_national(99, 2023).await;

    assert!(matches!(result, Err(AppError::RegionNotFound(99))));
}

#[tokio::test]
async fn test_region_shares() {
    let service = StatsService::new(two_region_store());

    let shares = service.region_shares(2023).await.unwrap();

    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].stat.code, 11);
    // 5000 / 6200 = 80.645...%
    assert_eq!(shares[0].share_pct, Ratio::Defined(eur(8065)));
    // 1200 / 6200 = 19.354...%
    assert_eq!(shares[1].share_pct, Ratio::Defined(eur(1935)));
}

#[tokio::test]
async fn test_region_shares_zero_total_is_undefined() {
    let store = MockStore::new();
    store.add_region_total(11, "Île-de-France", 2023, 0, 0);
    let service = StatsService::new(store);

    let shares = service.region_shares(2023).await.unwrap();

    assert_eq!(shares[0].share_pct, Ratio::Undefined);
}

#[tokio::test]
async fn test_drug_totals_folds_across_regions() {
    let store = two_region_store();
    let doliprane = store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    let ibuprofene = store.add_drug("3400930000002", "IBUPROFENE 400MG");
    let levothyrox = store.add_drug("3400930000003", "LEVOTHYROX 50UG");
    store.add_fact(Some(1), Some(doliprane), 2023, 100, 20_000);
    store.add_fact(Some(3), Some(doliprane), 2023, 50, 10_000);
    store.add_fact(Some(1), Some(ibuprofene), 2023, 10, 40_000);
    store.add_fact(Some(1), Some(levothyrox), 2023, 5, 1_000);
    store.add_fact(Some(1), Some(levothyrox), 2022, 5, 99_000);
    let service = StatsService::new(store);

    let top = service.drug_totals(2023, 2).await.unwrap();

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].name, "IBUPROFENE 400MG");
    assert_eq!(top[0].total_reimbursed, eur(40_000));
    assert_eq!(top[1].cip_code, "3400930000001");
    assert_eq!(top[1].total_units, 150);
    assert_eq!(top[1].total_reimbursed, eur(30_000));
}

#[tokio::test]
async fn test_drug_totals_empty_without_per_drug_rows() {
    let service = StatsService::new(two_region_store());

    assert!(service.drug_totals(2023, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_drug_search_is_case_insensitive_and_limited() {
    let store = MockStore::new();
    store.add_drug("3400930000001", "DOLIPRANE 1000MG");
    store.add_drug("3400930000002", "Doliprane 500mg");
    store.add_drug("3400930000003", "EFFERALGAN DOLIPRA");
    store.add_drug("3400930000004", "IBUPROFENE 400MG");
    let service = StatsService::new(store);

    let all = service.drug_search("dolipra", 10).await.unwrap();
    let limited = service.drug_search("dolipra", 2).await.unwrap();

    assert_eq!(all.len(), 3);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited, all[..2].to_vec());
}

#[tokio::test]
async fn test_drug_search_returns_only_matching_names() {
    let store = MockStore::new();
    store.add_drug("3400930000010", "Paracetamol");
    store.add_drug("3400930000011", "Ibuprofen");
    let service = StatsService::new(store);

    let found = service.drug_search("par", 10).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Paracetamol");
    assert_eq!(service.drug_search("PAR", 10).await.unwrap(), found);
    assert!(service.drug_search("xyz", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_is_propagated() {
    let service = StatsService::new(FailingStore);

    let result = service.region_totals(2023).await;

    match result {
        Err(err @ AppError::DatabaseError(_)) => assert!(err.is_retryable()),
        other => panic!("expected a database error, got {:?}", other.map(|v| v.len())),
    }
    assert!(service.national_overview(2023).await.is_err());
    assert!(service.compare_to_national(11, 2023).await.is_err());
}
