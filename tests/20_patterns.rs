mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use anyhow::Result;
use axum::http::StatusCode;

use common::{dates_of, get, keys_of, API_KEY};

#[tokio::test]
async fn latest_defaults_to_first_twenty_newest_rows() -> Result<()> {
    let app = common::router(common::sample_store());
    let (status, body) = get(&app, "/patterns/latest", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::OK);

    let dates = dates_of(&body);
    assert_eq!(dates.len(), 20);
    assert_eq!(dates[0], "2024-04-30");
    assert!(dates.windows(2).all(|w| w[0] >= w[1]), "not newest first: {:?}", dates);

    let first = &body[0];
    for field in [
        "symbol", "date", "open", "high", "low", "close", "volume", "prev_close", "avg_price",
        "pattern_value", "matched_patterns",
    ] {
        assert!(first.get(field).is_some(), "missing {}", field);
    }
    Ok(())
}

#[tokio::test]
async fn pages_are_disjoint_and_contiguous() -> Result<()> {
    let app = common::router(common::sample_store());

    let (_, all) = get(&app, "/patterns/latest?limit=100", Some(API_KEY)).await?;
    let all = dates_of(&all);
    // rows without a pattern value are never listed
    assert_eq!(all.len(), 40);

    let mut stitched = Vec::new();
    for page in 1..=4 {
        let uri = format!("/patterns/latest?page={}&limit=12", page);
        let (status, body) = get(&app, &uri, Some(API_KEY)).await?;
        assert_eq!(status, StatusCode::OK);
        let dates = dates_of(&body);
        assert!(dates.len() <= 12);
        stitched.extend(dates);
    }
    assert_eq!(stitched, all);
    assert_eq!(stitched.iter().collect::<HashSet<_>>().len(), 40);

    // past the end: empty, not an error
    let (status, body) = get(&app, "/patterns/latest?page=9&limit=12", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn pages_stay_disjoint_when_symbols_share_dates() -> Result<()> {
    let app = common::router(common::crowded_store());

    for (base, expected) in [("/patterns/latest?", 100), ("/patterns/search?pattern_value=3&", 52)] {
        let (_, all) = get(&app, &format!("{}limit=100", base), Some(API_KEY)).await?;
        let all = keys_of(&all);
        assert_eq!(all.len(), expected, "{}", base);

        let mut stitched = Vec::new();
        for page in 1..=15 {
            let uri = format!("{}page={}&limit=7", base, page);
            let (status, body) = get(&app, &uri, Some(API_KEY)).await?;
            assert_eq!(status, StatusCode::OK);
            stitched.extend(keys_of(&body));
        }
        assert_eq!(stitched.iter().collect::<HashSet<_>>().len(), stitched.len(), "{}", base);
        assert_eq!(stitched, all, "{}", base);
    }

    // within a day, symbols ascend
    let (_, first) = get(&app, "/patterns/latest?limit=3", Some(API_KEY)).await?;
    assert_eq!(
        keys_of(&first),
        vec![
            ("SYM00".to_string(), "2024-05-04".to_string()),
            ("SYM01".to_string(), "2024-05-04".to_string()),
            ("SYM02".to_string(), "2024-05-04".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn invalid_pagination_is_reported_per_field() -> Result<()> {
    let store = common::sample_store();
    let calls = store.calls.clone();
    let app = common::router(store);

    let (status, body) = get(&app, "/patterns/latest?page=0&limit=101", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "UNPROCESSABLE_ENTITY");
    assert!(body["field_errors"]["page"].is_string());
    assert!(body["field_errors"]["limit"].is_string());

    let (status, body) = get(&app, "/patterns/search?limit=abc&start_date=2024-02-30", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["limit"].is_string());
    assert!(body["field_errors"]["start_date"].is_string());

    assert_eq!(calls.load(Ordering::SeqCst), 0, "invalid requests reached the store");
    Ok(())
}

#[tokio::test]
async fn search_without_filters_matches_latest() -> Result<()> {
    let app = common::router(common::sample_store());
    let (_, latest) = get(&app, "/patterns/latest?page=2&limit=7", Some(API_KEY)).await?;
    let (_, search) = get(&app, "/patterns/search?page=2&limit=7", Some(API_KEY)).await?;
    assert_eq!(latest, search);

    let (_, empty_symbol) = get(&app, "/patterns/search?page=2&limit=7&symbol=", Some(API_KEY)).await?;
    assert_eq!(latest, empty_symbol);

    let (_, blank_symbol) = get(&app, "/patterns/search?page=2&limit=7&symbol=%20%20", Some(API_KEY)).await?;
    assert_eq!(latest, blank_symbol);
    Ok(())
}

#[tokio::test]
async fn search_uses_bitmask_containment() -> Result<()> {
    let app = common::router(common::sample_store());
    let (status, body) = get(&app, "/patterns/search?pattern_value=3&limit=100", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert!(!rows.is_empty());
    for row in rows {
        let v = row["pattern_value"].as_i64().unwrap();
        assert_eq!(v & 3, 3, "row {} does not contain mask 3", row);
    }
    // 0b1011 contains 0b0011, 0b1010 does not
    assert!(rows.iter().any(|r| r["symbol"] == "MSFT"));
    assert!(!rows.iter().any(|r| r["pattern_value"] == 10));
    Ok(())
}

#[tokio::test]
async fn search_date_bounds_are_inclusive() -> Result<()> {
    let app = common::router(common::sample_store());
    let (status, body) = get(
        &app,
        "/patterns/search?symbol=AAPL&start_date=2024-04-10&end_date=2024-04-12",
        Some(API_KEY),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dates_of(&body), vec!["2024-04-12", "2024-04-11", "2024-04-10"]);

    let (_, single_day) = get(
        &app,
        "/patterns/search?start_date=2024-03-05&end_date=2024-03-05",
        Some(API_KEY),
    )
    .await?;
    assert_eq!(dates_of(&single_day), vec!["2024-03-05"]);
    Ok(())
}

#[tokio::test]
async fn search_combines_filters_conjunctively() -> Result<()> {
    let app = common::router(common::sample_store());
    let (_, body) = get(
        &app,
        "/patterns/search?symbol=AAPL&pattern_value=8&start_date=2024-04-01&end_date=2024-04-15",
        Some(API_KEY),
    )
    .await?;
    // days whose (day % 16) has bit 3 set: 8..=15
    assert_eq!(
        dates_of(&body),
        (8..=15).rev().map(|d| format!("2024-04-{:02}", d)).collect::<Vec<_>>()
    );
    assert!(body.as_array().unwrap().iter().all(|r| r["symbol"] == "AAPL"));

    let (_, none) = get(&app, "/patterns/search?symbol=aapl", Some(API_KEY)).await?;
    assert_eq!(none.as_array().map(Vec::len), Some(0), "search symbol match is exact");

    let (status, padded) = get(&app, "/patterns/search?symbol=%20AAPL", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(padded.as_array().map(Vec::len), Some(0), "surrounding spaces are not trimmed");
    Ok(())
}

#[tokio::test]
async fn database_errors_surface_with_context() -> Result<()> {
    let store = common::InMemoryStore {
        failure: Some("relation \"common_stock_data\" does not exist".to_string()),
        ..Default::default()
    };
    let app = common::router(store);

    let (status, body) = get(&app, "/patterns/search", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Error while filtering patterns: "), "{}", message);
    assert!(message.contains("common_stock_data"), "{}", message);

    let (status, body) = get(&app, "/patterns/latest", Some(API_KEY)).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Error fetching latest patterns: "), "{}", message);
    Ok(())
}
