//! PostgreSQL repository tests.
//!
//! These need a migrated database (`DATABASE_URL`, default port 15432) and are
//! ignored by default. Run with `cargo test -p geofind-db -- --ignored`.

use geofind_db::{
    create_pool_with_config,
    test_fixtures::{coordinate, test_database_url, unique_detail},
    FavoriteRepository, LocationRepository, NewFavorite, NewSearchHistoryEntry,
    PgFavoriteRepository, PgLocationRepository, PgSearchHistoryRepository, PoolConfig,
    SearchHistoryRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn setup_test_pool() -> PgPool {
    create_pool_with_config(&test_database_url(), &PoolConfig::default())
        .await
        .expect("Failed to create test pool")
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_search_by_address_is_case_insensitive() {
    let pool = setup_test_pool().await;
    let repo = PgLocationRepository::new(pool);

    let req = unique_detail("Baker Street");
    let upper = req.address.to_uppercase();
    let detail = repo.insert_location(req).await.expect("insert detail");
    repo.insert_coordinate(coordinate(detail.id, 51.5237, -0.1585))
        .await
        .expect("insert coordinate");

    let hits = repo.search_by_address(&upper, 5).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].detail.id, detail.id);
    assert_eq!(hits[0].coordinates.len(), 1);

    repo.delete_location(detail.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_search_escapes_wildcards() {
    let pool = setup_test_pool().await;
    let repo = PgLocationRepository::new(pool);

    let detail = repo
        .insert_location(unique_detail("Percent Plaza"))
        .await
        .expect("insert detail");
    repo.insert_coordinate(coordinate(detail.id, 1.0, 1.0))
        .await
        .expect("insert coordinate");

    let hits = repo.search_by_address("%", 50).await.expect("search");
    assert!(hits.iter().all(|h| h.detail.address_key.contains('%')));

    repo.delete_location(detail.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_favorite_lifecycle() {
    let pool = setup_test_pool().await;
    let locations = PgLocationRepository::new(pool.clone());
    let favorites = PgFavoriteRepository::new(pool);
    let user = Uuid::new_v4();

    let detail = locations
        .insert_location(unique_detail("Favorite Road"))
        .await
        .expect("insert detail");
    locations
        .insert_coordinate(coordinate(detail.id, 40.0, -70.0))
        .await
        .expect("insert coordinate");

    let fav = favorites
        .insert_favorite(NewFavorite {
            user_id: user,
            location_detail_id: detail.id,
            name: Some("Home".to_string()),
            notes: None,
        })
        .await
        .expect("insert favorite");

    let found = favorites
        .find_favorite(user, detail.id)
        .await
        .expect("find favorite");
    assert_eq!(found.map(|f| f.id), Some(fav.id));

    let listed = favorites.list_favorites(user).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert!(listed[0].to_resolved().is_some());

    assert!(favorites.delete_favorite(fav.id).await.expect("delete"));
    assert!(!favorites.delete_favorite(fav.id).await.expect("delete again"));

    locations.delete_location(detail.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_history_cap_and_prune() {
    let pool = setup_test_pool().await;
    let history = PgSearchHistoryRepository::new(pool);
    let user = Uuid::new_v4();

    for i in 0..25 {
        history
            .insert_history(NewSearchHistoryEntry {
                user_id: user,
                location_detail_id: None,
                search_query: format!("query {i}"),
            })
            .await
            .expect("insert history");
    }

    let page = history.list_history(user, 100).await.expect("list");
    assert_eq!(page.len(), 20);
    assert_eq!(page[0].entry.search_query, "query 24");

    let deleted = history.prune_history(user, 10).await.expect("prune");
    assert_eq!(deleted, 15);
    let remaining = history.list_history(user, 20).await.expect("list");
    assert_eq!(remaining.len(), 10);

    history.prune_history(user, 0).await.expect("cleanup");
}
