//! Favorite toggling and history listing.

use geofind_api::services::{FavoriteLabels, LocationRecorder};
use geofind_core::{
    CurrentUser, Error, FavoriteRepository, NewSearchHistoryEntry, ResolvedLocation,
    SearchHistoryRepository,
};
use geofind_db::InMemoryLocationStore;
use uuid::Uuid;

fn setup(retention: i64) -> (InMemoryLocationStore, LocationRecorder) {
    let store = InMemoryLocationStore::new();
    let recorder = LocationRecorder::with_retention(store.stores(), retention);
    (store, recorder)
}

fn eiffel() -> ResolvedLocation {
    ResolvedLocation {
        latitude: 48.8584,
        longitude: 2.2945,
        address: "Eiffel Tower".to_string(),
        formatted_address: "Tour Eiffel, Paris, France".to_string(),
    }
}

#[tokio::test]
async fn test_toggle_twice_adds_then_removes() {
    let (store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());

    let first = recorder
        .toggle_favorite(&eiffel(), Some(&user), FavoriteLabels::default())
        .await
        .unwrap();
    assert!(first.favorited);
    assert!(recorder.is_favorited("eiffel tower", Some(&user)).await.unwrap());

    let second = recorder
        .toggle_favorite(&eiffel(), Some(&user), FavoriteLabels::default())
        .await
        .unwrap();
    assert!(!second.favorited);
    assert_eq!(second.favorite_id, first.favorite_id);

    assert!(store.list_favorites(user.id).await.unwrap().is_empty());
    assert!(!recorder.is_favorited("Eiffel Tower", Some(&user)).await.unwrap());
    // The location detail is kept for reuse.
    assert_eq!(store.location_count().unwrap(), 1);
}

#[tokio::test]
async fn test_toggle_without_user_has_no_side_effects() {
    let (store, recorder) = setup(100);

    let err = recorder
        .toggle_favorite(&eiffel(), None, FavoriteLabels::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuthRequired(_)));
    assert_eq!(store.lookup_count(), 0);
    assert_eq!(store.location_count().unwrap(), 0);
}

#[tokio::test]
async fn test_toggle_reuses_existing_detail() {
    let (store, recorder) = setup(100);
    let alice = CurrentUser::new(Uuid::new_v4());
    let bob = CurrentUser::new(Uuid::new_v4());

    recorder
        .toggle_favorite(&eiffel(), Some(&alice), FavoriteLabels::default())
        .await
        .unwrap();
    let mut spaced = eiffel();
    spaced.address = "  EIFFEL   tower ".to_string();
    recorder
        .toggle_favorite(&spaced, Some(&bob), FavoriteLabels::default())
        .await
        .unwrap();

    assert_eq!(store.location_count().unwrap(), 1);
    assert_eq!(store.coordinate_count().unwrap(), 1);
    assert_eq!(store.list_favorites(alice.id).await.unwrap().len(), 1);
    assert_eq!(store.list_favorites(bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_map_click_favorite_uses_coordinate_pair() {
    let (store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());
    let picked = ResolvedLocation::from_coordinates(40.748817, -73.985428).unwrap();

    let toggle = recorder
        .toggle_favorite(
            &picked,
            Some(&user),
            FavoriteLabels {
                name: Some("Office".to_string()),
                notes: Some("3rd floor".to_string()),
            },
        )
        .await
        .unwrap();

    let favorites = recorder.list_favorites(Some(&user)).await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].favorite.id, toggle.favorite_id);
    assert_eq!(favorites[0].favorite.name.as_deref(), Some("Office"));
    assert_eq!(favorites[0].favorite.notes.as_deref(), Some("3rd floor"));

    let resolved = favorites[0].to_resolved().unwrap();
    assert_eq!(resolved.address, "40.748817, -73.985428");
    assert_eq!(resolved.formatted_address, "40.748817, -73.985428");
    assert_eq!(store.coordinate_count().unwrap(), 1);
}

#[tokio::test]
async fn test_toggle_rejects_out_of_range_location() {
    let (store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());
    let mut bad = eiffel();
    bad.longitude = 200.0;

    let err = recorder
        .toggle_favorite(&bad, Some(&user), FavoriteLabels::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.location_count().unwrap(), 0);
}

#[tokio::test]
async fn test_favorites_listed_newest_first() {
    let (_store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());

    for (i, name) in ["first", "second", "third"].iter().enumerate() {
        let location = ResolvedLocation::from_coordinates(10.0 + i as f64, 20.0).unwrap();
        recorder
            .toggle_favorite(
                &location,
                Some(&user),
                FavoriteLabels {
                    name: Some(name.to_string()),
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    let names: Vec<String> = recorder
        .list_favorites(Some(&user))
        .await
        .unwrap()
        .into_iter()
        .filter_map(|f| f.favorite.name)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_remove_favorite_checks_owner() {
    let (store, recorder) = setup(100);
    let owner = CurrentUser::new(Uuid::new_v4());
    let stranger = CurrentUser::new(Uuid::new_v4());
    let toggle = recorder
        .toggle_favorite(&eiffel(), Some(&owner), FavoriteLabels::default())
        .await
        .unwrap();

    let err = recorder
        .remove_favorite(toggle.favorite_id, Some(&stranger))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FavoriteNotFound(id) if id == toggle.favorite_id));
    assert!(store.get_favorite(toggle.favorite_id).await.unwrap().is_some());

    recorder
        .remove_favorite(toggle.favorite_id, Some(&owner))
        .await
        .unwrap();
    assert!(store.get_favorite(toggle.favorite_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lists_require_sign_in() {
    let (_store, recorder) = setup(100);

    assert!(matches!(
        recorder.list_favorites(None).await,
        Err(Error::AuthRequired(_))
    ));
    assert!(matches!(
        recorder.list_history(None, None).await,
        Err(Error::AuthRequired(_))
    ));
    assert!(!recorder.is_favorited("Eiffel Tower", None).await.unwrap());
}

#[tokio::test]
async fn test_history_listing_capped_and_ordered() {
    let (store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());

    for i in 0..30 {
        assert!(recorder.record_search(&user, None, &format!("query {i}")).await);
    }

    let history = recorder.list_history(Some(&user), Some(50)).await.unwrap();
    assert_eq!(history.len(), 20);
    for pair in history.windows(2) {
        assert!(pair[0].entry.searched_at >= pair[1].entry.searched_at);
    }
    assert_eq!(history[0].entry.search_query, "query 29");

    let short = recorder.list_history(Some(&user), Some(5)).await.unwrap();
    assert_eq!(short.len(), 5);
    assert_eq!(store.history_count().unwrap(), 30);
}

#[tokio::test]
async fn test_history_retention_prunes_oldest() {
    let (store, recorder) = setup(3);
    let user = CurrentUser::new(Uuid::new_v4());

    for i in 0..5 {
        recorder.record_search(&user, None, &format!("q{i}")).await;
    }

    let remaining = store.list_history(user.id, 20).await.unwrap();
    let queries: Vec<&str> = remaining
        .iter()
        .map(|h| h.entry.search_query.as_str())
        .collect();
    assert_eq!(queries, vec!["q4", "q3", "q2"]);
}

#[tokio::test]
async fn test_history_entry_without_location_is_not_selectable() {
    let (store, recorder) = setup(100);
    let user = CurrentUser::new(Uuid::new_v4());
    store
        .insert_history(NewSearchHistoryEntry {
            user_id: user.id,
            location_detail_id: None,
            search_query: "nowhere".to_string(),
        })
        .await
        .unwrap();

    let history = recorder.list_history(Some(&user), None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].to_resolved().is_none());
}
