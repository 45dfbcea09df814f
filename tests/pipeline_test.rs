mod helpers;

use garb::embedding::cache;
use garb::wardrobe::store::{insert_item, load_items, NewItem};
use garb::wardrobe::Category;
use helpers::{test_db, test_engine, BagOfWordsProvider};

const MODEL: &str = "all-MiniLM-L6-v2";

fn add(conn: &rusqlite::Connection, kind: &str, color: &str, category: Category) -> i64 {
    insert_item(
        conn,
        &NewItem {
            kind: kind.into(),
            color: Some(color.into()),
            category,
            description: None,
        },
    )
    .unwrap()
}

fn seed_wardrobe(conn: &rusqlite::Connection) {
    add(conn, "white t-shirt", "white", Category::Top);
    add(conn, "dress shirt", "light blue", Category::Top);
    add(conn, "swim shorts", "navy", Category::Bottom);
    add(conn, "suit pants", "charcoal", Category::Bottom);
    add(conn, "sandals", "brown", Category::Footwear);
    add(conn, "oxford dress shoes", "black", Category::Footwear);
}

#[test]
fn stored_wardrobe_round_trips_through_the_full_pipeline() {
    let mut conn = test_db();
    seed_wardrobe(&conn);

    let mut items = load_items(&conn, MODEL).unwrap();
    assert!(items.iter().all(|i| i.embedding.is_none()), "cache starts cold");

    cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, MODEL, &mut items).unwrap();
    assert!(items.iter().all(|i| i.embedding.is_some()));

    let engine = test_engine();
    let rec = engine.recommend(&items, "going to swim", None).unwrap();
    assert!(!rec.outfits.is_empty());

    // Second load hits the warm cache; no provider needed
    let warm = load_items(&conn, MODEL).unwrap();
    assert!(warm.iter().all(|i| i.embedding.is_some()));

    let rec2 = engine.recommend(&warm, "going to swim", None).unwrap();
    let ids1: Vec<i64> = rec.outfits[0].items.iter().map(|i| i.id).collect();
    let ids2: Vec<i64> = rec2.outfits[0].items.iter().map(|i| i.id).collect();
    assert_eq!(ids1, ids2, "cold and warm cache agree");
}

#[test]
fn on_disk_database_persists_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wardrobe.db");

    {
        let mut conn = garb::db::open_database(&path).unwrap();
        seed_wardrobe(&conn);
        let mut items = load_items(&conn, MODEL).unwrap();
        cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, MODEL, &mut items).unwrap();
    }

    let conn = garb::db::open_database(&path).unwrap();
    let items = load_items(&conn, MODEL).unwrap();
    assert_eq!(items.len(), 6);
    assert!(
        items.iter().all(|i| i.embedding.is_some()),
        "cached vectors survive a reopen"
    );
}

#[test]
fn deleting_an_item_cascades_its_cached_vector() {
    let mut conn = test_db();
    let id = add(&conn, "sandals", "brown", Category::Footwear);

    let mut items = load_items(&conn, MODEL).unwrap();
    cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, MODEL, &mut items).unwrap();
    assert!(cache::get_embedding(&conn, id, MODEL).unwrap().is_some());

    garb::wardrobe::store::delete_item(&conn, id).unwrap();
    assert!(cache::get_embedding(&conn, id, MODEL).unwrap().is_none());
}

#[test]
fn model_change_invalidates_and_recovers() {
    let mut conn = test_db();
    seed_wardrobe(&conn);

    let mut items = load_items(&conn, "old-model").unwrap();
    cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, "old-model", &mut items).unwrap();

    // Under the new model every cached vector is a miss
    let items = load_items(&conn, MODEL).unwrap();
    assert!(items.iter().all(|i| i.embedding.is_none()));

    let removed = cache::invalidate_other_models(&conn, MODEL).unwrap();
    assert_eq!(removed, 6);

    let mut items = load_items(&conn, MODEL).unwrap();
    cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, MODEL, &mut items).unwrap();
    let engine = test_engine();
    assert!(!engine
        .recommend(&items, "office meeting", None)
        .unwrap()
        .outfits
        .is_empty());
}

#[tokio::test]
async fn background_worker_refreshes_enqueued_items() {
    use garb::embedding::worker::{spawn_worker, WorkerOptions};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    let conn = test_db();
    seed_wardrobe(&conn);
    let ids: Vec<i64> = (1..=6).collect();
    let db = Arc::new(Mutex::new(conn));

    let handle = spawn_worker(
        db.clone(),
        Arc::new(BagOfWordsProvider),
        MODEL.into(),
        WorkerOptions {
            queue_capacity: 16,
            batch_size: 4,
            batch_timeout: Duration::from_millis(20),
        },
    );
    for &id in &ids {
        assert!(handle.enqueue(id));
    }
    drop(handle); // close the queue so the worker drains and stops

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let done = {
            let conn = db.lock().unwrap();
            ids.iter()
                .all(|&id| cache::get_embedding(&conn, id, MODEL).unwrap().is_some())
        };
        if done {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "worker did not refresh all items in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn stats_reflect_cache_coverage() {
    let mut conn = test_db();
    seed_wardrobe(&conn);

    let mut items = load_items(&conn, MODEL).unwrap();
    cache::ensure_embeddings(&mut conn, &BagOfWordsProvider, MODEL, &mut items).unwrap();

    let stats = garb::wardrobe::stats::collect_stats(&conn, MODEL).unwrap();
    assert_eq!(stats.total_items, 6);
    assert_eq!(stats.embedded_items, 6);
    assert_eq!(stats.stale_embeddings, 0);
    assert_eq!(stats.by_category["top"], 2);
    assert_eq!(stats.by_category["footwear"], 2);
}
