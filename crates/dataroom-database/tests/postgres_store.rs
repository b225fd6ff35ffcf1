//! Tree store tests against a live PostgreSQL database.
//!
//! Skipped unless `DATABASE_URL` points at a disposable database.

use std::time::Duration;

use sqlx::PgPool;

use dataroom_core::error::ErrorKind;
use dataroom_core::types::id::{DataroomFolderId, DataroomId, DocumentId, TeamId};
use dataroom_database::migration::run_migrations;
use dataroom_database::store::{FolderRelocation, IndexWrite, IsolationLevel, PgTreeStore, TreeStore};
use dataroom_entity::dataroom::CreateDataroom;
use dataroom_entity::folder::NewDataroomFolder;
use dataroom_entity::placement::NewDataroomDocument;

async fn setup() -> Option<(PgPool, TeamId)> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let team = TeamId::new();
    sqlx::query("INSERT INTO teams (id, name) VALUES ($1, 'Test team')")
        .bind(team)
        .execute(&pool)
        .await
        .expect("Failed to seed team");
    Some((pool, team))
}

async fn seed_document(pool: &PgPool, team: TeamId, name: &str) -> DocumentId {
    let id = DocumentId::new();
    sqlx::query("INSERT INTO documents (id, team_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(team)
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to seed document");
    id
}

fn new_folder(
    dataroom_id: DataroomId,
    parent: Option<DataroomFolderId>,
    name: &str,
    path: &str,
) -> NewDataroomFolder {
    NewDataroomFolder {
        id: DataroomFolderId::new(),
        dataroom_id,
        parent_id: parent,
        name: name.to_string(),
        path: path.to_string(),
    }
}

#[tokio::test]
async fn test_new_dataroom_is_visible_only_after_commit() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool.clone());
    let document = seed_document(&pool, team, "Budget.xlsx").await;

    let data = CreateDataroom::new(team, "Deal room");
    let mut tx = store.begin_new_dataroom(&data).await.unwrap();
    let finance = new_folder(data.id, None, "Finance", "/finance");
    let budgets = new_folder(data.id, Some(finance.id), "Budgets", "/finance/budgets");
    tx.insert_folders(&[finance.clone(), budgets]).await.unwrap();
    tx.insert_placements(&[NewDataroomDocument {
        id: Default::default(),
        dataroom_id: data.id,
        document_id: document,
        folder_id: Some(finance.id),
    }])
    .await
    .unwrap();

    assert!(store.find_dataroom(data.id).await.unwrap().is_none());
    tx.commit().await.unwrap();
    assert!(store.find_dataroom(data.id).await.unwrap().is_some());

    let mut tx = store.begin(data.id, IsolationLevel::RepeatableRead).await.unwrap();
    let folders = tx.folders().await.unwrap();
    let placements = tx.placements().await.unwrap();
    assert_eq!(folders.len(), 2);
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].document_name, "Budget.xlsx");
    assert_eq!(placements[0].folder_id, Some(finance.id));
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool);

    let data = CreateDataroom::new(team, "Abandoned");
    let mut tx = store.begin_new_dataroom(&data).await.unwrap();
    tx.insert_folders(&[new_folder(data.id, None, "Legal", "/legal")])
        .await
        .unwrap();
    drop(tx);

    assert!(store.find_dataroom(data.id).await.unwrap().is_none());
    let err = store
        .begin(data.id, IsolationLevel::ReadCommitted)
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_relocation_swaps_paths_inside_one_transaction() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool);

    let data = CreateDataroom::new(team, "Swap");
    let a = new_folder(data.id, None, "A", "/a");
    let b = new_folder(data.id, None, "B", "/b");
    let mut tx = store.begin_new_dataroom(&data).await.unwrap();
    tx.insert_folders(&[a.clone(), b.clone()]).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin(data.id, IsolationLevel::ReadCommitted).await.unwrap();
    let swapped = tx
        .relocate_folders(&[
            FolderRelocation {
                id: a.id,
                parent_id: None,
                path: "/b".to_string(),
                moved: false,
            },
            FolderRelocation {
                id: b.id,
                parent_id: None,
                path: "/a".to_string(),
                moved: false,
            },
        ])
        .await
        .unwrap();
    assert_eq!(swapped, 2);
    tx.commit().await.unwrap();

    let mut tx = store.begin(data.id, IsolationLevel::ReadCommitted).await.unwrap();
    let folders = tx.folders().await.unwrap();
    let path_of = |id| folders.iter().find(|f| f.id == id).map(|f| f.path.clone());
    assert_eq!(path_of(a.id).as_deref(), Some("/b"));
    assert_eq!(path_of(b.id).as_deref(), Some("/a"));
}

#[tokio::test]
async fn test_duplicate_path_is_a_conflict() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool);

    let data = CreateDataroom::new(team, "Duplicates");
    let mut tx = store.begin_new_dataroom(&data).await.unwrap();
    let err = tx
        .insert_folders(&[
            new_folder(data.id, None, "Legal", "/legal"),
            new_folder(data.id, None, "legal", "/legal"),
        ])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_index_writes_are_scoped_to_the_dataroom() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool);

    let first = CreateDataroom::new(team, "First");
    let folder = new_folder(first.id, None, "Finance", "/finance");
    let mut tx = store.begin_new_dataroom(&first).await.unwrap();
    tx.insert_folders(&[folder.clone()]).await.unwrap();
    tx.commit().await.unwrap();

    let second = CreateDataroom::new(team, "Second");
    store.begin_new_dataroom(&second).await.unwrap().commit().await.unwrap();

    let write = IndexWrite {
        id: folder.id,
        hierarchical_index: Some("1".to_string()),
    };

    let mut tx = store.begin(second.id, IsolationLevel::RepeatableRead).await.unwrap();
    assert_eq!(tx.write_folder_indexes(&[write.clone()]).await.unwrap(), 0);
    tx.commit().await.unwrap();

    let mut tx = store.begin(first.id, IsolationLevel::RepeatableRead).await.unwrap();
    assert_eq!(tx.write_folder_indexes(&[write]).await.unwrap(), 1);
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn test_snapshot_taken_while_waiting_for_the_lock_fails_to_commit() {
    let Some((pool, team)) = setup().await else {
        return;
    };
    let store = PgTreeStore::new(pool);

    let data = CreateDataroom::new(team, "Race");
    store.begin_new_dataroom(&data).await.unwrap().commit().await.unwrap();

    let mut first = store.begin(data.id, IsolationLevel::RepeatableRead).await.unwrap();
    let waiting = {
        let store = store.clone();
        let dataroom_id = data.id;
        tokio::spawn(async move {
            let mut tx = store.begin(dataroom_id, IsolationLevel::RepeatableRead).await?;
            let seen = tx.folders().await?.len();
            tx.commit().await.map(|()| seen)
        })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    first
        .insert_folders(&[new_folder(data.id, None, "Legal", "/legal")])
        .await
        .unwrap();
    first.commit().await.unwrap();

    let err = waiting.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::TransactionConflict);
    assert!(err.is_retryable());
}
