#![allow(clippy::disallowed_methods)]

mod common;

use boxtag_core::{CoreSize, HoleFilter, Length, NewRecord};
use std::error::Error;

use db::DbError;

fn new_record(hole_id: &str, top: u32, bottom: u32, box_id: u32) -> NewRecord {
    let top = Length::from_hundredths(top);
    let bottom = Length::from_hundredths(bottom);
    NewRecord {
        hole_id: hole_id.to_string(),
        top_length: top,
        bottom_length: bottom,
        total_length: bottom.checked_sub(top).unwrap(),
        box_id,
        core_size: CoreSize::HalfCore,
    }
}

#[tokio::test]
async fn test_insert_get_and_exists() -> Result<(), Box<dyn Error>> {
    let repo = common::setup_repo().await?;

    let record = new_record("H1", 0, 150, 3);
    let created = repo.insert(&record).await?;
    assert_eq!(created.hole_id, "H1");
    assert_eq!(created.total_length.to_string(), "1.50");

    let loaded = repo.get(created.id).await?;
    assert_eq!(loaded, created);

    assert!(repo.exists(&record.key()).await?);

    let mut other_box = record.key();
    other_box.box_id = 4;
    assert!(!repo.exists(&other_box).await?);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_tuple_is_rejected() -> Result<(), Box<dyn Error>> {
    let repo = common::setup_repo().await?;

    let record = new_record("H1", 0, 150, 3);
    repo.insert(&record).await?;

    let duplicate = repo.insert(&record).await;
    assert!(matches!(duplicate, Err(DbError::Duplicate(_))));

    // same interval in another box is a different assignment
    repo.insert(&new_record("H1", 0, 150, 4)).await?;
    assert_eq!(repo.list(&HoleFilter::All).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_list_by_hole_and_hole_ids() -> Result<(), Box<dyn Error>> {
    let repo = common::setup_repo().await?;

    repo.insert(&new_record("H2", 0, 100, 1)).await?;
    repo.insert(&new_record("H1", 0, 120, 1)).await?;
    repo.insert(&new_record("H2", 100, 220, 2)).await?;

    let all = repo.list(&HoleFilter::All).await?;
    assert_eq!(all.len(), 3);

    let h2 = repo.list(&HoleFilter::Hole("H2".into())).await?;
    assert_eq!(h2.len(), 2);
    assert!(h2.iter().all(|r| r.hole_id == "H2"));
    assert_eq!(h2[0].top_length, Length::ZERO);
    assert_eq!(h2[1].top_length.to_string(), "1.00");

    let missing = repo.list(&HoleFilter::Hole("H9".into())).await?;
    assert!(missing.is_empty());

    assert_eq!(repo.hole_ids().await?, vec!["H1".to_string(), "H2".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_delete_by_hole_and_top() -> Result<(), Box<dyn Error>> {
    let repo = common::setup_repo().await?;

    let first = repo.insert(&new_record("H3", 0, 100, 1)).await?;
    repo.insert(&new_record("H3", 100, 200, 2)).await?;

    let removed = repo.delete("H3", Length::ZERO).await?;
    assert_eq!(removed, 1);
    assert!(matches!(repo.get(first.id).await, Err(DbError::NotFound(_))));

    let removed_again = repo.delete("H3", Length::ZERO).await?;
    assert_eq!(removed_again, 0);

    let remaining = repo.list(&HoleFilter::Hole("H3".into())).await?;
    assert_eq!(remaining.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_delete_by_id() -> Result<(), Box<dyn Error>> {
    let repo = common::setup_repo().await?;

    let created = repo.insert(&new_record("H4", 0, 100, 1)).await?;
    repo.delete_by_id(created.id).await?;

    assert!(!repo.exists(&created.key()).await?);
    assert!(matches!(
        repo.delete_by_id(created.id).await,
        Err(DbError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_each_open_is_its_own_store() -> Result<(), Box<dyn Error>> {
    let config = db::DbConfig::memory().with_database("isolated");
    let first = db::open(&config).await?;
    let second = db::open(&config).await?;

    let created = first.insert(&new_record("H5", 0, 100, 1)).await?;
    assert!(first.exists(&created.key()).await?);
    assert!(!second.exists(&created.key()).await?);
    second.insert(&new_record("H5", 0, 100, 1)).await?;

    Ok(())
}
