use lesson_media::catalog::models::{ContentCategory, NewPresentation};
use lesson_media::catalog::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn new_item(category: ContentCategory, url: &str, external_ref: Option<&str>) -> NewPresentation {
    NewPresentation {
        category,
        file_url: url.to_string(),
        external_ref: external_ref.map(|s| s.to_string()),
        title: None,
        description: None,
        created_by: 1,
    }
}

fn image_item(n: u32) -> NewPresentation {
    new_item(
        ContentCategory::Image,
        &format!("/uploads/img-{n}.jpg"),
        Some(&format!("img-{n}.jpg")),
    )
}

/// Assert the lesson's display orders are exactly {1..N} in listing order.
fn assert_gap_free(db: &Database, lesson_id: &str) {
    let items = db.list_presentations(lesson_id).unwrap();
    let orders: Vec<u32> = items.iter().map(|p| p.display_order).collect();
    let expected: Vec<u32> = (1..=items.len() as u32).collect();
    assert_eq!(orders, expected, "display orders must be gap-free");
}

#[test]
fn test_create_assigns_sequential_orders() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();

    let created = db
        .create_presentations(&lesson.id, vec![image_item(1), image_item(2), image_item(3)])
        .unwrap()
        .unwrap();

    assert_eq!(
        created.iter().map(|p| p.display_order).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_gap_free(&db, &lesson.id);
}

#[test]
fn test_orders_continue_across_batches() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();

    db.create_presentations(&lesson.id, vec![image_item(1), image_item(2)])
        .unwrap()
        .unwrap();
    let second = db
        .create_presentations(&lesson.id, vec![image_item(3)])
        .unwrap()
        .unwrap();

    assert_eq!(second[0].display_order, 3);
    assert_gap_free(&db, &lesson.id);
}

#[test]
fn test_create_for_missing_lesson_returns_none() {
    let (_dir, db) = test_db();
    let result = db
        .create_presentations("no-such-lesson", vec![image_item(1)])
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_list_is_ordered_by_display_order() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();
    db.create_presentations(
        &lesson.id,
        vec![image_item(1), image_item(2), image_item(3)],
    )
    .unwrap()
    .unwrap();

    let items = db.list_presentations(&lesson.id).unwrap();
    assert_eq!(items.len(), 3);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.display_order, i as u32 + 1);
    }
}

#[test]
fn test_list_unknown_lesson_is_empty() {
    let (_dir, db) = test_db();
    assert!(db.list_presentations("nope").unwrap().is_empty());
}

#[test]
fn test_delete_renumbers_following_siblings() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();
    let created = db
        .create_presentations(
            &lesson.id,
            vec![image_item(1), image_item(2), image_item(3)],
        )
        .unwrap()
        .unwrap();
    let (a, b, c) = (&created[0], &created[1], &created[2]);

    let deleted = db.delete_presentation(&b.id).unwrap().unwrap();
    assert_eq!(deleted.id, b.id);
    assert_eq!(deleted.external_ref, b.external_ref);

    let remaining = db.list_presentations(&lesson.id).unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].id, a.id);
    assert_eq!(remaining[0].display_order, 1);
    assert_eq!(remaining[1].id, c.id);
    assert_eq!(remaining[1].display_order, 2);
}

#[test]
fn test_delete_first_and_last_keep_orders_gap_free() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();
    let created = db
        .create_presentations(
            &lesson.id,
            vec![
                image_item(1),
                image_item(2),
                image_item(3),
                image_item(4),
            ],
        )
        .unwrap()
        .unwrap();

    db.delete_presentation(&created[0].id).unwrap().unwrap();
    assert_gap_free(&db, &lesson.id);

    db.delete_presentation(&created[3].id).unwrap().unwrap();
    assert_gap_free(&db, &lesson.id);
}

#[test]
fn test_delete_nonexistent_leaves_catalog_unchanged() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();
    db.create_presentations(&lesson.id, vec![image_item(1), image_item(2)])
        .unwrap()
        .unwrap();

    assert!(db.delete_presentation("no-such-id").unwrap().is_none());

    let items = db.list_presentations(&lesson.id).unwrap();
    assert_eq!(items.len(), 2);
    assert_gap_free(&db, &lesson.id);
}

#[test]
fn test_link_items_have_no_external_ref() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();

    let created = db
        .create_presentations(
            &lesson.id,
            vec![new_item(ContentCategory::Link, "https://example.com/deck", None)],
        )
        .unwrap()
        .unwrap();

    assert_eq!(created[0].external_ref, None);
    assert_eq!(created[0].file_url, "https://example.com/deck");
    assert!(!created[0].category.owns_blob());
}

#[test]
fn test_lesson_cascade_returns_children() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();
    db.create_presentations(
        &lesson.id,
        vec![image_item(1), image_item(2)],
    )
    .unwrap()
    .unwrap();

    let (deleted, children) = db.delete_lesson(&lesson.id).unwrap().unwrap();
    assert_eq!(deleted.id, lesson.id);
    assert_eq!(children.len(), 2);

    assert!(db.get_lesson(&lesson.id).unwrap().is_none());
    assert!(db.list_presentations(&lesson.id).unwrap().is_empty());
    for child in &children {
        assert!(db.get_presentation(&child.id).unwrap().is_none());
    }
}

#[test]
fn test_delete_missing_lesson_returns_none() {
    let (_dir, db) = test_db();
    assert!(db.delete_lesson("missing").unwrap().is_none());
}

#[test]
fn test_lesson_numbers_are_sequential_per_quarter() {
    let (_dir, db) = test_db();
    let l1 = db.create_lesson("q1", "One", 1).unwrap();
    let l2 = db.create_lesson("q1", "Two", 1).unwrap();
    let other = db.create_lesson("q2", "Other quarter", 1).unwrap();

    assert_eq!(l1.lesson_number, 1);
    assert_eq!(l2.lesson_number, 2);
    assert_eq!(other.lesson_number, 1);

    let listed = db.list_lessons("q1").unwrap();
    assert_eq!(
        listed.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
        vec![l1.id.as_str(), l2.id.as_str()]
    );
}

#[test]
fn test_interleaved_creates_and_deletes_hold_invariant() {
    let (_dir, db) = test_db();
    let lesson = db.create_lesson("q1", "Lesson One", 1).unwrap();

    let first = db
        .create_presentations(&lesson.id, vec![image_item(1), image_item(2), image_item(3)])
        .unwrap()
        .unwrap();
    db.delete_presentation(&first[1].id).unwrap().unwrap();
    db.create_presentations(&lesson.id, vec![image_item(4), image_item(5)])
        .unwrap()
        .unwrap();
    db.delete_presentation(&first[0].id).unwrap().unwrap();

    assert_gap_free(&db, &lesson.id);
    assert_eq!(db.list_presentations(&lesson.id).unwrap().len(), 3);
}
