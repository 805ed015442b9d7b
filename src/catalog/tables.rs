use redb::TableDefinition;

/// Lesson records: uuid -> Lesson (msgpack)
pub const LESSONS: TableDefinition<&str, &[u8]> = TableDefinition::new("lessons");

/// Quarter index: quarter_id -> msgpack Vec of lesson UUIDs
pub const QUARTER_LESSONS: TableDefinition<&str, &[u8]> = TableDefinition::new("quarter_lessons");

/// Presentation records: uuid -> Presentation (msgpack)
pub const PRESENTATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("presentations");

/// Lesson index: lesson_id -> msgpack Vec of presentation UUIDs
pub const LESSON_PRESENTATIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("lesson_presentations");
