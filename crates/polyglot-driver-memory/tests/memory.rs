use polyglot_core::driver::operation::{
    Condition, DeleteByKey, GetByKey, Insert, QueryByColumns, UpdateByKey,
};
use polyglot_core::driver::Driver;
use polyglot_core::schema::{app, db, Schema};
use polyglot_core::stmt::{self, Value, ValueRecord};
use polyglot_driver_memory::Memory;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const BOOK: app::ModelId = app::ModelId(0);

struct Fixture {
    schema: Arc<db::Schema>,
    driver: Memory,
    books: db::TableId,
    localized: db::TableId,
}

fn book_schema() -> Schema {
    let mut book = app::Model::new(BOOK, "Book");

    let id = book.push_field(app::Field {
        primary_key: true,
        auto_increment: true,
        ..app::Field::primitive(BOOK.field(0), "id", stmt::Type::I64)
    });
    book.push_field(app::Field::primitive(
        BOOK.field(0),
        "title",
        stmt::Type::String,
    ));
    book.push_field(app::Field::primitive(
        BOOK.field(0),
        "author",
        stmt::Type::String,
    ));
    book.primary_key = Some(app::PrimaryKey { fields: vec![id] });
    book.localize = Some(app::Localize::for_fields(["title"]));

    Schema::builder()
        .build(app::Schema::from_models([book]).unwrap())
        .unwrap()
}

async fn setup() -> Fixture {
    let schema = book_schema();
    let mut driver = Memory::new();
    driver.register_schema(&schema.db).await.unwrap();

    Fixture {
        books: schema.db.table_by_name("books").unwrap().id,
        localized: schema.db.table_by_name("books_localized").unwrap().id,
        schema: schema.db.clone(),
        driver,
    }
}

fn key(id: i64) -> ValueRecord {
    ValueRecord::from_vec(vec![Value::from(id)])
}

impl Fixture {
    fn column(&self, table: db::TableId, name: &str) -> db::ColumnId {
        self.schema
            .table(table)
            .column_by_name(name)
            .unwrap_or_else(|| panic!("no column `{name}`"))
            .id
    }

    fn columns(&self, table: db::TableId, names: &[&str]) -> Vec<db::ColumnId> {
        names.iter().map(|name| self.column(table, name)).collect()
    }

    async fn insert(
        &self,
        table: db::TableId,
        columns: &[&str],
        values: Vec<Value>,
    ) -> polyglot_core::Result<ValueRecord> {
        let returning = self.schema.table(table).primary_key.columns.clone();
        let op = Insert {
            table,
            columns: self.columns(table, columns),
            values: ValueRecord::from_vec(values),
            returning,
        };

        let mut rows = self.driver.exec(&self.schema, op.into()).await?.into_values()?;
        assert_eq!(rows.len(), 1);
        Ok(rows.remove(0))
    }

    async fn insert_book(&self, title: &str) -> polyglot_core::Result<ValueRecord> {
        self.insert(
            self.books,
            &["title", "author", "default_locale"],
            vec![title.into(), "Anonymous".into(), "en".into()],
        )
        .await
    }

    async fn insert_translation(
        &self,
        book: i64,
        locale: &str,
        title: &str,
    ) -> polyglot_core::Result<ValueRecord> {
        self.insert(
            self.localized,
            &["translated_id", "locale_id", "translated_type", "title"],
            vec![book.into(), locale.into(), "book_localized".into(), title.into()],
        )
        .await
    }

    async fn query(
        &self,
        table: db::TableId,
        select: &[&str],
        filter: Vec<Condition>,
    ) -> Vec<ValueRecord> {
        let op = QueryByColumns {
            table,
            select: self.columns(table, select),
            filter,
        };

        self.driver
            .exec(&self.schema, op.into())
            .await
            .unwrap()
            .into_values()
            .unwrap()
    }

    async fn count_rows(&self, table: db::TableId) -> usize {
        let key = self.schema.table(table).primary_key.columns[0];
        let name = self.schema.column(key).name.clone();
        self.query(table, &[name.as_str()], vec![]).await.len()
    }
}

#[tokio::test]
async fn auto_increment_assigns_ids() {
    let fx = setup().await;

    assert_eq!(fx.insert_book("Dune").await.unwrap(), key(1));
    assert_eq!(fx.insert_book("Emma").await.unwrap(), key(2));

    let explicit = fx
        .insert(
            fx.books,
            &["id", "title", "author", "default_locale"],
            vec![10_i64.into(), "Ulysses".into(), "Joyce".into(), "en".into()],
        )
        .await
        .unwrap();
    assert_eq!(explicit, key(10));

    assert_eq!(fx.insert_book("Beloved").await.unwrap(), key(11));
}

#[tokio::test]
async fn rejected_insert_does_not_consume_id() {
    let fx = setup().await;

    let err = fx
        .insert(fx.books, &["default_locale"], vec!["en".into()])
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    let err = fx
        .insert(
            fx.books,
            &["id", "title", "default_locale"],
            vec![7_i64.into(), "Dune".into(), "en".into()],
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("books.author"), "{err}");

    assert_eq!(fx.insert_book("Dune").await.unwrap(), key(1));
    assert_eq!(fx.insert_book("Emma").await.unwrap(), key(2));
}

#[tokio::test]
async fn duplicate_key_is_rejected() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();

    fx.insert_translation(1, "fr", "Dune").await.unwrap();
    let err = fx.insert_translation(1, "fr", "Dune, encore").await.unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    // Another locale of the same record is a different key
    fx.insert_translation(1, "de", "Der Wüstenplanet").await.unwrap();
    assert_eq!(fx.count_rows(fx.localized).await, 2);
}

#[tokio::test]
async fn missing_required_column() {
    let fx = setup().await;

    let err = fx
        .insert(fx.books, &["title", "default_locale"], vec!["Dune".into(), "en".into()])
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");
    assert!(err.to_string().contains("books.author"), "{err}");

    // Localized values may be left unset
    assert_eq!(fx.insert_book("Dune").await.unwrap(), key(1));
    fx.insert(
        fx.localized,
        &["translated_id", "locale_id", "translated_type"],
        vec![1_i64.into(), "fr".into(), "book_localized".into()],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn discriminator_width_is_enforced() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();

    let err = fx
        .insert(
            fx.localized,
            &["translated_id", "locale_id", "translated_type"],
            vec![1_i64.into(), "fr".into(), "x".repeat(41).into()],
        )
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");
}

#[tokio::test]
async fn values_are_cast_to_column_type() {
    let fx = setup().await;

    let err = fx
        .insert(
            fx.books,
            &["title", "author", "default_locale"],
            vec![1_i64.into(), "Anonymous".into(), "en".into()],
        )
        .await
        .unwrap_err();
    assert!(err.root().is_type_conversion(), "{err}");
    assert!(err.to_string().contains("books.title"), "{err}");
}

#[tokio::test]
async fn foreign_key_must_exist() {
    let fx = setup().await;

    let err = fx.insert_translation(42, "fr", "Dune").await.unwrap_err();
    assert!(err.is_condition_failed(), "{err}");
    assert_eq!(fx.count_rows(fx.localized).await, 0);
}

#[tokio::test]
async fn get_by_key_skips_missing_rows() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();
    fx.insert_book("Emma").await.unwrap();

    let op = GetByKey {
        table: fx.books,
        select: fx.columns(fx.books, &["title", "id"]),
        keys: vec![key(2), key(7), key(1)],
    };

    let rows = fx
        .driver
        .exec(&fx.schema, op.into())
        .await
        .unwrap()
        .into_values()
        .unwrap();

    assert_eq!(
        rows,
        [
            ValueRecord::from_vec(vec!["Emma".into(), 2_i64.into()]),
            ValueRecord::from_vec(vec!["Dune".into(), 1_i64.into()]),
        ]
    );
}

#[tokio::test]
async fn query_by_columns_filters_in_storage_order() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();
    fx.insert_book("Emma").await.unwrap();

    fx.insert_translation(1, "fr", "Dune").await.unwrap();
    fx.insert_translation(2, "fr", "Emma").await.unwrap();
    fx.insert_translation(1, "ar", "كثيب").await.unwrap();
    fx.insert_translation(1, "de", "Der Wüstenplanet").await.unwrap();

    let translated_id = fx.column(fx.localized, "translated_id");
    let locale_id = fx.column(fx.localized, "locale_id");

    let rows = fx
        .query(
            fx.localized,
            &["locale_id"],
            vec![Condition::Eq(translated_id, 1_i64.into())],
        )
        .await;
    assert_eq!(
        rows,
        [
            ValueRecord::from_vec(vec!["fr".into()]),
            ValueRecord::from_vec(vec!["ar".into()]),
            ValueRecord::from_vec(vec!["de".into()]),
        ]
    );

    let rows = fx
        .query(
            fx.localized,
            &["title"],
            vec![
                Condition::Eq(translated_id, 1_i64.into()),
                Condition::In(locale_id, vec!["de".into(), "fr".into(), "es".into()]),
            ],
        )
        .await;
    assert_eq!(
        rows,
        [
            ValueRecord::from_vec(vec!["Dune".into()]),
            ValueRecord::from_vec(vec!["Der Wüstenplanet".into()]),
        ]
    );
}

#[tokio::test]
async fn update_by_key() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();

    let title = fx.column(fx.books, "title");
    let op = UpdateByKey {
        table: fx.books,
        keys: vec![key(1), key(5)],
        assignments: vec![(title, "Dune Messiah".into())],
    };
    let count = fx
        .driver
        .exec(&fx.schema, op.into())
        .await
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(count, 1);

    let rows = fx.query(fx.books, &["title"], vec![]).await;
    assert_eq!(rows, [ValueRecord::from_vec(vec!["Dune Messiah".into()])]);

    // Key columns are immutable
    let op = UpdateByKey {
        table: fx.books,
        keys: vec![key(1)],
        assignments: vec![(fx.column(fx.books, "id"), 2_i64.into())],
    };
    let err = fx.driver.exec(&fx.schema, op.into()).await.unwrap_err();
    assert!(err.is_invalid_statement(), "{err}");

    // Required columns stay required
    let op = UpdateByKey {
        table: fx.books,
        keys: vec![key(1)],
        assignments: vec![(title, Value::Null)],
    };
    let err = fx.driver.exec(&fx.schema, op.into()).await.unwrap_err();
    assert!(err.is_condition_failed(), "{err}");
}

#[tokio::test]
async fn delete_cascades_to_translations() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();
    fx.insert_book("Emma").await.unwrap();

    fx.insert_translation(1, "fr", "Dune").await.unwrap();
    fx.insert_translation(1, "ar", "كثيب").await.unwrap();
    fx.insert_translation(2, "fr", "Emma").await.unwrap();

    let op = DeleteByKey {
        table: fx.books,
        keys: vec![key(1)],
    };
    let count = fx
        .driver
        .exec(&fx.schema, op.into())
        .await
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(count, 1);

    let rows = fx.query(fx.localized, &["translated_id", "locale_id"], vec![]).await;
    assert_eq!(
        rows,
        [ValueRecord::from_vec(vec![2_i64.into(), "fr".into()])]
    );

    // Deleting a missing row is not an error
    let op = DeleteByKey {
        table: fx.books,
        keys: vec![key(1)],
    };
    let count = fx
        .driver
        .exec(&fx.schema, op.into())
        .await
        .unwrap()
        .into_count()
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn reset_db_clears_rows() {
    let fx = setup().await;
    fx.insert_book("Dune").await.unwrap();
    fx.insert_translation(1, "fr", "Dune").await.unwrap();

    fx.driver.reset_db(&fx.schema).await.unwrap();

    assert_eq!(fx.count_rows(fx.books).await, 0);
    assert_eq!(fx.count_rows(fx.localized).await, 0);
    assert_eq!(fx.insert_book("Emma").await.unwrap(), key(1));
}

#[tokio::test]
async fn schema_must_be_registered() {
    let schema = book_schema();
    let driver = Memory::new();

    let op = GetByKey {
        table: schema.table_id_for(BOOK),
        select: vec![],
        keys: vec![key(1)],
    };

    let err = driver.exec(&schema.db, op.into()).await.unwrap_err();
    assert!(err.is_invalid_statement(), "{err}");
}
