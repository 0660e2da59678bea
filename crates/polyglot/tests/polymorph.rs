use polyglot::schema::{Field, Inheritance, Localize, Model, StorageType, Type};
use polyglot::{Db, Entity, Translation, Value};
use pretty_assertions::assert_eq;

fn media() -> Model {
    Model::new("Media")
        .field(Field::primitive("id", Type::I64).primary_key().auto_increment())
        .field(Field::primitive("title", Type::String))
        .field(Field::primitive("year", Type::I32).nullable())
        .localized(Localize::for_fields(["title"]))
}

fn movie() -> Model {
    Model::new("Movie")
        .inherits("Media", Inheritance::Multi)
        .field(Field::primitive("resume", Type::String))
        .field(Field::primitive("director", Type::String).nullable())
        .localized(Localize::for_fields(["resume"]).default_locale("fr"))
}

fn documentary() -> Model {
    Model::new("Documentary")
        .inherits("Movie", Inheritance::Multi)
        .field(Field::primitive("subject", Type::String).nullable())
}

async fn setup() -> Db {
    Db::builder()
        .register(media())
        .register(movie())
        .register(documentary())
        .in_memory()
        .await
        .unwrap()
}

async fn insert_movie(db: &Db) -> Entity {
    db.insert(
        "Movie",
        [
            ("title", Value::from("Le Fabuleux Destin d'Amélie Poulain")),
            ("year", Value::from(2001)),
            ("resume", Value::from("Une serveuse timide décide d'aider les autres")),
        ],
    )
    .await
    .unwrap()
}

fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn field_names(entity: &Entity) -> Vec<&str> {
    entity.fields().map(|(name, _)| name).collect()
}

#[tokio::test]
async fn child_fields_are_merged_with_parent() {
    let db = setup().await;
    let movie = insert_movie(&db).await;

    assert_eq!(movie.model_name(), "Movie");
    assert_eq!(
        field_names(&movie),
        ["id", "title", "year", "row_type", "default_locale", "resume", "director"]
    );
    assert_eq!(movie.get_field("row_type"), Some(&Value::from("movie")));
    assert_eq!(movie.get_field("year"), Some(&Value::I32(2001)));
    assert_eq!(movie.get_field("director"), Some(&Value::Null));
}

#[tokio::test]
async fn loading_through_parent_returns_concrete_model() {
    let db = setup().await;
    let movie = insert_movie(&db).await;
    let plain = db
        .insert("Media", [("title", "Hamlet")])
        .await
        .unwrap();

    let loaded = db.get("Media", movie.id().clone()).await.unwrap();
    assert_eq!(loaded, movie);

    let loaded = db.get("Media", plain.id().clone()).await.unwrap();
    assert_eq!(loaded.model_name(), "Media");
    assert_eq!(loaded.get_field("resume"), None);

    // Not a movie
    assert!(db.find("Movie", plain.id().clone()).await.unwrap().is_none());
    assert!(db
        .find("Documentary", movie.id().clone())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn nearest_localization_sets_default_locale() {
    let db = setup().await;

    let plain = db.insert("Media", [("title", "Hamlet")]).await.unwrap();
    assert_eq!(plain.default_locale(), Some("en"));

    let movie = insert_movie(&db).await;
    assert_eq!(movie.default_locale(), Some("fr"));

    // Documentary declares no localization of its own
    let documentary = db
        .insert(
            "Documentary",
            [("title", "Microcosmos"), ("resume", "Le peuple de l'herbe")],
        )
        .await
        .unwrap();
    assert_eq!(documentary.default_locale(), Some("fr"));
}

#[tokio::test]
async fn translation_spans_every_level() {
    let db = setup().await;
    let movie = insert_movie(&db).await;

    let en = movie
        .add_locale(
            &db,
            "en",
            [
                ("title", "Amélie"),
                ("resume", "A shy waitress decides to help those around her"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(en.model_name(), "MovieLocalized");
    assert_eq!(text(en.get_field("title")), Some("Amélie"));
    assert_eq!(
        text(en.get_field("resume")),
        Some("A shy waitress decides to help those around her")
    );
    assert_eq!(en.get_field("year"), Some(&Value::I32(2001)));
    assert_eq!(en.get_field("translated_type"), Some(&Value::from("movie_localized")));

    let Some(Translation::Localized(loaded)) = movie.get_localized(&db, "en").await.unwrap()
    else {
        panic!("expected a stored translation");
    };
    assert_eq!(loaded, en);

    let translation = movie.get_localized(&db, "fr").await.unwrap().unwrap();
    assert!(translation.is_default());
}

#[tokio::test]
async fn localizable_fields_come_from_the_whole_chain() {
    let db = setup().await;
    let movie = insert_movie(&db).await;

    let err = movie
        .add_locale(&db, "en", [("director", "Jean-Pierre Jeunet")])
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");

    let plain = db.insert("Media", [("title", "Hamlet")]).await.unwrap();
    let err = plain
        .add_locale(&db, "fr", [("resume", "Un prince danois")])
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");

    plain
        .add_locale(&db, "fr", [("title", "Hamlet, prince de Danemark")])
        .await
        .unwrap();
}

#[tokio::test]
async fn edit_translation_across_tables() {
    let db = setup().await;
    let mut movie = insert_movie(&db).await;

    movie
        .add_locale(&db, "en", [("title", "Amelie"), ("resume", "A waitress")])
        .await
        .unwrap();

    let edited = movie
        .edit_locale(
            &db,
            "en",
            [("title", "Amélie"), ("resume", "A shy waitress")],
        )
        .await
        .unwrap()
        .and_then(Translation::into_localized)
        .unwrap();
    assert_eq!(text(edited.get_field("title")), Some("Amélie"));
    assert_eq!(text(edited.get_field("resume")), Some("A shy waitress"));

    // Only the resume changes
    movie
        .edit_locale(&db, "en", [("resume", "A shy Parisian waitress")])
        .await
        .unwrap();

    let loaded = movie.get_localized(&db, "en").await.unwrap().unwrap();
    assert_eq!(text(loaded.get_field("title")), Some("Amélie"));
    assert_eq!(text(loaded.get_field("resume")), Some("A shy Parisian waitress"));
}

#[tokio::test]
async fn translations_belong_to_their_own_record() {
    let db = setup().await;
    let movie = insert_movie(&db).await;
    let plain = db.insert("Media", [("title", "Hamlet")]).await.unwrap();

    movie
        .add_locale(&db, "en", [("title", "Amélie")])
        .await
        .unwrap();
    plain
        .add_locale(&db, "fr", [("title", "Hamlet")])
        .await
        .unwrap();
    plain
        .add_locale(&db, "de", [("title", "Hamlet, Prinz von Dänemark")])
        .await
        .unwrap();

    let all = movie.get_all_localized(&db).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].locale(), "en");

    let all = plain.get_all_localized(&db).await.unwrap();
    let locales: Vec<&str> = all.iter().map(|record| record.locale()).collect();
    assert_eq!(locales, ["fr", "de"]);
    assert!(all.iter().all(|record| record.model_name() == "MediaLocalized"));

    let many = movie
        .get_many_localized(&db, ["fr", "en", "de"])
        .await
        .unwrap();
    let locales: Vec<&str> = many.iter().map(|translation| translation.locale()).collect();
    assert_eq!(locales, ["en", "fr"]);
}

#[tokio::test]
async fn deleting_child_removes_every_level() {
    let db = setup().await;
    let movie = insert_movie(&db).await;
    let id = movie.id().clone();

    movie
        .add_locale(&db, "en", [("title", "Amélie"), ("resume", "A shy waitress")])
        .await
        .unwrap();
    movie.delete_locale(&db, "en").await.unwrap();
    assert!(movie.get_all_localized(&db).await.unwrap().is_empty());

    movie
        .add_locale(&db, "en", [("title", "Amélie"), ("resume", "A shy waitress")])
        .await
        .unwrap();
    movie
        .add_locale(&db, "de", [("title", "Die fabelhafte Welt der Amélie")])
        .await
        .unwrap();

    db.delete(movie).await.unwrap();
    assert!(db.find("Media", id.clone()).await.unwrap().is_none());

    let movie = db
        .insert(
            "Movie",
            [
                ("id", id.clone()),
                ("title", Value::from("Amélie")),
                ("resume", Value::from("Une serveuse")),
            ],
        )
        .await
        .unwrap();
    assert!(movie.get_all_localized(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_spans_tables() {
    let db = setup().await;
    let mut movie = insert_movie(&db).await;

    db.update(
        &mut movie,
        [
            ("year", Value::from(2002)),
            ("director", Value::from("Jean-Pierre Jeunet")),
        ],
    )
    .await
    .unwrap();

    assert_eq!(movie.get_field("year"), Some(&Value::I32(2002)));
    assert_eq!(text(movie.get_field("director")), Some("Jean-Pierre Jeunet"));

    let err = db
        .update(&mut movie, [("row_type", "media")])
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");

    let err = db
        .update(&mut movie, [("id", 7_i64)])
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");
}

/// Movies whose resume fits in twelve characters, in every table.
async fn setup_short_resume() -> Db {
    Db::builder()
        .register(media())
        .register(
            Model::new("Movie")
                .inherits("Media", Inheritance::Multi)
                .field(
                    Field::primitive("resume", Type::String)
                        .storage_ty(StorageType::VarChar(12)),
                )
                .localized(Localize::for_fields(["resume"])),
        )
        .in_memory()
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_insert_leaves_no_partial_record() {
    let db = setup().await;

    // `resume` is required and lives in the child table
    let err = db
        .insert("Movie", [("title", "Amélie")])
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    assert!(db.find("Media", 1_i64).await.unwrap().is_none());
    assert!(db.find("Movie", 1_i64).await.unwrap().is_none());

    let movie = insert_movie(&db).await;
    let loaded = db.get("Media", movie.id().clone()).await.unwrap();
    assert_eq!(loaded, movie);
}

#[tokio::test]
async fn failed_add_locale_can_be_retried() {
    let db = setup_short_resume().await;
    let movie = db
        .insert("Movie", [("title", "Amélie"), ("resume", "Une serveuse")])
        .await
        .unwrap();

    let err = movie
        .add_locale(
            &db,
            "fr",
            [("title", "Amélie"), ("resume", "Une serveuse timide")],
        )
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    assert!(movie.get_localized(&db, "fr").await.unwrap().is_none());
    assert!(movie.get_all_localized(&db).await.unwrap().is_empty());
    movie.delete_locale(&db, "fr").await.unwrap();

    let fr = movie
        .add_locale(&db, "fr", [("title", "Amélie"), ("resume", "Une serveuse")])
        .await
        .unwrap();
    assert_eq!(text(fr.get_field("resume")), Some("Une serveuse"));
}

#[tokio::test]
async fn failed_edit_locale_changes_nothing() {
    let db = setup_short_resume().await;
    let mut movie = db
        .insert("Movie", [("title", "Amélie"), ("resume", "Une serveuse")])
        .await
        .unwrap();

    movie
        .add_locale(&db, "fr", [("title", "Amelie"), ("resume", "A waitress")])
        .await
        .unwrap();

    let err = movie
        .edit_locale(
            &db,
            "fr",
            [("title", "Amélie"), ("resume", "A shy Parisian waitress")],
        )
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    let fr = movie.get_localized(&db, "fr").await.unwrap().unwrap();
    assert_eq!(text(fr.get_field("title")), Some("Amelie"));
    assert_eq!(text(fr.get_field("resume")), Some("A waitress"));
}

#[tokio::test]
async fn failed_update_changes_nothing() {
    let db = setup_short_resume().await;
    let mut movie = db
        .insert("Movie", [("title", "Amélie"), ("resume", "Une serveuse")])
        .await
        .unwrap();

    let err = db
        .update(
            &mut movie,
            [("title", "Le Fabuleux Destin"), ("resume", "Une serveuse timide")],
        )
        .await
        .unwrap_err();
    assert!(err.is_condition_failed(), "{err}");

    let loaded = db.get("Movie", movie.id().clone()).await.unwrap();
    assert_eq!(text(loaded.get_field("title")), Some("Amélie"));
    assert_eq!(loaded, movie);
}
