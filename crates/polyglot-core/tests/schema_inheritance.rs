use polyglot_core::schema::{app::*, db, Schema};
use polyglot_core::stmt;
use pretty_assertions::assert_eq;

const MEDIA: ModelId = ModelId(0);
const MOVIE: ModelId = ModelId(1);
const SONG: ModelId = ModelId(2);

fn string_field(model: ModelId, name: &str) -> Field {
    Field::primitive(model.field(0), name, stmt::Type::String)
}

fn root(id: ModelId, name: &str, fields: &[&str]) -> Model {
    let mut model = Model::new(id, name);

    let key = model.push_field(Field {
        primary_key: true,
        auto_increment: true,
        ..Field::primitive(id.field(0), "id", stmt::Type::I64)
    });

    for name in fields {
        model.push_field(string_field(id, name));
    }

    model.primary_key = Some(PrimaryKey { fields: vec![key] });
    model
}

fn child(
    id: ModelId,
    name: &str,
    parent: ModelId,
    strategy: Inheritance,
    fields: &[&str],
) -> Model {
    let mut model = Model::new(id, name);
    model.inherits = Some(Inherits { parent, strategy });

    for name in fields {
        model.push_field(string_field(id, name));
    }

    model
}

fn media_models() -> Vec<Model> {
    let mut media = root(MEDIA, "Media", &["title"]);
    media.table_name = Some("medias".to_string());
    media.localize = Some(Localize::for_fields(["title"]));

    let mut movie = child(MOVIE, "Movie", MEDIA, Inheritance::Multi, &["resume"]);
    movie.localize = Some(Localize::for_fields(["resume"]));

    let mut song = child(SONG, "Song", MEDIA, Inheritance::Single, &["lyrics"]);
    song.localize = Some(Localize::for_fields(["lyrics"]));

    vec![media, movie, song]
}

fn build(models: Vec<Model>) -> Schema {
    Schema::builder()
        .build(polyglot_core::schema::app::Schema::from_models(models).unwrap())
        .unwrap()
}

fn localized(schema: &Schema, id: ModelId) -> &Model {
    let localization = schema.app.model(id).localization.as_ref().unwrap();
    schema.app.model(localization.model)
}

fn column_names(table: &db::Table) -> Vec<&str> {
    table
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect()
}

#[test]
fn polymorphic_root_gets_row_type() {
    let schema = build(media_models());
    let media = schema.app.model(MEDIA);

    let row_type = schema.app.field(media.discriminator.unwrap());
    assert_eq!(row_type.name.app_name, "row_type");
    assert_eq!(schema.app.model(MOVIE).identity, "movie");
    assert_eq!(schema.app.model(SONG).identity, "song");
    assert_eq!(
        schema.app.model_by_identity(MEDIA, "movie").map(|model| model.id),
        Some(MOVIE)
    );

    let medias = schema.table_for(MEDIA);
    assert_eq!(
        column_names(medias),
        ["id", "title", "row_type", "default_locale", "lyrics"]
    );
}

#[test]
fn localized_models_follow_entity_chain() {
    let schema = build(media_models());

    let media_localized = localized(&schema, MEDIA);
    let movie_localized = localized(&schema, MOVIE);
    let song_localized = localized(&schema, SONG);

    assert!(media_localized.is_root());
    assert_eq!(
        movie_localized.inherits,
        Some(Inherits {
            parent: media_localized.id,
            strategy: Inheritance::Multi,
        })
    );
    assert_eq!(
        song_localized.inherits,
        Some(Inherits {
            parent: media_localized.id,
            strategy: Inheritance::Single,
        })
    );

    assert_eq!(movie_localized.identity, "movie_localized");
    assert_eq!(
        schema
            .app
            .model_by_identity(media_localized.id, "movie_localized")
            .map(|model| model.id),
        Some(movie_localized.id)
    );

    // Only the root of the localized chain has a key and a discriminator
    assert!(movie_localized.primary_key.is_none());
    assert!(movie_localized.discriminator.is_none());
    assert!(movie_localized.field_by_name("translated_id").is_none());

    // Every level is visible through the most derived localized model
    let fields: Vec<&str> = schema
        .app
        .localized_fields(movie_localized.id)
        .iter()
        .map(|field| field.name.app_name.as_str())
        .collect();
    assert_eq!(fields, ["title", "resume"]);
}

#[test]
fn each_level_has_its_own_relation() {
    let schema = build(media_models());

    assert!(schema
        .app
        .model(MEDIA)
        .field_by_name("Media_localized_versions")
        .is_some());
    assert!(schema
        .app
        .model(MOVIE)
        .field_by_name("Movie_localized_versions")
        .is_some());

    // The default locale is declared once, on the first localized level
    let default_locale = schema.app.field_by_name(MOVIE, "default_locale").unwrap();
    assert_eq!(default_locale.id.model, MEDIA);
    assert!(schema.app.model(MOVIE).field_by_name("default_locale").is_none());

    let movie_localization = schema.app.model(MOVIE).localization.as_ref().unwrap();
    assert_eq!(movie_localization.default_locale_field, default_locale.id);

    // The back-reference of a joined level uses the key of the localized root
    let movie_localized = localized(&schema, MOVIE);
    let translated = movie_localized.field_by_name("translated").unwrap();
    let fk = &translated.ty.expect_belongs_to().foreign_key.fields[0];
    assert_eq!(
        schema.app.field(fk.source).name.app_name,
        "translated_id"
    );
    assert_eq!(fk.source.model, localized(&schema, MEDIA).id);
}

#[test]
fn joined_localized_table_references_parent() {
    let schema = build(media_models());

    let medias = schema.table_for(MEDIA);
    let movies = schema.table_for(MOVIE);
    let medias_localized = schema.table_for(localized(&schema, MEDIA).id);
    let movies_localized = schema.table_for(localized(&schema, MOVIE).id);

    assert_eq!(movies.name, "movies");
    assert_eq!(column_names(movies), ["id", "resume"]);
    assert_eq!(medias_localized.name, "medias_localized");
    assert_eq!(movies_localized.name, "movies_localized");
    assert_eq!(
        column_names(movies_localized),
        ["translated_id", "locale_id", "resume"]
    );

    let references: Vec<(&str, usize)> = movies_localized
        .foreign_keys
        .iter()
        .map(|fk| (schema.db.table(fk.references).name.as_str(), fk.columns.len()))
        .collect();
    assert_eq!(references, [("medias_localized", 2), ("movies", 1)]);
    assert!(movies_localized
        .foreign_keys
        .iter()
        .all(|fk| fk.on_delete.is_cascade()));

    // The joined entity table is keyed by the root table
    assert_eq!(movies.foreign_keys[0].references, medias.id);
}

#[test]
fn single_table_levels_share_the_localized_root_table() {
    let schema = build(media_models());

    let song_localized = localized(&schema, SONG);
    let media_localized = localized(&schema, MEDIA);

    assert_eq!(
        schema.table_id_for(song_localized.id),
        schema.table_id_for(media_localized.id)
    );

    let table = schema.table_for(song_localized.id);
    assert_eq!(
        column_names(table),
        ["title", "translated_id", "locale_id", "translated_type", "lyrics"]
    );
    assert!(table.column_by_name("lyrics").unwrap().nullable);

    // A shared table keeps only the constraints of its root
    assert_eq!(table.foreign_keys.len(), 1);
    assert_eq!(table.foreign_keys[0].references, schema.table_for(MEDIA).id);

    assert_eq!(
        schema.tables_for(song_localized.id),
        [schema.table_id_for(media_localized.id)]
    );
}

#[test]
fn registration_order_does_not_matter() {
    let mut models = media_models();
    models.reverse();

    let schema = build(models);
    let movie_localized = localized(&schema, MOVIE);

    assert_eq!(
        movie_localized.parent(),
        Some(localized(&schema, MEDIA).id)
    );
    assert_eq!(schema.table_for(movie_localized.id).name, "movies_localized");
}

#[test]
fn localized_child_of_plain_parent_is_a_localized_root() {
    const DOCUMENT: ModelId = ModelId(0);
    const ARTICLE: ModelId = ModelId(1);

    let document = root(DOCUMENT, "Document", &["path"]);
    let mut article = child(ARTICLE, "Article", DOCUMENT, Inheritance::Multi, &["body"]);
    article.localize = Some(Localize::for_fields(["body"]).default_locale("fr"));

    let schema = build(vec![document, article]);
    let article_localized = localized(&schema, ARTICLE);

    assert!(article_localized.is_root());
    assert!(article_localized.field_by_name("translated_id").is_some());
    assert_eq!(
        schema.table_for(article_localized.id).name,
        "articles_localized"
    );

    // The default locale lives on the localized level, not on its parent
    assert!(schema
        .app
        .model(ARTICLE)
        .field_by_name("default_locale")
        .is_some());
    assert!(schema.app.localization(DOCUMENT).is_none());

    let (owner, localization) = schema.app.localization(ARTICLE).unwrap();
    assert_eq!(owner.id, ARTICLE);
    assert_eq!(localization.default_locale, "fr");

    let fk = &schema.table_for(article_localized.id).foreign_keys[0];
    assert_eq!(schema.db.table(fk.references).name, "articles");
}

#[test]
fn chain_helpers() {
    let schema = build(media_models());
    let app = &schema.app;

    let chain: Vec<ModelId> = app.chain(MOVIE).iter().map(|model| model.id).collect();
    assert_eq!(chain, [MEDIA, MOVIE]);
    assert_eq!(app.root(SONG).id, MEDIA);
    assert!(app.is_a(MOVIE, MEDIA));
    assert!(!app.is_a(MEDIA, MOVIE));
    assert_eq!(app.primary_key(MOVIE).fields, [MEDIA.field(0)]);

    let descendants: Vec<ModelId> = app.descendants(MEDIA).map(|model| model.id).collect();
    assert_eq!(descendants, [MOVIE, SONG]);

    assert_eq!(
        app.field_by_name(MOVIE, "title").map(|field| field.id),
        Some(MEDIA.field(1))
    );
    assert_eq!(app.model_by_name("movie").map(|model| model.id), Some(MOVIE));
}
