//! Per-locale helpers of localized entities.

use crate::{
    db::collect_fields,
    engine::{Fields, Filter},
    Db, Entity, Error, LocalizedRecord, Result, Translation,
};

use polyglot_core::{
    schema::app::{Localization, ModelId},
    stmt::Value,
};

impl Entity {
    /// Stores a translation of this entity into `locale`.
    ///
    /// Only localizable fields may be given. Fails with a validation error for
    /// the entity's default locale, and with a condition failed error if the
    /// locale already has a translation.
    pub async fn add_locale<I, K, V>(
        &self,
        db: &Db,
        locale: &str,
        fields: I,
    ) -> Result<LocalizedRecord>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let localized = self.localized_model(db)?;

        if self.is_default_locale(locale) {
            return Err(Error::validation(format!(
                "`{locale}` is the default locale of this `{}`; edit the record itself",
                self.model_name()
            )));
        }

        let mut fields = collect_fields(fields);
        self.check_localizable(db, localized, &fields)?;

        fields.insert(Localization::OWNER_FIELD.to_string(), self.id().clone());
        fields.insert(Localization::LOCALE_FIELD.to_string(), Value::from(locale));

        let record = db.engine.insert(localized, fields).await?;

        tracing::debug!(
            model = self.model_name(),
            id = %self.id(),
            locale,
            "added locale"
        );

        Ok(LocalizedRecord::from_record(
            &db.engine.schema,
            record,
            self.clone(),
        ))
    }

    /// Returns the entity itself for its default locale, the stored
    /// translation for any other locale, or `None` if there is none.
    pub async fn get_localized(&self, db: &Db, locale: &str) -> Result<Option<Translation<'_>>> {
        let localized = self.localized_model(db)?;

        if self.is_default_locale(locale) {
            return Ok(Some(Translation::Default(self)));
        }

        let filter = Filter::Eq(Localization::LOCALE_FIELD, locale.into());
        let records = self.translations(db, localized, Some(filter)).await?;

        Ok(records.into_iter().next().map(Translation::Localized))
    }

    /// Returns the stored translations for `locales` in storage order,
    /// followed by the entity itself if its default locale was requested.
    /// Locales without a translation are skipped.
    pub async fn get_many_localized<I, L>(
        &self,
        db: &Db,
        locales: I,
    ) -> Result<Vec<Translation<'_>>>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let localized = self.localized_model(db)?;
        let mut include_self = false;
        let mut requested: Vec<Value> = vec![];

        for locale in locales {
            let locale = locale.as_ref();

            if self.is_default_locale(locale) {
                include_self = true;
            } else if !requested.iter().any(|value| *value == locale) {
                requested.push(locale.into());
            }
        }

        let mut translations = vec![];

        if !requested.is_empty() {
            let filter = Filter::In(Localization::LOCALE_FIELD, requested);
            let records = self.translations(db, localized, Some(filter)).await?;
            translations.extend(records.into_iter().map(Translation::Localized));
        }

        if include_self {
            translations.push(Translation::Default(self));
        }

        Ok(translations)
    }

    /// Returns every stored translation. The entity itself is not included.
    pub async fn get_all_localized(&self, db: &Db) -> Result<Vec<LocalizedRecord>> {
        let localized = self.localized_model(db)?;
        self.translations(db, localized, None).await
    }

    /// Updates the translation for `locale` in place. For the default locale,
    /// updates the entity's own fields. Returns `None` if the locale has no
    /// translation.
    pub async fn edit_locale<I, K, V>(
        &mut self,
        db: &Db,
        locale: &str,
        fields: I,
    ) -> Result<Option<Translation<'_>>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let localized = self.localized_model(db)?;
        let fields = collect_fields(fields);

        if self.is_default_locale(locale) {
            self.check_localizable(db, localized, &fields)?;
            db.update(self, fields).await?;
            return Ok(Some(Translation::Default(self)));
        }

        let Some(current) = self.find_translation(db, localized, locale).await? else {
            return Ok(None);
        };

        self.check_localizable(db, localized, &fields)?;

        let key = current.key;
        db.engine.update(current.model, &key, fields).await?;

        let record = db.engine.get(current.model, key).await?.ok_or_else(|| {
            Error::record_not_found(format!("translation `{locale}` was deleted"))
        })?;

        Ok(Some(Translation::Localized(LocalizedRecord::from_record(
            &db.engine.schema,
            record,
            self.clone(),
        ))))
    }

    /// Deletes the translation for `locale`. Does nothing for the default
    /// locale or a locale without a translation.
    pub async fn delete_locale(&self, db: &Db, locale: &str) -> Result<()> {
        let localized = self.localized_model(db)?;

        if self.is_default_locale(locale) {
            return Ok(());
        }

        if let Some(current) = self.find_translation(db, localized, locale).await? {
            db.engine.delete(current.model, current.key).await?;

            tracing::debug!(
                model = self.model_name(),
                id = %self.id(),
                locale,
                "deleted locale"
            );
        }

        Ok(())
    }

    fn is_default_locale(&self, locale: &str) -> bool {
        self.default_locale() == Some(locale)
    }

    /// The localized model holding this entity's translations.
    fn localized_model(&self, db: &Db) -> Result<ModelId> {
        match db.engine.schema.app.localization(self.model_id()) {
            Some((_, localization)) => Ok(localization.model),
            None => Err(Error::validation(format!(
                "`{}` is not localized",
                self.model_name()
            ))),
        }
    }

    /// Checks that every field is localizable somewhere along the chain.
    fn check_localizable(&self, db: &Db, localized: ModelId, fields: &Fields) -> Result<()> {
        let localizable = db.engine.schema.app.localized_fields(localized);

        for name in fields.keys() {
            if !localizable.iter().any(|field| field.name.app_name == *name) {
                return Err(Error::validation(format!(
                    "field `{name}` of `{}` is not localized",
                    self.model_name()
                )));
            }
        }

        Ok(())
    }

    async fn find_translation(
        &self,
        db: &Db,
        localized: ModelId,
        locale: &str,
    ) -> Result<Option<crate::engine::Record>> {
        let mut records = db
            .engine
            .query(
                localized,
                vec![
                    Filter::Eq(Localization::OWNER_FIELD, self.id().clone()),
                    Filter::Eq(Localization::LOCALE_FIELD, locale.into()),
                ],
            )
            .await?;

        Ok(records.pop())
    }

    async fn translations(
        &self,
        db: &Db,
        localized: ModelId,
        filter: Option<Filter<'_>>,
    ) -> Result<Vec<LocalizedRecord>> {
        let mut filters = vec![Filter::Eq(Localization::OWNER_FIELD, self.id().clone())];
        filters.extend(filter);

        let records = db.engine.query(localized, filters).await?;

        Ok(records
            .into_iter()
            .map(|record| LocalizedRecord::from_record(&db.engine.schema, record, self.clone()))
            .collect())
    }
}
