//! One section to objects of one domain type

use super::helpers::HelperTable;
use super::{MappingContext, SectionMapper};
use isatab_core::{IsaTabError, Result, SectionInstance, Store};
use std::any::{Any, type_name};
use tracing::debug;

/// Builds a fresh object for each record
pub type Factory<T> = fn(&MappingContext) -> Result<T>;
/// Computes the store key of a mapped object
pub type KeyFn<T> = fn(&T) -> Option<String>;
/// Updates the context after an object has been mapped
pub type StoredHook<T> = fn(&T, &mut MappingContext);

/// Maps each record of a section into one `T`
pub struct ClassTabMapper<T> {
    section_id: &'static str,
    helpers: HelperTable<T>,
    factory: Factory<T>,
    key: KeyFn<T>,
    on_stored: Option<StoredHook<T>>,
}

impl<T: Any> ClassTabMapper<T> {
    /// Create a mapper for a section
    #[must_use]
    pub fn new(
        section_id: &'static str,
        helpers: HelperTable<T>,
        factory: Factory<T>,
        key: KeyFn<T>,
    ) -> Self {
        Self {
            section_id,
            helpers,
            factory,
            key,
            on_stored: None,
        }
    }

    /// Run a hook after each object is mapped, before it is stored
    #[must_use]
    pub fn on_stored(mut self, hook: StoredHook<T>) -> Self {
        self.on_stored = Some(hook);
        self
    }

    /// Helper table
    #[must_use]
    pub fn helpers(&self) -> &HelperTable<T> {
        &self.helpers
    }
}

impl<T: Any> SectionMapper for ClassTabMapper<T> {
    fn section_id(&self) -> &str {
        self.section_id
    }

    fn map(
        &self,
        instance: &SectionInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize> {
        if instance.id() != self.section_id {
            return Err(IsaTabError::internal(format!(
                "mapper for '{}' applied to section '{}'",
                self.section_id,
                instance.id()
            )));
        }

        let helpers = self.helpers.resolve(instance)?;
        instance.check_structure()?;

        let mut stored = 0;
        for (index, record) in instance.records().iter().enumerate() {
            let mut object = (self.factory)(ctx)?;
            for helper in &helpers {
                helper.apply(&mut object, record)?;
            }

            let key = (self.key)(&object);
            if let Some(hook) = self.on_stored {
                hook(&object, ctx);
            }
            if key.is_some() {
                stored += 1;
            }
            debug!(
                section = self.section_id,
                record = index,
                kind = type_name::<T>(),
                ?key,
                "Mapped record"
            );
            store.put(key, object);
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isatab_core::Record;
    use isatab_core::schema::{Field, Section, SectionType};
    use std::sync::Arc;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        study: String,
    }

    fn mapper() -> ClassTabMapper<Person> {
        ClassTabMapper::new(
            "people",
            HelperTable::<Person>::new().text("Person Name", |p, v| p.name = v),
            |ctx| {
                Ok(Person {
                    study: ctx.require_study()?.to_string(),
                    ..Default::default()
                })
            },
            |p| (!p.name.is_empty()).then(|| p.name.clone()),
        )
    }

    fn instance(names: &[&str]) -> SectionInstance {
        let section = Arc::new(Section {
            id: "people".to_string(),
            header: None,
            section_type: SectionType::ManyInCols,
            fields: vec![Field::new("Person Name").with_max(1)],
        });
        let mut instance = SectionInstance::new(section);
        instance.add_header("Person Name", false).unwrap();
        for name in names {
            instance.add_record(Record::new(vec![(*name).to_string()]));
        }
        instance
    }

    #[test]
    fn test_map_requires_study_context() {
        let mut store = Store::new();
        let mut ctx = MappingContext::new(false);
        let err = mapper()
            .map(&instance(&["ann"]), &mut store, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, IsaTabError::Internal(_)));
    }

    #[test]
    fn test_map_skips_anonymous_records() {
        let mut store = Store::new();
        let mut ctx = MappingContext::new(false);
        ctx.current_study = Some("S1".to_string());

        let stored = mapper()
            .map(&instance(&["ann", "", "bob"]), &mut store, &mut ctx)
            .unwrap();
        assert_eq!(stored, 2);
        assert_eq!(store.count_of_type::<Person>(), 2);
        assert_eq!(store.get_type::<Person>("bob").unwrap().study, "S1");
    }

    #[test]
    fn test_duplicate_single_column_is_rejected() {
        let mut duplicated = instance(&[]);
        duplicated.add_header("Person Name", false).unwrap();

        let mut ctx = MappingContext::new(false);
        ctx.current_study = Some("S1".to_string());
        let err = mapper()
            .map(&duplicated, &mut Store::new(), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, IsaTabError::StructureError { .. }));
    }
}
