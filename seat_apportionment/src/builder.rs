pub use crate::config::*;

use std::collections::HashSet;

/// A builder for adding entities one at a time.
///
/// Names are checked as they are added, so that errors can be reported
/// close to the faulty input.
///
/// ```
/// pub use seat_apportionment::builder::Builder;
/// pub use seat_apportionment::ApportionmentRules;
/// # use seat_apportionment::ApportionmentErrors;
///
/// let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES)?;
///
/// builder.add_entity("Virginia", 1_000_000)?;
/// builder.add_entity("Vermont", 100_000)?;
///
/// let result = builder.apportion(5)?;
/// assert_eq!(result.seats_of("Virginia"), Some(4));
///
/// # Ok::<(), ApportionmentErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ApportionmentRules,
    pub(crate) _entities: Vec<Entity>,
    pub(crate) _names: HashSet<String>,
}

impl Builder {
    pub fn new(rules: &ApportionmentRules) -> Result<Builder, ApportionmentErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _entities: Vec::new(),
            _names: HashSet::new(),
        })
    }

    /// Adds an entity. Surrounding whitespace is removed from the name.
    pub fn add_entity(&mut self, name: &str, population: u64) -> Result<(), ApportionmentErrors> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApportionmentErrors::EmptyEntityName);
        }
        if !self._names.insert(name.to_string()) {
            return Err(ApportionmentErrors::DuplicateEntity(name.to_string()));
        }
        self._entities.push(Entity::new(name, population));
        Ok(())
    }

    pub fn entities(&self) -> &[Entity] {
        &self._entities
    }

    pub fn apportion(&self, total_seats: u32) -> Result<ApportionmentResult, ApportionmentErrors> {
        crate::run_apportionment(&self._entities, total_seats, &self._rules)
    }

    /// Like `apportion`, without recording the priority list.
    pub fn apportion_seats(
        &self,
        total_seats: u32,
    ) -> Result<ApportionmentResult, ApportionmentErrors> {
        crate::apportion_entities(&self._entities, total_seats, &self._rules, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicates_after_trimming() {
        let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES).unwrap();
        builder.add_entity("Ohio", 10).unwrap();
        assert_eq!(
            builder.add_entity(" Ohio ", 20),
            Err(ApportionmentErrors::DuplicateEntity("Ohio".to_string()))
        );
        assert_eq!(
            builder.add_entity("", 20),
            Err(ApportionmentErrors::EmptyEntityName)
        );
        assert_eq!(builder.entities().len(), 1);
    }

    #[test]
    fn uses_the_builder_rules() {
        let mut builder = Builder::new(&ApportionmentRules::HAMILTON_RULES).unwrap();
        builder.add_entity("Large", 900).unwrap();
        builder.add_entity("Small", 100).unwrap();
        // Hamilton does not guarantee a seat to every entity.
        let res = builder.apportion(1).unwrap();
        assert_eq!(res.seats_of("Large"), Some(1));
        assert_eq!(res.seats_of("Small"), Some(0));
    }

    #[test]
    fn seats_only() {
        let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES).unwrap();
        builder.add_entity("Virginia", 1_000_000).unwrap();
        builder.add_entity("Vermont", 100_000).unwrap();
        let full = builder.apportion(7).unwrap();
        let res = builder.apportion_seats(7).unwrap();
        assert_eq!(full.priority_list.len(), 5);
        assert!(res.priority_list.is_empty());
        assert_eq!(res.seats, full.seats);
    }
}
