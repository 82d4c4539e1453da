//! Reduction of a catalog listing to one latest form per name.

use crate::model::Form;
use crate::FormResult;
use forms_types::FormVersion;
use std::collections::HashMap;

/// One form per name, kept in the order names were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestForms {
    forms: Vec<Form>,
    positions: HashMap<String, usize>,
}

impl LatestForms {
    /// Keeps, for each name, the form with the numerically highest version.
    ///
    /// A form replaces the entry for its name only when its version is strictly greater, so
    /// among equal versions the first one seen wins. Filtering retired or unpublished forms is
    /// the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidVersion`] if any version is not an integer.
    pub fn select<I>(forms: I) -> FormResult<Self>
    where
        I: IntoIterator<Item = Form>,
    {
        let mut latest = Self::default();
        let mut versions: Vec<FormVersion> = Vec::new();

        for form in forms {
            let version = form.parsed_version()?;
            match latest.positions.get(&form.name) {
                Some(&index) => {
                    if version > versions[index] {
                        versions[index] = version;
                        latest.forms[index] = form;
                    }
                }
                None => {
                    latest.positions.insert(form.name.clone(), latest.forms.len());
                    versions.push(version);
                    latest.forms.push(form);
                }
            }
        }

        Ok(latest)
    }

    pub fn get(&self, name: &str) -> Option<&Form> {
        self.positions.get(name).map(|&index| &self.forms[index])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Form> {
        let index = *self.positions.get(name)?;
        self.forms.get_mut(index)
    }

    /// True when the entry for `name` is exactly at `version`.
    pub fn contains_version(&self, name: &str, version: &str) -> bool {
        self.get(name).is_some_and(|form| form.is(name, version))
    }

    pub fn into_vec(self) -> Vec<Form> {
        self.forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormError;

    fn form(name: &str, version: &str) -> Form {
        let mut form = Form::new(name, FormVersion::INITIAL);
        form.version = version.into();
        form.published = true;
        form
    }

    fn summary(latest: LatestForms) -> Vec<(String, String)> {
        latest
            .into_vec()
            .into_iter()
            .map(|f| (f.name, f.version))
            .collect()
    }

    #[test]
    fn keeps_highest_version_per_name_in_first_seen_order() {
        let latest = LatestForms::select(vec![
            form("Vitals", "1"),
            form("History", "2"),
            form("Vitals", "3"),
            form("History", "1"),
            form("Vitals", "2"),
        ])
        .unwrap();

        assert_eq!(
            summary(latest),
            vec![
                ("Vitals".to_string(), "3".to_string()),
                ("History".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn compares_numerically_not_lexically() {
        let latest = LatestForms::select(vec![form("Vitals", "9"), form("Vitals", "10")]).unwrap();
        assert_eq!(latest.get("Vitals").unwrap().version, "10");
    }

    #[test]
    fn first_of_equal_versions_wins() {
        let first = form("Vitals", "2");
        let first_uuid = first.uuid;
        let latest = LatestForms::select(vec![first, form("Vitals", "2")]).unwrap();

        assert_eq!(latest.get("Vitals").unwrap().uuid, first_uuid);
        assert_eq!(latest.into_vec().len(), 1);
    }

    #[test]
    fn non_integer_version_is_fatal() {
        let result = LatestForms::select(vec![form("Vitals", "1"), form("Vitals", "1.5")]);
        assert!(matches!(result, Err(FormError::InvalidVersion(_))));
    }

    #[test]
    fn empty_listing_gives_empty_selection() {
        let latest = LatestForms::select(Vec::new()).unwrap();
        assert!(!latest.contains_version("Vitals", "1"));
        assert!(latest.into_vec().is_empty());
    }
}
