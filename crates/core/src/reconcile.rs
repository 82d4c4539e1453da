//! Reconciliation of the latest forms with an encounter's recorded observations.
//!
//! By default a client is shown the latest published version of every form. When an
//! encounter already holds observations captured with an older published version, that form
//! must be displayed at the version the data was recorded against, or the recorded values
//! would no longer line up with the form's fields. Each observation names its form through its
//! form-field path (`"Vitals.1/3-0"`), and each form name is reconciled independently.
//!
//! Voided observations take part in reconciliation like any other observation.
//!
//! When one encounter holds observations for several versions of the same form, the versions
//! are applied in ascending numeric order and the highest recorded version wins.

use crate::catalog::EncounterStore;
use crate::latest::LatestForms;
use crate::model::{Form, Obs};
use crate::{FormError, FormResult};
use forms_types::FormVersion;
use forms_uuid::RegistryUuid;
use std::collections::BTreeMap;

/// Returns `latest` as a list, with versions overridden by the encounter's observations.
///
/// Without an encounter, or for an encounter with no form-tagged observations, `latest` is
/// returned unchanged. For every `"<name>.<version>"` seen in the observations that differs
/// from the latest entry of `name`, the first form of `all_published` with exactly that name
/// and version replaces the entry's version and uuid. Observations naming a version that is no
/// longer published are ignored. The output keeps the order of `latest`.
///
/// # Errors
///
/// Returns [`FormError::EncounterNotFound`] when `encounter_uuid` is unknown, and propagates
/// encounter store failures.
pub fn reconcile<E: EncounterStore>(
    encounters: &E,
    all_published: &[Form],
    mut latest: LatestForms,
    encounter_uuid: Option<&RegistryUuid>,
) -> FormResult<Vec<Form>> {
    let Some(encounter_uuid) = encounter_uuid else {
        return Ok(latest.into_vec());
    };

    let encounter = encounters
        .get_encounter_by_uuid(encounter_uuid)?
        .ok_or(FormError::EncounterNotFound(*encounter_uuid))?;

    let groups = group_by_form_key(&encounter.observations);
    if groups.is_empty() {
        return Ok(latest.into_vec());
    }

    for &(name, version) in groups.keys() {
        let version = version.to_string();
        if latest.contains_version(name, &version) {
            continue;
        }

        let Some(recorded) = all_published.iter().find(|form| form.is(name, &version)) else {
            tracing::debug!("no published form {} v{}; keeping latest", name, version);
            continue;
        };

        if let Some(entry) = latest.get_mut(name) {
            tracing::debug!(
                "encounter {} recorded {} v{}; overriding latest v{}",
                encounter_uuid,
                name,
                version,
                entry.version
            );
            entry.version = recorded.version.clone();
            entry.uuid = recorded.uuid;
        }
    }

    Ok(latest.into_vec())
}

/// Groups observations by form name and version.
///
/// The key is a pure function of each observation, so the fold is order-independent; the
/// `BTreeMap` orders each name's versions numerically. Keys that do not parse are logged and
/// dropped.
fn group_by_form_key(observations: &[Obs]) -> BTreeMap<(&str, FormVersion), Vec<&Obs>> {
    observations
        .iter()
        .filter_map(|obs| obs.form_key().map(|key| (key, obs)))
        .fold(BTreeMap::new(), |mut groups, (key, obs)| {
            match parse_form_key(key) {
                Some(parsed) => groups.entry(parsed).or_insert_with(Vec::new).push(obs),
                None => tracing::warn!(
                    "ignoring observation {} with malformed form key '{}'",
                    obs.uuid,
                    key
                ),
            }
            groups
        })
}

/// Splits `"<name>.<version>"` at its last dot and parses the version.
fn parse_form_key(key: &str) -> Option<(&str, FormVersion)> {
    let (name, version) = key.rsplit_once('.')?;
    if name.is_empty() {
        return None;
    }
    FormVersion::parse(version).ok().map(|version| (name, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::model::Encounter;

    fn published(name: &str, version: i64) -> Form {
        let mut form = Form::new(name, FormVersion::new(version));
        form.published = true;
        form
    }

    fn obs(path: &str) -> Obs {
        Obs {
            uuid: RegistryUuid::new(),
            form_field_path: Some(path.into()),
            voided: false,
        }
    }

    fn encounter_with(catalog: &mut MemoryCatalog, observations: Vec<Obs>) -> RegistryUuid {
        let uuid = RegistryUuid::new();
        catalog.insert_encounter(Encounter { uuid, observations });
        uuid
    }

    #[test]
    fn without_encounter_latest_is_returned_unchanged() {
        let catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 1), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();

        let result = reconcile(&catalog, &all, latest.clone(), None).unwrap();

        assert_eq!(result, latest.into_vec());
    }

    #[test]
    fn observation_version_overrides_latest() {
        let mut catalog = MemoryCatalog::new();
        let v1 = published("Vitals", 1);
        let all = vec![v1.clone(), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(&mut catalog, vec![obs("Vitals.1/temperature")]);

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].version, "1");
        assert_eq!(result[0].uuid, v1.uuid);
    }

    #[test]
    fn observation_matching_latest_changes_nothing() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 1), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(&mut catalog, vec![obs("Vitals.2/pulse")]);

        let result = reconcile(&catalog, &all, latest.clone(), Some(&encounter)).unwrap();

        assert_eq!(result, latest.into_vec());
    }

    #[test]
    fn unknown_published_version_is_ignored() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(&mut catalog, vec![obs("Vitals.1/pulse")]);

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        assert_eq!(result[0].version, "2");
    }

    #[test]
    fn forms_are_reconciled_independently_and_order_is_kept() {
        let mut catalog = MemoryCatalog::new();
        let history_v1 = published("History", 1);
        let all = vec![
            published("Vitals", 1),
            published("Vitals", 2),
            history_v1.clone(),
            published("History", 2),
            published("Allergies", 1),
        ];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(
            &mut catalog,
            vec![
                obs("History.1/complaint"),
                obs("History.1/duration"),
                obs("Vitals.2/pulse"),
            ],
        );

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        let summary: Vec<(&str, &str)> = result
            .iter()
            .map(|f| (f.name.as_str(), f.version.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("Vitals", "2"), ("History", "1"), ("Allergies", "1")]
        );
        assert_eq!(result[1].uuid, history_v1.uuid);
    }

    #[test]
    fn voided_and_untagged_observations() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 1), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let mut voided = obs("Vitals.1/pulse");
        voided.voided = true;
        let untagged = Obs {
            uuid: RegistryUuid::new(),
            form_field_path: None,
            voided: false,
        };
        let encounter = encounter_with(&mut catalog, vec![voided, untagged]);

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        assert_eq!(result[0].version, "1");
    }

    #[test]
    fn encounter_without_form_observations_returns_latest() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 1), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(&mut catalog, vec![]);

        let result = reconcile(&catalog, &all, latest.clone(), Some(&encounter)).unwrap();

        assert_eq!(result, latest.into_vec());
    }

    #[test]
    fn unknown_encounter_is_an_error() {
        let catalog = MemoryCatalog::new();
        let missing = RegistryUuid::new();

        let result = reconcile(&catalog, &[], LatestForms::default(), Some(&missing));

        assert!(matches!(result, Err(FormError::EncounterNotFound(id)) if id == missing));
    }

    #[test]
    fn highest_recorded_version_wins_numerically() {
        let mut catalog = MemoryCatalog::new();
        let v10 = published("Vitals", 10);
        let all = vec![published("Vitals", 2), v10.clone(), published("Vitals", 11)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(
            &mut catalog,
            vec![obs("Vitals.10/pulse"), obs("Vitals.2/pulse")],
        );

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        assert_eq!(result[0].version, "10");
        assert_eq!(result[0].uuid, v10.uuid);
    }

    #[test]
    fn recorded_latest_version_is_kept_alongside_older_one() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 2), published("Vitals", 10)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(
            &mut catalog,
            vec![obs("Vitals.10/pulse"), obs("Vitals.2/pulse")],
        );

        let result = reconcile(&catalog, &all, latest, Some(&encounter)).unwrap();

        assert_eq!(result[0].version, "10");
    }

    #[test]
    fn malformed_keys_are_skipped() {
        let mut catalog = MemoryCatalog::new();
        let all = vec![published("Vitals", 1), published("Vitals", 2)];
        let latest = LatestForms::select(all.clone()).unwrap();
        let encounter = encounter_with(
            &mut catalog,
            vec![obs("Vitals/pulse"), obs("Vitals.x/pulse"), obs(".1/pulse")],
        );

        let result = reconcile(&catalog, &all, latest.clone(), Some(&encounter)).unwrap();

        assert_eq!(result, latest.into_vec());
    }

    #[test]
    fn form_keys_split_at_last_dot() {
        assert_eq!(parse_form_key("Vitals.2"), Some(("Vitals", FormVersion::new(2))));
        assert_eq!(parse_form_key("Pre.Op.3"), Some(("Pre.Op", FormVersion::new(3))));
        assert_eq!(parse_form_key("Vitals"), None);
        assert_eq!(parse_form_key("Vitals."), None);
    }
}
