//! Next-version resolution for a form name.

use crate::catalog::FormCatalog;
use crate::FormResult;
use forms_types::FormVersion;

/// Computes the version a new form of `form_name` should get.
///
/// Every non-retired form of that name counts, drafts included, so two drafts started from the
/// same published form receive distinct versions. See [`FormVersion::next_after`] for the
/// arithmetic.
///
/// # Errors
///
/// Propagates catalog failures, and [`crate::FormError::InvalidVersion`] when a stored version
/// is not numeric.
pub fn next_version<C: FormCatalog>(catalog: &C, form_name: &str) -> FormResult<FormVersion> {
    let forms = catalog.get_all_forms(Some(form_name), false, true)?;
    Ok(FormVersion::next_after(
        forms.iter().map(|form| form.version.as_str()),
    )?)
}
