//! Transformation option assembly.
//!
//! [`OptionsForm`] mirrors the option surface the embedding UI presents
//! (scope restriction, target release, transformer toggles) and validates it
//! into an immutable [`TransformOptions`] snapshot at submission time.
//!
//! The scope filter field is shared state: the user types into it while the
//! asynchronous auto-detect response may race in with a suggestion.
//! [`ScopeField`] closes that race with a `touched` flag — a suggestion only
//! lands while the field has never been edited by the user.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ValidationError;
use crate::types::{TargetRelease, TransformOptions};

#[derive(Debug, Default)]
struct ScopeState {
    value: String,
    touched: bool,
}

/// Shared scope-filter field with a user-touched guard.
///
/// Cloning yields another handle to the same field.
#[derive(Clone, Debug, Default)]
pub struct ScopeField {
    inner: Arc<Mutex<ScopeState>>,
}

impl ScopeField {
    /// Create an empty, untouched field.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScopeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a user edit. Marks the field as touched so later suggestions
    /// are ignored.
    pub fn set(&self, value: impl Into<String>) {
        let mut state = self.lock();
        state.value = value.into();
        state.touched = true;
    }

    /// Offer an auto-detected suggestion.
    ///
    /// Applied only while the field is untouched; returns whether the value
    /// was taken.
    pub fn suggest(&self, value: impl Into<String>) -> bool {
        let mut state = self.lock();
        if state.touched {
            return false;
        }
        state.value = value.into();
        true
    }

    /// Current field content.
    pub fn value(&self) -> String {
        self.lock().value.clone()
    }

    /// Whether the user has edited the field since the last reset.
    pub fn is_touched(&self) -> bool {
        self.lock().touched
    }

    /// Reset to empty and untouched (a new artifact selection starts fresh).
    pub fn reset(&self) {
        let mut state = self.lock();
        state.value.clear();
        state.touched = false;
    }
}

/// UI state for one submission attempt.
///
/// [`build`](Self::build) is a pure function of this state; it performs no
/// I/O and has no side effects.
#[derive(Clone, Debug)]
pub struct OptionsForm {
    /// Restrict transformation to the main package named in [`scope`](Self::scope)
    pub only_main_package: bool,
    /// Scope filter field (shared with the auto-detect path)
    pub scope: ScopeField,
    /// Target JVM release
    pub target_release: TargetRelease,
    /// Encrypt string constants
    pub string_encryption: bool,
    /// Encrypt numeric constants
    pub number_encryption: bool,
    /// Obfuscate conditional control flow
    pub flow_condition: bool,
    /// Obfuscate control flow via exception handlers
    pub flow_exception: bool,
    /// Obfuscate range checks
    pub flow_range: bool,
    /// Obfuscate switch tables
    pub flow_switch: bool,
}

impl Default for OptionsForm {
    fn default() -> Self {
        Self {
            only_main_package: false,
            scope: ScopeField::new(),
            target_release: TargetRelease::default(),
            string_encryption: true,
            number_encryption: true,
            flow_condition: true,
            flow_exception: true,
            flow_range: true,
            flow_switch: true,
        }
    }
}

impl OptionsForm {
    /// Validate the form into an immutable [`TransformOptions`] snapshot.
    ///
    /// Fails with [`ValidationError::MissingScopeFilter`] when the only-main
    /// restriction is enabled but the scope field is blank after trimming.
    /// With the restriction disabled the scope is structurally absent from
    /// the snapshot regardless of the field's content.
    pub fn build(&self) -> Result<TransformOptions, ValidationError> {
        let main_package = if self.only_main_package {
            let value = self.scope.value();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingScopeFilter);
            }
            Some(trimmed.to_string())
        } else {
            None
        };

        Ok(TransformOptions {
            main_package,
            target_release: self.target_release,
            string_encryption: self.string_encryption,
            number_encryption: self.number_encryption,
            flow_condition: self.flow_condition,
            flow_exception: self.flow_exception,
            flow_range: self.flow_range,
            flow_switch: self.flow_switch,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_when_scope_required_but_blank() {
        let form = OptionsForm {
            only_main_package: true,
            ..OptionsForm::default()
        };
        assert_eq!(form.build().unwrap_err(), ValidationError::MissingScopeFilter);

        form.scope.set("   \t ");
        assert_eq!(form.build().unwrap_err(), ValidationError::MissingScopeFilter);
    }

    #[test]
    fn build_trims_the_scope_filter() {
        let form = OptionsForm {
            only_main_package: true,
            ..OptionsForm::default()
        };
        form.scope.set("  com.acme.app  ");
        let options = form.build().unwrap();
        assert_eq!(options.main_package.as_deref(), Some("com.acme.app"));
    }

    #[test]
    fn scope_is_structurally_absent_when_flag_unset() {
        let form = OptionsForm::default();
        form.scope.set("com.acme.app");
        let options = form.build().unwrap();
        assert!(options.main_package.is_none());
    }

    #[test]
    fn suggestion_lands_on_untouched_field() {
        let field = ScopeField::new();
        assert!(field.suggest("com.detected.app"));
        assert_eq!(field.value(), "com.detected.app");
        assert!(!field.is_touched());
    }

    #[test]
    fn suggestion_never_overwrites_a_user_edit() {
        let field = ScopeField::new();
        field.set("com.typed.by.user");
        assert!(!field.suggest("com.detected.app"));
        assert_eq!(field.value(), "com.typed.by.user");
    }

    #[test]
    fn reset_clears_value_and_touched_flag() {
        let field = ScopeField::new();
        field.set("com.typed.by.user");
        field.reset();
        assert!(!field.is_touched());
        assert_eq!(field.value(), "");
        assert!(field.suggest("com.detected.app"));
    }

    #[test]
    fn a_later_suggestion_replaces_an_earlier_one() {
        let field = ScopeField::new();
        assert!(field.suggest("com.first"));
        assert!(field.suggest("com.second"));
        assert_eq!(field.value(), "com.second");
    }
}
