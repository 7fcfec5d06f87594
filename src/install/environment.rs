//! Detection of the Python environment the installer was launched from

use std::path::PathBuf;

/// Virtualenv the user has activated in the current shell, if any
///
/// Activation scripts export `VIRTUAL_ENV`; an empty value counts as unset.
pub fn active_virtualenv() -> Option<PathBuf> {
    std::env::var_os("VIRTUAL_ENV")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_virtual_env_variable() {
        temp_env::with_var("VIRTUAL_ENV", Some("/home/user/venv"), || {
            assert_eq!(active_virtualenv(), Some(PathBuf::from("/home/user/venv")));
        });
    }

    #[test]
    fn empty_or_missing_means_none() {
        temp_env::with_var("VIRTUAL_ENV", Some(""), || {
            assert_eq!(active_virtualenv(), None);
        });
        temp_env::with_var_unset("VIRTUAL_ENV", || {
            assert_eq!(active_virtualenv(), None);
        });
    }
}
