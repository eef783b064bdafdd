//! Settings resolution from the real process environment and `~/.nscmrc`.

use std::time::Duration;

use serial_test::serial;

use nscm::config::{
    CONFIG_FILE_NAME, DEFAULT_MAX_DIFF_LINES, GIT_TIMEOUT_ENV_VAR, git_timeout,
    resolve_from_environment,
};

/// Every variable resolution reads, unset.
const CLEARED: &[&str] = &[
    "NSCM_PROVIDER",
    "NSCM_MODEL",
    "NSCM_STYLE",
    "NSCM_TIMEOUT",
    "NSCM_MAX_DIFF_LINES",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "OLLAMA_HOST",
];

/// Run `f` with HOME pointing at `home`, the given variables set, and every
/// other nscm variable unset.
fn with_env<F: FnOnce()>(home: &std::path::Path, set: &[(&str, &str)], f: F) {
    let home = home.to_string_lossy().into_owned();
    let mut vars: Vec<(&str, Option<String>)> = CLEARED
        .iter()
        .filter(|key| !set.iter().any(|(k, _)| k == *key))
        .map(|key| (*key, None))
        .collect();
    vars.extend(set.iter().map(|(k, v)| (*k, Some(v.to_string()))));
    vars.push(("HOME", Some(home)));

    temp_env::with_vars(vars, f);
}

#[test]
#[serial]
fn test_defaults_without_env_or_file() {
    let home = tempfile::tempdir().unwrap();

    with_env(home.path(), &[], || {
        let settings = resolve_from_environment();
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.style, "conventional");
        assert_eq!(settings.timeout, Duration::from_secs(20));
        assert_eq!(settings.max_diff_lines, DEFAULT_MAX_DIFF_LINES);
        assert!(settings.api_key.is_none());
    });
}

#[test]
#[serial]
fn test_file_values_apply_when_env_unset() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(CONFIG_FILE_NAME),
        "provider: anthropic\nstyle: plain\n",
    )
    .unwrap();

    with_env(home.path(), &[("ANTHROPIC_API_KEY", "sk-ant")], || {
        let settings = resolve_from_environment();
        assert_eq!(settings.provider, "anthropic");
        assert_eq!(settings.model, "claude-3-5-haiku-latest");
        assert_eq!(settings.style, "plain");
        assert_eq!(settings.api_key.as_deref(), Some("sk-ant"));
    });
}

#[test]
#[serial]
fn test_env_beats_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(CONFIG_FILE_NAME),
        "provider: anthropic\nmodel: from-file\n",
    )
    .unwrap();

    with_env(
        home.path(),
        &[
            ("NSCM_PROVIDER", "ollama"),
            ("NSCM_MODEL", "qwen2.5-coder"),
            ("OLLAMA_HOST", "gpu.lan:11434"),
        ],
        || {
            let settings = resolve_from_environment();
            assert_eq!(settings.provider, "ollama");
            assert_eq!(settings.model, "qwen2.5-coder");
            assert_eq!(settings.base_url.as_deref(), Some("gpu.lan:11434"));
        },
    );
}

#[test]
#[serial]
fn test_invalid_numbers_fall_back_to_defaults() {
    let home = tempfile::tempdir().unwrap();

    with_env(
        home.path(),
        &[("NSCM_TIMEOUT", "soon"), ("NSCM_MAX_DIFF_LINES", "-4")],
        || {
            let settings = resolve_from_environment();
            assert_eq!(settings.timeout, Duration::from_secs(20));
            assert_eq!(settings.max_diff_lines, DEFAULT_MAX_DIFF_LINES);
        },
    );
}

#[test]
#[serial]
fn test_git_timeout_from_process_env() {
    temp_env::with_var(GIT_TIMEOUT_ENV_VAR, Some("7"), || {
        assert_eq!(
            git_timeout(|key| std::env::var(key).ok()),
            Duration::from_secs(7)
        );
    });

    temp_env::with_var_unset(GIT_TIMEOUT_ENV_VAR, || {
        assert_eq!(
            git_timeout(|key| std::env::var(key).ok()),
            Duration::from_secs(30)
        );
    });
}
