//! Configuration loading tests

use refguard::access_control::{
    AccessGrant, Actor, ProtectedAction, ProtectedRefRegistry, RefKind, RoleTier,
};
use refguard::config::{LogFormat, load_config, load_config_from_str};

const MINIMAL_CONFIG: &str = r#"
[project]
default_branch = "main"

[[protected_refs]]
name = "main"
push = [{ role = "maintainer" }]
"#;

const FULL_CONFIG: &str = r#"
[logging]
level = "debug"
format = "json"

[features]
deploy_key_grants = true

[project]
empty_repository = false
default_branch_protected = true
default_branch = "main"

[extensions]
code_owner_approval = true
restricted_unprotect = true
unprotect_min_role = "owner"

[[protected_refs]]
name = "main"
code_owner_approval_required = true
push = [{ role = "maintainer" }, { deploy_key = 21 }]
merge = [{ role = "developer" }]
unprotect = [{ role = "owner" }]

[[protected_refs]]
name = "release/*"
push = [{ group = 7 }, { user = 3 }]
merge = [{ role = "maintainer" }]

[[protected_refs]]
name = "v*"
kind = "tag"
created_at = "2021-01-28T14:02:32Z"
push = [{ role = "maintainer" }]
"#;

#[test]
fn test_minimal_config() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert_eq!(config.project.default_branch, "main");
    assert_eq!(config.protected_refs.len(), 1);
    assert_eq!(config.protected_refs[0].kind, RefKind::Branch);
    assert!(config.protected_refs[0].unprotect.is_empty());
    assert!(!config.features.deploy_key_grants);
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    // Logging
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    // Features and extensions
    assert!(config.features.deploy_key_grants);
    assert!(config.extensions.code_owner_approval);
    assert_eq!(config.extensions.unprotect_min_role, RoleTier::Owner);

    // Protected refs
    assert_eq!(config.protected_refs.len(), 3);
    assert_eq!(
        config.protected_refs[1].push,
        vec![AccessGrant::Group(7), AccessGrant::User(3)]
    );
    assert_eq!(config.protected_refs[2].kind, RefKind::Tag);
}

#[test]
fn test_full_config_evaluates() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();
    let project = config.snapshot();
    let evaluator = config.evaluator();

    let deploy_key = Actor::new(100, RoleTier::NoAccess).with_deploy_key(21);
    assert!(evaluator.can_perform(
        &deploy_key,
        ProtectedAction::Push,
        "main",
        RefKind::Branch,
        &project
    ));

    let group_member = Actor::new(9, RoleTier::Reporter).with_groups([7]);
    assert!(evaluator.can_perform(
        &group_member,
        ProtectedAction::Push,
        "release/2.1",
        RefKind::Branch,
        &project
    ));
    assert!(!evaluator.can_perform(
        &group_member,
        ProtectedAction::Merge,
        "release/2.1",
        RefKind::Branch,
        &project
    ));

    // restricted_unprotect with owner minimum blocks maintainers on open specs
    let maintainer = Actor::new(2, RoleTier::Maintainer);
    assert!(!evaluator.can_perform(
        &maintainer,
        ProtectedAction::Unprotect,
        "release/2.1",
        RefKind::Branch,
        &project
    ));

    assert!(evaluator.requires_code_owner_approval("main", &project));
}

#[test]
fn test_registry_from_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();
    let project = config.snapshot();
    let registry = ProtectedRefRegistry::new(&project.specs);

    assert!(registry.is_protected("release/9", RefKind::Branch, &project.state));
    assert!(!registry.is_protected("feature", RefKind::Branch, &project.state));
    assert!(registry.is_protected("v2.0", RefKind::Tag, &project.state));
    assert_eq!(registry.by_name("REL").len(), 1);
}

#[test]
fn test_invalid_grant_kind() {
    let config_str = r#"
[[protected_refs]]
name = "main"
push = [{ robot = 1 }]
"#;

    assert!(load_config_from_str(config_str).is_err());
}

#[test]
fn test_invalid_ref_kind() {
    let config_str = r#"
[[protected_refs]]
name = "main"
kind = "commit"
"#;

    assert!(load_config_from_str(config_str).is_err());
}

#[test]
fn test_missing_file_error() {
    let result = load_config(Some("/nonexistent/refguard.toml"));
    assert!(result.is_err());
}

#[test]
#[serial_test::serial]
fn test_load_config_from_file() {
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("refguard.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.protected_refs[0].name, "main");
}

#[test]
#[serial_test::serial]
fn test_env_var_overrides_file() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("refguard.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    unsafe {
        env::set_var("REFGUARD__PROJECT__EMPTY_REPOSITORY", "true");
        env::set_var("REFGUARD__FEATURES__DEPLOY_KEY_GRANTS", "true");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("REFGUARD__PROJECT__EMPTY_REPOSITORY");
        env::remove_var("REFGUARD__FEATURES__DEPLOY_KEY_GRANTS");
    }

    let config = config.unwrap();
    assert!(config.project.empty_repository);
    assert!(config.features.deploy_key_grants);
    // File values are kept
    assert_eq!(config.protected_refs.len(), 1);
}

#[test]
#[serial_test::serial]
fn test_env_var_default_branch() {
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("refguard.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    unsafe {
        env::set_var("REFGUARD__PROJECT__DEFAULT_BRANCH", "trunk");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("REFGUARD__PROJECT__DEFAULT_BRANCH");
    }

    assert_eq!(config.unwrap().project.default_branch, "trunk");
}
