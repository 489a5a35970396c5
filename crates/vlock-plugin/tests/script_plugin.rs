//! Script plugins driven through real executables.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serial_test::serial;

use vlock_plugin::{DependencyKind, Hook, PluginError, PluginLoader, ScriptLoader};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn loader(dir: &Path) -> ScriptLoader {
    ScriptLoader::new(dir).with_grace(Duration::from_millis(100))
}

#[tokio::test]
#[serial]
async fn dependencies_come_from_relation_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_script(
        dir.path(),
        "blank",
        r#"case "$1" in
  requires) echo all ;;
  succeeds) printf 'new\nnosysrq\n' ;;
  conflicts) printf 'other\r\n' ;;
esac"#,
    );

    let plugin = loader(dir.path()).open("blank").await.expect("open");
    let deps = plugin.dependencies();

    assert_eq!(plugin.name(), "blank");
    assert_eq!(plugin.variant(), "script");
    assert_eq!(deps.get(DependencyKind::Requires), ["all"]);
    assert_eq!(deps.get(DependencyKind::Succeeds), ["new", "nosysrq"]);
    assert_eq!(deps.get(DependencyKind::Conflicts), ["other"]);
    assert!(deps.get(DependencyKind::Depends).is_empty());

    plugin.close().await;
}

#[tokio::test]
#[serial]
async fn hooks_are_written_one_per_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("hooks.log");
    write_script(
        dir.path(),
        "recorder",
        &format!(
            r#"case "$1" in
  hooks) while read -r hook; do echo "$hook" >> '{}'; done ;;
esac"#,
            log.display()
        ),
    );

    // Leave the child enough time to drain its stdin before teardown.
    let loader = ScriptLoader::new(dir.path()).with_grace(Duration::from_secs(3));
    let mut plugin = loader.open("recorder").await.expect("open");

    assert!(plugin.call_hook(Hook::Start).await);
    assert!(plugin.call_hook(Hook::Save).await);
    assert!(plugin.call_hook(Hook::SaveAbort).await);
    assert!(plugin.call_hook(Hook::End).await);
    plugin.close().await;

    let recorded = std::fs::read_to_string(&log).expect("hook log");
    assert_eq!(
        recorded,
        "vlock_start\nvlock_save\nvlock_save_abort\nvlock_end\n"
    );
}

#[tokio::test]
#[serial]
async fn missing_script_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");

    let err = loader(dir.path()).open("absent").await.expect_err("must fail");

    assert!(err.is_not_found());
}

#[tokio::test]
#[serial]
async fn non_executable_script_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plain");
    std::fs::write(&path, "#!/bin/sh\n").expect("write");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

    let err = loader(dir.path()).open("plain").await.expect_err("must fail");

    assert!(err.is_not_found());
}

#[tokio::test]
#[serial]
async fn slow_query_fails_instead_of_falling_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_script(dir.path(), "sleepy", "exec sleep 5");

    let started = Instant::now();
    let err = loader(dir.path()).open("sleepy").await.expect_err("must fail");

    assert!(matches!(err, PluginError::Failed { .. }));
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
#[serial]
async fn oversized_output_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_script(dir.path(), "chatty", "yes plugin | head -c 5000");

    let err = loader(dir.path()).open("chatty").await.expect_err("must fail");

    assert!(matches!(err, PluginError::Failed { .. }));
    assert!(err.to_string().contains("exceeds"));
}

#[tokio::test]
#[serial]
async fn exited_hook_process_marks_plugin_dead() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_script(dir.path(), "quitter", r#"[ "$1" = hooks ] && exit 0; exit 0"#);

    let mut plugin = loader(dir.path()).open("quitter").await.expect("open");

    // The first write may still land in the pipe before the child exits.
    plugin.call_hook(Hook::Start).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!plugin.call_hook(Hook::Save).await);
    assert!(!plugin.call_hook(Hook::SaveAbort).await);
    assert!(!plugin.call_hook(Hook::End).await);

    plugin.close().await;
}

#[tokio::test]
#[serial]
async fn failed_launch_marks_plugin_dead() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_script(dir.path(), "vanishing", "exit 0");

    let mut plugin = loader(dir.path()).open("vanishing").await.expect("open");
    std::fs::remove_file(&path).expect("remove");

    assert!(!plugin.call_hook(Hook::Start).await);

    // Restoring the script does not revive the plugin.
    write_script(dir.path(), "vanishing", "exit 0");
    assert!(!plugin.call_hook(Hook::End).await);

    plugin.close().await;
}
