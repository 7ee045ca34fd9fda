//! Integration tests for mod manager profile detection

use camino::{Utf8Path, Utf8PathBuf};
use map_installer::services::find_active_profile;
use map_installer::services::profile_detection::most_recent_modification;
use std::fs::{self, File};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn touch(path: &Utf8Path, age: Duration) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

#[test]
fn test_picks_profile_with_newest_plugin_file() {
    let (_temp_dir, root) = temp_root();
    touch(&root.join("Default/BepInEx/plugins/a.dll"), Duration::from_secs(7200));
    touch(&root.join("Modded/BepInEx/plugins/Mod/Maps/x.cok"), Duration::from_secs(10));
    touch(&root.join("Vanilla/BepInEx/plugins/b.dll"), Duration::from_secs(600));

    let active = find_active_profile(&root, "BepInEx/plugins").unwrap();

    assert_eq!(active, Some(root.join("Modded/BepInEx/plugins")));
}

#[test]
fn test_files_outside_plugins_are_ignored() {
    let (_temp_dir, root) = temp_root();
    touch(&root.join("A/BepInEx/plugins/a.dll"), Duration::from_secs(3600));
    // Newer, but not under the plugin folder
    touch(&root.join("B/BepInEx/LogOutput.log"), Duration::from_secs(1));
    fs::create_dir_all(root.join("B/BepInEx/plugins")).unwrap();

    let active = find_active_profile(&root, "BepInEx/plugins").unwrap();

    assert_eq!(active, Some(root.join("A/BepInEx/plugins")));
}

#[test]
fn test_no_profiles() {
    let (_temp_dir, root) = temp_root();
    assert_eq!(find_active_profile(&root, "BepInEx/plugins").unwrap(), None);
}

#[test]
fn test_stray_files_in_profiles_dir_are_ignored() {
    let (_temp_dir, root) = temp_root();
    fs::write(root.join("profiles.json"), b"{}").unwrap();
    touch(&root.join("Only/BepInEx/plugins/a.dll"), Duration::from_secs(60));

    let active = find_active_profile(&root, "BepInEx/plugins").unwrap();

    assert_eq!(active, Some(root.join("Only/BepInEx/plugins")));
}

#[test]
fn test_most_recent_modification_is_recursive() {
    let (_temp_dir, root) = temp_root();
    touch(&root.join("top.txt"), Duration::from_secs(3600));
    touch(&root.join("a/b/c/deep.txt"), Duration::from_secs(5));

    let newest = most_recent_modification(&root).unwrap();
    let age = SystemTime::now().duration_since(newest).unwrap();

    assert!(age < Duration::from_secs(600));
}
