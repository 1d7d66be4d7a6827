use std::process::Command;

fn turngrid(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_turngrid"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch the turngrid binary")
}

#[test]
fn default_scenario_plays_the_requested_rounds() {
    let output = turngrid(&["--rounds", "2", "--seed", "7"]);
    assert!(
        output.status.success(),
        "turngrid failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("== Round 1 =="));
    assert!(stdout.contains("== Round 2 =="));
    assert!(!stdout.contains("== Round 3 =="));
    assert!(stdout.contains("Ana picks up a Key"));
    assert!(stdout.contains("Ana gives a Key to Bo"), "{stdout}");
    assert!(stdout.contains("Bo (#2) at (1, 5)"));
}

#[test]
fn exported_layouts_can_be_played_back() {
    let exported = turngrid(&["--export-layout"]);
    assert!(exported.status.success());
    let layout = String::from_utf8_lossy(&exported.stdout).trim().to_owned();
    assert!(layout.starts_with("grid:v1:10x8:"), "unexpected layout {layout}");

    let replay = turngrid(&["--layout", &layout, "--rounds", "1", "--quiet-map"]);
    assert!(
        replay.status.success(),
        "replay failed: {}",
        String::from_utf8_lossy(&replay.stderr)
    );
    let stdout = String::from_utf8_lossy(&replay.stdout);
    assert!(stdout.contains("== Round 1 =="));
    assert!(!stdout.contains("...."), "the map is not drawn");
}

#[test]
fn missing_scenario_files_are_reported() {
    let output = turngrid(&["--scenario", "does/not/exist.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read scenario"));
}
