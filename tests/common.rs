use assert_cmd::Command;
use assert_cmd::cargo_bin_cmd;
use std::path::Path;

/// Get a command for the program which ignores the user's settings file
fn osemosys_prep_cmd(current_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("osemosys-prep");
    cmd.env("OSEMOSYS_PREP_USE_DEFAULT_SETTINGS", "1")
        .env("OSEMOSYS_PREP_LOG_LEVEL", "off")
        .current_dir(current_dir);
    cmd
}

pub fn assert_osemosys_prep_runs(args: &[&str], current_dir: &Path) {
    osemosys_prep_cmd(current_dir).args(args).assert().success();
}

#[allow(dead_code)]
pub fn assert_osemosys_prep_fails(args: &[&str], current_dir: &Path) {
    osemosys_prep_cmd(current_dir).args(args).assert().failure();
}

#[allow(dead_code)]
pub fn get_osemosys_prep_stdout(args: &[&str], current_dir: &Path) -> String {
    let output = osemosys_prep_cmd(current_dir).args(args).output().unwrap();
    assert!(output.status.success());

    String::from_utf8(output.stdout).unwrap()
}
