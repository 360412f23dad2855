//! In-process tests for the CLI runtime.

mod support;

use std::process::ExitCode;

use rstest::rstest;

use support::TestWorld;

#[rstest]
fn apply_corrections_sends_every_result_id() {
    let mut world = TestWorld::default();

    world
        .run("apply-corrections 7 9")
        .expect("fake server should finish cleanly");

    world.assert_exit(ExitCode::SUCCESS).expect("success");
    let command = world.commands.last().expect("a command was sent");
    assert_eq!(
        *command,
        serde_json::json!({"command": "apply-corrections", "results": [7, 9]})
    );
}

#[rstest]
fn cavities_are_listed_one_per_line() {
    let mut world = TestWorld::default();
    world.script.cavities = vec![
        String::from("3L01-1"),
        String::from("2L26-8"),
        String::from("2L26-8"),
    ];

    world.run("cavities").expect("fake server should finish cleanly");

    world.assert_exit(ExitCode::SUCCESS).expect("success");
    assert_eq!(world.stdout_text().expect("stdout"), "3L01-1\n2L26-8\n");
}

#[rstest]
fn all_cavities_uses_the_server_list() {
    let mut world = TestWorld::default();

    world
        .run("start --all-cavities --max-phase-error 5 --max-momentum-error 0.5 --kick-samples 8")
        .expect("fake server should finish cleanly");

    world.assert_exit(ExitCode::SUCCESS).expect("success");
    let start = world.commands.last().expect("a command was sent");
    assert_eq!(start["job"]["cavities"], serde_json::json!(["0L03-1", "0L03-2"]));
    assert_eq!(start["job"]["kick-samples"], serde_json::json!(8));
}

#[rstest]
fn unknown_cavities_are_refused_before_sending() {
    let mut world = TestWorld::default();

    world
        .run("start --max-phase-error 5 --max-momentum-error 0.5 --kick-samples 8 9L99-9")
        .expect("fake server should finish cleanly");

    world.assert_exit(ExitCode::FAILURE).expect("failure");
    assert!(
        world
            .stderr_text()
            .expect("stderr")
            .contains("unknown cavity 9L99-9")
    );
    assert_eq!(world.command_names(), vec!["version", "cavities"]);
}

#[rstest]
fn missing_command_is_a_usage_error() {
    let mut world = TestWorld::default();

    world.run_offline("").expect("closed port");

    world
        .assert_exit(ExitCode::from(2))
        .expect("usage exit status");
    assert!(world.stderr_text().expect("stderr").contains("Usage"));
}

#[rstest]
fn help_goes_to_stdout() {
    let mut world = TestWorld::default();

    world.run_offline("--help").expect("closed port");

    world.assert_exit(ExitCode::SUCCESS).expect("success");
    assert!(world.stdout_text().expect("stdout").contains("apply-corrections"));
}

#[rstest]
fn unreachable_server_is_reported() {
    let mut world = TestWorld::default();

    world.run_offline("pause").expect("closed port");

    world.assert_exit(ExitCode::FAILURE).expect("failure");
    assert!(
        world
            .stderr_text()
            .expect("stderr")
            .contains("failed to open session")
    );
}
