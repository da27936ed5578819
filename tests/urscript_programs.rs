// tests/urscript_programs.rs
use glam::{DQuat, DVec3};
use kinescript::{
    Action, ActionIds, ActionQueue, Addressing, CompileError, CompileOptions, Consume, MotionKind,
    Part, StateError, Tool, UrScript, compile,
};

fn queue_of(actions: Vec<Action>) -> ActionQueue {
    let mut queue = ActionQueue::new();
    for action in actions {
        queue.enqueue(action);
    }
    queue
}

fn inline() -> CompileOptions {
    CompileOptions::default()
}

#[test]
fn inline_program_shape_and_pin_diagnostic() {
    let ids = ActionIds::new();
    // Precision is set before the move so the motion instruction carries it;
    // pin 9 exceeds the UR dialect's 8 digital pins and must degrade to a
    // diagnostic comment without blocking the rest of the program.
    let mut queue = queue_of(vec![
        Action::precision_to(&ids, 5.0),
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
        Action::write_digital(&ids, 9, true),
    ]);

    let program = compile(&UrScript::new(), "approach", &mut queue, inline()).unwrap();

    assert_eq!(
        program,
        vec![
            "## PROGRAM \"approach\"",
            "## Compiled for URScript from a device-agnostic action sequence.",
            "## Machine-generated file, review before running on a physical device.",
            "",
            "def approach():",
            "",
            "  movel(p[0.3,0,0.5,0,0,0], a=1.2, v=0.25, r=0.005)",
            "  # ERROR on action 3 \"Turn digital IO 9 ON\": digital pin not available on this controller",
            "",
            "end",
            "",
            "approach()",
        ]
    );

    // Exactly one diagnostic, zero write instructions.
    let diagnostics = program
        .iter()
        .filter(|l| l.contains("ERROR on action 3"))
        .count();
    assert_eq!(diagnostics, 1);
    assert!(!program.iter().any(|l| l.contains("set_standard_digital_out")));
}

#[test]
fn variable_mode_declares_targets_with_index_jumps() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
        Action::speed_to(&ids, 200.0),
        Action::move_to(&ids, DVec3::new(100.0, 100.0, 500.0)),
    ]);

    let options = CompileOptions {
        addressing: Addressing::Variables,
        ..inline()
    };
    let program = compile(&UrScript::new(), "path", &mut queue, options).unwrap();

    assert_eq!(
        program,
        vec![
            "## PROGRAM \"path\"",
            "## Compiled for URScript from a device-agnostic action sequence.",
            "## Machine-generated file, review before running on a physical device.",
            "",
            "def path():",
            "",
            "  target0=p[0.3,0,0.5,0,0,0]",
            "  target2=p[0.1,0.1,0.5,0,0,0]",
            "",
            "  movel(target0, a=1.2, v=0.25, r=0)",
            "  movel(target2, a=1.2, v=0.2, r=0)",
            "",
            "end",
            "",
            "path()",
        ]
    );
}

#[test]
fn motion_kind_selects_instruction_and_parameter_units() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
        Action::motion(&ids, MotionKind::Joint),
        Action::move_to(&ids, DVec3::new(300.0, 100.0, 500.0)),
        Action::axes_to(&ids, kinescript::Joints::new(0.0, 90.0, 0.0, 0.0, 0.0, 0.0)),
    ]);

    let program = compile(&UrScript::new(), "kinds", &mut queue, inline()).unwrap();

    // Cartesian move: m/s² and m/s defaults. Joint-space move of the same
    // pose target: rad/s² and rad/s defaults. Axes always move joint-space.
    assert!(program.contains(&"  movel(p[0.3,0,0.5,0,0,0], a=1.2, v=0.25, r=0)".to_string()));
    assert!(program.contains(&"  movej(p[0.3,0.1,0.5,0,0,0], a=1.4, v=1.05, r=0)".to_string()));
    assert!(program.contains(&"  movej([0,1.570796,0,0,0,0], a=1.4, v=1.05, r=0)".to_string()));
}

#[test]
fn cursor_settings_convert_into_native_units() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::speed_to(&ids, 200.0),
        Action::acceleration_to(&ids, 2000.0),
        Action::precision_to(&ids, 5.0),
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
    ]);

    let program = compile(&UrScript::new(), "units", &mut queue, inline()).unwrap();
    assert!(program.contains(&"  movel(p[0.3,0,0.5,0,0,0], a=2, v=0.2, r=0.005)".to_string()));
}

#[test]
fn pose_orientation_renders_as_a_rotation_vector() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::rotate_to(&ids, DVec3::Z, 90.0),
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
    ]);

    let program = compile(&UrScript::new(), "orient", &mut queue, inline()).unwrap();
    // Both poses carry the same orientation: axis Z scaled by pi/2 radians.
    let motions: Vec<&String> = program.iter().filter(|l| l.contains("movel")).collect();
    assert_eq!(motions.len(), 2);
    assert!(motions[0].contains("p[0,0,0,0,0,1.570796]"));
    assert!(motions[1].contains("p[0.3,0,0.5,0,0,1.570796]"));
}

#[test]
fn io_messages_waits_and_comments_use_the_native_vocabulary() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::write_digital(&ids, 2, true),
        Action::write_analog(&ids, 1, 0.75),
        Action::message(&ids, "Hello"),
        Action::wait(&ids, 2500),
        Action::comment(&ids, "check the fixture"),
    ]);

    let program = compile(&UrScript::new(), "io", &mut queue, inline()).unwrap();
    assert!(program.contains(&"  set_standard_digital_out(2, True)".to_string()));
    assert!(program.contains(&"  set_standard_analog_out(1, 0.75)".to_string()));
    assert!(
        program.contains(
            &"  popup(\"Hello\", title=\"Message\", warning=False, error=False)".to_string()
        )
    );
    assert!(program.contains(&"  sleep(2.5)".to_string()));
    assert!(program.contains(&"  # check the fixture".to_string()));
}

#[test]
fn analog_value_out_of_range_degrades_to_a_diagnostic() {
    let ids = ActionIds::new();
    let bad = Action::write_analog(&ids, 0, 1.5);
    let bad_id = bad.id();
    let mut queue = queue_of(vec![bad, Action::write_analog(&ids, 0, 0.5)]);

    let program = compile(&UrScript::new(), "analog", &mut queue, inline()).unwrap();
    assert!(program.contains(&format!(
        "  # ERROR on action {bad_id} \"Set analog IO 0 to 1.5\": value out of range [0,1]"
    )));
    // The following valid action is unaffected.
    assert!(program.contains(&"  set_standard_analog_out(0, 0.5)".to_string()));
}

#[test]
fn unsupported_settings_warn_and_compilation_continues() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::rotation_speed_to(&ids, 45.0),
        Action::temperature_to(&ids, 210.0, Part::Extruder, false),
        Action::extrude(&ids, true),
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
    ]);

    let program = compile(&UrScript::new(), "warned", &mut queue, inline()).unwrap();
    let warnings = program.iter().filter(|l| l.contains("# WARNING")).count();
    assert_eq!(warnings, 3);
    assert!(program.contains(&"  movel(p[0.3,0,0.5,0,0,0], a=1.2, v=0.25, r=0)".to_string()));
}

#[test]
fn attach_and_detach_emit_tool_frames() {
    let ids = ActionIds::new();
    let tool = Tool::new("gripper", DVec3::new(0.0, 0.0, 120.0), DQuat::IDENTITY);
    let mut queue = queue_of(vec![Action::attach(&ids, tool), Action::detach(&ids)]);

    let program = compile(&UrScript::new(), "tooling", &mut queue, inline()).unwrap();
    assert!(program.contains(&"  set_tcp(p[0,0,0.12,0,0,0])".to_string()));
    assert!(program.contains(&"  set_tcp(p[0,0,0,0,0,0])".to_string()));
}

#[test]
fn annotation_suffixes_every_non_comment_instruction() {
    let ids = ActionIds::new();
    let mut queue = queue_of(vec![
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
        Action::comment(&ids, "unannotated"),
    ]);

    let options = CompileOptions {
        annotate: true,
        ..inline()
    };
    let program = compile(&UrScript::new(), "notes", &mut queue, options).unwrap();
    assert!(program.contains(
        &"  movel(p[0.3,0,0.5,0,0,0], a=1.2, v=0.25, r=0)  # [Move to [300,0,500] mm]".to_string()
    ));
    // A comment action is already a comment and gains no suffix.
    assert!(program.contains(&"  # unannotated".to_string()));
}

#[test]
fn two_runs_produce_byte_identical_output() {
    let build = |ids: &ActionIds| {
        queue_of(vec![
            Action::speed_to(ids, 200.0),
            Action::move_to(ids, DVec3::new(300.0, 0.0, 500.0)),
            Action::rotate_by(ids, DVec3::X, 30.0),
            Action::write_digital(ids, 2, true),
            Action::wait(ids, 500),
        ])
    };

    let mut first_queue = build(&ActionIds::new());
    let mut second_queue = build(&ActionIds::new());
    let first = compile(&UrScript::new(), "determinism", &mut first_queue, inline()).unwrap();
    let second = compile(&UrScript::new(), "determinism", &mut second_queue, inline()).unwrap();
    assert_eq!(first, second);

    // A non-draining compile is also repeatable against the same queue.
    let again = compile(&UrScript::new(), "determinism", &mut first_queue, inline()).unwrap();
    assert_eq!(first, again);
}

#[test]
fn block_consumption_compiles_one_export_unit() {
    let ids = ActionIds::new();
    let mut queue = ActionQueue::new();
    queue.enqueue(Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)));
    queue.close_block();
    queue.enqueue(Action::move_to(&ids, DVec3::new(0.0, 0.0, 500.0)));

    let options = CompileOptions {
        consume: Consume::Block,
        drain: true,
        ..inline()
    };
    let program = compile(&UrScript::new(), "unit", &mut queue, options).unwrap();

    let motions = program.iter().filter(|l| l.contains("movel")).count();
    assert_eq!(motions, 1);
    // Only the compiled block was drained.
    assert_eq!(queue.len(), 1);
}

#[test]
fn structural_failure_aborts_and_leaves_the_queue_untouched() {
    let ids = ActionIds::new();
    let pop = Action::pop_settings(&ids);
    let pop_id = pop.id();
    let mut queue = queue_of(vec![
        Action::move_to(&ids, DVec3::new(300.0, 0.0, 500.0)),
        pop,
        Action::move_to(&ids, DVec3::new(0.0, 0.0, 500.0)),
    ]);

    let options = CompileOptions {
        drain: true,
        ..inline()
    };
    let err = compile(&UrScript::new(), "doomed", &mut queue, options).unwrap_err();

    assert_eq!(
        err,
        CompileError::State(StateError::EmptySettingsStack { id: pop_id })
    );
    // All-or-nothing: no partial program, nothing drained.
    assert_eq!(queue.len(), 3);
}
