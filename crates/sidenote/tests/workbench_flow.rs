//! End-to-end comment editing flows through the workbench surface.

use pretty_assertions::assert_eq;
use sidenote::{
    CommentSyntax, Config, ConfigFile, EditConfig, RenderConfig, RenderMode, RenderRule, Workbench,
};

fn config_with(policy: &str, keep_open: bool) -> Config {
    let mut cfg = Config {
        file: ConfigFile {
            edit: EditConfig {
                policy: policy.to_string(),
                keep_open_on_save: keep_open,
            },
            render: RenderConfig::default(),
        },
        ..Config::default()
    };
    cfg.resolve();
    cfg
}

const DOUBLER: &str = "\
fn scale(v: u32) -> u32 {
    // Doubles the input.
    // Overflow is the caller's problem.
    v * 2
}
";

#[test]
fn edit_save_round_trip_rewrites_the_block_in_place() {
    let mut bench = Workbench::from_language("scale.rs", DOUBLER, "rust").unwrap();
    let id = bench.start_edit(32).unwrap();
    assert_eq!(
        bench.working(id).unwrap().as_str(),
        "Doubles the input.\nOverflow is the caller's problem.\n"
    );

    bench
        .working_mut(id)
        .unwrap()
        .set("Doubles the input, saturating.\n");
    let saved = bench.save(id).unwrap();
    assert!(saved.closed.is_some());
    assert_eq!(
        bench.text(),
        "fn scale(v: u32) -> u32 {\n    // Doubles the input, saturating.\n    v * 2\n}\n"
    );
}

const NOTES: &str = "\
const A: u8 = 1;

// First note.

// Second note.
const B: u8 = 2;
";

#[test]
fn restricted_policy_edits_one_block_between_blanks() {
    let syntax = CommentSyntax::for_language("rust").unwrap();
    let mut bench =
        Workbench::with_config("notes.rs", NOTES, syntax, config_with("restricted", false))
            .unwrap();
    let id = bench.start_edit(36).unwrap();
    assert_eq!(bench.working(id).unwrap().as_str(), "Second note.\n");

    bench.working_mut(id).unwrap().set("Second note, expanded.\n");
    bench.save(id).unwrap();
    assert_eq!(
        bench.text(),
        "const A: u8 = 1;\n\n// First note.\n\n// Second note, expanded.\nconst B: u8 = 2;\n"
    );
}

#[test]
fn keep_open_config_saves_without_closing() {
    let syntax = CommentSyntax::for_language("rust").unwrap();
    let mut bench =
        Workbench::with_config("notes.rs", "// v1\n", syntax, config_with("unrestricted", true))
            .unwrap();
    let id = bench.start_edit(1).unwrap();

    bench.working_mut(id).unwrap().set("v2\n");
    let saved = bench.save(id).unwrap();
    assert!(saved.closed.is_none());
    assert_eq!(bench.text(), "// v2\n");

    // Still open, so the next round edits the same session.
    bench.working_mut(id).unwrap().set("v3\n");
    let last = bench.save_with(id, false).unwrap();
    assert!(last.closed.is_some());
    assert_eq!(bench.text(), "// v3\n");
    assert!(bench.working(id).is_none());
}

#[test]
fn host_render_rules_drive_session_mode() {
    let mut bench = Workbench::from_language("r.rs", "// text\n", "rust").unwrap();
    bench.rules_mut().push(RenderRule::constant(
        "rust-prose",
        |lang| lang == "rust",
        RenderMode::Prose,
    ));
    let id = bench.start_edit(1).unwrap();
    let session = bench.session(id).unwrap();
    assert_eq!(session.render(), RenderMode::Prose);
    assert!(!session.render_fallback());
}

#[test]
fn external_edits_respect_the_session_guard() {
    let mut bench = Workbench::from_language("g.rs", "// locked\nfree\n", "rust").unwrap();
    let id = bench.start_edit(1).unwrap();

    assert!(bench.document_mut().splice(3, 9, "x").is_err());
    bench.document_mut().splice(12, 14, "EE").unwrap();
    assert_eq!(bench.text(), "// locked\nfrEE\n");

    bench.discard(id).unwrap();
    assert!(bench.document_mut().splice(3, 9, "x").is_ok());
}
