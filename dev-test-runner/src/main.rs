//! Smoke run over realistic shapes: print their bindings, then push sample
//! payloads through construct → JSON → construct and report each one.
use colored::Colorize;
use serde_json::{json, Value as Json};
use shape_idl::{render_binding, FieldSpec, ShapeType, Ty, Value};

fn point() -> ShapeType {
    ShapeType::builder()
        .field("x", Ty::INT)
        .field("y", FieldSpec::new(Ty::INT).optional().default(0))
        .build()
        .expect("point shape")
}

/// Roughly what an image build step that installs files declares.
fn install_files(point: &ShapeType) -> ShapeType {
    let mode = ShapeType::new([
        ("user", FieldSpec::new(Ty::STR).default("root")),
        ("group", FieldSpec::new(Ty::STR).default("root")),
        ("mode", FieldSpec::new(Ty::INT).default(0o444)),
    ])
    .expect("mode shape");
    ShapeType::new([
        ("source", FieldSpec::new(Ty::STR)),
        ("dest", FieldSpec::new(Ty::STR)),
        ("kind", FieldSpec::new(Ty::enumeration(["file", "dir", "symlink"]).expect("enum"))),
        ("stat", FieldSpec::new(&mode).default(json!({}))),
        ("tags", FieldSpec::new(Ty::set(Ty::STR)).default(Value::List(vec![]))),
        ("xattrs", FieldSpec::new(Ty::dict(Ty::STR, Ty::STR).expect("dict")).optional()),
        ("anchor", FieldSpec::new(point).optional()),
    ])
    .expect("install_files shape")
}

fn samples() -> Vec<(&'static str, Json, bool)> {
    vec![
        ("minimal", json!({"source": "a", "dest": "/a", "kind": "file"}), true),
        (
            "everything",
            json!({
                "source": "bin/tool",
                "dest": "/usr/bin/tool",
                "kind": "file",
                "stat": {"mode": 0o755},
                "tags": ["bin", "tool"],
                "xattrs": {"security.capability": "cap_net_raw+ep"},
                "anchor": {"x": 3}
            }),
            true,
        ),
        ("unknown kind", json!({"source": "a", "dest": "/a", "kind": "fifo"}), false),
        (
            "duplicate tag",
            json!({"source": "a", "dest": "/a", "kind": "dir", "tags": ["x", "x"]}),
            false,
        ),
        ("extra field", json!({"source": "a", "dest": "/a", "kind": "dir", "owner": "me"}), false),
        (
            "bad nested",
            json!({"source": "a", "dest": "/a", "kind": "dir", "stat": {"mode": "rw"}}),
            false,
        ),
    ]
}

fn main() {
    let point = point();
    let install = install_files(&point);

    println!("{}", render_binding(&install, "InstallFiles").expect("binding"));

    eprintln!("—— testing round trips ——");
    let mut failed = 0;
    for (label, sample, should_pass) in samples() {
        let outcome = install.from_json(sample).and_then(|inst| {
            let text = inst.to_json_string();
            let back = install.from_json(serde_json::from_str(&text).expect("own output is JSON"))?;
            Ok((inst == back, text))
        });
        match (outcome, should_pass) {
            (Ok((true, text)), true) => eprintln!("{} {label}: {text}", "✅".green()),
            (Err(error), false) => eprintln!("{} {label}: rejected ({error})", "✅".green()),
            (Ok((false, text)), _) => {
                failed += 1;
                eprintln!("{} {label}: round trip changed the value: {text}", "❌".red());
            }
            (Ok((true, text)), false) => {
                failed += 1;
                eprintln!("{} {label}: accepted but should not be: {text}", "❌".red());
            }
            (Err(error), true) => {
                failed += 1;
                eprintln!("{} {label}: {error}", "❌".red());
            }
        }
    }
    if failed > 0 {
        std::process::exit(1);
    }
}
