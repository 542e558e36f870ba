use std::path::Path;
use std::process::{Command, Output};

const LIB: &str = "\
use std::fmt;

// Adds one.
pub fn add(a: u8) -> u8 {
    a.saturating_add(1)
}

/// A mesh.
#[derive(Debug)]
pub struct Mesh {
    /// Vertex count.
    pub vertices: usize,
}
";

fn docstitch(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docstitch"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

/// A project with `engine/src/lib.rs` and one scenario per `(name, body)`.
fn project(scenarios: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("engine/src")).unwrap();
    std::fs::write(dir.path().join("engine/src/lib.rs"), LIB).unwrap();
    std::fs::create_dir_all(dir.path().join("scenarios")).unwrap();
    for (name, body) in scenarios {
        let content = format!("engine\nhttps://example.com/engine/\n\n{body}");
        std::fs::write(dir.path().join("scenarios").join(name), content).unwrap();
    }
    dir
}

#[test]
fn build_writes_pages_in_document_order() {
    let dir = project(&[(
        "guide",
        "# Guide\n\nStart here.\n@decl ~.lib::add\nThen the type.\n@def ~.lib::Mesh\nDone.\n",
    )]);

    let out = docstitch(dir.path(), &["build"]);
    assert!(out.status.success(), "build failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Finished in "));

    let html = std::fs::read_to_string(dir.path().join("output/guide.html")).unwrap();
    let needles = [
        "<h1>Guide</h1>",
        "Start here.",
        "href=\"https://example.com/engine/src/lib.rs#L4\"",
        "<p>Adds one.</p>",
        "pub fn add(a: u8) -&gt; u8",
        "Then the type.",
        "lib.rs::Mesh",
        "<p>A mesh.</p>",
        "#[derive(Debug)]",
        "<p>Vertex count.</p>",
        "Done.",
    ];
    let mut last = 0;
    for needle in needles {
        let at = html
            .find(needle)
            .unwrap_or_else(|| panic!("missing `{needle}` in:\n{html}"));
        assert!(at >= last, "`{needle}` out of order in:\n{html}");
        last = at;
    }
    assert!(!html.contains("saturating_add"), "declaration mode leaked the body:\n{html}");
}

#[test]
fn failing_command_exits_nonzero_and_names_it() {
    let dir = project(&[("broken", "Intro.\n@decl ~.lib::substract\n")]);

    let out = docstitch(dir.path(), &["build"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("@decl ~.lib::substract"), "stderr: {stderr}");
    assert!(stderr.contains("Declaration Not Found"), "stderr: {stderr}");
}

#[test]
fn unknown_verb_is_reported() {
    let dir = project(&[("page", "@include ~.lib::add\n")]);

    let out = docstitch(dir.path(), &["build"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown Command"), "stderr: {stderr}");
    assert!(stderr.contains("`@decl`"), "stderr: {stderr}");
}

#[test]
fn config_and_flags_choose_directories() {
    let dir = project(&[("page", "Hello.\n")]);
    std::fs::write(dir.path().join(".docstitch.toml"), "output = \"site\"\n").unwrap();

    let out = docstitch(dir.path(), &["build"]);
    assert!(out.status.success(), "build failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("site/page.html").exists());

    let out = docstitch(dir.path(), &["build", "--output", "public"]);
    assert!(out.status.success(), "build failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("public/page.html").exists());
}

#[test]
fn extract_prints_fragments() {
    let dir = project(&[]);

    let out = docstitch(dir.path(), &["extract", "engine", "~.lib::add", "--url", "https://x"]);
    assert!(out.status.success(), "extract failed: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout,
        "##### [lib.rs::add](https://x/src/lib.rs#L4)\n\nAdds one.\n\n```rust\npub fn add(a: u8) -> u8\n```\n"
    );
}

#[test]
fn list_reports_declarations_as_json() {
    let dir = project(&[]);

    let out = docstitch(dir.path(), &["list", "engine/src/lib.rs", "--json"]);
    assert!(out.status.success(), "list failed: {}", String::from_utf8_lossy(&out.stderr));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["add", "Mesh"]);
    assert_eq!(json[0]["kind"], "function");
    assert_eq!(json[0]["line"], 4);
}
