//! Per-scenario fan-out and fan-in.
//!
//! Commands and renders run as independent blocking tasks. Handles are kept in
//! a vector indexed by the snippet's original position and awaited in that
//! order, so completion order never leaks into the document. Every handle is
//! awaited before the first failure (in position order) is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::Error;
use crate::extract::Extractor;
use crate::scenario::{classify, read_scenario};
use crate::types::Snippet;

/// Turns one markdown fragment into HTML.
pub type Renderer = fn(&str) -> Result<String, Error>;

/// A snippet slot: either already final or waiting on a task.
enum Pending<T> {
    /// Passed through unchanged.
    Ready(Snippet),
    /// Result of the task started for this position.
    Task(JoinHandle<Result<T, Error>>),
}

/// Await every slot in position order, then fail with the first error.
///
/// # Errors
///
/// Returns the first task error in position order, or `Error::TaskFailed`
/// if a task panicked.
async fn join_in_order<T>(
    slots: Vec<Pending<T>>,
    finish: impl Fn(T) -> Vec<Snippet>,
) -> Result<Vec<Snippet>, Error> {
    let mut results = Vec::with_capacity(slots.len());
    for slot in slots {
        let result = match slot {
            Pending::Ready(snippet) => Ok(vec![snippet]),
            Pending::Task(handle) => match handle.await {
                Ok(outcome) => outcome.map(&finish),
                Err(join) => Err(Error::TaskFailed(join)),
            },
        };
        results.push(result);
    }

    let mut snippets = Vec::with_capacity(results.len());
    for result in results {
        snippets.extend(result?);
    }
    return Ok(snippets);
}

/// Render a markdown fragment as GitHub-flavored markdown. Raw HTML in
/// scenario prose (badges, pictures) is passed through as written.
///
/// # Errors
///
/// Returns `Error::RenderFailed` if the fragment cannot be parsed.
pub fn render_html(markdown: &str) -> Result<String, Error> {
    let options = markdown::Options {
        compile: markdown::CompileOptions {
            allow_dangerous_html: true,
            ..markdown::CompileOptions::gfm()
        },
        parse: markdown::ParseOptions::gfm(),
    };
    return markdown::to_html_with_options(markdown, &options)
        .map_err(|e| return Error::RenderFailed { reason: e.to_string() });
}

/// Render one scenario file and write `<output>/<scenario-filename>.html`.
/// Returns the path written.
///
/// # Errors
///
/// Returns scenario, command, render, or I/O errors. Nothing is written
/// when a command fails.
pub async fn render_scenario(
    path: PathBuf,
    extractor: Arc<Extractor>,
    output: PathBuf,
) -> Result<PathBuf, Error> {
    let scenario = Arc::new(read_scenario(&path)?);
    let snippets = classify(&scenario.body_lines);

    let resolve = {
        let scenario = Arc::clone(&scenario);
        Arc::new(move |raw: &str| return extractor.resolve_command(raw, &scenario))
    };
    let resolved = resolve_commands(snippets, resolve).await?;
    let rendered = render_snippets(resolved, render_html).await?;

    let html: String = rendered
        .into_iter()
        .map(|snippet| {
            return match snippet {
                Snippet::Command(text) | Snippet::Html(text) | Snippet::Prose(text) => text,
            };
        })
        .collect();

    let name = path.file_name().map_or_else(
        || return "scenario".into(),
        |n| return n.to_string_lossy().into_owned(),
    );
    std::fs::create_dir_all(&output)?;
    let target = output.join(format!("{name}.html"));
    std::fs::write(&target, html)?;

    tracing::info!(scenario = %path.display(), output = %target.display(), "page written");
    return Ok(target);
}

/// Replace every command with the fragments it resolves to, in place.
///
/// # Errors
///
/// Returns the first failing command's error in document order.
pub async fn resolve_commands<F>(snippets: Vec<Snippet>, resolve: Arc<F>) -> Result<Vec<Snippet>, Error>
where
    F: Fn(&str) -> Result<Vec<String>, Error> + Send + Sync + 'static,
{
    let slots = snippets
        .into_iter()
        .map(|snippet| {
            let Snippet::Command(raw) = snippet else {
                return Pending::Ready(snippet);
            };
            let resolve = Arc::clone(&resolve);
            return Pending::Task(tokio::task::spawn_blocking(move || return resolve(&raw)));
        })
        .collect();

    return join_in_order(slots, |fragments: Vec<String>| {
        return fragments.into_iter().map(Snippet::Prose).collect();
    })
    .await;
}

/// Render every prose snippet to HTML, keeping positions.
///
/// # Errors
///
/// Returns `Error::UnresolvedCommand` if a command is still present.
pub async fn render_snippets(snippets: Vec<Snippet>, renderer: Renderer) -> Result<Vec<Snippet>, Error> {
    let slots = snippets
        .into_iter()
        .map(|snippet| {
            return match snippet {
                Snippet::Command(command) => Pending::Task(tokio::task::spawn(async move {
                    return Err(Error::UnresolvedCommand { command });
                })),
                Snippet::Html(_) => Pending::Ready(snippet),
                Snippet::Prose(text) => {
                    Pending::Task(tokio::task::spawn_blocking(move || return renderer(&text)))
                },
            };
        })
        .collect();

    return join_in_order(slots, |html: String| return vec![Snippet::Html(html)]).await;
}

/// Render every scenario concurrently, one task each. A failing scenario does
/// not stop the others; once all have finished, the first failure in input
/// order is returned.
///
/// # Errors
///
/// Returns the first scenario error, or `Error::TaskFailed` if a task panicked.
pub async fn run_all(
    scenarios: Vec<PathBuf>,
    extractor: Arc<Extractor>,
    output: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let handles: Vec<JoinHandle<Result<PathBuf, Error>>> = scenarios
        .into_iter()
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            return tokio::spawn(render_scenario(path, extractor, output.to_path_buf()));
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.map_err(Error::from).and_then(|r| return r));
    }

    let mut written = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(path) => written.push(path),
            Err(e) => {
                tracing::error!(error = %e, "scenario failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            },
        }
    }

    return match first_error {
        Some(e) => Err(e),
        None => Ok(written),
    };
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::config::Config;

    fn prose(text: &str) -> Snippet {
        Snippet::Prose(text.to_string())
    }

    fn command(text: &str) -> Snippet {
        Snippet::Command(text.to_string())
    }

    /// Earlier commands finish later than the ones after them.
    fn slow_first(raw: &str) -> Result<Vec<String>, Error> {
        let delay = match raw {
            "@first" => 80,
            "@second" => 40,
            _ => 0,
        };
        thread::sleep(Duration::from_millis(delay));
        Ok(vec![format!("{raw} header"), format!("{raw} body")])
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn completion_order_does_not_change_document_order() {
        let snippets = vec![
            prose("intro"),
            command("@first"),
            prose("middle"),
            command("@second"),
            command("@third"),
            prose("outro"),
        ];

        let resolved = resolve_commands(snippets, Arc::new(slow_first)).await.unwrap();
        assert_eq!(
            resolved,
            vec![
                prose("intro"),
                prose("@first header"),
                prose("@first body"),
                prose("middle"),
                prose("@second header"),
                prose("@second body"),
                prose("@third header"),
                prose("@third body"),
                prose("outro"),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn first_failure_in_document_order_wins() {
        let resolve = |raw: &str| -> Result<Vec<String>, Error> {
            if raw == "@slow-bad" {
                thread::sleep(Duration::from_millis(50));
            }
            Err(Error::UnknownCommand { verb: raw.to_string() })
        };
        let snippets = vec![command("@slow-bad"), command("@fast-bad")];
        let err = resolve_commands(snippets, Arc::new(resolve)).await.unwrap_err();
        assert!(matches!(err, Error::UnknownCommand { verb } if verb == "@slow-bad"));
    }

    #[tokio::test]
    async fn renders_each_fragment_in_place() {
        let snippets = vec![prose("a"), Snippet::Html("<hr />".to_string()), prose("b")];
        let rendered = render_snippets(snippets, |text| Ok(format!("<{text}>"))).await.unwrap();
        assert_eq!(
            rendered,
            vec![
                Snippet::Html("<a>".to_string()),
                Snippet::Html("<hr />".to_string()),
                Snippet::Html("<b>".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn command_reaching_render_is_an_error() {
        let err = render_snippets(vec![prose("a"), command("@decl x::y")], render_html)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedCommand { command } if command == "@decl x::y"));
    }

    #[test]
    fn markdown_renders_code_fences() {
        let html = render_html("```rust\nfn bar()\n```").unwrap();
        assert!(html.contains("class=\"language-rust\""), "fence label lost: {html}");
        assert!(html.contains("fn bar()"), "code lost: {html}");
    }

    #[test]
    fn raw_html_in_prose_passes_through() {
        let html = render_html("<img src=\"pic.png\" alt=\"badge\">").unwrap();
        assert!(html.contains("<img src=\"pic.png\" alt=\"badge\">"), "html was escaped: {html}");
        assert!(!html.contains("&lt;img"), "html was escaped: {html}");
    }

    #[test]
    fn gfm_tables_render() {
        let html = render_html("| a | b |\n| - | - |\n| 1 | 2 |").unwrap();
        assert!(html.contains("<table>"), "table not rendered: {html}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn scenario_page_keeps_line_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "// doc\nfn bar() { }\n").unwrap();
        let scenario = dir.path().join("page");
        std::fs::write(
            &scenario,
            format!(
                "{}\nhttps://example.com/repo\n\nintro text\n@decl ~.lib::bar\noutro text\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let output = dir.path().join("out");
        let extractor = Arc::new(Extractor::new(Config::default()));
        let written = render_scenario(scenario, extractor, output.clone()).await.unwrap();
        assert_eq!(written, output.join("page.html"));

        let html = std::fs::read_to_string(written).unwrap();
        let positions: Vec<usize> = [
            "intro text",
            "lib.rs::bar</a>",
            "<p>doc</p>",
            "fn bar()",
            "outro text",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap_or_else(|| panic!("missing {needle} in {html}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order: {html}");
    }

    #[tokio::test]
    async fn failing_scenario_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), format!("{}\nhttps://x\n\nfine\n", dir.path().display())).unwrap();
        std::fs::write(dir.path().join("b"), "only-one-line\n").unwrap();

        let output = dir.path().join("out");
        let extractor = Arc::new(Extractor::new(Config::default()));
        let scenarios = vec![dir.path().join("a"), dir.path().join("b")];
        let err = run_all(scenarios, extractor, &output).await.unwrap_err();
        assert!(matches!(err, Error::MalformedScenario { .. }));
        assert!(output.join("a.html").exists());
    }
}
