mod common;

use std::fs;
use std::path::{Path, PathBuf};

use notes_viewer::publish::Publisher;
use notes_viewer::Error;
use speculate2::speculate;
use tempfile::TempDir;

use common::{sample_notes, write};

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

/// Every file under `dir`, relative path and contents, sorted.
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = files_under(dir)
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).expect("Failed to read staged file");
            (path.strip_prefix(dir).unwrap().to_path_buf(), bytes)
        })
        .collect();
    files.sort();
    files
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Bad dir entry").path();
        if path.is_dir() {
            out.extend(files_under(&path));
        } else {
            out.push(path);
        }
    }
    out
}

speculate! {
    before {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let notes = tmp.path().join("notes");
        let viewer = tmp.path().join("viewer");
        let public = viewer.join("public");
        fs::create_dir_all(&notes).expect("Failed to create notes dir");
        fs::create_dir_all(&viewer).expect("Failed to create viewer dir");
        let publisher = Publisher::new(&notes, &viewer, &public);
    }

    describe "build" {
        it "stages documents with their directory structure" {
            sample_notes(&notes);

            let report = publisher.build().expect("Build failed");

            assert!(report.is_clean());
            assert_eq!(read(&public.join("notes/a/x.html")), "<h1>x</h1>");
            assert_eq!(read(&public.join("notes/b/y.html")), "<h1>y</h1>");
            assert!(!public.join("notes/index.html").exists());
        }

        it "writes a sorted, indented manifest" {
            sample_notes(&notes);

            publisher.build().expect("Build failed");

            assert_eq!(
                read(&public.join("files.json")),
                "[\n  \"a/x.html\",\n  \"b/y.html\"\n]"
            );
        }

        it "writes non-ASCII paths literally" {
            write(&notes, "网络/TCP.html", "tcp");

            publisher.build().expect("Build failed");

            assert_eq!(read(&public.join("files.json")), "[\n  \"网络/TCP.html\"\n]");
        }

        it "writes an empty manifest for an empty tree" {
            let report = publisher.build().expect("Build failed");

            assert!(report.manifest.is_empty());
            assert_eq!(read(&public.join("files.json")), "[]");
            assert!(public.join("notes").is_dir());
        }

        it "copies the stylesheet to both locations" {
            sample_notes(&notes);

            publisher.build().expect("Build failed");

            assert_eq!(read(&public.join("style.css")), "body { margin: 0 }");
            assert_eq!(read(&public.join("notes/style.css")), "body { margin: 0 }");
        }

        it "copies the viewer files that exist" {
            write(&viewer, "index.html", "<html>viewer</html>");
            write(&viewer, "viewer.js", "console.log(1)");

            let report = publisher.build().expect("Build failed");

            assert_eq!(read(&public.join("index.html")), "<html>viewer</html>");
            assert_eq!(read(&public.join("viewer.js")), "console.log(1)");
            assert!(!public.join("viewer.css").exists());
            assert!(report.is_clean());
        }

        it "is idempotent" {
            sample_notes(&notes);
            write(&viewer, "viewer.css", ".v {}");

            publisher.build().expect("First build failed");
            let first = snapshot(&public);
            publisher.build().expect("Second build failed");
            let second = snapshot(&public);

            assert_eq!(first, second);
        }

        it "picks up edits on the next build" {
            sample_notes(&notes);
            publisher.build().expect("First build failed");

            write(&notes, "a/x.html", "<h1>x v2</h1>");
            publisher.build().expect("Second build failed");

            assert_eq!(read(&public.join("notes/a/x.html")), "<h1>x v2</h1>");
        }

        it "fails when the notes root is missing" {
            let publisher = Publisher::new(tmp.path().join("missing"), &viewer, &public);

            let err = publisher.build().unwrap_err();

            assert!(matches!(err, Error::MissingRoot { .. }));
            assert!(!public.join("files.json").exists());
        }
    }

    describe "copy failures" {
        it "skip the bad document and stage the rest" {
            sample_notes(&notes);
            // A directory where the staged file should go makes the copy fail.
            let blocked = public.join("notes").join("b").join("y.html");
            fs::create_dir_all(&blocked).expect("Failed to create blocking dir");

            let report = publisher.build().expect("Build failed");

            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].source, notes.join("b").join("y.html"));
            assert_eq!(report.failed[0].target, blocked);
            assert_eq!(read(&public.join("files.json")), "[\n  \"a/x.html\"\n]");
            assert_eq!(read(&public.join("notes/a/x.html")), "<h1>x</h1>");
            assert_eq!(read(&public.join("notes/style.css")), "body { margin: 0 }");
        }

        it "skip a bad stylesheet copy and keep the other" {
            sample_notes(&notes);
            let blocked = public.join("style.css");
            fs::create_dir_all(&blocked).expect("Failed to create blocking dir");

            let report = publisher.build().expect("Build failed");

            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].source, notes.join("style.css"));
            assert_eq!(report.failed[0].target, blocked);
            assert_eq!(read(&public.join("notes/style.css")), "body { margin: 0 }");
            assert_eq!(
                read(&public.join("files.json")),
                "[\n  \"a/x.html\",\n  \"b/y.html\"\n]"
            );
        }
    }

    describe "layout" {
        it "refuses a publish directory inside the notes root" {
            sample_notes(&notes);
            let inside = notes.join("public");

            let err = Publisher::new(&notes, &viewer, &inside).build().unwrap_err();

            assert!(matches!(err, Error::PublishInsideNotes { .. }));
            assert!(!inside.exists());
        }
    }

    describe "stale entries" {
        it "are kept by default" {
            sample_notes(&notes);
            publisher.build().expect("First build failed");

            fs::remove_file(notes.join("b/y.html")).expect("Failed to delete note");
            let report = publisher.build().expect("Second build failed");

            assert!(public.join("notes/b/y.html").exists());
            assert!(report.pruned.is_empty());
            assert_eq!(read(&public.join("files.json")), "[\n  \"a/x.html\"\n]");
        }

        it "are removed with pruning enabled" {
            sample_notes(&notes);
            publisher.build().expect("First build failed");

            fs::remove_file(notes.join("b/y.html")).expect("Failed to delete note");
            let report = publisher.clone().with_prune(true).build().expect("Second build failed");

            assert_eq!(report.pruned, vec![public.join("notes").join("b").join("y.html")]);
            assert!(!public.join("notes/b").exists());
            assert!(public.join("notes/a/x.html").exists());
            assert!(public.join("notes/style.css").exists());
        }
    }
}
