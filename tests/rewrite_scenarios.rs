/// Rewrite scenarios for the net package targets.
/// Each case writes a Go file to disk, rewrites it and compares the full output.

use std::fs;
use std::path::Path;

use go_net_overlay::domain::target::TargetKind;
use go_net_overlay::infrastructure::go_syntax::TreeSitterGoParser;
use go_net_overlay::infrastructure::matcher::match_file;
use go_net_overlay::infrastructure::rewriter::{RewriteOptions, SourceRewriter};
use go_net_overlay::ports::GoParser;
use go_net_overlay::PatchError;
use tempfile::tempdir;

fn rewrite_on_disk(source: &str) -> Result<String, PatchError> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("net.go");
    fs::write(&path, source).unwrap();
    let rewriter = SourceRewriter::new(&TreeSitterGoParser, RewriteOptions::default());
    rewriter.rewrite_file(&path).map(|src| src.content)
}

const DIAL_SOURCE: &str = r#"package net

import (
	"context"
	"time"
)

// DialContext connects to the address on the named network using
// the provided context.
func DialContext(ctx context.Context, network, address string) (Conn, error) {
	d := &Dialer{Timeout: 30 * time.Second}
	return d.DialContext(ctx, network, address)
}

type Dialer struct {
	Timeout time.Duration
}

func (d *Dialer) DialContext(ctx context.Context, network, address string) (Conn, error) {
	// implementation here
	return nil, nil
}

type Conn interface{}
"#;

const DIAL_EXPECTED: &str = r#"package net

import (
	"context"
	"time"
	_ "unsafe"
)

// DialContext connects to the address on the named network using
// the provided context.
func DialContext(ctx context.Context, network, address string) (Conn, error) {
	d := &Dialer{Timeout: 30 * time.Second}
	return d.DialContext(ctx, network, address)
}

type Dialer struct {
	Timeout time.Duration
}

func (d *Dialer) DialContext(ctx context.Context, network, address string) (Conn, error) {
	return _dialContext(ctx, network, address)
}

type Conn interface{}

//go:linkname _dialContext github.com/goccy/wasi-go-net/wasip1.DialContext
func _dialContext(ctx context.Context, network string, address string) (Conn, error)
"#;

const LISTEN_SOURCE: &str = r#"package net

import (
	"syscall"
)

// Listen announces on the local network address.
func Listen(network, address string) (Listener, error) {
	var la Addr
	switch network {
	case "tcp", "tcp4", "tcp6":
		la, _ = ResolveTCPAddr(network, address)
	}
	return ListenTCP(network, la.(*TCPAddr))
}

type Listener interface{}
type Addr interface{}
type TCPAddr struct{}

func ListenTCP(network string, laddr *TCPAddr) (Listener, error) {
	// implementation here
	return nil, nil
}
"#;

const LISTEN_EXPECTED: &str = r#"package net

import (
	"syscall"
	_ "unsafe"
)

// Listen announces on the local network address.
func Listen(network, address string) (Listener, error) {
	return _listen(network, address)
}

type Listener interface{}
type Addr interface{}
type TCPAddr struct{}

func ListenTCP(network string, laddr *TCPAddr) (Listener, error) {
	// implementation here
	return nil, nil
}

//go:linkname _listen github.com/goccy/wasi-go-net/wasip1.Listen
func _listen(network string, address string) (Listener, error)
"#;

#[test]
fn test_dial_context_only() {
    let out = rewrite_on_disk(DIAL_SOURCE).unwrap();
    assert_eq!(out, DIAL_EXPECTED);
    assert_eq!(out.matches("//go:linkname _dialContext").count(), 1);
    assert!(!out.contains("_listen"));
    assert_eq!(out.matches("_ \"unsafe\"").count(), 1);
}

#[test]
fn test_listen_only() {
    let out = rewrite_on_disk(LISTEN_SOURCE).unwrap();
    assert_eq!(out, LISTEN_EXPECTED);
    assert!(!out.contains("_dialContext"));
}

#[test]
fn test_dial_context_and_listen() {
    let source = format!(
        "{}\n{}",
        DIAL_SOURCE,
        r#"// Listen announces on the local network address.
func Listen(network, address string) (Listener, error) {
	return nil, nil
}

type Listener interface{}
"#
    );
    let out = rewrite_on_disk(&source).unwrap();

    assert_eq!(out.matches("//go:linkname _dialContext").count(), 1);
    assert_eq!(out.matches("//go:linkname _listen").count(), 1);
    assert_eq!(out.matches("_ \"unsafe\"").count(), 1);
    assert!(out.contains(
        "func Listen(network, address string) (Listener, error) {\n\treturn _listen(network, address)\n}"
    ));
    assert!(out.ends_with(
        "\n//go:linkname _dialContext github.com/goccy/wasi-go-net/wasip1.DialContext\n\
         func _dialContext(ctx context.Context, network string, address string) (Conn, error)\n\
         \n//go:linkname _listen github.com/goccy/wasi-go-net/wasip1.Listen\n\
         func _listen(network string, address string) (Listener, error)\n"
    ));
}

#[test]
fn test_existing_marker_import_is_not_duplicated() {
    let source = DIAL_SOURCE.replace("\t\"time\"\n)", "\t\"time\"\n\t_ \"unsafe\"\n)");
    let out = rewrite_on_disk(&source).unwrap();
    assert_eq!(out, DIAL_EXPECTED);
}

#[test]
fn test_rewriting_output_again_keeps_single_import() {
    let once = rewrite_on_disk(DIAL_SOURCE).unwrap();
    let twice = rewrite_on_disk(&once).unwrap();
    assert_eq!(twice.matches("\"unsafe\"").count(), 1);
}

#[test]
fn test_file_without_targets_is_rejected() {
    let source = "package net\n\nfunc (lc *ListenConfig) Listen(network, address string) (Listener, error) {\n\treturn nil, nil\n}\n";
    match rewrite_on_disk(source).unwrap_err() {
        PatchError::NoTargetFunctions { path } => assert!(path.ends_with("net.go")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unparsable_file_is_parse_error() {
    match rewrite_on_disk("package net\n\nfunc Listen(network string {\n").unwrap_err() {
        PatchError::Parse { path, .. } => assert!(path.ends_with("net.go")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_file_is_read_error() {
    let rewriter = SourceRewriter::new(&TreeSitterGoParser, RewriteOptions::default());
    let err = rewriter.rewrite_file(Path::new("/nonexistent/net.go")).unwrap_err();
    assert!(matches!(err, PatchError::Read { .. }));
}

#[test]
fn test_output_is_stable_and_still_matches() {
    let out = rewrite_on_disk(DIAL_SOURCE).unwrap();

    // Redirected bodies and the marker import are already in final form, so a second
    // pass only appends another stub.
    let again = rewrite_on_disk(&out).unwrap();
    let tail = again.strip_prefix(out.as_str()).unwrap();
    assert_eq!(
        tail,
        "\n//go:linkname _dialContext github.com/goccy/wasi-go-net/wasip1.DialContext\n\
         func _dialContext(ctx context.Context, network string, address string) (Conn, error)\n"
    );

    let file = TreeSitterGoParser.parse(&out).unwrap();
    let result = match_file("net.go", &file, &TargetKind::ALL);
    assert!(result.has(TargetKind::DialContext));
    let stub = file.funcs.iter().find(|f| f.name == "_dialContext").unwrap();
    assert!(stub.body.is_none());
}
