//! Tests for the Go authority.

use super::*;
use crate::exec::MockCommandExecutor;
use crate::test_utils::{
    ExpectedCall, StubExecutor, canned, exit_status, failure_output, json_output,
};
use std::process::Output;

const LISTING: &str = r#"{
	"Path": "example.com/app",
	"Main": true,
	"Dir": "/work",
	"GoMod": "/work/go.mod"
}
{
	"Path": "golang.org/x/text",
	"Version": "v0.3.0",
	"Indirect": true
}
{
	"Path": "example.com/old",
	"Version": "v1.0.0",
	"Replace": {
		"Path": "example.com/new",
		"Version": "v2.0.0"
	}
}
"#;

fn workspace() -> &'static Utf8Path {
    Utf8Path::new("/tmp/modresolve-gomod-test")
}

#[test]
fn list_modules_runs_go_list_in_workspace() {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_spawn()
        .withf(|request| {
            request.operation == LIST_OPERATION
                && request.program.as_str() == "/sdk/bin/go"
                && request.args == ["list", "-m", "-json", "all"]
                && request.dir.as_str() == "/tmp/modresolve-gomod-test"
        })
        .times(1)
        .returning(|_| Ok(canned(json_output(LISTING))));

    let authority = GoAuthority::with_tool(executor, "/sdk/bin/go");
    let modules = authority.list_modules(workspace()).expect("listing decodes");

    assert_eq!(modules.len(), 3);
    assert!(modules.first().is_some_and(|module| module.main));
    assert_eq!(
        modules.get(1),
        Some(&ListedModule {
            path: "golang.org/x/text".to_owned(),
            version: "v0.3.0".to_owned(),
            main: false,
            replace: None,
        })
    );
    assert_eq!(
        modules.get(2).and_then(|module| module.replace.clone()),
        Some(Replacement {
            path: "example.com/new".to_owned(),
            version: "v2.0.0".to_owned(),
        })
    );
}

#[test]
fn list_modules_passes_timeout_through() {
    let mut executor = MockCommandExecutor::new();
    executor
        .expect_spawn()
        .withf(|request| request.timeout == Some(Duration::from_secs(7)))
        .times(1)
        .returning(|_| Ok(canned(json_output(""))));

    let authority =
        GoAuthority::with_tool(executor, "go").with_timeout(Some(Duration::from_secs(7)));
    let modules = authority.list_modules(workspace()).expect("empty listing");
    assert!(modules.is_empty());
}

#[test]
fn non_zero_exit_is_tool_failure_with_diagnostics() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        LIST_OPERATION,
        &["list", "-m", "-json", "all"],
        Ok(failure_output("go: errors parsing go.mod\n")),
    )]);

    let authority = GoAuthority::with_tool(&executor, "go");
    match authority.list_modules(workspace()) {
        Err(ResolveError::ToolFailed {
            operation, stderr, ..
        }) => {
            assert_eq!(operation, LIST_OPERATION);
            assert_eq!(stderr, "go: errors parsing go.mod");
        }
        other => panic!("expected tool failure, got {other:?}"),
    }
    executor.assert_finished();
}

#[test]
fn failed_tool_with_truncated_output_reports_exit() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        LIST_OPERATION,
        &["list", "-m", "-json", "all"],
        Ok(Output {
            status: exit_status(1),
            stdout: br#"{"Path": "example.com/a", "Vers"#.to_vec(),
            stderr: b"go: killed\n".to_vec(),
        }),
    )]);

    let authority = GoAuthority::with_tool(&executor, "go");
    assert!(matches!(
        authority.list_modules(workspace()),
        Err(ResolveError::ToolFailed {
            operation: LIST_OPERATION,
            ..
        })
    ));
}

#[test]
fn launch_failure_propagates() {
    let mut executor = MockCommandExecutor::new();
    executor.expect_spawn().times(1).returning(|request| {
        Err(ResolveError::ToolLaunch {
            tool: request.program.clone(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    });

    let authority = GoAuthority::with_tool(executor, "/missing/go");
    assert!(matches!(
        authority.list_modules(workspace()),
        Err(ResolveError::ToolLaunch { .. })
    ));
}

#[test]
fn malformed_listing_is_decode_error() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        LIST_OPERATION,
        &["list", "-m", "-json", "all"],
        Ok(json_output(r#"{"Path": "example.com/a", "Version": 3}"#)),
    )]);

    let authority = GoAuthority::with_tool(&executor, "go");
    assert!(matches!(
        authority.list_modules(workspace()),
        Err(ResolveError::Decode {
            operation: LIST_OPERATION,
            ..
        })
    ));
}

#[test]
fn download_batches_all_targets_in_one_call() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        DOWNLOAD_OPERATION,
        &[
            "mod",
            "download",
            "-json",
            "example.com/a@v1.0.0",
            "example.com/b@v0.2.0",
        ],
        Ok(json_output(
            r#"{"Path":"example.com/a","Version":"v1.0.0","Sum":"h1:aaa="}
{"Path":"example.com/b","Version":"v0.2.0","Sum":"h1:bbb="}"#,
        )),
    )]);

    let authority = GoAuthority::with_tool(&executor, "go");
    let targets = [
        ModuleVersion::new("example.com/a", "v1.0.0"),
        ModuleVersion::new("example.com/b", "v0.2.0"),
    ];
    let downloaded = authority
        .download_checksums(workspace(), &targets)
        .expect("download decodes");

    executor.assert_finished();
    let sums: Vec<&str> = downloaded.iter().map(|module| module.sum.as_str()).collect();
    assert_eq!(sums, ["h1:aaa=", "h1:bbb="]);
}

#[test]
fn download_with_no_targets_skips_the_tool() {
    let executor = StubExecutor::new(Vec::new());
    let authority = GoAuthority::with_tool(&executor, "go");

    let downloaded = authority
        .download_checksums(workspace(), &[])
        .expect("nothing to download");

    assert!(downloaded.is_empty());
    assert!(executor.seen_dirs().is_empty());
}

#[test]
fn download_reports_per_module_errors() {
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        DOWNLOAD_OPERATION,
        &["mod", "download", "-json", "example.com/gone@v1.0.0"],
        Ok(json_output(
            r#"{"Path":"example.com/gone","Version":"v1.0.0","Error":"unknown revision v1.0.0"}"#,
        )),
    )]);

    let authority = GoAuthority::with_tool(&executor, "go");
    let downloaded = authority
        .download_checksums(workspace(), &[ModuleVersion::new("example.com/gone", "v1.0.0")])
        .expect("download decodes");

    assert_eq!(
        downloaded.first().and_then(|module| module.error.as_deref()),
        Some("unknown revision v1.0.0")
    );
}

#[test]
fn module_version_renders_with_at_sign() {
    let target = ModuleVersion::new("github.com/pkg/errors", "v0.9.1");
    assert_eq!(target.to_string(), "github.com/pkg/errors@v0.9.1");
}

#[test]
fn new_locates_tool_from_config() {
    let config = ResolverConfig {
        root_env_var: "MODRESOLVE_TEST_AUTHORITY_ROOT".to_owned(),
        timeout_secs: Some(12),
        ..ResolverConfig::default()
    };

    temp_env::with_var_unset("MODRESOLVE_TEST_AUTHORITY_ROOT", || {
        let authority = GoAuthority::new(MockCommandExecutor::new(), &config);
        assert_eq!(
            authority.tool().as_str(),
            format!("go{}", std::env::consts::EXE_SUFFIX)
        );
        assert_eq!(authority.timeout, Some(Duration::from_secs(12)));
    });
}
