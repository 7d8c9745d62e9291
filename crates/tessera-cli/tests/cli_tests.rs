//! CLI integration tests for tessera-cli
//!
//! Tests command parsing, config handling, error output and full
//! deploy/call runs against an in-process IPC node.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Isolated home and project directories for one run
struct Sandbox {
    home: TempDir,
    project: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
            project: tempfile::tempdir().unwrap(),
        }
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_tessera"))
            .args(args)
            .env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .current_dir(self.project.path())
            .output()
            .expect("Failed to execute command")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            output.status.success(),
            "tessera {:?} failed: {}{}",
            args,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_str(&stdout).unwrap()
    }
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let output = Sandbox::new().run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["call", "send", "deploy", "rpc", "config"] {
        assert!(stdout.contains(command), "missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let output = Sandbox::new().run(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("tessera"));
}

#[test]
fn test_cli_deploy_help() {
    let output = Sandbox::new().run(&["deploy", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--name"));
    assert!(stdout.contains("--compiler"));
}

#[test]
fn test_ipc_and_http_conflict() {
    let output = Sandbox::new().run(&["--ipc", "/tmp/x.ipc", "--http", "http://x", "rpc", "net_version"]);
    assert!(!output.status.success());
}

// ==================== Config Tests ====================

#[test]
fn test_config_show_defaults() {
    let sandbox = Sandbox::new();
    let json = sandbox.run_json(&["config", "--show"]);
    assert_eq!(json["transport"], "ipc");
    assert_eq!(json["http_url"], "http://localhost:8545");
    assert_eq!(json["block_time_secs"], 12);
    assert_eq!(json["gas"], 3141592);
    assert_eq!(json["compiler"], "serpent");
}

#[test]
fn test_config_set_persists() {
    let sandbox = Sandbox::new();
    let saved = sandbox.run_json(&["config", "--set-transport", "http", "--set-http-url", "http://node:8545"]);
    assert_eq!(saved["status"], "saved");
    assert!(sandbox.home.path().join(".tessera").join("config.toml").exists());

    let json = sandbox.run_json(&["config", "--show"]);
    assert_eq!(json["transport"], "http");
    assert_eq!(json["http_url"], "http://node:8545");
}

#[test]
fn test_config_rejects_bad_sender() {
    let output = Sandbox::new().run(&["config", "--set-sender", "0x1234"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_config_rejects_unknown_transport() {
    let output = Sandbox::new().run(&["config", "--set-transport", "carrier-pigeon"]);
    assert!(!output.status.success());
}

// ==================== Error Output Tests ====================

#[test]
fn test_call_unknown_contract() {
    let output = Sandbox::new().run(&["call", "token", "balance"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no contract named 'token'"));
}

#[test]
fn test_error_json_format() {
    let output = Sandbox::new().run(&["--json", "send", "token", "transfer"]);
    assert_eq!(output.status.code(), Some(1));
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("token"));
}

#[test]
fn test_missing_socket_fails() {
    let sandbox = Sandbox::new();
    let socket = sandbox.project.path().join("absent.ipc");
    let output = sandbox.run(&["--ipc", socket.to_str().unwrap(), "rpc", "eth_blockNumber"]);
    assert_eq!(output.status.code(), Some(1));
}

// ==================== Node Round Trips ====================

#[cfg(unix)]
mod node {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::net::{UnixListener, UnixStream};

    const COINBASE: &str = "0x407d73d8a49eeb85d32cf465507dd71d507100c1";
    const DEPLOYED: &str = "0x1111111111111111111111111111111111111111";
    const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    fn reply(request: &Value) -> Value {
        let result = match request["method"].as_str().unwrap_or_default() {
            "eth_coinbase" => json!(COINBASE),
            "eth_blockNumber" => json!("0x2a"),
            "eth_sendTransaction" => json!(TX_HASH),
            "eth_getTransactionReceipt" => json!({
                "transactionHash": TX_HASH,
                "blockNumber": "0x1",
                "contractAddress": DEPLOYED,
                "status": "0x1"
            }),
            "eth_getCode" => json!("0xaabb"),
            "eth_call" => json!(format!("0x{:064x}", 7)),
            _ => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": {"code": -32601, "message": "method not found"}
                })
            }
        };
        json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
    }

    fn serve(mut stream: UnixStream) {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buffer.extend_from_slice(&chunk[..n]);
            if let Ok(request) = serde_json::from_slice::<Value>(&buffer) {
                buffer.clear();
                let body = serde_json::to_vec(&reply(&request)).unwrap();
                if stream.write_all(&body).is_err() {
                    return;
                }
            }
        }
    }

    /// Node answering every connection on a socket inside `dir`
    fn spawn_node(dir: &Path) -> PathBuf {
        let path = dir.join("node.ipc");
        let listener = UnixListener::bind(&path).unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                serve(stream);
            }
        });
        path
    }

    fn fake_compiler(dir: &Path) -> PathBuf {
        let path = dir.join("fake-serpent");
        let body = r#"#!/bin/sh
cp "$2" "$HOME/last-compiled"
case "$1" in
  compile) echo 6060aabb ;;
  mk_signature) echo 'extern main: [get:[]:int256, set:[int256]:_]' ;;
  mk_full_signature) echo '[{"name":"get()","type":"function","outputs":[{"name":"","type":"uint256"}]},{"name":"set(uint256)","type":"function"}]' ;;
  *) exit 1 ;;
esac
"#;
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_rpc_over_ipc() {
        let sandbox = Sandbox::new();
        let socket = spawn_node(sandbox.home.path());

        let json = sandbox.run_json(&["--ipc", socket.to_str().unwrap(), "rpc", "eth_blockNumber"]);
        assert_eq!(json["method"], "eth_blockNumber");
        assert_eq!(json["result"], "0x2a");
    }

    #[test]
    fn test_rpc_error_code_reported() {
        let sandbox = Sandbox::new();
        let socket = spawn_node(sandbox.home.path());

        let output = sandbox.run(&["--ipc", socket.to_str().unwrap(), "rpc", "debug_nothing"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("-32601"));
    }

    #[test]
    fn test_deploy_then_call() {
        let sandbox = Sandbox::new();
        let socket = spawn_node(sandbox.home.path());
        let compiler = fake_compiler(sandbox.home.path());
        std::fs::write(sandbox.project.path().join("counter.se"), "def get(): return(7)").unwrap();
        let ipc = socket.to_str().unwrap();

        let deployed = sandbox.run_json(&[
            "--ipc",
            ipc,
            "--block-time",
            "0",
            "deploy",
            "counter.se",
            "--compiler",
            compiler.to_str().unwrap(),
        ]);
        assert_eq!(deployed["contract"], "counter");
        assert_eq!(deployed["address"], DEPLOYED);

        let record_path = sandbox.project.path().join(".tessera").join("build.json");
        let record: Value = serde_json::from_str(&std::fs::read_to_string(record_path).unwrap()).unwrap();
        assert_eq!(record["counter"]["address"], DEPLOYED);
        assert_eq!(record["counter"]["signature"], "extern counter: [get:[]:int256, set:[int256]:_]");

        let called = sandbox.run_json(&["--ipc", ipc, "call", "counter", "get"]);
        assert_eq!(called["function"], "get()");
        assert_eq!(called["result"], json!(["7"]));

        let sent = sandbox.run_json(&["--ipc", ipc, "--block-time", "0", "send", "counter", "set", "5"]);
        assert_eq!(sent["tx_hash"], TX_HASH);
        assert_eq!(sent["status"], 1);
    }

    #[test]
    fn test_deploy_resolves_imports_from_record() {
        let sandbox = Sandbox::new();
        let socket = spawn_node(sandbox.home.path());
        let compiler = fake_compiler(sandbox.home.path());
        let project = sandbox.project.path();
        std::fs::write(project.join("counter.se"), "def get(): return(7)").unwrap();
        std::fs::write(project.join("user.se"), "import counter as C\ndef f(): return(C.get())\n").unwrap();
        let ipc = socket.to_str().unwrap();
        let compiler = compiler.to_str().unwrap();

        for source in ["counter.se", "user.se"] {
            sandbox.run_json(&["--ipc", ipc, "--block-time", "0", "deploy", source, "--compiler", compiler]);
        }

        // The compiler saw the extern declaration and the recorded address
        let compiled = std::fs::read_to_string(sandbox.home.path().join("last-compiled")).unwrap();
        let lines: Vec<&str> = compiled.lines().collect();
        assert_eq!(lines[0], "extern counter: [get:[]:int256, set:[int256]:_]");
        assert_eq!(lines[1], format!("C = {}", DEPLOYED));
        assert_eq!(lines[2], "def f(): return(C.get())");
        assert!(project.join(".tessera").join("sources").join("user.se").exists());

        let record: Value = serde_json::from_str(
            &std::fs::read_to_string(project.join(".tessera").join("build.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record["user"]["signature"], "extern user: [get:[]:int256, set:[int256]:_]");
    }

    #[test]
    fn test_deploy_unknown_import_fails_before_compiling() {
        let sandbox = Sandbox::new();
        let compiler = fake_compiler(sandbox.home.path());
        std::fs::write(sandbox.project.path().join("user.se"), "import ghost as G\n").unwrap();
        let missing = sandbox.project.path().join("absent.ipc");

        let output = sandbox.run(&[
            "--ipc",
            missing.to_str().unwrap(),
            "deploy",
            "user.se",
            "--compiler",
            compiler.to_str().unwrap(),
        ]);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("no contract named 'ghost'"));
        assert!(!sandbox.home.path().join("last-compiled").exists());
    }

    #[test]
    fn test_call_arity_mismatch_fails_before_connecting() {
        let sandbox = Sandbox::new();
        let record = json!({
            "counter": {"address": DEPLOYED, "full_signature": [{"name": "get()", "type": "function"}]}
        });
        let dir = sandbox.project.path().join(".tessera");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("build.json"), record.to_string()).unwrap();

        let missing = sandbox.project.path().join("absent.ipc");
        let output = sandbox.run(&["--ipc", missing.to_str().unwrap(), "call", "counter", "get", "1"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Arity mismatch"));
    }
}
