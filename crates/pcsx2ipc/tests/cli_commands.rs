#![cfg(all(unix, feature = "cli"))]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

use bytes::BytesMut;
use pcsx2ipc_protocol::{decode_request, encode_response, Command as WireCommand, Status};

type Memory = Arc<Mutex<HashMap<u32, u8>>>;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/pcsx2ipc-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// Bind a fake emulator and serve `connections` requests against `memory`.
fn serve(path: &Path, status: Status, connections: usize, memory: Memory) -> thread::JoinHandle<()> {
    let listener = UnixListener::bind(path).expect("fake emulator should bind");
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut header = [0u8; 4];
            stream.read_exact(&mut header).expect("request header");
            let mut request = header.to_vec();
            request.resize(u32::from_ne_bytes(header) as usize, 0);
            stream.read_exact(&mut request[4..]).expect("request body");

            let mut payload = Vec::new();
            let mut memory = memory.lock().unwrap();
            for command in decode_request(&request).expect("request should decode") {
                match command {
                    WireCommand::Read { width, address } => {
                        for i in 0..width.bytes() as u32 {
                            payload.push(memory.get(&(address + i)).copied().unwrap_or(0));
                        }
                    }
                    WireCommand::Write {
                        width,
                        address,
                        value,
                    } => {
                        for (i, b) in value.to_le_bytes()[..width.bytes()].iter().enumerate() {
                            memory.insert(address + i as u32, *b);
                        }
                    }
                }
            }
            if status != Status::Ok {
                payload.clear();
            }

            let mut wire = BytesMut::new();
            encode_response(status, &payload, &mut wire).unwrap();
            let _ = stream.write_all(&wire);
        }
    })
}

fn pcsx2ipc(socket: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pcsx2ipc"))
        .env_remove("PCSX2_IPC_SOCKET")
        .arg("--socket")
        .arg(socket)
        .arg("--timeout")
        .arg("5s")
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("pcsx2ipc should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn no_arguments_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_pcsx2ipc"))
        .output()
        .expect("pcsx2ipc should run");
    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).is_empty());
}

#[test]
fn bad_hex_is_usage_error() {
    let dir = unique_temp_dir("badhex");
    let output = pcsx2ipc(&dir.join("pcsx2.sock"), &["peek", "zz"]);
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn peek_prints_single_byte_as_two_hex_digits() {
    let dir = unique_temp_dir("peek");
    let sock = dir.join("pcsx2.sock");
    let memory = Memory::default();
    memory.lock().unwrap().insert(0x0020_0000, 0x7F);
    let server = serve(&sock, Status::Ok, 1, Arc::clone(&memory));

    let output = pcsx2ipc(&sock, &["peek", "0x00200000"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "7f\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn peek_count_prints_wrapped_rows() {
    let dir = unique_temp_dir("peek-count");
    let sock = dir.join("pcsx2.sock");
    let memory = Memory::default();
    {
        let mut memory = memory.lock().unwrap();
        for i in 0..0x12u32 {
            memory.insert(0x1000 + i, i as u8);
        }
    }
    let server = serve(&sock, Status::Ok, 1, Arc::clone(&memory));

    let output = pcsx2ipc(&sock, &["peek", "1000", "--count", "12"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n00001010: 10 11\n"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn memset_writes_every_byte() {
    let dir = unique_temp_dir("memset");
    let sock = dir.join("pcsx2.sock");
    let memory = Memory::default();
    let server = serve(&sock, Status::Ok, 1, Arc::clone(&memory));

    let output = pcsx2ipc(&sock, &["memset", "2000", "ab", "10"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let memory = memory.lock().unwrap();
    assert_eq!(memory.len(), 0x10);
    assert!((0x2000..0x2010).all(|a| memory.get(&a) == Some(&0xAB)));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn memset_range_fills_half_open_range() {
    let dir = unique_temp_dir("memset-range");
    let sock = dir.join("pcsx2.sock");
    let memory = Memory::default();
    let server = serve(&sock, Status::Ok, 1, Arc::clone(&memory));

    let output = pcsx2ipc(&sock, &["memset-range", "3000", "3004", "1"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let memory = memory.lock().unwrap();
    assert_eq!(memory.get(&0x3003), Some(&0x01));
    assert_eq!(memory.get(&0x3004), None);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn memset_range_rejects_reversed_bounds() {
    let dir = unique_temp_dir("memset-reversed");
    let output = pcsx2ipc(&dir.join("pcsx2.sock"), &["memset-range", "2000", "1000", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("below start"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn poke_rejects_value_wider_than_width() {
    let dir = unique_temp_dir("poke-wide");
    let output = pcsx2ipc(&dir.join("pcsx2.sock"), &["poke", "1000", "1ff"]);
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_socket_is_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = pcsx2ipc(&dir.join("pcsx2.sock"), &["peek", "10"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("failed to connect"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_size_memset_still_requires_emulator() {
    let dir = unique_temp_dir("memset-zero");
    let output = pcsx2ipc(&dir.join("pcsx2.sock"), &["memset", "1000", "ff", "0"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("failed to connect"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn remote_failure_exits_one() {
    let dir = unique_temp_dir("fail");
    let sock = dir.join("pcsx2.sock");
    let server = serve(&sock, Status::Fail, 1, Memory::default());

    let output = pcsx2ipc(&sock, &["poke", "1000", "12345678", "--width", "32"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("IPC_FAIL"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn peek_json_reports_width_and_values() {
    let dir = unique_temp_dir("json");
    let sock = dir.join("pcsx2.sock");
    let memory = Memory::default();
    {
        let mut memory = memory.lock().unwrap();
        for (i, b) in 0xCAFE_u16.to_le_bytes().iter().enumerate() {
            memory.insert(0x40 + i as u32, *b);
        }
    }
    let server = serve(&sock, Status::Ok, 1, Arc::clone(&memory));

    let output = pcsx2ipc(&sock, &["--format", "json", "peek", "40", "--width", "16"]);
    server.join().expect("server thread should finish");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("\"width_bits\":16"));
    if cfg!(target_endian = "little") {
        assert!(out.contains("\"cafe\""));
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pcsx2ipc"))
        .arg("version")
        .output()
        .expect("pcsx2ipc should run");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        format!("pcsx2ipc {}\n", env!("CARGO_PKG_VERSION"))
    );
}
